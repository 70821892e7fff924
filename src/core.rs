//! Core functionality used across the crate.

pub mod feature;
pub mod mapping;
pub mod strand;

pub use feature::Feature;
pub use feature::FeatureId;
pub use mapping::Mapping;
pub use strand::Strand;

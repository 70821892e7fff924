//! `txstructure` is a crate for deriving the transcriptional structure of a
//! bacterial chromosome from aligned short reads.
//!
//! Given the annotated features of a chromosome and the read mappings of one
//! or more sequencing tracks, the crate provides:
//!
//! - The number of reads that hit each feature.
//! - The per-position coverage and read starts on each strand.
//! - The transcription start sites, found as sharp jumps in read starts.
//! - The operons, found as runs of neighbouring features joined by reads that
//!   span the gap between them.
//!
//! ## Building an index
//!
//! The features of a chromosome are indexed once with
//! [`index::Builder::try_build()`]. The resulting [`index::FeatureIndex`]
//! answers which features cover a position on a given strand, and carries the
//! [`index::ExclusionMask`] of positions (around tRNA and rRNA genes) that never
//! seed a transcription start. An index is never mutated after it is built and
//! may be shared between any number of tracks.
//!
//! ## Analysing a track
//!
//! Most users will want to go through a [`pipeline::Pipeline`], which bundles
//! the features, the index and the [`config::Config`]. Each track is opened
//! with [`pipeline::Pipeline::track()`], fed its mappings in as many batches as
//! needed, and then completed. Completing a track counts the hits, detects the
//! transcription starts and assembles the operons, returning a
//! [`pipeline::Status`] together with the [`Diagnostics`] of the track.
//!
//! Below is a representative example of how one might analyse a single track.
//!
//! ```
//! use txstructure::config;
//! use txstructure::core::Feature;
//! use txstructure::core::FeatureId;
//! use txstructure::core::Mapping;
//! use txstructure::core::Strand;
//! use txstructure::index;
//! use txstructure::pipeline::Pipeline;
//!
//! let features = vec![
//!     "1\t100\t400\t+\tCDS\tthrA".parse::<Feature>()?,
//!     "2\t450\t800\t+\tCDS\tthrB".parse::<Feature>()?,
//! ];
//!
//! let index = index::Builder::default().try_build(&features, 2000)?;
//! let config = config::Builder::default().try_build()?;
//! let pipeline = Pipeline::new(&features, &index, &config);
//!
//! let mut track = pipeline.track("wild-type");
//! track.feed(vec![Mapping::new(90, 480, Strand::Forward); 50]);
//!
//! let outcome = track.complete().into_result()?;
//!
//! assert_eq!(outcome.counts().get(FeatureId::from(1)), Some(50));
//! assert_eq!(outcome.starts()[0].position(), 90);
//! assert_eq!(
//!     outcome.operons()[0].features(),
//!     vec![FeatureId::from(1), FeatureId::from(2)]
//! );
//!
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Individual steps
//!
//! Each step of the pipeline is also available on its own:
//! [`aggregate::aggregate()`] for counting, [`detect::detect()`] for finding
//! transcription starts and [`operon::assemble()`] for merging adjacencies
//! into operons.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![warn(rust_2021_compatibility)]
#![warn(missing_debug_implementations)]
#![warn(clippy::missing_docs_in_private_items)]
#![warn(rustdoc::broken_intra_doc_links)]

pub mod aggregate;
pub mod config;
pub mod core;
pub mod detect;
mod diagnostics;
pub mod index;
pub mod operon;
pub mod pipeline;

pub use diagnostics::Diagnostics;

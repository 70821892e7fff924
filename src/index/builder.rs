//! A builder for a [`FeatureIndex`].

use std::collections::HashSet;

use omics::coordinate::position::Number;
use rust_lapper as lapper;
use tracing::debug;

use crate::core::Feature;
use crate::core::FeatureId;
use crate::core::Strand;
use crate::index::mask;
use crate::index::ExclusionMask;
use crate::index::FeatureIndex;
use crate::index::StrandIndex;

/// The inner value of the per-strand lookup data structure.
type Iv = lapper::Interval<Number, FeatureId>;

/// An error related to building a [`FeatureIndex`].
///
/// Each of these indicates that the feature set handed over by the caller is
/// inconsistent with itself or with the chromosome, so the analysis of every
/// track that depends on the index must be aborted.
#[derive(Debug, Eq, PartialEq)]
pub enum Error {
    /// A feature whose start is greater than its stop.
    InvalidFeature(FeatureId, Number, Number),

    /// A feature that does not lie within `[1, genome length]`.
    FeatureOutOfBounds(FeatureId, Number, Number),

    /// Two features share the same id.
    DuplicateId(FeatureId),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidFeature(id, start, stop) => write!(
                f,
                "invalid feature `{}`: start ({}) is greater than stop ({})",
                id, start, stop
            ),
            Error::FeatureOutOfBounds(id, stop, length) => write!(
                f,
                "feature `{}` ending at {} does not fit within the genome (length {})",
                id, stop, length
            ),
            Error::DuplicateId(id) => write!(f, "duplicate feature id: {}", id),
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

/// A builder for a [`FeatureIndex`].
#[derive(Clone, Debug, Default)]
pub struct Builder {
    /// The padding table for the exclusion mask.
    mask: mask::Config,
}

impl Builder {
    /// Sets the padding table for the exclusion mask.
    pub fn mask(mut self, config: mask::Config) -> Self {
        self.mask = config;
        self
    }

    /// Builds a [`FeatureIndex`] for a chromosome of `genome_length` bases.
    ///
    /// This is a pure function of its inputs: building twice from the same
    /// features yields identical indices.
    ///
    /// # Examples
    ///
    /// ```
    /// use txstructure::core::feature::Kind;
    /// use txstructure::core::Feature;
    /// use txstructure::core::Strand;
    ///
    /// let features = vec![Feature::new(1u64, 10, 40, Strand::Forward, Kind::Cds, "a")];
    /// let index = txstructure::index::Builder::default().try_build(&features, 100)?;
    ///
    /// assert_eq!(index.len(), 1);
    /// assert_eq!(index.genome_length(), 100);
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn try_build(&self, features: &[Feature], genome_length: Number) -> Result<FeatureIndex> {
        let mut seen = HashSet::with_capacity(features.len());
        let mut forward = Vec::<Iv>::new();
        let mut reverse = Vec::<Iv>::new();

        for feature in features {
            if feature.start() > feature.stop() {
                return Err(Error::InvalidFeature(
                    feature.id(),
                    feature.start(),
                    feature.stop(),
                ));
            }

            if feature.start() == 0 || feature.stop() > genome_length {
                return Err(Error::FeatureOutOfBounds(
                    feature.id(),
                    feature.stop(),
                    genome_length,
                ));
            }

            if !seen.insert(feature.id()) {
                return Err(Error::DuplicateId(feature.id()));
            }

            let iv = lapper::Interval {
                start: feature.start(),
                stop: feature.stop() + 1,
                val: feature.id(),
            };

            match feature.strand() {
                Strand::Forward => forward.push(iv),
                Strand::Reverse => reverse.push(iv),
            }
        }

        let mask = ExclusionMask::build(features, genome_length, &self.mask);

        debug!(
            forward = forward.len(),
            reverse = reverse.len(),
            masked = mask.count(),
            "built feature index"
        );

        Ok(FeatureIndex {
            genome_length,
            forward: StrandIndex::new(forward),
            reverse: StrandIndex::new(reverse),
            mask,
        })
    }
}

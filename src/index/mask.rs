//! Positions that must not seed a transcription start.
//!
//! Structural RNAs (tRNAs and rRNAs) are processed from longer precursors, so
//! their 5' ends pile up read starts that do not reflect transcription
//! initiation. Every position within a padded window around such a feature is
//! flagged in an [`ExclusionMask`].

use omics::coordinate::position::Number;

use crate::core::feature::Kind;
use crate::core::Feature;
use crate::core::Strand;

/// The padding applied around a masked feature, in strand sense.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Padding {
    /// Bases masked before the 5' end of the feature.
    pub upstream: Number,

    /// Bases masked after the 3' end of the feature.
    pub downstream: Number,
}

/// The padding table used when building an [`ExclusionMask`].
///
/// A type without padding is not masked at all.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Config {
    /// The padding around tRNAs.
    pub trna: Option<Padding>,

    /// The padding around rRNAs.
    pub rrna: Option<Padding>,
}

impl Config {
    /// A padding table that masks nothing.
    pub fn empty() -> Self {
        Self {
            trna: None,
            rrna: None,
        }
    }

    /// Gets the padding for a feature type, if that type is masked at all.
    pub fn padding(&self, kind: &Kind) -> Option<Padding> {
        match kind {
            Kind::Trna => self.trna,
            Kind::Rrna => self.rrna,
            _ => None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            trna: Some(Padding {
                upstream: 20,
                downstream: 20,
            }),
            rrna: Some(Padding {
                upstream: 500,
                downstream: 20,
            }),
        }
    }
}

/// A per-position flag marking positions near structural RNAs.
///
/// The mask is indexed by 0-based array index (position `p` lives at index
/// `p - 1`) and always has exactly one entry per genome position.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ExclusionMask(Vec<bool>);

impl ExclusionMask {
    /// Builds a mask for a chromosome of `genome_length` bases.
    ///
    /// Features are expected to lie within `[1, genome_length]`; padded
    /// windows are clamped to the chromosome.
    ///
    /// # Examples
    ///
    /// ```
    /// use txstructure::core::feature::Kind;
    /// use txstructure::core::Feature;
    /// use txstructure::core::Strand;
    /// use txstructure::index::mask;
    /// use txstructure::index::mask::ExclusionMask;
    ///
    /// let features = vec![Feature::new(1u64, 100, 150, Strand::Forward, Kind::Trna, "trnA")];
    /// let mask = ExclusionMask::build(&features, 1000, &mask::Config::default());
    ///
    /// assert!(!mask.is_masked(79));
    /// assert!(mask.is_masked(80));
    /// assert!(mask.is_masked(170));
    /// assert!(!mask.is_masked(171));
    /// ```
    pub fn build(features: &[Feature], genome_length: Number, config: &Config) -> Self {
        let mut inner = vec![false; genome_length as usize];

        for feature in features {
            let padding = match config.padding(feature.kind()) {
                Some(padding) => padding,
                None => continue,
            };

            let (before, after) = match feature.strand() {
                Strand::Forward => (padding.upstream, padding.downstream),
                Strand::Reverse => (padding.downstream, padding.upstream),
            };

            let start = feature.start().saturating_sub(before).max(1);
            let stop = feature
                .stop()
                .saturating_add(after)
                .min(genome_length);

            if start > stop {
                continue;
            }

            for flag in &mut inner[(start - 1) as usize..stop as usize] {
                *flag = true;
            }
        }

        Self(inner)
    }

    /// Whether the 1-based `position` is masked.
    ///
    /// Positions outside of the chromosome are never masked.
    pub fn is_masked(&self, position: Number) -> bool {
        match position.checked_sub(1) {
            Some(index) => self.get(index as usize),
            None => false,
        }
    }

    /// Whether the 0-based array `index` is masked.
    pub fn get(&self, index: usize) -> bool {
        self.0.get(index).copied().unwrap_or(false)
    }

    /// Gets the number of positions covered by the mask.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the mask covers no positions at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Gets the number of masked positions.
    pub fn count(&self) -> usize {
        self.0.iter().filter(|flag| **flag).count()
    }
}

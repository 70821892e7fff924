//! A per-strand index of features and positions excluded from detection.
//!
//! A [`FeatureIndex`] is built once per chromosome and feature set, after
//! which it is never mutated. It can therefore be shared by reference between
//! any number of concurrent per-track analyses.

use omics::coordinate::position::Number;
use rust_lapper as lapper;

use crate::core::FeatureId;
use crate::core::Strand;

pub mod builder;
pub mod mask;

pub use builder::Builder;
pub use builder::Error;
pub use mask::ExclusionMask;

/// The lookup structure for a single strand.
///
/// Intervals are stored half-open, so a feature spanning `[start, stop]`
/// occupies `[start, stop + 1)` within the lapper.
pub(crate) type StrandIndex = lapper::Lapper<Number, FeatureId>;

/// A feature as it is seen through the index.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Entry {
    /// The feature id.
    id: FeatureId,

    /// The start position.
    start: Number,

    /// The stop position.
    stop: Number,

    /// The strand.
    strand: Strand,
}

impl Entry {
    /// Gets the feature id.
    pub fn id(&self) -> FeatureId {
        self.id
    }

    /// Gets the start position.
    pub fn start(&self) -> Number {
        self.start
    }

    /// Gets the stop position.
    pub fn stop(&self) -> Number {
        self.stop
    }

    /// Gets the strand.
    pub fn strand(&self) -> Strand {
        self.strand
    }

    /// The position where transcription of the feature begins.
    pub fn five_prime(&self) -> Number {
        match self.strand {
            Strand::Forward => self.start,
            Strand::Reverse => self.stop,
        }
    }

    /// The position where transcription of the feature ends.
    pub fn three_prime(&self) -> Number {
        match self.strand {
            Strand::Forward => self.stop,
            Strand::Reverse => self.start,
        }
    }

    /// Whether `position` lies within the feature.
    pub fn contains(&self, position: Number) -> bool {
        self.start <= position && position <= self.stop
    }
}

/// Feature membership for every position of a chromosome, one lookup per
/// strand, plus the [`ExclusionMask`] for that chromosome.
///
/// Generally, you will want to use a [`Builder`] to construct one of these.
#[derive(Debug)]
pub struct FeatureIndex {
    /// The length of the chromosome.
    genome_length: Number,

    /// Features on the forward strand.
    forward: StrandIndex,

    /// Features on the reverse strand.
    reverse: StrandIndex,

    /// The positions excluded from seeding a detection.
    mask: ExclusionMask,
}

impl FeatureIndex {
    /// Gets the length of the indexed chromosome.
    pub fn genome_length(&self) -> Number {
        self.genome_length
    }

    /// Gets the exclusion mask.
    pub fn mask(&self) -> &ExclusionMask {
        &self.mask
    }

    /// Gets the number of indexed features.
    pub fn len(&self) -> usize {
        self.forward.len() + self.reverse.len()
    }

    /// Whether no features were indexed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Gets the lookup for a single strand.
    fn strand(&self, strand: Strand) -> &StrandIndex {
        match strand {
            Strand::Forward => &self.forward,
            Strand::Reverse => &self.reverse,
        }
    }

    /// Gets the ordered set of feature ids on `strand` whose interval contains
    /// the 1-based `position`.
    ///
    /// # Examples
    ///
    /// ```
    /// use txstructure::core::feature::Kind;
    /// use txstructure::core::Feature;
    /// use txstructure::core::FeatureId;
    /// use txstructure::core::Strand;
    /// use txstructure::index;
    ///
    /// let features = vec![
    ///     Feature::new(2u64, 10, 40, Strand::Forward, Kind::Cds, "b"),
    ///     Feature::new(1u64, 30, 60, Strand::Forward, Kind::Cds, "a"),
    /// ];
    ///
    /// let index = index::Builder::default().try_build(&features, 100)?;
    ///
    /// assert_eq!(
    ///     index.features_at(Strand::Forward, 35),
    ///     vec![FeatureId::from(1), FeatureId::from(2)]
    /// );
    /// assert!(index.features_at(Strand::Reverse, 35).is_empty());
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn features_at(&self, strand: Strand, position: Number) -> Vec<FeatureId> {
        let mut ids = self
            .strand(strand)
            .find(position, position + 1)
            .map(|iv| iv.val)
            .collect::<Vec<_>>();

        ids.sort();
        ids.dedup();
        ids
    }

    /// Gets every feature on `strand` that overlaps the fully closed range
    /// `[from, to]`, ordered by start position.
    pub fn entries(&self, strand: Strand, from: Number, to: Number) -> Vec<Entry> {
        if from > to {
            return Vec::new();
        }

        let mut entries = self
            .strand(strand)
            .find(from, to + 1)
            .map(|iv| Entry {
                id: iv.val,
                start: iv.start,
                stop: iv.stop - 1,
                strand,
            })
            .collect::<Vec<_>>();

        entries.sort_by_key(|entry| (entry.start, entry.id));
        entries
    }

    /// Gets the ids of every indexed feature.
    pub fn ids(&self) -> impl Iterator<Item = FeatureId> + '_ {
        self.forward
            .iter()
            .chain(self.reverse.iter())
            .map(|iv| iv.val)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::feature::Kind;
    use crate::core::Feature;

    fn features() -> Vec<Feature> {
        vec![
            Feature::new(1u64, 100, 200, Strand::Forward, Kind::Cds, "a"),
            Feature::new(2u64, 150, 300, Strand::Reverse, Kind::Cds, "b"),
            Feature::new(3u64, 400, 480, Strand::Forward, Kind::Trna, "c"),
        ]
    }

    #[test]
    fn test_membership_is_fully_closed_and_strand_aware() -> Result<(), Box<dyn std::error::Error>>
    {
        let index = Builder::default().try_build(&features(), 1000)?;

        assert!(index.features_at(Strand::Forward, 99).is_empty());
        assert_eq!(index.features_at(Strand::Forward, 100), vec![FeatureId::from(1)]);
        assert_eq!(index.features_at(Strand::Forward, 200), vec![FeatureId::from(1)]);
        assert!(index.features_at(Strand::Forward, 201).is_empty());

        assert_eq!(index.features_at(Strand::Reverse, 150), vec![FeatureId::from(2)]);
        assert!(index.features_at(Strand::Reverse, 100).is_empty());

        Ok(())
    }

    #[test]
    fn test_entries() -> Result<(), Box<dyn std::error::Error>> {
        let index = Builder::default().try_build(&features(), 1000)?;

        let entries = index.entries(Strand::Forward, 150, 450);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id(), FeatureId::from(1));
        assert_eq!(entries[0].start(), 100);
        assert_eq!(entries[0].stop(), 200);
        assert_eq!(entries[1].id(), FeatureId::from(3));
        assert_eq!(entries[1].five_prime(), 400);

        let entries = index.entries(Strand::Reverse, 1, 1000);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].five_prime(), 300);
        assert_eq!(entries[0].three_prime(), 150);

        assert!(index.entries(Strand::Forward, 201, 399).is_empty());
        assert!(index.entries(Strand::Forward, 10, 5).is_empty());

        Ok(())
    }

    #[test]
    fn test_building_twice_yields_identical_indices() -> Result<(), Box<dyn std::error::Error>> {
        let first = Builder::default().try_build(&features(), 1000)?;
        let second = Builder::default().try_build(&features(), 1000)?;

        assert_eq!(first.mask(), second.mask());
        assert_eq!(first.genome_length(), second.genome_length());

        for position in 0..=1001 {
            for strand in [Strand::Forward, Strand::Reverse] {
                assert_eq!(
                    first.features_at(strand, position),
                    second.features_at(strand, position)
                );
            }
        }

        let mut first = first.ids().collect::<Vec<_>>();
        let mut second = second.ids().collect::<Vec<_>>();
        first.sort();
        second.sort();
        assert_eq!(first, second);

        Ok(())
    }
}

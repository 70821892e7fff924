//! Pairs of neighbouring features and the reads spanning them.

use crate::core::Feature;
use crate::core::FeatureId;
use crate::core::Mapping;
use crate::core::Strand;

/// Two neighbouring features on the same strand and the number of reads that
/// span the gap between them.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Adjacency {
    /// The leading feature.
    feature1: FeatureId,

    /// The trailing feature.
    feature2: FeatureId,

    /// The number of reads overlapping both features.
    spanning_reads: u64,
}

impl Adjacency {
    /// Creates a new adjacency.
    ///
    /// # Examples
    ///
    /// ```
    /// use txstructure::core::FeatureId;
    /// use txstructure::operon::Adjacency;
    ///
    /// let adjacency = Adjacency::new(1u64, 2u64, 5);
    ///
    /// assert_eq!(adjacency.feature1(), FeatureId::from(1));
    /// assert_eq!(adjacency.feature2(), FeatureId::from(2));
    /// assert_eq!(adjacency.spanning_reads(), 5);
    /// ```
    pub fn new(
        feature1: impl Into<FeatureId>,
        feature2: impl Into<FeatureId>,
        spanning_reads: u64,
    ) -> Self {
        Self {
            feature1: feature1.into(),
            feature2: feature2.into(),
            spanning_reads,
        }
    }

    /// Gets the leading feature.
    pub fn feature1(&self) -> FeatureId {
        self.feature1
    }

    /// Gets the trailing feature.
    pub fn feature2(&self) -> FeatureId {
        self.feature2
    }

    /// Gets the number of spanning reads.
    pub fn spanning_reads(&self) -> u64 {
        self.spanning_reads
    }
}

/// Counts the spanning reads for every pair of consecutive features on the
/// same strand.
///
/// A mapping spans a pair when it lies on the pair's strand and overlaps both
/// features, i.e. `mapping.start <= feature1.stop` and
/// `mapping.stop >= feature2.start`. Pairs are returned for the forward strand
/// first and then for the reverse strand, each ordered by the position of the
/// leading feature, so that chains of adjacencies are contiguous.
pub fn count(features: &[Feature], mappings: &[Mapping]) -> Vec<Adjacency> {
    let mut adjacencies = Vec::new();

    for strand in [Strand::Forward, Strand::Reverse] {
        let mut stranded = features
            .iter()
            .filter(|feature| feature.strand() == strand)
            .collect::<Vec<_>>();
        stranded.sort_by_key(|feature| (feature.start(), feature.id()));

        let mut reads = mappings
            .iter()
            .filter(|mapping| mapping.strand() == strand && mapping.start() <= mapping.stop())
            .collect::<Vec<_>>();
        reads.sort_by_key(|mapping| (mapping.start(), mapping.stop()));

        let longest = reads
            .iter()
            .map(|mapping| mapping.stop() - mapping.start())
            .max()
            .unwrap_or(0);

        let mut cursor = 0;

        for pair in stranded.windows(2) {
            let (first, second) = (pair[0], pair[1]);

            while cursor < reads.len() && reads[cursor].start() + longest < second.start() {
                cursor += 1;
            }

            let spanning = reads[cursor..]
                .iter()
                .take_while(|mapping| mapping.start() <= first.stop())
                .filter(|mapping| mapping.stop() >= second.start())
                .count();

            adjacencies.push(Adjacency::new(first.id(), second.id(), spanning as u64));
        }
    }

    adjacencies
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::feature::Kind;

    #[test]
    fn test_spanning_reads_are_counted_per_pair() {
        let features = vec![
            Feature::new(1u64, 100, 200, Strand::Forward, Kind::Cds, "a"),
            Feature::new(2u64, 250, 400, Strand::Forward, Kind::Cds, "b"),
            Feature::new(3u64, 420, 500, Strand::Forward, Kind::Cds, "c"),
            Feature::new(4u64, 150, 300, Strand::Reverse, Kind::Cds, "d"),
            Feature::new(5u64, 350, 450, Strand::Reverse, Kind::Cds, "e"),
        ];

        let mappings = vec![
            Mapping::new(180, 260, Strand::Forward),
            Mapping::new(190, 255, Strand::Forward),
            // Ends before the second feature begins.
            Mapping::new(190, 240, Strand::Forward),
            Mapping::new(390, 425, Strand::Forward),
            // Wrong strand for the forward pair.
            Mapping::new(180, 260, Strand::Reverse),
            Mapping::new(290, 360, Strand::Reverse),
        ];

        let adjacencies = count(&features, &mappings);

        assert_eq!(
            adjacencies,
            vec![
                Adjacency::new(1u64, 2u64, 2),
                Adjacency::new(2u64, 3u64, 1),
                Adjacency::new(4u64, 5u64, 1),
            ]
        );
    }

    #[test]
    fn test_long_and_nested_mappings() {
        let features = vec![
            Feature::new(1u64, 100, 200, Strand::Forward, Kind::Cds, "a"),
            Feature::new(2u64, 300, 400, Strand::Forward, Kind::Cds, "b"),
            Feature::new(3u64, 500, 600, Strand::Forward, Kind::Cds, "c"),
            Feature::new(4u64, 700, 800, Strand::Forward, Kind::Cds, "d"),
        ];

        let mappings = vec![
            // Spans every pair.
            Mapping::new(50, 900, Strand::Forward),
            Mapping::new(150, 320, Strand::Forward),
            Mapping::new(550, 750, Strand::Forward),
            // Lies within the last gap.
            Mapping::new(610, 690, Strand::Forward),
        ];

        assert_eq!(
            count(&features, &mappings),
            vec![
                Adjacency::new(1u64, 2u64, 2),
                Adjacency::new(2u64, 3u64, 1),
                Adjacency::new(3u64, 4u64, 2),
            ]
        );
    }

    #[test]
    fn test_single_features_have_no_adjacency() {
        let features = vec![
            Feature::new(1u64, 100, 200, Strand::Forward, Kind::Cds, "a"),
            Feature::new(2u64, 250, 400, Strand::Reverse, Kind::Cds, "b"),
        ];
        assert!(count(&features, &[]).is_empty());
    }
}

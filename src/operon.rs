//! Assembling operons from chains of supported adjacencies.

use nonempty::NonEmpty;

use crate::core::FeatureId;

pub mod adjacency;

pub use adjacency::Adjacency;

/// A maximal chain of adjacencies hypothesised to be co-transcribed.
///
/// An operon always holds at least one adjacency, and consecutive adjacencies
/// share a feature: the trailing feature of one is the leading feature of the
/// next.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Operon(NonEmpty<Adjacency>);

impl Operon {
    /// Gets the adjacencies of the operon.
    pub fn adjacencies(&self) -> &NonEmpty<Adjacency> {
        &self.0
    }

    /// Gets the features of the operon in chain order.
    ///
    /// # Examples
    ///
    /// ```
    /// use txstructure::core::FeatureId;
    /// use txstructure::operon;
    /// use txstructure::operon::Adjacency;
    ///
    /// let adjacencies = vec![Adjacency::new(1u64, 2u64, 5), Adjacency::new(2u64, 3u64, 6)];
    /// let operons = operon::assemble(&adjacencies, 2);
    ///
    /// assert_eq!(
    ///     operons[0].features(),
    ///     vec![FeatureId::from(1), FeatureId::from(2), FeatureId::from(3)]
    /// );
    /// ```
    pub fn features(&self) -> Vec<FeatureId> {
        let mut features = vec![self.0.head.feature1()];
        features.extend(self.0.iter().map(|adjacency| adjacency.feature2()));
        features
    }

    /// Gets the number of adjacencies in the operon.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`: an operon holds at least one adjacency.
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Merges sequentially connected adjacencies whose spanning read count
/// exceeds `threshold` into operons.
///
/// Adjacencies at or below the threshold are dropped and break the current
/// chain, as does an adjacency whose leading feature is not the trailing
/// feature of the previous one. The result partitions the supported
/// adjacencies into maximal contiguous runs, in input order.
pub fn assemble(adjacencies: &[Adjacency], threshold: u64) -> Vec<Operon> {
    let mut operons = Vec::new();
    let mut current: Option<NonEmpty<Adjacency>> = None;

    for adjacency in adjacencies {
        if adjacency.spanning_reads() <= threshold {
            if let Some(chain) = current.take() {
                operons.push(Operon(chain));
            }

            continue;
        }

        match current.as_mut() {
            Some(chain) if chain.last().feature2() == adjacency.feature1() => {
                chain.push(*adjacency)
            }
            _ => {
                if let Some(chain) = current.replace(NonEmpty::new(*adjacency)) {
                    operons.push(Operon(chain));
                }
            }
        }
    }

    if let Some(chain) = current {
        operons.push(Operon(chain));
    }

    operons
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weak_adjacency_is_dropped() {
        let adjacencies = vec![
            Adjacency::new(1u64, 2u64, 5),
            Adjacency::new(2u64, 3u64, 6),
            Adjacency::new(3u64, 4u64, 1),
        ];

        let operons = assemble(&adjacencies, 2);

        assert_eq!(operons.len(), 1);
        assert_eq!(
            operons[0].adjacencies().iter().copied().collect::<Vec<_>>(),
            vec![Adjacency::new(1u64, 2u64, 5), Adjacency::new(2u64, 3u64, 6)]
        );
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let adjacencies = vec![Adjacency::new(1u64, 2u64, 2)];
        assert!(assemble(&adjacencies, 2).is_empty());
    }

    #[test]
    fn test_weak_adjacency_breaks_the_chain() {
        let adjacencies = vec![
            Adjacency::new(1u64, 2u64, 5),
            Adjacency::new(2u64, 3u64, 0),
            Adjacency::new(3u64, 4u64, 9),
            Adjacency::new(4u64, 5u64, 9),
        ];

        let operons = assemble(&adjacencies, 2);

        assert_eq!(operons.len(), 2);
        assert_eq!(operons[0].len(), 1);
        assert_eq!(operons[1].features().len(), 3);
    }

    #[test]
    fn test_disconnected_adjacencies_start_a_new_operon() {
        let adjacencies = vec![
            Adjacency::new(1u64, 2u64, 5),
            Adjacency::new(7u64, 8u64, 5),
            Adjacency::new(8u64, 9u64, 5),
        ];

        let operons = assemble(&adjacencies, 2);

        assert_eq!(operons.len(), 2);
        assert_eq!(operons[0].features(), vec![FeatureId::from(1), FeatureId::from(2)]);
        assert_eq!(
            operons[1].features(),
            vec![FeatureId::from(7), FeatureId::from(8), FeatureId::from(9)]
        );

        for operon in &operons {
            let chain = operon.adjacencies().iter().collect::<Vec<_>>();
            for pair in chain.windows(2) {
                assert_eq!(pair[0].feature2(), pair[1].feature1());
            }
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(assemble(&[], 0).is_empty());
    }
}

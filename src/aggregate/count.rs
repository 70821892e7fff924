//! Counting the mappings that hit each feature.

use std::collections::BTreeMap;

use omics::coordinate::position::Number;

use crate::core::Feature;
use crate::core::FeatureId;
use crate::core::Mapping;
use crate::core::Strand;

/// The number of mappings hitting each feature of a track.
///
/// Every feature handed to the count has an entry, including features that no
/// mapping hit.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FeatureCounts(BTreeMap<FeatureId, u64>);

impl FeatureCounts {
    /// Gets the count for a feature, if the feature was counted at all.
    pub fn get(&self, id: FeatureId) -> Option<u64> {
        self.0.get(&id).copied()
    }

    /// Whether the feature was counted.
    pub fn contains(&self, id: FeatureId) -> bool {
        self.0.contains_key(&id)
    }

    /// Gets the number of counted features.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no features were counted.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the counts in feature id order.
    pub fn iter(&self) -> impl Iterator<Item = (FeatureId, u64)> + '_ {
        self.0.iter().map(|(id, count)| (*id, *count))
    }
}

/// The sorted ends of the mappings on one strand.
#[derive(Debug, Default)]
struct Ends {
    /// Start positions, ascending.
    starts: Vec<Number>,

    /// Stop positions, ascending.
    stops: Vec<Number>,

    /// Positions of single-base mappings, ascending.
    points: Vec<Number>,

    /// The number of stops known to lie at or before the current window.
    cursor: usize,
}

impl Ends {
    /// Adds a mapping.
    fn push(&mut self, mapping: &Mapping) {
        self.starts.push(mapping.start());
        self.stops.push(mapping.stop());

        if mapping.start() == mapping.stop() {
            self.points.push(mapping.start());
        }
    }

    /// Sorts the ends.
    fn sort(&mut self) {
        self.starts.sort_unstable();
        self.stops.sort_unstable();
        self.points.sort_unstable();
    }

    /// Counts the mappings with `stop > from` and `start < to`.
    ///
    /// Windows must be visited in ascending order of `from`.
    fn overlapping(&mut self, from: Number, to: Number) -> u64 {
        while self.cursor < self.stops.len() && self.stops[self.cursor] <= from {
            self.cursor += 1;
        }

        let before = self.starts.partition_point(|start| *start < to);

        // A single-base mapping at `from == to` is in both of the above.
        let both = if from == to {
            let lower = self.points.partition_point(|point| *point < from);
            let upper = self.points.partition_point(|point| *point <= from);
            upper - lower
        } else {
            0
        };

        (before + both - self.cursor) as u64
    }
}

/// Counts, for each feature, the mappings on the same strand that overlap the
/// feature's window.
///
/// The window of a feature is `[start - start_offset, stop + stop_offset]`,
/// and a mapping overlaps it when `mapping.stop > window.start` and
/// `mapping.start < window.stop`.
///
/// The starts and stops of each strand are sorted once. A mapping overlaps a
/// window exactly when it starts before the window stops and does not stop
/// at or before the window starts, so each feature costs two lookups no
/// matter how long or nested the mappings are. Features are visited in order
/// of their window start, which lets the stop cursor only ever move forward.
pub(crate) fn count(
    features: &[Feature],
    mappings: &[Mapping],
    start_offset: Number,
    stop_offset: Number,
) -> FeatureCounts {
    let mut forward = Ends::default();
    let mut reverse = Ends::default();

    for mapping in mappings {
        match mapping.strand() {
            Strand::Forward => forward.push(mapping),
            Strand::Reverse => reverse.push(mapping),
        }
    }

    forward.sort();
    reverse.sort();

    let mut ordered = features.iter().collect::<Vec<_>>();
    ordered.sort_by_key(|feature| (feature.start(), feature.id()));

    let mut counts = BTreeMap::new();

    for feature in ordered {
        let window_start = feature.start().saturating_sub(start_offset);
        let window_stop = feature.stop().saturating_add(stop_offset);

        let ends = match feature.strand() {
            Strand::Forward => &mut forward,
            Strand::Reverse => &mut reverse,
        };

        counts.insert(feature.id(), ends.overlapping(window_start, window_stop));
    }

    FeatureCounts(counts)
}

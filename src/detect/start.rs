//! Detected transcription start sites.

use omics::coordinate::position::Number;

use crate::core::FeatureId;
use crate::core::Strand;

/// The number of upstream positions whose read starts are recorded for each
/// transcription start.
pub const CONTEXT_LENGTH: usize = 10;

/// A feature near a transcription start together with its distance from it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Neighbor {
    /// The feature.
    pub feature: FeatureId,

    /// The distance, in strand sense, from the start site to the 5' end of
    /// the feature.
    pub offset: Number,
}

/// Where a transcription start lies relative to the annotated features.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Placement {
    /// The site lies before the 5' end of the nearest downstream feature.
    Upstream(Neighbor),

    /// The site lies within the interval of a feature.
    Within {
        /// The feature.
        feature: FeatureId,

        /// The distance to the 5' end of the feature.
        to_start: Number,

        /// The distance to the 3' end of the feature.
        to_stop: Number,

        /// The next feature beyond the 3' end of `feature`, if any is within
        /// reach.
        next: Option<Neighbor>,
    },

    /// No feature on the same strand is within reach.
    Orphan,
}

impl Placement {
    /// Gets the feature the site was attributed to.
    pub fn feature(&self) -> Option<FeatureId> {
        match self {
            Placement::Upstream(neighbor) => Some(neighbor.feature),
            Placement::Within { feature, .. } => Some(*feature),
            Placement::Orphan => None,
        }
    }

    /// Gets the distance between the site and the 5' end of the feature it
    /// was attributed to.
    pub fn offset(&self) -> Option<Number> {
        match self {
            Placement::Upstream(neighbor) => Some(neighbor.offset),
            Placement::Within { to_start, .. } => Some(*to_start),
            Placement::Orphan => None,
        }
    }
}

/// A transcription start site.
#[derive(Clone, Debug, PartialEq)]
pub struct TranscriptionStart {
    /// The 1-based position.
    pub(crate) position: Number,

    /// The strand.
    pub(crate) strand: Strand,

    /// The number of reads starting at the position.
    pub(crate) read_starts: u32,

    /// The read starts per million reads in the track.
    pub(crate) relative_count: f64,

    /// The read starts at the positions preceding the site, in strand sense,
    /// farthest first.
    pub(crate) upstream: [u32; CONTEXT_LENGTH],

    /// The flanking reference sequence, when a reference was supplied.
    pub(crate) sequence: Option<String>,

    /// The placement relative to the features.
    pub(crate) placement: Placement,
}

impl TranscriptionStart {
    /// Gets the 1-based position.
    pub fn position(&self) -> Number {
        self.position
    }

    /// Gets the strand.
    pub fn strand(&self) -> Strand {
        self.strand
    }

    /// Gets the number of reads starting at the position.
    pub fn read_starts(&self) -> u32 {
        self.read_starts
    }

    /// Gets the read starts per million reads in the track.
    pub fn relative_count(&self) -> f64 {
        self.relative_count
    }

    /// Gets the read starts at the positions preceding the site, in strand
    /// sense, farthest first.
    pub fn upstream(&self) -> &[u32; CONTEXT_LENGTH] {
        &self.upstream
    }

    /// Gets the flanking reference sequence.
    pub fn sequence(&self) -> Option<&str> {
        self.sequence.as_deref()
    }

    /// Gets the placement relative to the features.
    pub fn placement(&self) -> &Placement {
        &self.placement
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placement_accessors() {
        let upstream = Placement::Upstream(Neighbor {
            feature: FeatureId::from(3),
            offset: 12,
        });
        assert_eq!(upstream.feature(), Some(FeatureId::from(3)));
        assert_eq!(upstream.offset(), Some(12));

        let within = Placement::Within {
            feature: FeatureId::from(4),
            to_start: 0,
            to_stop: 99,
            next: None,
        };
        assert_eq!(within.feature(), Some(FeatureId::from(4)));
        assert_eq!(within.offset(), Some(0));

        assert_eq!(Placement::Orphan.feature(), None);
        assert_eq!(Placement::Orphan.offset(), None);
    }
}

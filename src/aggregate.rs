//! Turning a stream of mappings into per-feature counts and per-position
//! coverage.
//!
//! Mappings for a track are delivered in batches through
//! [`Aggregator::feed()`]. Coverage and read starts are accumulated as each
//! batch arrives, while the per-feature counts are computed by a single merge
//! scan once [`Aggregator::finish()`] is called, together with the reads
//! spanning each pair of neighbouring features. An [`Aggregation`] can only be
//! obtained by finishing the aggregator, which makes "all mappings have been
//! delivered" a precondition that the types enforce.

use omics::coordinate::position::Number;
use tracing::debug;

use crate::core::Feature;
use crate::core::Mapping;
use crate::diagnostics::Diagnostics;
use crate::operon::adjacency;
use crate::operon::Adjacency;

pub mod count;
pub mod profile;

pub use count::FeatureCounts;
pub use profile::CoverageProfile;

/// The tolerance applied around each feature when counting hits.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Offsets {
    /// Bases added before the start of each feature.
    pub start: Number,

    /// Bases added after the stop of each feature.
    pub stop: Number,
}

/// The finished aggregation for one track.
#[derive(Debug)]
pub struct Aggregation {
    /// The per-feature counts.
    counts: FeatureCounts,

    /// The per-position coverage and read starts.
    profile: CoverageProfile,

    /// The spanning reads between neighbouring features.
    adjacencies: Vec<Adjacency>,
}

impl Aggregation {
    /// Gets the per-feature counts.
    pub fn counts(&self) -> &FeatureCounts {
        &self.counts
    }

    /// Gets the coverage profile.
    pub fn profile(&self) -> &CoverageProfile {
        &self.profile
    }

    /// Gets the spanning reads between neighbouring features.
    pub fn adjacencies(&self) -> &[Adjacency] {
        &self.adjacencies
    }

    /// Consumes self and returns the counts, the profile and the adjacencies.
    pub fn into_parts(self) -> (FeatureCounts, CoverageProfile, Vec<Adjacency>) {
        (self.counts, self.profile, self.adjacencies)
    }
}

/// A streaming consumer of the mappings of one track.
#[derive(Debug)]
pub struct Aggregator<'a> {
    /// The features to count against.
    features: &'a [Feature],

    /// The length of the chromosome.
    genome_length: Number,

    /// The tolerance around each feature.
    offsets: Offsets,

    /// The coverage accumulated so far.
    profile: CoverageProfile,

    /// The accepted mappings, kept for the final count.
    mappings: Vec<Mapping>,
}

impl<'a> Aggregator<'a> {
    /// Creates an aggregator for a chromosome of `genome_length` bases.
    pub fn new(features: &'a [Feature], genome_length: Number, offsets: Offsets) -> Self {
        Self {
            features,
            genome_length,
            offsets,
            profile: CoverageProfile::new(genome_length),
            mappings: Vec::new(),
        }
    }

    /// Feeds a batch of mappings into the aggregator.
    ///
    /// Batches may arrive in any order and mappings within a batch need not be
    /// sorted. Mappings whose start is greater than their stop, or that do not
    /// fit within the chromosome, are reported in `diagnostics` and skipped.
    pub fn feed<I>(&mut self, batch: I, diagnostics: &mut Diagnostics)
    where
        I: IntoIterator<Item = Mapping>,
    {
        for mapping in batch {
            if mapping.start() > mapping.stop() {
                diagnostics.malformed_mapping(&mapping);
                continue;
            }

            if mapping.start() == 0 || mapping.stop() > self.genome_length {
                diagnostics.out_of_bounds_mapping(&mapping);
                continue;
            }

            self.profile.add(&mapping);
            self.mappings.push(mapping);
            diagnostics.accept();
        }
    }

    /// Finishes the aggregation, counting the hits for every feature and the
    /// spanning reads for every pair of neighbouring features.
    pub fn finish(self) -> Aggregation {
        let counts = count::count(
            self.features,
            &self.mappings,
            self.offsets.start,
            self.offsets.stop,
        );
        let adjacencies = adjacency::count(self.features, &self.mappings);

        debug!(
            features = counts.len(),
            mappings = self.mappings.len(),
            "finished aggregation"
        );

        Aggregation {
            counts,
            profile: self.profile,
            adjacencies,
        }
    }
}

/// Aggregates a complete set of mappings in one call.
///
/// # Examples
///
/// ```
/// use txstructure::aggregate;
/// use txstructure::aggregate::Offsets;
/// use txstructure::core::feature::Kind;
/// use txstructure::core::Feature;
/// use txstructure::core::FeatureId;
/// use txstructure::core::Mapping;
/// use txstructure::core::Strand;
/// use txstructure::Diagnostics;
///
/// let features = vec![Feature::new(1u64, 100, 200, Strand::Forward, Kind::Cds, "a")];
/// let mappings = vec![Mapping::new(150, 160, Strand::Forward); 10];
///
/// let mut diagnostics = Diagnostics::new("example");
/// let aggregation = aggregate::aggregate(
///     &features,
///     mappings,
///     1000,
///     Offsets::default(),
///     &mut diagnostics,
/// );
///
/// assert_eq!(aggregation.counts().get(FeatureId::from(1)), Some(10));
/// assert_eq!(aggregation.profile().starts(Strand::Forward)[149], 10);
/// ```
pub fn aggregate<I>(
    features: &[Feature],
    mappings: I,
    genome_length: Number,
    offsets: Offsets,
    diagnostics: &mut Diagnostics,
) -> Aggregation
where
    I: IntoIterator<Item = Mapping>,
{
    let mut aggregator = Aggregator::new(features, genome_length, offsets);
    aggregator.feed(mappings, diagnostics);
    aggregator.finish()
}

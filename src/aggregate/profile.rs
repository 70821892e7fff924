//! Per-position coverage and read starts for a single track.

use omics::coordinate::position::Number;

use crate::core::Mapping;
use crate::core::Strand;

/// Per-position counts for one strand.
#[derive(Clone, Debug, Eq, PartialEq)]
struct Track {
    /// The number of mappings overlapping each position.
    coverage: Vec<u32>,

    /// The number of mappings whose 5' end falls on each position.
    starts: Vec<u32>,
}

impl Track {
    /// Creates a zeroed track of `length` positions.
    fn new(length: usize) -> Self {
        Self {
            coverage: vec![0; length],
            starts: vec![0; length],
        }
    }
}

/// Directional coverage and read-start arrays for one track.
///
/// All four arrays are indexed by 0-based array index (position `p` lives at
/// index `p - 1`), have exactly one entry per genome position and are
/// zero-initialised on creation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CoverageProfile {
    /// Counts on the forward strand.
    forward: Track,

    /// Counts on the reverse strand.
    reverse: Track,
}

impl CoverageProfile {
    /// Creates an empty profile for a chromosome of `genome_length` bases.
    pub fn new(genome_length: Number) -> Self {
        let length = genome_length as usize;

        Self {
            forward: Track::new(length),
            reverse: Track::new(length),
        }
    }

    /// Gets the number of positions in the profile.
    pub fn len(&self) -> usize {
        self.forward.coverage.len()
    }

    /// Whether the profile covers no positions at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Gets the counts for `strand`.
    fn track(&self, strand: Strand) -> &Track {
        match strand {
            Strand::Forward => &self.forward,
            Strand::Reverse => &self.reverse,
        }
    }

    /// Gets the coverage array for `strand`.
    pub fn coverage(&self, strand: Strand) -> &[u32] {
        &self.track(strand).coverage
    }

    /// Gets the read-start array for `strand`.
    pub fn starts(&self, strand: Strand) -> &[u32] {
        &self.track(strand).starts
    }

    /// Gets the total number of read starts across both strands.
    pub fn total_starts(&self) -> u64 {
        self.forward
            .starts
            .iter()
            .chain(self.reverse.starts.iter())
            .map(|count| u64::from(*count))
            .sum()
    }

    /// Adds a mapping to the profile.
    ///
    /// The mapping must satisfy `1 <= start <= stop <= genome length`; the
    /// [`Aggregator`](crate::aggregate::Aggregator) checks this before calling.
    ///
    /// # Examples
    ///
    /// ```
    /// use txstructure::aggregate::CoverageProfile;
    /// use txstructure::core::Mapping;
    /// use txstructure::core::Strand;
    ///
    /// let mut profile = CoverageProfile::new(10);
    /// profile.add(&Mapping::new(3, 5, Strand::Reverse));
    ///
    /// assert_eq!(profile.coverage(Strand::Reverse), &[0, 0, 1, 1, 1, 0, 0, 0, 0, 0]);
    /// assert_eq!(profile.starts(Strand::Reverse), &[0, 0, 0, 0, 1, 0, 0, 0, 0, 0]);
    /// assert_eq!(profile.total_starts(), 1);
    /// ```
    pub fn add(&mut self, mapping: &Mapping) {
        let track = match mapping.strand() {
            Strand::Forward => &mut self.forward,
            Strand::Reverse => &mut self.reverse,
        };

        let from = (mapping.start() - 1) as usize;
        let to = mapping.stop() as usize;

        for depth in &mut track.coverage[from..to] {
            *depth += 1;
        }

        track.starts[(mapping.five_prime() - 1) as usize] += 1;
    }
}

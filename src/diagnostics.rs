//! Diagnostics gathered while analysing a single track.
//!
//! A [`Diagnostics`] value is created for each track and handed to every step
//! of that track's analysis. Nothing is shared between tracks, so concurrent
//! analyses never contend on it.

use tracing::warn;

use crate::core::Mapping;

/// Counters describing what happened during the analysis of one track.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Diagnostics {
    /// The name of the track.
    track: String,

    /// Mappings that were accepted into the coverage profile.
    accepted: u64,

    /// Mappings whose start is greater than their stop.
    malformed: u64,

    /// Mappings that do not fit within the chromosome.
    out_of_bounds: u64,

    /// Positions whose signal exceeded the background cutoff.
    candidates: u64,

    /// Candidate positions suppressed by the exclusion mask.
    masked: u64,

    /// Transcription starts that were emitted.
    starts: u64,

    /// Operons that were assembled.
    operons: u64,
}

impl Diagnostics {
    /// Creates an empty set of diagnostics for the track named `track`.
    pub fn new(track: impl Into<String>) -> Self {
        Self {
            track: track.into(),
            ..Default::default()
        }
    }

    /// Gets the name of the track.
    pub fn track(&self) -> &str {
        &self.track
    }

    /// Gets the number of accepted mappings.
    pub fn accepted(&self) -> u64 {
        self.accepted
    }

    /// Gets the number of mappings skipped because their start is greater
    /// than their stop.
    pub fn malformed(&self) -> u64 {
        self.malformed
    }

    /// Gets the number of mappings skipped because they do not fit within the
    /// chromosome.
    pub fn out_of_bounds(&self) -> u64 {
        self.out_of_bounds
    }

    /// Gets the number of skipped mappings, regardless of the reason.
    pub fn skipped(&self) -> u64 {
        self.malformed + self.out_of_bounds
    }

    /// Gets the number of candidate positions.
    pub fn candidates(&self) -> u64 {
        self.candidates
    }

    /// Gets the number of candidate positions suppressed by the mask.
    pub fn masked(&self) -> u64 {
        self.masked
    }

    /// Gets the number of emitted transcription starts.
    pub fn starts(&self) -> u64 {
        self.starts
    }

    /// Gets the number of assembled operons.
    pub fn operons(&self) -> u64 {
        self.operons
    }

    pub(crate) fn accept(&mut self) {
        self.accepted += 1;
    }

    pub(crate) fn malformed_mapping(&mut self, mapping: &Mapping) {
        self.malformed += 1;
        warn!(
            track = %self.track,
            start = mapping.start(),
            stop = mapping.stop(),
            "skipping mapping whose start is greater than its stop"
        );
    }

    pub(crate) fn out_of_bounds_mapping(&mut self, mapping: &Mapping) {
        self.out_of_bounds += 1;
        warn!(
            track = %self.track,
            start = mapping.start(),
            stop = mapping.stop(),
            "skipping mapping outside of the chromosome"
        );
    }

    pub(crate) fn candidate(&mut self) {
        self.candidates += 1;
    }

    pub(crate) fn masked_candidate(&mut self) {
        self.masked += 1;
    }

    pub(crate) fn start(&mut self) {
        self.starts += 1;
    }

    pub(crate) fn operons_assembled(&mut self, count: usize) {
        self.operons += count as u64;
    }
}

impl std::fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "track `{}`: {} mappings accepted, {} skipped, {} candidates ({} masked), {} starts, \
             {} operons",
            self.track,
            self.accepted,
            self.skipped(),
            self.candidates,
            self.masked,
            self.starts,
            self.operons
        )
    }
}

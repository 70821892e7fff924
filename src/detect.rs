//! Scanning read starts for transcription start sites.
//!
//! A position is a transcription start on a strand when the number of reads
//! starting there exceeds the background cutoff and jumps, relative to the
//! position immediately upstream of it (in strand sense), by at least the
//! ratio threshold:
//!
//! ```text
//! forward:  (starts[i] + 1) / (starts[i - 1] + 1) >= threshold
//! reverse:  (starts[i] + 1) / (starts[i + 1] + 1) >= threshold
//! ```
//!
//! The first and last positions of the chromosome lack a neighbour on one
//! side and are never reported. Positions flagged by the exclusion mask never
//! seed a start on either strand.

use omics::coordinate::position::Number;
use tracing::debug;

use crate::aggregate::CoverageProfile;
use crate::core::Strand;
use crate::diagnostics::Diagnostics;
use crate::index::Entry;
use crate::index::FeatureIndex;

mod sequence;
pub mod start;

pub use start::Neighbor;
pub use start::Placement;
pub use start::TranscriptionStart;
use start::CONTEXT_LENGTH;

/// The number of reads per million used for the relative count.
const PER_MILLION: f64 = 1_000_000.0;

/// An error related to detecting transcription starts.
#[derive(Debug, Eq, PartialEq)]
pub enum Error {
    /// The profile does not cover the indexed chromosome.
    ProfileLengthMismatch(usize, Number),

    /// The reference sequence does not cover the indexed chromosome.
    ReferenceLengthMismatch(usize, Number),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::ProfileLengthMismatch(found, expected) => write!(
                f,
                "coverage profile spans {} positions, but the genome has {}",
                found, expected
            ),
            Error::ReferenceLengthMismatch(found, expected) => write!(
                f,
                "reference sequence spans {} positions, but the genome has {}",
                found, expected
            ),
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

/// The parameters of a detection pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Parameters {
    /// The minimum jump in read starts relative to the upstream neighbour.
    pub ratio_threshold: f64,

    /// The number of read starts a position must exceed to be considered.
    pub background_cutoff: u64,

    /// The bases of reference sequence reported before each site.
    ///
    /// No sequence is reported when both windows are zero.
    pub upstream_window: Number,

    /// The bases of reference sequence reported after each site.
    pub downstream_window: Number,

    /// How far downstream of a site to look for a feature to attribute it to.
    pub max_feature_distance: Number,
}

/// Detects the transcription starts of one track.
///
/// The result is a pure function of the inputs. Sites are reported in
/// position order and, at the same position, forward before reverse.
///
/// # Examples
///
/// ```
/// use txstructure::aggregate;
/// use txstructure::core::Mapping;
/// use txstructure::core::Strand;
/// use txstructure::detect;
/// use txstructure::detect::Parameters;
/// use txstructure::Diagnostics;
///
/// let index = txstructure::index::Builder::default().try_build(&[], 1000)?;
///
/// let mut diagnostics = Diagnostics::new("example");
/// let mappings = vec![Mapping::new(501, 530, Strand::Forward); 50];
/// let aggregation = aggregate::aggregate(&[], mappings, 1000, Default::default(), &mut diagnostics);
///
/// let parameters = Parameters {
///     ratio_threshold: 5.0,
///     background_cutoff: 10,
///     upstream_window: 0,
///     downstream_window: 0,
///     max_feature_distance: 700,
/// };
///
/// let starts = detect::detect(&index, aggregation.profile(), &parameters, None, &mut diagnostics)?;
///
/// assert_eq!(starts.len(), 1);
/// assert_eq!(starts[0].position(), 501);
/// assert_eq!(starts[0].strand(), Strand::Forward);
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn detect(
    index: &FeatureIndex,
    profile: &CoverageProfile,
    parameters: &Parameters,
    reference: Option<&[u8]>,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<TranscriptionStart>> {
    let genome_length = index.genome_length();

    if profile.len() as Number != genome_length {
        return Err(Error::ProfileLengthMismatch(profile.len(), genome_length));
    }

    if let Some(reference) = reference {
        if reference.len() as Number != genome_length {
            return Err(Error::ReferenceLengthMismatch(reference.len(), genome_length));
        }
    }

    let forward = profile.starts(Strand::Forward);
    let reverse = profile.starts(Strand::Reverse);
    let total = profile.total_starts();
    let cutoff = parameters.background_cutoff;

    let mut results = Vec::new();

    for i in 1..profile.len().saturating_sub(1) {
        let f = u64::from(forward[i]);
        let r = u64::from(reverse[i]);

        if f <= cutoff && r <= cutoff {
            continue;
        }

        diagnostics.candidate();

        if index.mask().get(i) {
            diagnostics.masked_candidate();
            continue;
        }

        if f > cutoff && ratio(forward[i], forward[i - 1]) >= parameters.ratio_threshold {
            results.push(build(
                index,
                forward,
                i,
                Strand::Forward,
                total,
                parameters,
                reference,
            ));
            diagnostics.start();
        }

        if r > cutoff && ratio(reverse[i], reverse[i + 1]) >= parameters.ratio_threshold {
            results.push(build(
                index,
                reverse,
                i,
                Strand::Reverse,
                total,
                parameters,
                reference,
            ));
            diagnostics.start();
        }
    }

    debug!(
        candidates = diagnostics.candidates(),
        starts = results.len(),
        "finished detection"
    );

    Ok(results)
}

/// The pseudo-counted ratio between a position and its upstream neighbour.
fn ratio(count: u32, neighbour: u32) -> f64 {
    (f64::from(count) + 1.0) / (f64::from(neighbour) + 1.0)
}

/// Builds the record for a start at the 0-based array index `i`.
fn build(
    index: &FeatureIndex,
    starts: &[u32],
    i: usize,
    strand: Strand,
    total: u64,
    parameters: &Parameters,
    reference: Option<&[u8]>,
) -> TranscriptionStart {
    let position = i as Number + 1;
    let read_starts = starts[i];

    let mut upstream = [0; CONTEXT_LENGTH];
    for (k, slot) in upstream.iter_mut().enumerate() {
        let distance = CONTEXT_LENGTH - k;
        let neighbour = match strand {
            Strand::Forward => i.checked_sub(distance),
            Strand::Reverse => Some(i + distance),
        };

        if let Some(count) = neighbour.and_then(|j| starts.get(j)) {
            *slot = *count;
        }
    }

    let relative_count = match total {
        0 => 0.0,
        total => f64::from(read_starts) * PER_MILLION / total as f64,
    };

    // Both windows at zero turn the sequence off.
    let wants_sequence = parameters.upstream_window > 0 || parameters.downstream_window > 0;
    let sequence = reference.filter(|_| wants_sequence).map(|reference| {
        sequence::flank(
            reference,
            position,
            strand,
            parameters.upstream_window,
            parameters.downstream_window,
        )
    });

    TranscriptionStart {
        position,
        strand,
        read_starts,
        relative_count,
        upstream,
        sequence,
        placement: place(index, strand, position, parameters.max_feature_distance),
    }
}

/// The distance in strand sense from `position` to the 5' end of `entry`, if
/// that end lies at or downstream of `position`.
fn downstream_offset(entry: &Entry, position: Number) -> Option<Number> {
    match entry.strand() {
        Strand::Forward => entry.five_prime().checked_sub(position),
        Strand::Reverse => position.checked_sub(entry.five_prime()),
    }
}

/// Finds the features within reach of `position` on `strand`.
fn reachable(index: &FeatureIndex, strand: Strand, from: Number, distance: Number) -> Vec<Entry> {
    match strand {
        Strand::Forward => index.entries(strand, from, from.saturating_add(distance)),
        Strand::Reverse => index.entries(strand, from.saturating_sub(distance), from),
    }
}

/// Attributes a site to the nearest feature on its strand.
fn place(index: &FeatureIndex, strand: Strand, position: Number, distance: Number) -> Placement {
    let entries = reachable(index, strand, position, distance);

    let within = entries
        .iter()
        .filter(|entry| entry.contains(position))
        .min_by_key(|entry| (entry.five_prime().abs_diff(position), entry.id()));

    if let Some(entry) = within {
        let to_start = entry.five_prime().abs_diff(position);
        let to_stop = entry.three_prime().abs_diff(position);

        let beyond = match strand {
            Strand::Forward => entry.stop() + 1,
            Strand::Reverse => entry.start().saturating_sub(1),
        };

        let next = reachable(index, strand, beyond, distance)
            .into_iter()
            .filter(|next| match strand {
                Strand::Forward => next.five_prime() > entry.three_prime(),
                Strand::Reverse => next.five_prime() < entry.three_prime(),
            })
            .filter_map(|next| downstream_offset(&next, position).map(|offset| (next, offset)))
            .min_by_key(|(next, offset)| (*offset, next.id()))
            .map(|(next, offset)| Neighbor {
                feature: next.id(),
                offset,
            });

        return Placement::Within {
            feature: entry.id(),
            to_start,
            to_stop,
            next,
        };
    }

    entries
        .iter()
        .filter_map(|entry| downstream_offset(entry, position).map(|offset| (entry, offset)))
        .filter(|(_, offset)| *offset <= distance)
        .min_by_key(|(entry, offset)| (*offset, entry.id()))
        .map(|(entry, offset)| {
            Placement::Upstream(Neighbor {
                feature: entry.id(),
                offset,
            })
        })
        .unwrap_or(Placement::Orphan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::CoverageProfile;
    use crate::core::feature::Kind;
    use crate::core::Feature;
    use crate::core::FeatureId;
    use crate::core::Mapping;
    use crate::index;

    fn parameters() -> Parameters {
        Parameters {
            ratio_threshold: 5.0,
            background_cutoff: 10,
            upstream_window: 0,
            downstream_window: 0,
            max_feature_distance: 700,
        }
    }

    fn pile(profile: &mut CoverageProfile, start: Number, stop: Number, strand: Strand, n: usize) {
        for _ in 0..n {
            profile.add(&Mapping::new(start, stop, strand));
        }
    }

    fn cds(id: u64, start: Number, stop: Number, strand: Strand) -> Feature {
        Feature::new(id, start, stop, strand, Kind::Cds, format!("g{id}"))
    }

    #[test]
    fn test_single_forward_peak() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let index = index::Builder::default().try_build(&[], 1000)?;
        let mut profile = CoverageProfile::new(1000);
        pile(&mut profile, 501, 520, Strand::Forward, 50);

        let mut diagnostics = Diagnostics::new("peak");
        let starts = detect(&index, &profile, &parameters(), None, &mut diagnostics)?;

        assert_eq!(starts.len(), 1);
        let start = &starts[0];
        assert_eq!(start.position(), 501);
        assert_eq!(start.strand(), Strand::Forward);
        assert_eq!(start.read_starts(), 50);
        assert_eq!(start.relative_count(), 1_000_000.0);
        assert_eq!(start.upstream(), &[0; CONTEXT_LENGTH]);
        assert_eq!(start.sequence(), None);
        assert_eq!(start.placement(), &Placement::Orphan);
        assert_eq!(diagnostics.candidates(), 1);
        assert_eq!(diagnostics.starts(), 1);

        Ok(())
    }

    #[test]
    fn test_reverse_ratio_uses_the_right_neighbour() -> std::result::Result<(), Box<dyn std::error::Error>>
    {
        let index = index::Builder::default().try_build(&[], 100)?;
        let mut profile = CoverageProfile::new(100);

        // 5' ends of reverse reads are their stop positions.
        pile(&mut profile, 30, 50, Strand::Reverse, 40);
        pile(&mut profile, 30, 51, Strand::Reverse, 2);
        pile(&mut profile, 10, 40, Strand::Reverse, 20);
        pile(&mut profile, 10, 41, Strand::Reverse, 10);

        let mut diagnostics = Diagnostics::new("reverse");
        let starts = detect(&index, &profile, &parameters(), None, &mut diagnostics)?;

        // Position 50: 41 / 3 >= 5. Position 40: 21 / 11 < 5, even though
        // nothing starts at position 39.
        assert_eq!(starts.len(), 1);
        assert_eq!(starts[0].position(), 50);
        assert_eq!(starts[0].strand(), Strand::Reverse);

        let mut expected = [0; CONTEXT_LENGTH];
        expected[CONTEXT_LENGTH - 1] = 2;
        assert_eq!(starts[0].upstream(), &expected);

        Ok(())
    }

    #[test]
    fn test_chromosome_edges_are_never_reported() -> std::result::Result<(), Box<dyn std::error::Error>>
    {
        let index = index::Builder::default().try_build(&[], 10)?;
        let mut profile = CoverageProfile::new(10);
        pile(&mut profile, 1, 5, Strand::Forward, 1000);
        pile(&mut profile, 6, 10, Strand::Reverse, 1000);
        pile(&mut profile, 1, 10, Strand::Reverse, 1000);
        pile(&mut profile, 1, 10, Strand::Forward, 1000);

        let mut diagnostics = Diagnostics::new("edges");
        let starts = detect(&index, &profile, &parameters(), None, &mut diagnostics)?;

        assert!(starts.is_empty());
        assert_eq!(diagnostics.candidates(), 0);

        Ok(())
    }

    #[test]
    fn test_tiny_genomes() -> std::result::Result<(), Box<dyn std::error::Error>> {
        for length in 0..3 {
            let index = index::Builder::default().try_build(&[], length)?;
            let profile = CoverageProfile::new(length);
            let mut diagnostics = Diagnostics::new("tiny");
            assert!(detect(&index, &profile, &parameters(), None, &mut diagnostics)?.is_empty());
        }

        Ok(())
    }

    #[test]
    fn test_masked_positions_do_not_seed() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let features = vec![Feature::new(1u64, 300, 380, Strand::Forward, Kind::Trna, "t")];
        let index = index::Builder::default().try_build(&features, 1000)?;

        let mut profile = CoverageProfile::new(1000);
        pile(&mut profile, 290, 320, Strand::Forward, 50);
        pile(&mut profile, 600, 620, Strand::Forward, 50);

        let mut diagnostics = Diagnostics::new("masked");
        let starts = detect(&index, &profile, &parameters(), None, &mut diagnostics)?;

        assert_eq!(starts.len(), 1);
        assert_eq!(starts[0].position(), 600);
        assert_eq!(diagnostics.masked(), 1);

        Ok(())
    }

    #[test]
    fn test_weak_strand_is_not_reported() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let index = index::Builder::default().try_build(&[], 100)?;
        let mut profile = CoverageProfile::new(100);
        pile(&mut profile, 50, 60, Strand::Forward, 50);
        pile(&mut profile, 40, 50, Strand::Reverse, 8);

        let mut diagnostics = Diagnostics::new("weak");
        let starts = detect(&index, &profile, &parameters(), None, &mut diagnostics)?;

        assert_eq!(starts.len(), 1);
        assert_eq!(starts[0].strand(), Strand::Forward);

        Ok(())
    }

    #[test]
    fn test_placement_upstream_and_within() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let features = vec![
            cds(1, 200, 400, Strand::Forward),
            cds(2, 450, 600, Strand::Forward),
            cds(3, 100, 180, Strand::Reverse),
        ];
        let index = index::Builder::default().try_build(&features, 2000)?;

        assert_eq!(
            place(&index, Strand::Forward, 150, 700),
            Placement::Upstream(Neighbor {
                feature: FeatureId::from(1),
                offset: 50,
            })
        );

        assert_eq!(
            place(&index, Strand::Forward, 300, 700),
            Placement::Within {
                feature: FeatureId::from(1),
                to_start: 100,
                to_stop: 100,
                next: Some(Neighbor {
                    feature: FeatureId::from(2),
                    offset: 150,
                }),
            }
        );

        assert_eq!(
            place(&index, Strand::Forward, 500, 700),
            Placement::Within {
                feature: FeatureId::from(2),
                to_start: 50,
                to_stop: 100,
                next: None,
            }
        );

        assert_eq!(
            place(&index, Strand::Reverse, 250, 700),
            Placement::Upstream(Neighbor {
                feature: FeatureId::from(3),
                offset: 70,
            })
        );

        assert_eq!(place(&index, Strand::Forward, 150, 10), Placement::Orphan);
        assert_eq!(place(&index, Strand::Reverse, 50, 700), Placement::Orphan);

        Ok(())
    }

    #[test]
    fn test_sequence_is_attached() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let index = index::Builder::default().try_build(&[], 12)?;
        let mut profile = CoverageProfile::new(12);
        pile(&mut profile, 6, 8, Strand::Forward, 20);

        let reference = b"AAAACCGGTTTT";
        let parameters = Parameters {
            upstream_window: 2,
            downstream_window: 1,
            ..parameters()
        };

        let mut diagnostics = Diagnostics::new("sequence");
        let starts = detect(
            &index,
            &profile,
            &parameters,
            Some(&reference[..]),
            &mut diagnostics,
        )?;

        assert_eq!(starts.len(), 1);
        assert_eq!(starts[0].sequence(), Some("ACCG"));

        let err = detect(
            &index,
            &profile,
            &parameters,
            Some(&reference[..4]),
            &mut diagnostics,
        )
        .unwrap_err();
        assert_eq!(err, Error::ReferenceLengthMismatch(4, 12));

        Ok(())
    }

    #[test]
    fn test_zero_windows_report_no_sequence() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let index = index::Builder::default().try_build(&[], 12)?;
        let mut profile = CoverageProfile::new(12);
        pile(&mut profile, 6, 8, Strand::Forward, 20);

        let reference = b"AAAACCGGTTTT";
        let mut diagnostics = Diagnostics::new("sequence");
        let starts = detect(
            &index,
            &profile,
            &parameters(),
            Some(&reference[..]),
            &mut diagnostics,
        )?;

        assert_eq!(starts.len(), 1);
        assert_eq!(starts[0].position(), 6);
        assert_eq!(starts[0].sequence(), None);

        let parameters = Parameters {
            downstream_window: 1,
            ..parameters()
        };
        let starts = detect(
            &index,
            &profile,
            &parameters,
            Some(&reference[..]),
            &mut diagnostics,
        )?;
        assert_eq!(starts[0].sequence(), Some("CG"));

        Ok(())
    }

    #[test]
    fn test_ratio_threshold_is_inclusive() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let index = index::Builder::default().try_build(&[], 100)?;
        let mut profile = CoverageProfile::new(100);

        // Position 50: (24 + 1) / (4 + 1) == 5.
        pile(&mut profile, 49, 60, Strand::Forward, 4);
        pile(&mut profile, 50, 60, Strand::Forward, 24);
        // Position 70: (23 + 1) / (4 + 1) < 5.
        pile(&mut profile, 69, 80, Strand::Forward, 4);
        pile(&mut profile, 70, 80, Strand::Forward, 23);

        let mut diagnostics = Diagnostics::new("ratio");
        let starts = detect(&index, &profile, &parameters(), None, &mut diagnostics)?;

        assert_eq!(starts.len(), 1);
        assert_eq!(starts[0].position(), 50);
        assert_eq!(diagnostics.candidates(), 2);

        Ok(())
    }

    #[test]
    fn test_background_cutoff_is_exclusive() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let index = index::Builder::default().try_build(&[], 100)?;
        let mut profile = CoverageProfile::new(100);
        pile(&mut profile, 30, 40, Strand::Forward, 10);
        pile(&mut profile, 60, 70, Strand::Forward, 11);

        let mut diagnostics = Diagnostics::new("cutoff");
        let starts = detect(&index, &profile, &parameters(), None, &mut diagnostics)?;

        assert_eq!(starts.len(), 1);
        assert_eq!(starts[0].position(), 60);
        assert_eq!(diagnostics.candidates(), 1);

        Ok(())
    }
}

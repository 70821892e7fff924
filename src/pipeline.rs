//! Driving the analysis of a single track.
//!
//! A [`Pipeline`] bundles everything that is shared between tracks: the
//! features, the [`FeatureIndex`] built from them, the [`Config`] and the
//! optional reference sequence. None of these are mutated during an analysis,
//! so one pipeline can serve any number of tracks at once, including from
//! several threads.
//!
//! Each track is analysed through its own [`Track`], which owns the coverage
//! and the [`Diagnostics`] for that track alone. Mappings are pushed into the
//! track as they are retrieved with [`Track::feed()`], and the analysis is
//! closed with either [`Track::complete()`] or [`Track::fail()`]. Detection
//! only ever runs as part of [`Track::complete()`].

use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::info_span;
use tracing::Span;

use crate::aggregate::Aggregator;
use crate::aggregate::FeatureCounts;
use crate::config::Config;
use crate::core::Feature;
use crate::core::FeatureId;
use crate::core::Mapping;
use crate::detect;
use crate::detect::TranscriptionStart;
use crate::index::FeatureIndex;
use crate::operon;
use crate::operon::Operon;

pub use crate::diagnostics::Diagnostics;

////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////

/// An error that aborts the analysis of a track.
#[derive(Debug, PartialEq)]
pub enum Error {
    /// The mappings of the track could not be retrieved.
    Retrieval(String),

    /// A feature in the index received no count, meaning the features and the
    /// index were built from different annotations.
    MissingFeatureCount(FeatureId),

    /// A detection error.
    Detect(detect::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Retrieval(reason) => write!(f, "retrieval error: {}", reason),
            Error::MissingFeatureCount(id) => {
                write!(f, "feature {} is indexed but was never counted", id)
            }
            Error::Detect(err) => write!(f, "detect error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Detect(err) => Some(err),
            _ => None,
        }
    }
}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

////////////////////////////////////////////////////////////////////////////////////////
// Results
////////////////////////////////////////////////////////////////////////////////////////

/// The results of a completed track.
#[derive(Debug)]
pub struct Outcome {
    /// The per-feature counts.
    counts: FeatureCounts,

    /// The detected transcription starts.
    starts: Vec<TranscriptionStart>,

    /// The assembled operons.
    operons: Vec<Operon>,

    /// The diagnostics of the track.
    diagnostics: Diagnostics,
}

impl Outcome {
    /// Gets the per-feature counts.
    pub fn counts(&self) -> &FeatureCounts {
        &self.counts
    }

    /// Gets the detected transcription starts.
    pub fn starts(&self) -> &[TranscriptionStart] {
        &self.starts
    }

    /// Gets the assembled operons.
    pub fn operons(&self) -> &[Operon] {
        &self.operons
    }

    /// Gets the diagnostics of the track.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }
}

/// The final status of a track.
#[derive(Debug)]
pub enum Status {
    /// The track was analysed.
    Complete(Outcome),

    /// The track produced no results.
    Failed {
        /// The name of the track.
        track: String,

        /// The reason the track failed.
        error: Error,
    },
}

impl Status {
    /// Whether the track was analysed.
    pub fn is_complete(&self) -> bool {
        matches!(self, Status::Complete(_))
    }

    /// Converts the status into a [`Result`](std::result::Result).
    pub fn into_result(self) -> Result<Outcome> {
        match self {
            Status::Complete(outcome) => Ok(outcome),
            Status::Failed { error, .. } => Err(error),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Pipeline
////////////////////////////////////////////////////////////////////////////////////////

/// The inputs shared by every track of an analysis.
#[derive(Clone, Copy, Debug)]
pub struct Pipeline<'a> {
    /// The features to count against.
    features: &'a [Feature],

    /// The index built from the features.
    index: &'a FeatureIndex,

    /// The analysis parameters.
    config: &'a Config,

    /// The reference sequence, if one is available.
    reference: Option<&'a [u8]>,
}

impl<'a> Pipeline<'a> {
    /// Creates a new pipeline.
    pub fn new(features: &'a [Feature], index: &'a FeatureIndex, config: &'a Config) -> Self {
        Self {
            features,
            index,
            config,
            reference: None,
        }
    }

    /// Attaches a reference sequence used to report the bases around each
    /// transcription start.
    pub fn with_reference(mut self, reference: &'a [u8]) -> Self {
        self.reference = Some(reference);
        self
    }

    /// Opens a new track named `name`.
    ///
    /// # Examples
    ///
    /// ```
    /// use txstructure::config::Config;
    /// use txstructure::core::feature::Kind;
    /// use txstructure::core::Feature;
    /// use txstructure::core::FeatureId;
    /// use txstructure::core::Mapping;
    /// use txstructure::core::Strand;
    /// use txstructure::index;
    /// use txstructure::pipeline::Pipeline;
    ///
    /// let features = vec![Feature::new(1u64, 100, 200, Strand::Forward, Kind::Cds, "a")];
    /// let index = index::Builder::default().try_build(&features, 1000)?;
    /// let config = Config::default();
    /// let pipeline = Pipeline::new(&features, &index, &config);
    ///
    /// let mut track = pipeline.track("wild-type");
    /// track.feed(vec![Mapping::new(150, 160, Strand::Forward); 10]);
    ///
    /// let outcome = track.complete().into_result()?;
    /// assert_eq!(outcome.counts().get(FeatureId::from(1)), Some(10));
    /// assert_eq!(outcome.diagnostics().accepted(), 10);
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn track(&self, name: impl Into<String>) -> Track<'a> {
        let name = name.into();
        let span = info_span!("track", name = %name);

        Track {
            pipeline: *self,
            aggregator: Aggregator::new(
                self.features,
                self.index.genome_length(),
                self.config.offsets(),
            ),
            diagnostics: Diagnostics::new(name),
            span,
        }
    }

    /// Runs everything that follows the delivery of the last mapping.
    fn finish(
        &self,
        aggregator: Aggregator<'a>,
        diagnostics: &mut Diagnostics,
    ) -> Result<(FeatureCounts, Vec<TranscriptionStart>, Vec<Operon>)> {
        let (counts, profile, adjacencies) = aggregator.finish().into_parts();

        if let Some(id) = self.index.ids().filter(|id| !counts.contains(*id)).min() {
            return Err(Error::MissingFeatureCount(id));
        }

        let parameters = self.config.detection(profile.total_starts());
        debug!(
            cutoff = parameters.background_cutoff,
            total_starts = profile.total_starts(),
            "scaled background cutoff"
        );

        let starts = detect::detect(
            self.index,
            &profile,
            &parameters,
            self.reference,
            diagnostics,
        )
        .map_err(Error::Detect)?;

        let operons = operon::assemble(&adjacencies, self.config.spanning_read_threshold());
        diagnostics.operons_assembled(operons.len());

        Ok((counts, starts, operons))
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Tracks
////////////////////////////////////////////////////////////////////////////////////////

/// The analysis of a single track.
///
/// Generally, you will want to use [`Pipeline::track()`] to construct one of
/// these.
#[derive(Debug)]
pub struct Track<'a> {
    /// The shared inputs.
    pipeline: Pipeline<'a>,

    /// The aggregator receiving the mappings.
    aggregator: Aggregator<'a>,

    /// The diagnostics of this track.
    diagnostics: Diagnostics,

    /// The span every event of this track is recorded in.
    span: Span,
}

impl<'a> Track<'a> {
    /// Gets the diagnostics gathered so far.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Feeds a batch of mappings into the track.
    pub fn feed<I>(&mut self, batch: I)
    where
        I: IntoIterator<Item = Mapping>,
    {
        let _entered = self.span.enter();
        self.aggregator.feed(batch, &mut self.diagnostics);
    }

    /// Signals that every mapping has been delivered and analyses the track.
    pub fn complete(self) -> Status {
        let Track {
            pipeline,
            aggregator,
            mut diagnostics,
            span,
        } = self;
        let _entered = span.enter();

        match pipeline.finish(aggregator, &mut diagnostics) {
            Ok((counts, starts, operons)) => {
                info!("{}", diagnostics);

                Status::Complete(Outcome {
                    counts,
                    starts,
                    operons,
                    diagnostics,
                })
            }
            Err(err) => {
                error!("{}", err);

                Status::Failed {
                    track: diagnostics.track().to_string(),
                    error: err,
                }
            }
        }
    }

    /// Signals that the mappings of this track could not be retrieved.
    ///
    /// Everything accumulated so far is dropped and no results are produced.
    pub fn fail(self, reason: impl Into<String>) -> Status {
        let _entered = self.span.enter();
        let error = Error::Retrieval(reason.into());
        error!("{}", error);

        Status::Failed {
            track: self.diagnostics.track().to_string(),
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::feature::Kind;
    use crate::core::Strand;
    use crate::detect::Neighbor;
    use crate::detect::Placement;
    use crate::index;

    fn features() -> Vec<Feature> {
        vec![
            Feature::new(1u64, 100, 400, Strand::Forward, Kind::Cds, "a"),
            Feature::new(2u64, 450, 800, Strand::Forward, Kind::Cds, "b"),
            Feature::new(3u64, 1200, 1500, Strand::Reverse, Kind::Cds, "c"),
        ]
    }

    #[test]
    fn test_end_to_end() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let features = features();
        let index = index::Builder::default().try_build(&features, 2000)?;
        let config = Config::default();
        let pipeline = Pipeline::new(&features, &index, &config);

        let mut track = pipeline.track("wild-type");
        track.feed(vec![Mapping::new(90, 480, Strand::Forward); 50]);
        track.feed(vec![Mapping::new(1300, 1350, Strand::Reverse); 10]);
        track.feed(vec![Mapping::new(480, 90, Strand::Forward)]);
        assert_eq!(track.diagnostics().accepted(), 60);

        let outcome = track.complete().into_result()?;

        let counts = outcome.counts();
        assert_eq!(counts.get(FeatureId::from(1)), Some(50));
        assert_eq!(counts.get(FeatureId::from(2)), Some(50));
        assert_eq!(counts.get(FeatureId::from(3)), Some(10));

        let starts = outcome.starts();
        assert_eq!(starts.len(), 2);

        assert_eq!(starts[0].position(), 90);
        assert_eq!(starts[0].strand(), Strand::Forward);
        assert_eq!(
            starts[0].placement(),
            &Placement::Upstream(Neighbor {
                feature: FeatureId::from(1),
                offset: 10,
            })
        );

        assert_eq!(starts[1].position(), 1350);
        assert_eq!(starts[1].strand(), Strand::Reverse);
        assert_eq!(starts[1].placement().feature(), Some(FeatureId::from(3)));

        let operons = outcome.operons();
        assert_eq!(operons.len(), 1);
        assert_eq!(
            operons[0].features(),
            vec![FeatureId::from(1), FeatureId::from(2)]
        );
        assert_eq!(operons[0].adjacencies().head.spanning_reads(), 50);

        let diagnostics = outcome.diagnostics();
        assert_eq!(diagnostics.malformed(), 1);
        assert_eq!(diagnostics.starts(), 2);
        assert_eq!(diagnostics.operons(), 1);

        Ok(())
    }

    #[test]
    fn test_retrieval_failure() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let features = features();
        let index = index::Builder::default().try_build(&features, 2000)?;
        let config = Config::default();

        let mut track = Pipeline::new(&features, &index, &config).track("mutant");
        track.feed(vec![Mapping::new(90, 480, Strand::Forward); 5]);

        match track.fail("connection reset") {
            Status::Failed { track, error } => {
                assert_eq!(track, "mutant");
                assert_eq!(error, Error::Retrieval(String::from("connection reset")));
                assert_eq!(error.to_string(), "retrieval error: connection reset");
            }
            Status::Complete(_) => panic!("a failed track must not complete"),
        }

        Ok(())
    }

    #[test]
    fn test_features_must_match_the_index() -> std::result::Result<(), Box<dyn std::error::Error>>
    {
        let features = features();
        let index = index::Builder::default().try_build(&features, 2000)?;
        let config = Config::default();

        let pipeline = Pipeline::new(&features[..2], &index, &config);
        let status = pipeline.track("partial").complete();

        assert!(!status.is_complete());
        assert_eq!(
            status.into_result().unwrap_err(),
            Error::MissingFeatureCount(FeatureId::from(3))
        );

        Ok(())
    }

    #[test]
    fn test_reference_must_match_the_genome() -> std::result::Result<(), Box<dyn std::error::Error>>
    {
        let index = index::Builder::default().try_build(&[], 20)?;
        let config = Config::default();
        let reference = b"ACGT";

        let status = Pipeline::new(&[], &index, &config)
            .with_reference(reference)
            .track("short")
            .complete();

        assert_eq!(
            status.into_result().unwrap_err(),
            Error::Detect(detect::Error::ReferenceLengthMismatch(4, 20))
        );

        Ok(())
    }

    #[test]
    fn test_empty_input() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let index = index::Builder::default().try_build(&[], 100)?;
        let config = Config::default();

        let outcome = Pipeline::new(&[], &index, &config)
            .track("empty")
            .complete()
            .into_result()?;

        assert!(outcome.counts().is_empty());
        assert!(outcome.starts().is_empty());
        assert!(outcome.operons().is_empty());

        Ok(())
    }

    #[test]
    fn test_tracks_share_the_index() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let features = features();
        let index = index::Builder::default().try_build(&features, 2000)?;
        let config = Config::default();
        let pipeline = Pipeline::new(&features, &index, &config);

        let (first, second) = std::thread::scope(|scope| {
            let first = scope.spawn(|| {
                let mut track = pipeline.track("first");
                track.feed(vec![Mapping::new(90, 480, Strand::Forward); 50]);
                track.complete()
            });

            let second = scope.spawn(|| {
                let mut track = pipeline.track("second");
                track.feed(vec![Mapping::new(1300, 1350, Strand::Reverse); 10]);
                track.complete()
            });

            (first.join(), second.join())
        });

        let first = first
            .map_err(|_| "first track panicked")?
            .into_result()?;
        let second = second
            .map_err(|_| "second track panicked")?
            .into_result()?;

        assert_eq!(first.counts().get(FeatureId::from(1)), Some(50));
        assert_eq!(first.counts().get(FeatureId::from(3)), Some(0));
        assert_eq!(first.diagnostics().track(), "first");

        assert_eq!(second.counts().get(FeatureId::from(1)), Some(0));
        assert_eq!(second.counts().get(FeatureId::from(3)), Some(10));
        assert_eq!(second.starts().len(), 1);

        Ok(())
    }
}

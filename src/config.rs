//! Parameters of a transcriptional structure analysis.

use std::cmp::Ordering;

use omics::coordinate::position::Number;

use crate::aggregate::Offsets;
use crate::detect;
use crate::index::mask;

/// The default minimum jump in read starts.
pub const DEFAULT_RATIO_THRESHOLD: f64 = 5.0;

/// The default background cutoff, as a fraction of all read starts.
pub const DEFAULT_BACKGROUND_CUTOFF_FRACTION: f64 = 0.0001;

/// The default minimum number of spanning reads for an adjacency.
pub const DEFAULT_SPANNING_READ_THRESHOLD: u64 = 2;

/// The default distance searched for a feature downstream of a start.
pub const DEFAULT_MAX_FEATURE_DISTANCE: Number = 700;

/// An error related to a [`Config`].
#[derive(Debug, PartialEq)]
pub enum Error {
    /// The ratio threshold is not greater than one.
    InvalidRatioThreshold(f64),

    /// The background cutoff fraction does not lie in `(0, 1]`.
    InvalidBackgroundCutoffFraction(f64),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidRatioThreshold(value) => write!(
                f,
                "invalid ratio threshold: expected a value greater than 1, found {}",
                value
            ),
            Error::InvalidBackgroundCutoffFraction(value) => write!(
                f,
                "invalid background cutoff fraction: expected a value in (0, 1], found {}",
                value
            ),
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

/// The validated parameters of an analysis.
///
/// Generally, you will want to use a [`Builder`] to construct one of these.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// The minimum jump in read starts relative to the upstream neighbour.
    ratio_threshold: f64,

    /// The background cutoff, as a fraction of all read starts of a track.
    background_cutoff_fraction: f64,

    /// The tolerance around each feature when counting hits.
    offsets: Offsets,

    /// The bases of reference sequence reported before each start.
    upstream_window: Number,

    /// The bases of reference sequence reported after each start.
    downstream_window: Number,

    /// The spanning reads an adjacency must exceed to join an operon.
    spanning_read_threshold: u64,

    /// How far downstream of a start to look for a feature.
    max_feature_distance: Number,

    /// The padding table of the exclusion mask.
    mask: mask::Config,
}

impl Config {
    /// Gets the ratio threshold.
    pub fn ratio_threshold(&self) -> f64 {
        self.ratio_threshold
    }

    /// Gets the background cutoff fraction.
    pub fn background_cutoff_fraction(&self) -> f64 {
        self.background_cutoff_fraction
    }

    /// Gets the feature offsets.
    pub fn offsets(&self) -> Offsets {
        self.offsets
    }

    /// Gets the upstream sequence window.
    pub fn upstream_window(&self) -> Number {
        self.upstream_window
    }

    /// Gets the downstream sequence window.
    pub fn downstream_window(&self) -> Number {
        self.downstream_window
    }

    /// Gets the spanning read threshold.
    pub fn spanning_read_threshold(&self) -> u64 {
        self.spanning_read_threshold
    }

    /// Gets the maximum feature distance.
    pub fn max_feature_distance(&self) -> Number {
        self.max_feature_distance
    }

    /// Gets the padding table of the exclusion mask.
    pub fn mask(&self) -> &mask::Config {
        &self.mask
    }

    /// Scales the background cutoff fraction against the total number of read
    /// starts of a track.
    ///
    /// # Examples
    ///
    /// ```
    /// let config = txstructure::config::Builder::default()
    ///     .background_cutoff_fraction(0.001)
    ///     .try_build()?;
    ///
    /// assert_eq!(config.background_cutoff(25_000), 25);
    /// assert_eq!(config.background_cutoff(999), 0);
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn background_cutoff(&self, total_starts: u64) -> u64 {
        (self.background_cutoff_fraction * total_starts as f64).floor() as u64
    }

    /// Gets the detection parameters for a track with `total_starts` read
    /// starts.
    pub fn detection(&self, total_starts: u64) -> detect::Parameters {
        detect::Parameters {
            ratio_threshold: self.ratio_threshold,
            background_cutoff: self.background_cutoff(total_starts),
            upstream_window: self.upstream_window,
            downstream_window: self.downstream_window,
            max_feature_distance: self.max_feature_distance,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ratio_threshold: DEFAULT_RATIO_THRESHOLD,
            background_cutoff_fraction: DEFAULT_BACKGROUND_CUTOFF_FRACTION,
            offsets: Offsets::default(),
            upstream_window: 0,
            downstream_window: 0,
            spanning_read_threshold: DEFAULT_SPANNING_READ_THRESHOLD,
            max_feature_distance: DEFAULT_MAX_FEATURE_DISTANCE,
            mask: mask::Config::default(),
        }
    }
}

/// A builder for a [`Config`].
#[derive(Clone, Debug, Default)]
pub struct Builder {
    /// The config being built.
    inner: Config,
}

impl Builder {
    /// Sets the ratio threshold.
    pub fn ratio_threshold(mut self, value: f64) -> Self {
        self.inner.ratio_threshold = value;
        self
    }

    /// Sets the background cutoff fraction.
    pub fn background_cutoff_fraction(mut self, value: f64) -> Self {
        self.inner.background_cutoff_fraction = value;
        self
    }

    /// Sets the offset added before the start of each feature.
    pub fn start_offset(mut self, value: Number) -> Self {
        self.inner.offsets.start = value;
        self
    }

    /// Sets the offset added after the stop of each feature.
    pub fn stop_offset(mut self, value: Number) -> Self {
        self.inner.offsets.stop = value;
        self
    }

    /// Sets the upstream sequence window.
    pub fn upstream_window(mut self, value: Number) -> Self {
        self.inner.upstream_window = value;
        self
    }

    /// Sets the downstream sequence window.
    pub fn downstream_window(mut self, value: Number) -> Self {
        self.inner.downstream_window = value;
        self
    }

    /// Sets the spanning read threshold.
    pub fn spanning_read_threshold(mut self, value: u64) -> Self {
        self.inner.spanning_read_threshold = value;
        self
    }

    /// Sets the maximum feature distance.
    pub fn max_feature_distance(mut self, value: Number) -> Self {
        self.inner.max_feature_distance = value;
        self
    }

    /// Sets the padding table of the exclusion mask.
    pub fn mask(mut self, value: mask::Config) -> Self {
        self.inner.mask = value;
        self
    }

    /// Validates and builds the [`Config`].
    ///
    /// # Examples
    ///
    /// ```
    /// use txstructure::config;
    ///
    /// let config = config::Builder::default()
    ///     .ratio_threshold(3.0)
    ///     .start_offset(20)
    ///     .try_build()?;
    ///
    /// assert_eq!(config.ratio_threshold(), 3.0);
    /// assert_eq!(config.offsets().start, 20);
    ///
    /// let err = config::Builder::default().ratio_threshold(1.0).try_build().unwrap_err();
    /// assert_eq!(err, config::Error::InvalidRatioThreshold(1.0));
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn try_build(self) -> Result<Config> {
        let config = self.inner;

        // NaN compares as `None` and is rejected along with everything else.
        match config.ratio_threshold.partial_cmp(&1.0) {
            Some(Ordering::Greater) => {}
            _ => return Err(Error::InvalidRatioThreshold(config.ratio_threshold)),
        }

        match (
            config.background_cutoff_fraction.partial_cmp(&0.0),
            config.background_cutoff_fraction.partial_cmp(&1.0),
        ) {
            (Some(Ordering::Greater), Some(Ordering::Less | Ordering::Equal)) => {}
            _ => {
                return Err(Error::InvalidBackgroundCutoffFraction(
                    config.background_cutoff_fraction,
                ))
            }
        }

        Ok(config)
    }
}

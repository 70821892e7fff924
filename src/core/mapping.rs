//! Aligned reads against the reference genome.

use std::num::ParseIntError;
use std::str::FromStr;

use omics::coordinate::position::Number;

use crate::core::strand;
use crate::core::Strand;

/// The delimiter for a mapping record.
pub const DELIMITER: char = '\t';

/// The number of expected fields in a mapping record.
pub const NUM_MAPPING_FIELDS: usize = 3;

/// An error associated with parsing a mapping record.
#[derive(Debug)]
pub enum ParseError {
    /// An incorrect number of fields in the mapping line.
    IncorrectNumberOfFields(usize),

    /// An invalid start position.
    InvalidStart(ParseIntError),

    /// An invalid stop position.
    InvalidStop(ParseIntError),

    /// An invalid strand.
    InvalidStrand(strand::ParseStrandError),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::IncorrectNumberOfFields(fields) => write!(
                f,
                "invalid number of fields in mapping: expected {} fields, found {} fields",
                NUM_MAPPING_FIELDS, fields
            ),
            ParseError::InvalidStart(err) => write!(f, "invalid start: {}", err),
            ParseError::InvalidStop(err) => write!(f, "invalid stop: {}", err),
            ParseError::InvalidStrand(err) => write!(f, "invalid strand: {}", err),
        }
    }
}

impl std::error::Error for ParseError {}

/// A single read aligned to the reference genome.
///
/// Coordinates are 1-based and fully closed. No consistency checks are done
/// here: malformed mappings are reported and skipped during aggregation.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Mapping {
    /// The start position.
    start: Number,

    /// The stop position.
    stop: Number,

    /// The strand.
    strand: Strand,
}

impl Mapping {
    /// Creates a new mapping.
    ///
    /// # Examples
    ///
    /// ```
    /// use txstructure::core::Mapping;
    /// use txstructure::core::Strand;
    ///
    /// let mapping = Mapping::new(10, 45, Strand::Reverse);
    /// assert_eq!(mapping.five_prime(), 45);
    /// ```
    pub fn new(start: Number, stop: Number, strand: Strand) -> Self {
        Self {
            start,
            stop,
            strand,
        }
    }

    /// Gets the start position.
    pub fn start(&self) -> Number {
        self.start
    }

    /// Gets the stop position.
    pub fn stop(&self) -> Number {
        self.stop
    }

    /// Gets the strand.
    pub fn strand(&self) -> Strand {
        self.strand
    }

    /// The position of the 5' end of the read.
    pub fn five_prime(&self) -> Number {
        match self.strand {
            Strand::Forward => self.start,
            Strand::Reverse => self.stop,
        }
    }
}

impl FromStr for Mapping {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s.split(DELIMITER).collect::<Vec<_>>();
        if parts.len() != NUM_MAPPING_FIELDS {
            return Err(ParseError::IncorrectNumberOfFields(parts.len()));
        }

        let start = parts[0].parse().map_err(ParseError::InvalidStart)?;
        let stop = parts[1].parse().map_err(ParseError::InvalidStop)?;
        let strand = parts[2].parse().map_err(ParseError::InvalidStrand)?;

        Ok(Mapping::new(start, stop, strand))
    }
}

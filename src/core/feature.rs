//! Annotated features of a reference genome.

use std::num::ParseIntError;
use std::str::FromStr;

use omics::coordinate::position::Number;

use crate::core::strand;
use crate::core::Strand;

/// The delimiter for a feature record.
pub const DELIMITER: char = '\t';

/// The number of expected fields in a feature record.
pub const NUM_FEATURE_FIELDS: usize = 6;

////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////

/// An error associated with parsing a feature record.
#[derive(Debug)]
pub enum ParseError {
    /// An incorrect number of fields in the feature line.
    IncorrectNumberOfFields(usize),

    /// An invalid id.
    InvalidId(ParseIntError),

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
                "invalid number of fields in feature: expected {} fields, found {} fields",
                NUM_FEATURE_FIELDS, fields
            ),
            ParseError::InvalidId(err) => write!(f, "invalid id: {}", err),
            ParseError::InvalidStart(err) => write!(f, "invalid start: {}", err),
            ParseError::InvalidStop(err) => write!(f, "invalid stop: {}", err),
            ParseError::InvalidStrand(err) => write!(f, "invalid strand: {}", err),
        }
    }
}

impl std::error::Error for ParseError {}

////////////////////////////////////////////////////////////////////////////////////////
// Identifiers and kinds
////////////////////////////////////////////////////////////////////////////////////////

/// The identifier of a feature, unique per chromosome.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct FeatureId(u64);

impl From<u64> for FeatureId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for FeatureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The type of a feature.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Kind {
    /// A gene.
    Gene,
    /// A protein coding sequence.
    Cds,
    /// A transfer RNA.
    Trna,
    /// A ribosomal RNA.
    Rrna,
    /// Any other annotated type.
    Other(String),
}

impl FromStr for Kind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = if s.eq_ignore_ascii_case("gene") {
            Kind::Gene
        } else if s.eq_ignore_ascii_case("cds") {
            Kind::Cds
        } else if s.eq_ignore_ascii_case("trna") {
            Kind::Trna
        } else if s.eq_ignore_ascii_case("rrna") {
            Kind::Rrna
        } else {
            Kind::Other(s.to_string())
        };

        Ok(kind)
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Kind::Gene => write!(f, "gene"),
            Kind::Cds => write!(f, "CDS"),
            Kind::Trna => write!(f, "tRNA"),
            Kind::Rrna => write!(f, "rRNA"),
            Kind::Other(s) => write!(f, "{}", s),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Feature
////////////////////////////////////////////////////////////////////////////////////////

/// An annotated region of a chromosome.
///
/// Coordinates are 1-based and fully closed. A feature is plain data: whether
/// its coordinates are consistent is checked when it is indexed (see
/// [`index::Builder`](crate::index::Builder)).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Feature {
    /// The id.
    id: FeatureId,

    /// The start position.
    start: Number,

    /// The stop position.
    stop: Number,

    /// The strand.
    strand: Strand,

    /// The type.
    kind: Kind,

    /// The name.
    name: String,
}

impl Feature {
    /// Creates a new feature.
    ///
    /// # Examples
    ///
    /// ```
    /// use txstructure::core::feature::Kind;
    /// use txstructure::core::Feature;
    /// use txstructure::core::Strand;
    ///
    /// let feature = Feature::new(1u64, 100, 200, Strand::Reverse, Kind::Cds, "dnaA");
    ///
    /// assert_eq!(feature.five_prime(), 200);
    /// assert_eq!(feature.three_prime(), 100);
    /// assert!(feature.contains(150));
    /// ```
    pub fn new(
        id: impl Into<FeatureId>,
        start: Number,
        stop: Number,
        strand: Strand,
        kind: Kind,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            start,
            stop,
            strand,
            kind,
            name: name.into(),
        }
    }

    /// Gets the id.
    pub fn id(&self) -> FeatureId {
        self.id
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

    /// Gets the type.
    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    /// Gets the name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The position where transcription of the feature begins.
    pub fn five_prime(&self) -> Number {
        match self.strand {
            Strand::Forward => self.start,
            Strand::Reverse => self.stop,
        }
    }

    /// The position where transcription of the feature ends.
    pub fn three_prime(&self) -> Number {
        match self.strand {
            Strand::Forward => self.stop,
            Strand::Reverse => self.start,
        }
    }

    /// Whether `position` lies within the feature.
    pub fn contains(&self, position: Number) -> bool {
        self.start <= position && position <= self.stop
    }
}

impl FromStr for Feature {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s.split(DELIMITER).collect::<Vec<_>>();
        if parts.len() != NUM_FEATURE_FIELDS {
            return Err(ParseError::IncorrectNumberOfFields(parts.len()));
        }

        let id = parts[0]
            .parse::<u64>()
            .map_err(ParseError::InvalidId)?;
        let start = parts[1].parse().map_err(ParseError::InvalidStart)?;
        let stop = parts[2].parse().map_err(ParseError::InvalidStop)?;
        let strand = parts[3].parse().map_err(ParseError::InvalidStrand)?;
        let kind = match parts[4].parse::<Kind>() {
            Ok(kind) => kind,
            Err(never) => match never {},
        };

        Ok(Feature::new(id, start, stop, strand, kind, parts[5]))
    }
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}",
            self.id, self.start, self.stop, self.strand, self.kind, self.name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_feature() -> Result<(), Box<dyn std::error::Error>> {
        let feature = "7\t10\t20\t+\ttRNA\ttrnA".parse::<Feature>()?;

        assert_eq!(feature.id(), FeatureId::from(7));
        assert_eq!(feature.start(), 10);
        assert_eq!(feature.stop(), 20);
        assert_eq!(feature.strand(), Strand::Forward);
        assert_eq!(feature.kind(), &Kind::Trna);
        assert_eq!(feature.name(), "trnA");
        assert_eq!(feature.five_prime(), 10);
        assert_eq!(feature.three_prime(), 20);
        assert_eq!(feature.to_string(), "7\t10\t20\t+\ttRNA\ttrnA");

        Ok(())
    }

    #[test]
    fn test_kind_is_parsed_case_insensitively() -> Result<(), Box<dyn std::error::Error>> {
        assert_eq!("cds".parse::<Kind>()?, Kind::Cds);
        assert_eq!("RRNA".parse::<Kind>()?, Kind::Rrna);
        assert_eq!(
            "ncRNA".parse::<Kind>()?,
            Kind::Other(String::from("ncRNA"))
        );
        Ok(())
    }

    #[test]
    fn test_invalid_number_of_fields() {
        let err = "7\t10\t20\t+".parse::<Feature>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid number of fields in feature: expected 6 fields, found 4 fields"
        );
    }

    #[test]
    fn test_invalid_strand() {
        let err = "7\t10\t20\t?\tCDS\tx".parse::<Feature>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid strand: parse strand error: ? is not a valid strand"
        );
    }
}

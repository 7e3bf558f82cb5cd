//! Unified Error Model
//!
//! Every failure here is a deterministic function of the input, so nothing is
//! ever retried. Transport failures belong to the collaborators.
use thiserror::Error;

/// Malformed shape in a raw query document
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("PARSE/dimensions: value of '{key}' must be a string or a list of strings")]
    InvalidDimensionValue { key: String },

    #[error("PARSE/period: '{value}' is not a positive number of seconds or \"auto\"")]
    InvalidPeriod { value: String },

    #[error("PARSE/statistic: expected a string or a list of strings")]
    InvalidStatistic,

    #[error("PARSE/id: '{id}' is not a valid metric data identifier")]
    InvalidId { id: String },

    #[error("PARSE/{0}")]
    Malformed(String),
}

impl From<serde_json::Error> for ParseError {
    fn from(err: serde_json::Error) -> Self {
        ParseError::Malformed(err.to_string())
    }
}

/// Well-formed document that is missing a required combination of fields
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("VALIDATION/annotation: invalid annotations query, missing {}", missing.join(", "))]
    MissingAnnotationFields { missing: Vec<&'static str> },

    #[error("VALIDATION/id: query id '{id}' is not unique")]
    DuplicateId { id: String },
}

/// Failure to turn one raw query into a `ResolvedQuery`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Failure reported by an external collaborator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("TRANSPORT/{operation}: {message}")]
pub struct TransportError {
    pub operation: String,
    pub message: String,
}

impl TransportError {
    pub fn new(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

/// Failure to load normalizer settings
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("SETTINGS/read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("SETTINGS/yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("SETTINGS/{field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

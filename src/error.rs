//! Error types surfaced by the cleaning, generation and reporting stages.
use polars::prelude::PolarsError;
use std::fmt;
use std::io;

pub type Result<T> = std::result::Result<T, SurveyError>;

#[derive(Debug)]
pub enum SurveyError {
    Io(io::Error),
    Csv(csv::Error),
    MissingColumn { column: String },
    ColumnLayout { expected: usize, found: usize },
    InvalidTopic { key: String, value: String },
    DuplicateKey { key: String },
    Polars(PolarsError),
    Config(String),
    Generation(String),
    Chart(String),
}

impl SurveyError {
    pub fn missing_column(column: impl Into<String>) -> Self {
        Self::MissingColumn {
            column: column.into(),
        }
    }

    pub fn chart(message: impl fmt::Display) -> Self {
        Self::Chart(message.to_string())
    }
}

impl fmt::Display for SurveyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "I/O error: {}", err),
            Self::Csv(err) => write!(f, "CSV error: {}", err),
            Self::MissingColumn { column } => write!(f, "missing column '{}'", column),
            Self::ColumnLayout { expected, found } => write!(
                f,
                "expected {} response columns, found {}",
                expected, found
            ),
            Self::InvalidTopic { key, value } => write!(
                f,
                "participant {} has topic '{}', expected 1-4",
                key, value
            ),
            Self::DuplicateKey { key } => write!(f, "duplicate participant key '{}'", key),
            Self::Polars(err) => write!(f, "table error: {}", err),
            Self::Config(message) => write!(f, "configuration error: {}", message),
            Self::Generation(message) => write!(f, "content generation failed: {}", message),
            Self::Chart(message) => write!(f, "chart rendering failed: {}", message),
        }
    }
}

impl std::error::Error for SurveyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Csv(err) => Some(err),
            Self::Polars(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for SurveyError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for SurveyError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

impl From<PolarsError> for SurveyError {
    fn from(err: PolarsError) -> Self {
        Self::Polars(err)
    }
}

impl From<reqwest::Error> for SurveyError {
    fn from(err: reqwest::Error) -> Self {
        Self::Generation(err.to_string())
    }
}

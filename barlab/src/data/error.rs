use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while loading or validating bar data.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Error)]
pub enum DataError {
    #[error("io: {0}")]
    Io(String),

    #[error("csv parse error at line {line}: {message}")]
    Csv { line: usize, message: String },

    #[error("duplicate timestamp {timestamp} in bar source '{symbol}'")]
    DuplicateTimestamp {
        symbol: String,
        timestamp: DateTime<Utc>,
    },

    #[error("unknown timeframe '{0}'")]
    UnknownTimeframe(String),
}

impl From<std::io::Error> for DataError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value.to_string())
    }
}

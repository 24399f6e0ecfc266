use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by the optional pre-submission risk checks.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Error)]
pub enum OrderError {
    #[error("insufficient capital: order requires {required} but only {available} available")]
    InsufficientCapital {
        required: Decimal,
        available: Decimal,
    },

    #[error("risk limit: {0}")]
    RiskLimit(String),
}

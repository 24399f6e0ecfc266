//! Position lifecycle, cash accounting and the equity curve.

pub mod portfolio;
pub mod position;

pub use portfolio::{EquityPoint, Portfolio};
pub use position::{Position, PositionStatus, TradeResult};

use crate::execution::order::Side;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Slippage models, applied only to MARKET and STOP fills.
///
/// The side passed to [`Slippage::apply`] is the *effective* fill side: a
/// buyer pays up, a seller receives less.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Slippage {
    #[default]
    Zero,
    /// Proportional to the fill price, e.g. `rate = 0.0005` for 5bps.
    Percentage { rate: Decimal },
    /// Fixed price offset.
    Fixed { points: Decimal },
}

impl Slippage {
    /// Slippage-adjusted fill price.
    pub fn apply(&self, price: Decimal, side: Side) -> Decimal {
        let offset = match self {
            Self::Zero => Decimal::ZERO,
            Self::Percentage { rate } => price * rate,
            Self::Fixed { points } => *points,
        };
        match side {
            Side::Long => price + offset,
            Side::Short => price - offset,
        }
    }
}

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Commission models. Commission is always non-negative.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Commission {
    #[default]
    Zero,
    /// Percentage of notional, e.g. `rate = 0.001` for 0.1%.
    Percentage { rate: Decimal },
    /// Flat amount per fill.
    Fixed { amount: Decimal },
    /// `(threshold, rate)` pairs in ascending threshold order; the rate of
    /// the highest threshold at or below the notional applies, falling back
    /// to the first tier.
    Tiered { tiers: Vec<(Decimal, Decimal)> },
}

impl Commission {
    pub fn calculate(&self, price: Decimal, quantity: Decimal) -> Decimal {
        let notional = price * quantity;
        let commission = match self {
            Self::Zero => Decimal::ZERO,
            Self::Percentage { rate } => notional * rate,
            Self::Fixed { amount } => *amount,
            Self::Tiered { tiers } => tiers
                .iter()
                .rev()
                .find(|(threshold, _)| notional >= *threshold)
                .or_else(|| tiers.first())
                .map(|(_, rate)| notional * rate)
                .unwrap_or(Decimal::ZERO),
        };
        commission.max(Decimal::ZERO)
    }
}

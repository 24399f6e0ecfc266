use crate::statistic::summary::MetricsSummary;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Closed set of optimization objectives evaluated on a run's metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    Sharpe,
    Sortino,
    Return,
    /// Minimized; everything else is maximized.
    MaxDrawdown,
    ProfitFactor,
    Calmar,
}

impl Objective {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sharpe => "sharpe",
            Self::Sortino => "sortino",
            Self::Return => "return",
            Self::MaxDrawdown => "max_dd",
            Self::ProfitFactor => "profit_factor",
            Self::Calmar => "calmar",
        }
    }

    pub fn maximize(&self) -> bool {
        !matches!(self, Self::MaxDrawdown)
    }

    pub fn evaluate(&self, metrics: &MetricsSummary) -> Decimal {
        match self {
            Self::Sharpe => metrics.sharpe_ratio,
            Self::Sortino => metrics.sortino_ratio,
            Self::Return => metrics.total_return_pct,
            Self::MaxDrawdown => metrics.max_drawdown_pct,
            Self::ProfitFactor => metrics.profit_factor,
            Self::Calmar => metrics.calmar_ratio,
        }
    }

    /// Objective recorded for a failed trial: the worst representable value
    /// for the optimization direction.
    pub fn sentinel(&self) -> Decimal {
        if self.maximize() {
            Decimal::MIN
        } else {
            Decimal::MAX
        }
    }

    /// True when `candidate` beats `incumbent` under this objective.
    pub fn improves(&self, candidate: Decimal, incumbent: Decimal) -> bool {
        if self.maximize() {
            candidate > incumbent
        } else {
            candidate < incumbent
        }
    }
}

impl std::fmt::Display for Objective {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Objective {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sharpe" => Ok(Self::Sharpe),
            "sortino" => Ok(Self::Sortino),
            "return" => Ok(Self::Return),
            "max_dd" => Ok(Self::MaxDrawdown),
            "profit_factor" => Ok(Self::ProfitFactor),
            "calmar" => Ok(Self::Calmar),
            other => Err(format!("unknown objective '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_direction() {
        assert!(Objective::Sharpe.maximize());
        assert!(!Objective::MaxDrawdown.maximize());

        assert!(Objective::Sharpe.improves(dec!(2), dec!(1)));
        assert!(!Objective::Sharpe.improves(dec!(1), dec!(1)));
        assert!(Objective::MaxDrawdown.improves(dec!(5), dec!(10)));
    }

    #[test]
    fn test_sentinels() {
        assert_eq!(Objective::Sharpe.sentinel(), Decimal::MIN);
        assert_eq!(Objective::MaxDrawdown.sentinel(), Decimal::MAX);
    }

    #[test]
    fn test_name_round_trip() {
        for objective in [
            Objective::Sharpe,
            Objective::Sortino,
            Objective::Return,
            Objective::MaxDrawdown,
            Objective::ProfitFactor,
            Objective::Calmar,
        ] {
            assert_eq!(objective.name().parse::<Objective>().unwrap(), objective);
        }
        assert!("nonsense".parse::<Objective>().is_err());
    }
}

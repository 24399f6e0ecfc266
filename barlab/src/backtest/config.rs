use crate::data::market::{SymbolInfo, Timeframe};
use crate::execution::commission::Commission;
use crate::execution::risk::RiskLimits;
use crate::execution::slippage::Slippage;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Invalid configuration detected at runner construction.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Error)]
pub enum ConfigError {
    #[error("initial capital must be positive, got {0}")]
    NonPositiveCapital(Decimal),

    #[error("max bars back must be at least 1")]
    ZeroMaxBarsBack,

    #[error("{model} rate must be non-negative, got {rate}")]
    NegativeRate { model: String, rate: Decimal },
}

/// Configuration for one backtest run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BacktestConfig {
    pub symbol_info: SymbolInfo,
    pub timeframe: Timeframe,
    pub initial_capital: Decimal,
    pub commission: Commission,
    pub slippage: Slippage,
    /// Upper bound on each series' history buffer.
    pub max_bars_back: usize,
    /// Optional pre-submission order gating; off by default.
    pub risk_limits: Option<RiskLimits>,
}

impl BacktestConfig {
    /// Conventional defaults: 10,000 starting capital, 0.1% commission,
    /// 0.05% slippage, 5,000 bars of history, no risk gating.
    pub fn new(symbol_info: SymbolInfo, timeframe: Timeframe) -> Self {
        Self {
            symbol_info,
            timeframe,
            initial_capital: dec!(10000),
            commission: Commission::Percentage { rate: dec!(0.001) },
            slippage: Slippage::Percentage { rate: dec!(0.0005) },
            max_bars_back: 5000,
            risk_limits: None,
        }
    }

    /// Frictionless variant used widely in tests: zero commission and
    /// slippage.
    pub fn frictionless(symbol_info: SymbolInfo, timeframe: Timeframe) -> Self {
        Self {
            commission: Commission::Zero,
            slippage: Slippage::Zero,
            ..Self::new(symbol_info, timeframe)
        }
    }

    pub fn with_initial_capital(mut self, initial_capital: Decimal) -> Self {
        self.initial_capital = initial_capital;
        self
    }

    pub fn with_commission(mut self, commission: Commission) -> Self {
        self.commission = commission;
        self
    }

    pub fn with_slippage(mut self, slippage: Slippage) -> Self {
        self.slippage = slippage;
        self
    }

    pub fn with_max_bars_back(mut self, max_bars_back: usize) -> Self {
        self.max_bars_back = max_bars_back;
        self
    }

    pub fn with_risk_limits(mut self, risk_limits: RiskLimits) -> Self {
        self.risk_limits = Some(risk_limits);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_capital <= Decimal::ZERO {
            return Err(ConfigError::NonPositiveCapital(self.initial_capital));
        }
        if self.max_bars_back == 0 {
            return Err(ConfigError::ZeroMaxBarsBack);
        }

        match &self.commission {
            Commission::Percentage { rate } if *rate < Decimal::ZERO => {
                return Err(ConfigError::NegativeRate {
                    model: "commission".into(),
                    rate: *rate,
                });
            }
            Commission::Tiered { tiers } => {
                if let Some((_, rate)) = tiers.iter().find(|(_, rate)| *rate < Decimal::ZERO) {
                    return Err(ConfigError::NegativeRate {
                        model: "commission".into(),
                        rate: *rate,
                    });
                }
            }
            _ => {}
        }

        if let Slippage::Percentage { rate } = self.slippage {
            if rate < Decimal::ZERO {
                return Err(ConfigError::NegativeRate {
                    model: "slippage".into(),
                    rate,
                });
            }
        }

        Ok(())
    }
}

use crate::backtest::config::BacktestConfig;
use crate::portfolio::portfolio::EquityPoint;
use crate::portfolio::position::TradeResult;
use crate::statistic::summary::MetricsSummary;
use crate::strategy::parameters::Parameters;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Complete result surface of one backtest run.
///
/// Two runs with identical inputs carry the same `run_hash` and identical
/// numeric contents, byte for byte.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BacktestResult {
    /// SHA-256 fingerprint of the run inputs, hex-encoded.
    pub run_hash: String,
    pub strategy_name: SmolStr,
    pub parameters: Parameters,
    pub config: BacktestConfig,
    pub trades: Vec<TradeResult>,
    pub equity_curve: Vec<EquityPoint>,
    pub final_equity: Decimal,
    pub total_bars: usize,
    pub metrics: MetricsSummary,
}

impl BacktestResult {
    /// Render the full result surface as pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

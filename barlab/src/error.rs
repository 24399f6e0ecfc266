use crate::backtest::config::ConfigError;
use crate::data::error::DataError;
use crate::execution::error::OrderError;
use crate::strategy::StrategyError;
use barlab_ta::series::SeriesError;
use thiserror::Error;

/// Top-level error for engine, runner and optimizer entry points.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BarlabError {
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    #[error("data: {0}")]
    Data(#[from] DataError),

    #[error("series: {0}")]
    Series(#[from] SeriesError),

    #[error("order: {0}")]
    Order(#[from] OrderError),

    #[error("strategy: {0}")]
    Strategy(#[from] StrategyError),

    #[error("optimization: {0}")]
    Optimization(String),
}

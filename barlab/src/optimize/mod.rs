//! Parameter optimization: grid and evolutionary search over the strategy's
//! declared parameter space.

pub mod genetic;
pub mod grid;
pub mod objective;
pub mod parallel;
pub mod result;
pub mod space;

pub use genetic::GeneticConfig;
pub use objective::Objective;
pub use result::{OptimizationResult, TrialResult};
pub use space::{ParamRange, ParameterSpace};

use crate::backtest::config::BacktestConfig;
use crate::data::feed::DataFeed;
use crate::error::BarlabError;
use crate::strategy::Strategy;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::info;

/// Search method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizeMethod {
    Grid,
    Genetic,
}

impl OptimizeMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Grid => "grid",
            Self::Genetic => "genetic",
        }
    }
}

impl std::fmt::Display for OptimizeMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptimizeMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "grid" => Ok(Self::Grid),
            "genetic" => Ok(Self::Genetic),
            other => Err(format!("unknown optimization method '{other}'")),
        }
    }
}

/// Full optimizer configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OptimizerConfig {
    pub method: OptimizeMethod,
    pub objective: Objective,
    /// Worker pool size for trial execution; `1` runs sequentially.
    pub max_workers: usize,
    /// Evolutionary search settings, ignored by grid search.
    pub genetic: GeneticConfig,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            method: OptimizeMethod::Grid,
            objective: Objective::Sharpe,
            max_workers: 1,
            genetic: GeneticConfig::default(),
        }
    }
}

/// Run a parameter optimization for the strategy produced by `factory`.
///
/// The search space is derived from the strategy's parameter descriptors;
/// each trial executes a full, independent backtest.
pub fn run_optimization<F, S, New>(
    factory: New,
    feed: &F,
    config: &BacktestConfig,
    optimizer: &OptimizerConfig,
) -> Result<result::OptimizationResult, BarlabError>
where
    F: DataFeed + Sync,
    S: Strategy,
    New: Fn() -> S + Sync,
{
    let probe = factory();
    let space = ParameterSpace::from_descriptors(&probe.descriptors());

    info!(
        method = %optimizer.method,
        objective = optimizer.objective.name(),
        total_combinations = space.total_combinations(),
        dimensions = ?space.dimension_names(),
        "optimization start"
    );

    match optimizer.method {
        OptimizeMethod::Grid => grid::grid_search(
            &factory,
            feed,
            config,
            optimizer.objective,
            &space,
            optimizer.max_workers,
        ),
        OptimizeMethod::Genetic => genetic::genetic_search(
            &factory,
            feed,
            config,
            optimizer.objective,
            &space,
            &optimizer.genetic,
        ),
    }
}

use crate::optimize::OptimizeMethod;
use crate::optimize::objective::Objective;
use crate::statistic::summary::MetricsSummary;
use crate::strategy::parameters::Parameters;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Result of a single optimization trial.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TrialResult {
    pub trial_index: usize,
    pub parameters: Parameters,
    pub objective_value: Decimal,
    /// Absent for failed trials, which carry the sentinel objective.
    pub metrics: Option<MetricsSummary>,
    pub run_hash: String,
}

impl TrialResult {
    /// Placeholder recorded when a trial's backtest fails.
    pub fn failed(trial_index: usize, parameters: Parameters, objective: Objective) -> Self {
        Self {
            trial_index,
            parameters,
            objective_value: objective.sentinel(),
            metrics: None,
            run_hash: String::new(),
        }
    }
}

/// Complete result of an optimization run. Trials are ordered by
/// `trial_index` regardless of completion order.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OptimizationResult {
    pub method: OptimizeMethod,
    pub objective_name: String,
    pub total_trials: usize,
    pub best_params: Parameters,
    pub best_value: Decimal,
    pub all_trials: Vec<TrialResult>,
}

impl OptimizationResult {
    /// Trials sorted best-first by objective value.
    pub fn top_trials(&self) -> Vec<&TrialResult> {
        let mut trials: Vec<&TrialResult> = self.all_trials.iter().collect();
        trials.sort_by(|a, b| b.objective_value.cmp(&a.objective_value));
        trials
    }

    /// Render the full result as pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

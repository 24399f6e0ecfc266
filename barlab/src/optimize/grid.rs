use crate::backtest::config::BacktestConfig;
use crate::backtest::runner::BacktestRunner;
use crate::data::feed::DataFeed;
use crate::error::BarlabError;
use crate::optimize::OptimizeMethod;
use crate::optimize::objective::Objective;
use crate::optimize::parallel::run_trials;
use crate::optimize::result::{OptimizationResult, TrialResult};
use crate::optimize::space::ParameterSpace;
use crate::strategy::Strategy;
use crate::strategy::parameters::Parameters;
use tracing::info;

/// Exhaustive search over every combination of the parameter space, in
/// deterministic Cartesian order.
pub fn grid_search<F, S, New>(
    factory: &New,
    feed: &F,
    config: &BacktestConfig,
    objective: Objective,
    space: &ParameterSpace,
    max_workers: usize,
) -> Result<OptimizationResult, BarlabError>
where
    F: DataFeed + Sync,
    S: Strategy,
    New: Fn() -> S + Sync,
{
    let param_sets = space.grid_sets();
    let total = param_sets.len();
    info!(total_combinations = total, "grid search start");

    let trials = run_trials(param_sets, max_workers, objective, |index, params| {
        evaluate_trial(factory, feed, config, objective, index, params)
    });

    let best = best_trial(&trials, objective).ok_or_else(|| {
        BarlabError::Optimization("grid search produced no trials".to_string())
    })?;

    info!(
        best_value = %best.objective_value,
        best_params = ?best.parameters,
        "grid search complete"
    );

    Ok(OptimizationResult {
        method: OptimizeMethod::Grid,
        objective_name: objective.name().to_string(),
        total_trials: total,
        best_params: best.parameters.clone(),
        best_value: best.objective_value,
        all_trials: trials,
    })
}

/// Run one backtest under the given parameter assignment.
pub(crate) fn evaluate_trial<F, S, New>(
    factory: &New,
    feed: &F,
    config: &BacktestConfig,
    objective: Objective,
    trial_index: usize,
    params: &Parameters,
) -> Result<TrialResult, BarlabError>
where
    F: DataFeed,
    S: Strategy,
    New: Fn() -> S,
{
    let mut strategy = factory();
    strategy.set_parameters(params)?;

    let runner = BacktestRunner::new(feed, config.clone())?;
    let result = runner.run(&mut strategy)?;

    Ok(TrialResult {
        trial_index,
        parameters: params.clone(),
        objective_value: objective.evaluate(&result.metrics),
        metrics: Some(result.metrics),
        run_hash: result.run_hash,
    })
}

/// First trial with the best objective value; ties keep the earliest trial.
pub(crate) fn best_trial(trials: &[TrialResult], objective: Objective) -> Option<&TrialResult> {
    let mut best: Option<&TrialResult> = None;
    for trial in trials {
        best = match best {
            None => Some(trial),
            Some(incumbent)
                if objective.improves(trial.objective_value, incumbent.objective_value) =>
            {
                Some(trial)
            }
            Some(incumbent) => Some(incumbent),
        };
    }
    best
}

use crate::error::BarlabError;
use crate::optimize::objective::Objective;
use crate::optimize::result::TrialResult;
use crate::strategy::parameters::Parameters;
use rayon::prelude::*;
use tracing::{info, warn};

/// Execute one trial per parameter set, sequentially or on a worker pool.
///
/// A failed trial is contained: it is recorded with the objective's sentinel
/// value instead of aborting the sweep. Results are returned ordered by
/// trial index, independent of completion order.
pub fn run_trials<TrialFn>(
    param_sets: Vec<Parameters>,
    max_workers: usize,
    objective: Objective,
    trial_fn: TrialFn,
) -> Vec<TrialResult>
where
    TrialFn: Fn(usize, &Parameters) -> Result<TrialResult, BarlabError> + Sync,
{
    let total = param_sets.len();
    let execute = |(index, params): (usize, &Parameters)| match trial_fn(index, params) {
        Ok(trial) => trial,
        Err(err) => {
            warn!(trial_index = index, %err, "trial failed");
            TrialResult::failed(index, params.clone(), objective)
        }
    };

    let mut results: Vec<TrialResult> = if max_workers <= 1 {
        param_sets
            .iter()
            .enumerate()
            .map(|item| {
                let trial = execute(item);
                if (trial.trial_index + 1) % 10 == 0 {
                    info!(completed = trial.trial_index + 1, total, "trial progress");
                }
                trial
            })
            .collect()
    } else {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(max_workers)
            .build();
        match pool {
            Ok(pool) => pool.install(|| {
                param_sets
                    .par_iter()
                    .enumerate()
                    .map(execute)
                    .collect()
            }),
            Err(err) => {
                warn!(%err, "worker pool unavailable, running sequentially");
                param_sets.iter().enumerate().map(execute).collect()
            }
        }
    };

    results.sort_by_key(|trial| trial.trial_index);
    results
}

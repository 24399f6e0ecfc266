use barlab::backtest::BacktestConfig;
use barlab::data::{Bar, InMemoryFeed, SymbolInfo, Timeframe};
use barlab::execution::Side;
use barlab::optimize::{
    GeneticConfig, Objective, OptimizeMethod, OptimizerConfig, ParameterSpace, run_optimization,
};
use barlab::strategy::parameters::{ParamDescriptor, ParamValue, Parameters};
use barlab::strategy::{Strategy, StrategyError, TradeContext};
use barlab_ta::ta;
use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn feed() -> InMemoryFeed {
    // A deterministic oscillation with enough swings for short moving
    // averages to cross repeatedly.
    let bars = (0..60)
        .map(|i| {
            let base = dec!(100) + Decimal::from((i * 5) % 11) - dec!(5);
            Bar {
                timestamp: Utc.with_ymd_and_hms(2023, 1, 1, 0, i as u32, 0).unwrap(),
                open: base,
                high: base + dec!(2),
                low: base - dec!(2),
                close: base + dec!(1),
                volume: dec!(1000),
            }
        })
        .collect();
    InMemoryFeed::new("TEST", Timeframe::M1, bars).unwrap()
}

fn config() -> BacktestConfig {
    BacktestConfig::frictionless(SymbolInfo::new("TEST"), Timeframe::M1)
}

/// Small crossover strategy with a 3 x 3 search space.
#[derive(Debug, Clone)]
struct MiniCross {
    fast: i64,
    slow: i64,
    fail_when_fast: Option<i64>,
}

impl Default for MiniCross {
    fn default() -> Self {
        Self {
            fast: 2,
            slow: 4,
            fail_when_fast: None,
        }
    }
}

impl Strategy for MiniCross {
    fn name(&self) -> &str {
        "mini_cross"
    }

    fn descriptors(&self) -> Vec<ParamDescriptor> {
        vec![
            ParamDescriptor::int("fast", 2, 2, 4, 1),
            ParamDescriptor::int("slow", 4, 4, 6, 1),
        ]
    }

    fn parameters(&self) -> Parameters {
        Parameters::from_iter([
            ("fast".into(), ParamValue::Int(self.fast)),
            ("slow".into(), ParamValue::Int(self.slow)),
        ])
    }

    fn set_parameters(&mut self, params: &Parameters) -> Result<(), StrategyError> {
        for descriptor in self.descriptors() {
            let Some(value) = params.get(&descriptor.name) else {
                continue;
            };
            descriptor.validate(value)?;
            match descriptor.name.as_str() {
                "fast" => self.fast = value.as_int().unwrap_or_default(),
                "slow" => self.slow = value.as_int().unwrap_or_default(),
                _ => {}
            }
        }
        Ok(())
    }

    fn on_bar(&mut self, ctx: &mut TradeContext<'_>) -> Result<(), StrategyError> {
        if self.fail_when_fast == Some(self.fast) {
            return Err(StrategyError::Execution("intentional failure".into()));
        }

        let fast = ta::sma(&ctx.bars().close, self.fast as usize);
        let slow = ta::sma(&ctx.bars().close, self.slow as usize);

        let holding = ctx.position("x").is_some();
        if fast > slow && !holding {
            ctx.entry("x", Side::Long, Some(dec!(10)), None, None);
        } else if fast < slow && holding {
            ctx.close_position("x");
        }
        Ok(())
    }
}

#[test]
fn grid_enumerates_the_full_space() {
    let optimizer = OptimizerConfig {
        method: OptimizeMethod::Grid,
        objective: Objective::Return,
        max_workers: 1,
        genetic: GeneticConfig::default(),
    };

    let result = run_optimization(MiniCross::default, &feed(), &config(), &optimizer).unwrap();

    assert_eq!(result.method, OptimizeMethod::Grid);
    assert_eq!(result.total_trials, 9);
    assert_eq!(result.all_trials.len(), 9);

    // First trial is the first value of each dimension.
    let first = &result.all_trials[0];
    assert_eq!(first.trial_index, 0);
    assert_eq!(first.parameters.get("fast"), Some(&ParamValue::Int(2)));
    assert_eq!(first.parameters.get("slow"), Some(&ParamValue::Int(4)));

    // All nine combinations are present, each exactly once.
    let mut combos: Vec<(i64, i64)> = result
        .all_trials
        .iter()
        .map(|t| {
            (
                t.parameters.get("fast").and_then(ParamValue::as_int).unwrap(),
                t.parameters.get("slow").and_then(ParamValue::as_int).unwrap(),
            )
        })
        .collect();
    combos.sort();
    combos.dedup();
    assert_eq!(combos.len(), 9);

    // The best value is the maximum objective over all trials.
    let max_value = result
        .all_trials
        .iter()
        .map(|t| t.objective_value)
        .max()
        .unwrap();
    assert_eq!(result.best_value, max_value);
    assert!(
        result
            .all_trials
            .iter()
            .any(|t| t.parameters == result.best_params
                && t.objective_value == result.best_value)
    );
}

#[test]
fn grid_parallel_matches_sequential() {
    let sequential = OptimizerConfig {
        method: OptimizeMethod::Grid,
        objective: Objective::Return,
        max_workers: 1,
        genetic: GeneticConfig::default(),
    };
    let parallel = OptimizerConfig {
        max_workers: 4,
        ..sequential.clone()
    };

    let feed = feed();
    let a = run_optimization(MiniCross::default, &feed, &config(), &sequential).unwrap();
    let b = run_optimization(MiniCross::default, &feed, &config(), &parallel).unwrap();

    assert_eq!(a.best_params, b.best_params);
    assert_eq!(a.best_value, b.best_value);
    // Trial order and contents are identical regardless of worker count.
    assert_eq!(a.all_trials, b.all_trials);
}

#[test]
fn failed_trials_record_sentinel_and_stay_listed() {
    let factory = || MiniCross {
        fail_when_fast: Some(3),
        ..MiniCross::default()
    };
    let optimizer = OptimizerConfig {
        method: OptimizeMethod::Grid,
        objective: Objective::Return,
        max_workers: 1,
        genetic: GeneticConfig::default(),
    };

    let result = run_optimization(factory, &feed(), &config(), &optimizer).unwrap();
    assert_eq!(result.all_trials.len(), 9);

    let failed: Vec<_> = result
        .all_trials
        .iter()
        .filter(|t| t.objective_value == Decimal::MIN)
        .collect();
    // fast = 3 fails for each of the three slow values.
    assert_eq!(failed.len(), 3);
    for trial in failed {
        assert!(trial.metrics.is_none());
        assert_eq!(trial.parameters.get("fast"), Some(&ParamValue::Int(3)));
    }

    // The winner is never a failed trial.
    assert_ne!(result.best_params.get("fast"), Some(&ParamValue::Int(3)));
}

#[test]
fn genetic_is_deterministic_under_a_seed() {
    let optimizer = OptimizerConfig {
        method: OptimizeMethod::Genetic,
        objective: Objective::Return,
        max_workers: 1,
        genetic: GeneticConfig {
            population: 8,
            generations: 4,
            crossover_prob: 0.7,
            mutation_prob: 0.2,
            seed: Some(42),
        },
    };

    let feed = feed();
    let a = run_optimization(MiniCross::default, &feed, &config(), &optimizer).unwrap();
    let b = run_optimization(MiniCross::default, &feed, &config(), &optimizer).unwrap();

    assert_eq!(a.method, OptimizeMethod::Genetic);
    assert_eq!(a.best_params, b.best_params);
    assert_eq!(a.best_value, b.best_value);
    assert_eq!(a.total_trials, b.total_trials);
    assert_eq!(a.all_trials, b.all_trials);
    assert!(a.total_trials > 0);
}

#[test]
fn genetic_seeds_differ() {
    let base = OptimizerConfig {
        method: OptimizeMethod::Genetic,
        objective: Objective::Return,
        max_workers: 1,
        genetic: GeneticConfig {
            population: 6,
            generations: 2,
            crossover_prob: 0.7,
            mutation_prob: 0.2,
            seed: Some(1),
        },
    };
    let other = OptimizerConfig {
        genetic: GeneticConfig {
            seed: Some(2),
            ..base.genetic
        },
        ..base.clone()
    };

    let feed = feed();
    let a = run_optimization(MiniCross::default, &feed, &config(), &base).unwrap();
    let b = run_optimization(MiniCross::default, &feed, &config(), &other).unwrap();

    // Different seeds explore different trial streams (the best point may
    // still coincide on such a small space).
    let a_params: Vec<&Parameters> = a.all_trials.iter().map(|t| &t.parameters).collect();
    let b_params: Vec<&Parameters> = b.all_trials.iter().map(|t| &t.parameters).collect();
    assert!(a_params != b_params || a.total_trials != b.total_trials);
}

#[test]
fn genetic_requires_a_parameter_space() {
    #[derive(Debug, Default)]
    struct NoParams;

    impl Strategy for NoParams {
        fn name(&self) -> &str {
            "no_params"
        }

        fn descriptors(&self) -> Vec<ParamDescriptor> {
            Vec::new()
        }

        fn parameters(&self) -> Parameters {
            Parameters::new()
        }

        fn set_parameters(&mut self, _params: &Parameters) -> Result<(), StrategyError> {
            Ok(())
        }

        fn on_bar(&mut self, _ctx: &mut TradeContext<'_>) -> Result<(), StrategyError> {
            Ok(())
        }
    }

    let optimizer = OptimizerConfig {
        method: OptimizeMethod::Genetic,
        objective: Objective::Sharpe,
        max_workers: 1,
        genetic: GeneticConfig::default(),
    };
    let result = run_optimization(|| NoParams, &feed(), &config(), &optimizer);
    assert!(result.is_err());
}

#[test]
fn objective_direction_respected_for_drawdown() {
    let optimizer = OptimizerConfig {
        method: OptimizeMethod::Grid,
        objective: Objective::MaxDrawdown,
        max_workers: 1,
        genetic: GeneticConfig::default(),
    };

    let result = run_optimization(MiniCross::default, &feed(), &config(), &optimizer).unwrap();

    // Minimization: the best value is the smallest drawdown observed.
    let min_value = result
        .all_trials
        .iter()
        .map(|t| t.objective_value)
        .min()
        .unwrap();
    assert_eq!(result.best_value, min_value);
}

#[test]
fn space_total_matches_trial_count() {
    let space = ParameterSpace::from_descriptors(&MiniCross::default().descriptors());
    assert_eq!(space.total_combinations(), 9);
    assert_eq!(space.grid_sets().len(), 9);
}

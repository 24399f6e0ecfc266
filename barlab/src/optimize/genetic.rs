use crate::backtest::config::BacktestConfig;
use crate::data::feed::DataFeed;
use crate::error::BarlabError;
use crate::optimize::OptimizeMethod;
use crate::optimize::grid::evaluate_trial;
use crate::optimize::objective::Objective;
use crate::optimize::result::{OptimizationResult, TrialResult};
use crate::optimize::space::{ParamRange, ParameterSpace};
use crate::strategy::Strategy;
use crate::strategy::parameters::{ParamValue, Parameters};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

const TOURNAMENT_SIZE: usize = 3;
const GENE_SWAP_PROB: f64 = 0.5;

/// Evolutionary search settings.
///
/// With an explicit `seed` the whole run is reproducible: the seeded RNG
/// drives population initialization, selection, crossover and mutation, and
/// fitness evaluation is deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct GeneticConfig {
    pub population: usize,
    pub generations: usize,
    pub crossover_prob: f64,
    pub mutation_prob: f64,
    pub seed: Option<u64>,
}

impl Default for GeneticConfig {
    fn default() -> Self {
        Self {
            population: 50,
            generations: 50,
            crossover_prob: 0.7,
            mutation_prob: 0.2,
            seed: None,
        }
    }
}

#[derive(Debug, Clone)]
struct Individual {
    genes: Vec<ParamValue>,
    fitness: Option<Decimal>,
}

/// Evolutionary optimization over the parameter space: tournament selection,
/// uniform crossover and single-gene mutation.
pub fn genetic_search<F, S, New>(
    factory: &New,
    feed: &F,
    config: &BacktestConfig,
    objective: Objective,
    space: &ParameterSpace,
    genetic: &GeneticConfig,
) -> Result<OptimizationResult, BarlabError>
where
    F: DataFeed,
    S: Strategy,
    New: Fn() -> S,
{
    let ranges = space.ranges();
    if ranges.is_empty() {
        return Err(BarlabError::Optimization(
            "no parameter ranges defined for optimization".to_string(),
        ));
    }
    if genetic.population == 0 {
        return Err(BarlabError::Optimization(
            "population must be at least 1".to_string(),
        ));
    }

    let seed = genetic.seed.unwrap_or_else(rand::random);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    info!(
        population = genetic.population,
        generations = genetic.generations,
        seed,
        "genetic search start"
    );

    let mut population: Vec<Individual> = (0..genetic.population)
        .map(|_| Individual {
            genes: random_genes(ranges, &mut rng),
            fitness: None,
        })
        .collect();

    let mut trials: Vec<TrialResult> = Vec::new();

    for generation in 0..genetic.generations {
        evaluate_population(
            factory, feed, config, objective, ranges, &mut population, &mut trials,
        );

        // Tournament selection into the next generation.
        let mut offspring: Vec<Individual> = (0..population.len())
            .map(|_| tournament(&population, objective, &mut rng).clone())
            .collect();

        // Uniform crossover over adjacent pairs.
        for pair in offspring.chunks_mut(2) {
            if pair.len() == 2 && rng.random::<f64>() < genetic.crossover_prob {
                let (left, right) = pair.split_at_mut(1);
                crossover(&mut left[0], &mut right[0], &mut rng);
            }
        }

        // Single-gene mutation.
        for individual in offspring.iter_mut() {
            if rng.random::<f64>() < genetic.mutation_prob {
                mutate(individual, ranges, &mut rng);
            }
        }

        population = offspring;

        let best_so_far = population
            .iter()
            .filter_map(|individual| individual.fitness)
            .fold(None::<Decimal>, |best, fitness| match best {
                Some(current) if !objective.improves(fitness, current) => Some(current),
                _ => Some(fitness),
            });
        debug!(generation, best = ?best_so_far, "generation complete");
    }

    // Final fitness pass over individuals bred in the last generation.
    evaluate_population(
        factory, feed, config, objective, ranges, &mut population, &mut trials,
    );

    let best = population
        .iter()
        .reduce(|incumbent, candidate| {
            match (incumbent.fitness, candidate.fitness) {
                (Some(a), Some(b)) if objective.improves(b, a) => candidate,
                (None, Some(_)) => candidate,
                _ => incumbent,
            }
        })
        .ok_or_else(|| BarlabError::Optimization("empty population".to_string()))?;

    let best_params = genes_to_params(ranges, &best.genes);
    let best_value = best.fitness.unwrap_or_else(|| objective.sentinel());

    info!(
        best_value = %best_value,
        best_params = ?best_params,
        total_evaluations = trials.len(),
        "genetic search complete"
    );

    Ok(OptimizationResult {
        method: OptimizeMethod::Genetic,
        objective_name: objective.name().to_string(),
        total_trials: trials.len(),
        best_params,
        best_value,
        all_trials: trials,
    })
}

fn random_genes(ranges: &[ParamRange], rng: &mut ChaCha8Rng) -> Vec<ParamValue> {
    ranges
        .iter()
        .map(|range| range.values[rng.random_range(0..range.values.len())].clone())
        .collect()
}

fn genes_to_params(ranges: &[ParamRange], genes: &[ParamValue]) -> Parameters {
    ranges
        .iter()
        .zip(genes)
        .map(|(range, gene)| (range.name.clone(), gene.clone()))
        .collect()
}

/// Evaluate every individual without a fitness, recording one trial each.
fn evaluate_population<F, S, New>(
    factory: &New,
    feed: &F,
    config: &BacktestConfig,
    objective: Objective,
    ranges: &[ParamRange],
    population: &mut [Individual],
    trials: &mut Vec<TrialResult>,
) where
    F: DataFeed,
    S: Strategy,
    New: Fn() -> S,
{
    for individual in population.iter_mut() {
        if individual.fitness.is_some() {
            continue;
        }

        let params = genes_to_params(ranges, &individual.genes);
        let trial_index = trials.len();
        let trial = match evaluate_trial(factory, feed, config, objective, trial_index, &params)
        {
            Ok(trial) => trial,
            Err(err) => {
                warn!(trial_index, %err, "trial failed");
                TrialResult::failed(trial_index, params, objective)
            }
        };

        individual.fitness = Some(trial.objective_value);
        trials.push(trial);
    }
}

/// Pick the best of `TOURNAMENT_SIZE` randomly drawn individuals.
fn tournament<'p>(
    population: &'p [Individual],
    objective: Objective,
    rng: &mut ChaCha8Rng,
) -> &'p Individual {
    let mut best = &population[rng.random_range(0..population.len())];
    for _ in 1..TOURNAMENT_SIZE {
        let candidate = &population[rng.random_range(0..population.len())];
        let improves = match (candidate.fitness, best.fitness) {
            (Some(c), Some(b)) => objective.improves(c, b),
            (Some(_), None) => true,
            _ => false,
        };
        if improves {
            best = candidate;
        }
    }
    best
}

/// Swap each gene pair with probability [`GENE_SWAP_PROB`].
fn crossover(a: &mut Individual, b: &mut Individual, rng: &mut ChaCha8Rng) {
    for (gene_a, gene_b) in a.genes.iter_mut().zip(b.genes.iter_mut()) {
        if rng.random::<f64>() < GENE_SWAP_PROB {
            std::mem::swap(gene_a, gene_b);
        }
    }
    a.fitness = None;
    b.fitness = None;
}

/// Replace one random gene with a random valid value.
fn mutate(individual: &mut Individual, ranges: &[ParamRange], rng: &mut ChaCha8Rng) {
    let index = rng.random_range(0..individual.genes.len());
    individual.genes[index] =
        ranges[index].values[rng.random_range(0..ranges[index].values.len())].clone();
    individual.fitness = None;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::parameters::ParamDescriptor;

    fn ranges() -> Vec<ParamRange> {
        ParameterSpace::from_descriptors(&[
            ParamDescriptor::int("a", 1, 1, 5, 1),
            ParamDescriptor::int("b", 10, 10, 20, 5),
        ])
        .ranges()
        .to_vec()
    }

    #[test]
    fn test_random_genes_deterministic_with_seed() {
        let ranges = ranges();
        let mut rng_a = ChaCha8Rng::seed_from_u64(42);
        let mut rng_b = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..10 {
            assert_eq!(
                random_genes(&ranges, &mut rng_a),
                random_genes(&ranges, &mut rng_b)
            );
        }
    }

    #[test]
    fn test_crossover_preserves_gene_pool() {
        let ranges = ranges();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut a = Individual {
            genes: vec![ParamValue::Int(1), ParamValue::Int(10)],
            fitness: Some(Decimal::ONE),
        };
        let mut b = Individual {
            genes: vec![ParamValue::Int(5), ParamValue::Int(20)],
            fitness: Some(Decimal::ONE),
        };
        crossover(&mut a, &mut b, &mut rng);

        // Fitness invalidated, genes still drawn from the original pool.
        assert!(a.fitness.is_none() && b.fitness.is_none());
        for (i, range) in ranges.iter().enumerate() {
            assert!(range.values.contains(&a.genes[i]));
            assert!(range.values.contains(&b.genes[i]));
        }
    }

    #[test]
    fn test_mutate_stays_in_range() {
        let ranges = ranges();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut individual = Individual {
            genes: vec![ParamValue::Int(1), ParamValue::Int(10)],
            fitness: Some(Decimal::ONE),
        };
        for _ in 0..20 {
            mutate(&mut individual, &ranges, &mut rng);
            for (i, range) in ranges.iter().enumerate() {
                assert!(range.values.contains(&individual.genes[i]));
            }
        }
        assert!(individual.fitness.is_none());
    }

    #[test]
    fn test_tournament_prefers_better_fitness() {
        let population = vec![
            Individual {
                genes: vec![ParamValue::Int(1)],
                fitness: Some(Decimal::ONE),
            },
            Individual {
                genes: vec![ParamValue::Int(2)],
                fitness: Some(Decimal::TEN),
            },
        ];
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut wins = 0;
        for _ in 0..50 {
            let winner = tournament(&population, Objective::Sharpe, &mut rng);
            if winner.fitness == Some(Decimal::TEN) {
                wins += 1;
            }
        }
        // With tournament size 3 over two individuals, the better one wins
        // unless all three draws pick the worse one.
        assert!(wins > 40, "better individual won only {wins}/50");
    }
}

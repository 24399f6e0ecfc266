use crate::strategy::parameters::{ParamDescriptor, ParamValue, Parameters};
use itertools::Itertools;
use rand::Rng;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// A single parameter's discrete search range.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ParamRange {
    pub name: SmolStr,
    pub values: Vec<ParamValue>,
}

impl ParamRange {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Multi-dimensional parameter search space, derived from a strategy's
/// declaration table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ParameterSpace {
    ranges: Vec<ParamRange>,
}

impl ParameterSpace {
    pub fn new(ranges: Vec<ParamRange>) -> Self {
        Self { ranges }
    }

    pub fn from_descriptors(descriptors: &[ParamDescriptor]) -> Self {
        Self {
            ranges: descriptors
                .iter()
                .map(|descriptor| ParamRange {
                    name: descriptor.name.clone(),
                    values: descriptor.values(),
                })
                .collect(),
        }
    }

    pub fn ranges(&self) -> &[ParamRange] {
        &self.ranges
    }

    pub fn dimension_names(&self) -> Vec<SmolStr> {
        self.ranges.iter().map(|range| range.name.clone()).collect()
    }

    /// Product of all dimension sizes; zero for an empty space.
    pub fn total_combinations(&self) -> usize {
        if self.ranges.is_empty() {
            return 0;
        }
        self.ranges.iter().map(ParamRange::len).product()
    }

    /// Every combination in deterministic Cartesian order: the first
    /// declared dimension varies slowest, the last varies fastest.
    pub fn grid_sets(&self) -> Vec<Parameters> {
        if self.ranges.is_empty() {
            return vec![Parameters::new()];
        }

        self.ranges
            .iter()
            .map(|range| range.values.clone())
            .multi_cartesian_product()
            .map(|combination| {
                self.ranges
                    .iter()
                    .map(|range| range.name.clone())
                    .zip(combination)
                    .collect()
            })
            .collect()
    }

    /// One random combination, used by the evolutionary optimizer.
    pub fn random_sample(&self, rng: &mut impl Rng) -> Parameters {
        self.ranges
            .iter()
            .map(|range| {
                let value = range.values[rng.random_range(0..range.values.len())].clone();
                (range.name.clone(), value)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn space() -> ParameterSpace {
        ParameterSpace::from_descriptors(&[
            ParamDescriptor::int("fast", 2, 2, 4, 1),
            ParamDescriptor::int("slow", 4, 4, 6, 1),
        ])
    }

    #[test]
    fn test_total_combinations() {
        assert_eq!(space().total_combinations(), 9);
        assert_eq!(ParameterSpace::new(Vec::new()).total_combinations(), 0);
    }

    #[test]
    fn test_grid_order_is_deterministic() {
        let sets = space().grid_sets();
        assert_eq!(sets.len(), 9);

        // First combination takes the first value of every dimension.
        assert_eq!(sets[0].get("fast"), Some(&ParamValue::Int(2)));
        assert_eq!(sets[0].get("slow"), Some(&ParamValue::Int(4)));
        // Last dimension varies fastest.
        assert_eq!(sets[1].get("fast"), Some(&ParamValue::Int(2)));
        assert_eq!(sets[1].get("slow"), Some(&ParamValue::Int(5)));
        // Final combination.
        assert_eq!(sets[8].get("fast"), Some(&ParamValue::Int(4)));
        assert_eq!(sets[8].get("slow"), Some(&ParamValue::Int(6)));
    }

    #[test]
    fn test_empty_space_yields_single_empty_set() {
        let sets = ParameterSpace::new(Vec::new()).grid_sets();
        assert_eq!(sets.len(), 1);
        assert!(sets[0].is_empty());
    }

    #[test]
    fn test_random_sample_stays_in_range() {
        use rand::SeedableRng;
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(7);
        let space = space();
        for _ in 0..20 {
            let sample = space.random_sample(&mut rng);
            let fast = sample.get("fast").and_then(ParamValue::as_int).unwrap();
            let slow = sample.get("slow").and_then(ParamValue::as_int).unwrap();
            assert!((2..=4).contains(&fast));
            assert!((4..=6).contains(&slow));
        }
    }
}

//! Parameter record consumed by the driver. No CLI, no environment
//! variables — all configuration arrives as a single struct the caller
//! constructs and (optionally) mutates before handing it to the driver.

use crate::error::{NeatError, NeatResult};

/// Policy used to pick a species' representant for the next generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum RepresentantPolicy {
    Random,
    Champion,
}

/// Relative weights for the eight mutation operators, sampled from by
/// weighted choice.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct MutationWeights {
    pub add_link: f64,
    pub add_neuron: f64,
    pub one_weight: f64,
    pub all_weights: f64,
    pub reset_weights: f64,
    pub remove_gene: f64,
    pub reenable_gene: f64,
    pub toggle_enable: f64,
}

impl Default for MutationWeights {
    fn default() -> Self {
        MutationWeights {
            add_link: 0.08,
            add_neuron: 0.03,
            one_weight: 0.5,
            all_weights: 0.2,
            reset_weights: 0.02,
            remove_gene: 0.05,
            reenable_gene: 0.05,
            toggle_enable: 0.07,
        }
    }
}

/// Relative weights for the three crossover variants.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct CrossoverWeights {
    pub multipoint_best: f64,
    pub multipoint_rnd: f64,
    pub multipoint_avg: f64,
}

impl Default for CrossoverWeights {
    fn default() -> Self {
        CrossoverWeights {
            multipoint_best: 0.6,
            multipoint_rnd: 0.2,
            multipoint_avg: 0.2,
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct NeatParams {
    pub number_of_inputs: usize,
    pub number_of_outputs: usize,
    pub initial_population_size: usize,
    pub target_population_size: usize,

    pub compatibility_threshold: f64,
    pub dynamic_compatibility_threshold: bool,
    pub target_species_count: usize,

    pub distance_coef_c1: f64,
    pub distance_coef_c2: f64,
    pub distance_coef_c3: f64,

    pub mutation_weights: MutationWeights,
    pub crossover_weights: CrossoverWeights,

    pub initial_weight_perturbation: f64,
    pub weight_mutation_power: f64,

    pub p_crossover: f64,
    pub p_inherit_disabled: f64,
    pub p_reenable: f64,

    pub species_stagnation_cap: usize,
    pub best_genomes_library_max_size: usize,
    pub elite_threshold: usize,

    pub representant_policy: RepresentantPolicy,

    /// Fitness penalty for oversized genomes. Off by default.
    pub parsimony_enabled: bool,
    pub complexity_threshold: usize,
    pub target_complexity: usize,
    pub complexity_penalty_coefficient: f64,
    pub connections_penalty_coefficient: f64,
}

impl NeatParams {
    pub fn new(number_of_inputs: usize, number_of_outputs: usize) -> Self {
        NeatParams {
            number_of_inputs,
            number_of_outputs,
            initial_population_size: 150,
            target_population_size: 150,

            compatibility_threshold: 3.0,
            dynamic_compatibility_threshold: false,
            target_species_count: 15,

            distance_coef_c1: 1.0,
            distance_coef_c2: 1.0,
            distance_coef_c3: 0.4,

            mutation_weights: MutationWeights::default(),
            crossover_weights: CrossoverWeights::default(),

            initial_weight_perturbation: 1.0,
            weight_mutation_power: 0.5,

            p_crossover: 0.75,
            p_inherit_disabled: 0.75,
            p_reenable: 0.25,

            species_stagnation_cap: 15,
            best_genomes_library_max_size: 10,
            elite_threshold: 5,

            representant_policy: RepresentantPolicy::Random,

            parsimony_enabled: false,
            complexity_threshold: 20,
            target_complexity: 10,
            complexity_penalty_coefficient: 0.01,
            connections_penalty_coefficient: 0.001,
        }
    }

    /// Configuration is invalid when inputs or outputs are zero.
    pub fn validate(&self) -> NeatResult<()> {
        if self.number_of_inputs == 0 {
            return Err(NeatError::InvalidConfig(
                "number_of_inputs must be non-zero".into(),
            ));
        }
        if self.number_of_outputs == 0 {
            return Err(NeatError::InvalidConfig(
                "number_of_outputs must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

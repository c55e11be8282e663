//! Structural encoding of a neural network, its mutation and crossover
//! operators, and its compatibility distance.
//!
//! Genes live in a `BTreeMap<InnovationNumber, Gene>` so that "ordered,
//! sorted by innovation number, no duplicate keys" is an invariant of the
//! chosen container rather than bookkeeping every caller has to maintain.

mod crossover;
mod decode;
mod distance;
mod mutate;

use std::collections::{BTreeMap, HashSet};

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::config::NeatParams;
use crate::gene::Gene;
use crate::innovation::InnovationPool;
use crate::types::{InnovationNumber, NeuronId, Real};

pub use mutate::MutationOutcome;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Genome {
    pub input_count: usize,
    pub output_count: usize,
    genes: BTreeMap<InnovationNumber, Gene>,
    known_neurons: HashSet<NeuronId>,
    pub fitness: Real,
    pub adjusted_fitness: Real,
}

impl Genome {
    /// A genome with no genes and only the reserved neurons known.
    /// Mostly useful for tests and as a crossover scratch target.
    pub fn empty(input_count: usize, output_count: usize) -> Self {
        let mut known_neurons = HashSet::new();
        known_neurons.insert(NeuronId::BIAS);
        for i in 1..=input_count {
            known_neurons.insert(NeuronId(i as u32));
        }
        for i in 0..output_count {
            known_neurons.insert(NeuronId((input_count + 1 + i) as u32));
        }
        Genome {
            input_count,
            output_count,
            genes: BTreeMap::new(),
            known_neurons,
            fitness: 0.0,
            adjusted_fitness: 0.0,
        }
    }

    /// A seed genome with bias->output and input->output links for every
    /// output (full initial connectivity).
    pub fn seed(
        input_count: usize,
        output_count: usize,
        pool: &mut InnovationPool,
        rng: &mut dyn RngCore,
        params: &NeatParams,
    ) -> Self {
        let mut genome = Self::empty(input_count, output_count);

        let inputs: Vec<NeuronId> = (1..=input_count).map(|i| NeuronId(i as u32)).collect();
        let outputs: Vec<NeuronId> = (0..output_count)
            .map(|i| NeuronId((input_count + 1 + i) as u32))
            .collect();

        for &from in inputs.iter().chain(std::iter::once(&NeuronId::BIAS)) {
            for &to in &outputs {
                let innov = pool.link_innovation(from, to);
                let weight = rng.random_range(
                    -params.initial_weight_perturbation..=params.initial_weight_perturbation,
                );
                genome.genes.insert(innov, Gene::new(innov, from, to, weight));
            }
        }

        genome
    }

    pub fn genes(&self) -> impl Iterator<Item = &Gene> {
        self.genes.values()
    }

    pub fn gene_count(&self) -> usize {
        self.genes.len()
    }

    pub fn get_gene(&self, innov: InnovationNumber) -> Option<&Gene> {
        self.genes.get(&innov)
    }

    pub fn known_neurons(&self) -> &HashSet<NeuronId> {
        &self.known_neurons
    }

    pub fn max_innovation(&self) -> Option<InnovationNumber> {
        self.genes.keys().next_back().copied()
    }

    /// Invariant check used by tests and debug assertions: `known_neurons`
    /// is a superset of every gene endpoint, and the gene map is sorted
    /// with unique keys (guaranteed by `BTreeMap`, checked here for
    /// documentation purposes).
    pub fn well_formed(&self) -> bool {
        self.genes
            .values()
            .all(|g| self.known_neurons.contains(&g.from) && self.known_neurons.contains(&g.to))
    }

    fn insert_gene(&mut self, gene: Gene) {
        self.known_neurons.insert(gene.from);
        self.known_neurons.insert(gene.to);
        self.genes.insert(gene.innov, gene);
    }

    /// Inserts a gene with an explicit enabled flag. Used by the
    /// serialization reader, which parses the flag separately from the
    /// rest of the gene fields.
    pub(crate) fn insert_gene_with_enabled(&mut self, mut gene: Gene, enabled: bool) {
        gene.enabled = enabled;
        self.insert_gene(gene);
    }

    fn add_known_neuron(&mut self, id: NeuronId) {
        self.known_neurons.insert(id);
    }

    /// Fitness penalty based on genome complexity (node and connection
    /// count beyond a target). Off by default via
    /// `NeatParams::parsimony_enabled`.
    pub fn apply_parsimony_pressure(&self, params: &NeatParams, raw_fitness: Real) -> Real {
        if !params.parsimony_enabled || raw_fitness <= 0.0 {
            return raw_fitness;
        }
        let hidden_count = self
            .known_neurons
            .len()
            .saturating_sub(1 + self.input_count + self.output_count);
        if hidden_count <= params.complexity_threshold {
            return raw_fitness;
        }
        let excess_nodes = hidden_count.saturating_sub(params.target_complexity);
        let connection_penalty = params.connections_penalty_coefficient * self.genes.len() as f64;
        let node_penalty = if excess_nodes > 0 {
            params.complexity_penalty_coefficient * (excess_nodes as f64).powf(1.5)
        } else {
            0.0
        };
        (raw_fitness - node_penalty - connection_penalty).max(1e-5)
    }
}

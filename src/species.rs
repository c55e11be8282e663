//! A cluster of genetically compatible genomes sharing a representant.
//!
//! Members are referenced by `GenomeId` rather than owned as genome clones,
//! so that reproduction can rebuild the population's genomes without
//! leaving any species holding a dangling reference.

use rand::RngCore;

use crate::config::{NeatParams, RepresentantPolicy};
use crate::genome::Genome;
use crate::innovation::InnovationPool;
use crate::population::Population;
use crate::types::{GenomeId, Real, SpeciesId};

#[derive(Debug, Clone)]
pub struct Species {
    pub id: SpeciesId,
    /// Stored by value (a snapshot) so the species survives reproduction
    /// rebuilding the population.
    pub representant: Genome,
    pub members: Vec<GenomeId>,
    pub age: usize,
    pub stagnation_counter: usize,
    pub best_fitness_ever: Real,
    pub adjusted_fitness_sum: Real,
}

impl Species {
    pub fn new(id: SpeciesId, representant: Genome) -> Self {
        let best_fitness_ever = representant.fitness;
        Species {
            id,
            representant,
            members: Vec::new(),
            age: 0,
            stagnation_counter: 0,
            best_fitness_ever,
            adjusted_fitness_sum: 0.0,
        }
    }

    pub fn add_member(&mut self, genome_id: GenomeId) {
        self.members.push(genome_id);
    }

    pub fn is_compatible(&self, genome: &Genome, params: &NeatParams) -> bool {
        self.representant.is_compatible(genome, params)
    }

    /// Fitness sharing: each member's adjusted fitness is its raw fitness
    /// divided by the species size.
    pub fn adjust_fitnesses(&mut self, population: &mut Population) {
        let size = self.members.len().max(1) as Real;
        self.adjusted_fitness_sum = 0.0;
        for &id in &self.members {
            let genome = population.get_mut(id);
            genome.adjusted_fitness = genome.fitness / size;
            self.adjusted_fitness_sum += genome.adjusted_fitness;
        }
    }

    /// Updates stagnation bookkeeping from the current members' best raw
    /// fitness. Call once per epoch after fitnesses are assigned.
    pub fn update_stagnation(&mut self, population: &Population) {
        self.age += 1;
        let best_now = self
            .members
            .iter()
            .map(|&id| population.get(id).fitness)
            .fold(Real::NEG_INFINITY, Real::max);
        if best_now > self.best_fitness_ever {
            self.best_fitness_ever = best_now;
            self.stagnation_counter = 0;
        } else {
            self.stagnation_counter += 1;
        }
    }

    pub fn is_stagnant(&self, params: &NeatParams) -> bool {
        self.stagnation_counter > params.species_stagnation_cap
    }

    /// Proportional offspring allocation, rounded to nearest integer.
    /// Stagnant species are floored to zero unless `holds_champion` is
    /// set.
    pub fn offspring_quota(
        &self,
        total_adjusted_across_all_species: Real,
        target_population_size: usize,
        params: &NeatParams,
        holds_champion: bool,
    ) -> usize {
        if self.is_stagnant(params) && !holds_champion {
            return 0;
        }
        if total_adjusted_across_all_species <= 0.0 {
            return 0;
        }
        let share = self.adjusted_fitness_sum / total_adjusted_across_all_species
            * target_population_size as Real;
        share.round().max(0.0) as usize
    }

    fn best_member_id(&self, population: &Population) -> Option<GenomeId> {
        self.members.iter().copied().max_by(|&a, &b| {
            population
                .get(a)
                .fitness
                .partial_cmp(&population.get(b).fitness)
                .unwrap()
        })
    }

    /// Selects one member biased toward higher raw fitness (roulette
    /// selection, shifted so every weight is non-negative).
    fn select_parent(&self, population: &Population, rng: &mut dyn RngCore) -> GenomeId {
        if self.members.len() == 1 {
            return self.members[0];
        }
        let min_fitness = self
            .members
            .iter()
            .map(|&id| population.get(id).fitness)
            .fold(Real::INFINITY, Real::min);
        let shift = if min_fitness < 0.0 { -min_fitness } else { 0.0 };
        let weights: Vec<Real> = self
            .members
            .iter()
            .map(|&id| population.get(id).fitness + shift + 1e-6)
            .collect();
        let total: Real = weights.iter().sum();
        let mut draw = rng.random_range(0.0..total);
        for (i, &w) in weights.iter().enumerate() {
            if draw < w {
                return self.members[i];
            }
            draw -= w;
        }
        *self.members.last().unwrap()
    }

    /// Produces `quota` children. With probability `p_crossover`, two
    /// distinct parents are drawn and crossed; otherwise one parent is
    /// cloned. Every child is mutated unless it came from crossover and a
    /// fair coin says to skip mutation. The fittest member is copied
    /// unmodified as an elite when the quota allows and the species
    /// exceeds `elite_threshold` members.
    pub fn reproduce(
        &self,
        quota: usize,
        population: &Population,
        pool: &mut InnovationPool,
        rng: &mut dyn RngCore,
        params: &NeatParams,
    ) -> Vec<Genome> {
        if quota == 0 || self.members.is_empty() {
            return Vec::new();
        }

        let mut children = Vec::with_capacity(quota);

        if self.members.len() > params.elite_threshold {
            if let Some(best_id) = self.best_member_id(population) {
                children.push(population.get(best_id).clone());
            }
        }

        while children.len() < quota {
            let use_crossover = self.members.len() >= 2 && rng.random_bool(params.p_crossover);
            let mut child = if use_crossover {
                let a = self.select_parent(population, rng);
                let mut b = self.select_parent(population, rng);
                let mut tries = 0;
                while b == a && self.members.len() > 1 && tries < 5 {
                    b = self.select_parent(population, rng);
                    tries += 1;
                }
                let parent_a = population.get(a);
                let parent_b = population.get(b);
                parent_a.crossover(parent_b, rng, params)
            } else {
                let a = self.select_parent(population, rng);
                population.get(a).clone()
            };

            let skip_mutation = use_crossover && rng.random_bool(0.5);
            if !skip_mutation {
                child.mutate(rng, pool, params);
            }
            child.fitness = 0.0;
            child.adjusted_fitness = 0.0;
            children.push(child);
        }

        children
    }

    /// Chooses the representant for the next generation per
    /// `NeatParams::representant_policy`.
    pub fn pick_representant(
        &mut self,
        population: &Population,
        rng: &mut dyn RngCore,
        params: &NeatParams,
    ) {
        if self.members.is_empty() {
            return;
        }
        let chosen = match params.representant_policy {
            RepresentantPolicy::Random => {
                use rand::seq::IndexedRandom;
                *self.members.choose(rng).unwrap()
            }
            RepresentantPolicy::Champion => self.best_member_id(population).unwrap(),
        };
        self.representant = population.get(chosen).clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::innovation::InnovationPool;
    use rand::SeedableRng;

    fn seeded_genome(params: &NeatParams, pool: &mut InnovationPool, seed: u64) -> Genome {
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        Genome::seed(
            params.number_of_inputs,
            params.number_of_outputs,
            pool,
            &mut rng,
            params,
        )
    }

    #[test]
    fn offspring_quota_floors_stagnant_species_without_champion() {
        let params = NeatParams::new(2, 1);
        let mut pool = InnovationPool::new(4);
        let rep = seeded_genome(&params, &mut pool, 1);
        let mut species = Species::new(SpeciesId(0), rep);
        species.stagnation_counter = params.species_stagnation_cap + 1;
        assert_eq!(species.offspring_quota(10.0, 150, &params, false), 0);
        assert!(species.offspring_quota(10.0, 150, &params, true) > 0);
    }

    #[test]
    fn reproduce_respects_quota() {
        let params = NeatParams::new(2, 1);
        let mut pool = InnovationPool::new(4);
        let mut population = Population::new(Vec::new());
        let mut species = Species::new(SpeciesId(0), seeded_genome(&params, &mut pool, 1));
        for i in 0..5 {
            let mut g = seeded_genome(&params, &mut pool, 10 + i);
            g.fitness = i as f64;
            let id = population.push(g);
            species.add_member(id);
        }
        let mut rng = rand::rngs::StdRng::seed_from_u64(42);
        let children = species.reproduce(6, &population, &mut pool, &mut rng, &params);
        assert_eq!(children.len(), 6);
    }
}

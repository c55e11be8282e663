//! The NEAT epoch loop: the single owner of the innovation pool, the
//! population, every species, and the RNG threaded into every sampling
//! site in the crate.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::SeedableRng;

use tracing::{debug, info};

use crate::config::NeatParams;
use crate::error::{NeatError, NeatResult};
use crate::genome::Genome;
use crate::innovation::InnovationPool;
use crate::population::Population;
use crate::serialize::{NeatSnapshot, SpeciesSnapshot};
use crate::species::Species;
use crate::types::{GenomeId, Real, SpeciesId};

pub struct Neat {
    params: NeatParams,
    rng: StdRng,
    pool: InnovationPool,
    population: Population,
    species: Vec<Species>,
    next_species_id: usize,

    best_ever: Option<Genome>,
    best_ever_age: usize,

    /// Bounded library of structurally-distinct high performers.
    best_genomes: Vec<Genome>,
}

impl Neat {
    /// Builds an initial population: a seed genome with full initial
    /// connectivity, then `initial_population_size` copies each mutated
    /// once, all placed into a single founding species.
    #[tracing::instrument(skip(params), fields(inputs = params.number_of_inputs, outputs = params.number_of_outputs))]
    pub fn init(params: NeatParams, seed: u64) -> NeatResult<Self> {
        params.validate()?;

        let mut rng = StdRng::seed_from_u64(seed);
        let first_hidden_id = (params.number_of_inputs + params.number_of_outputs + 1) as u32;
        let mut pool = InnovationPool::new(first_hidden_id);

        let template = Genome::seed(
            params.number_of_inputs,
            params.number_of_outputs,
            &mut pool,
            &mut rng,
            &params,
        );

        let mut population = Population::new(Vec::new());
        for _ in 0..params.initial_population_size {
            let mut genome = template.clone();
            genome.mutate(&mut rng, &mut pool, &params);
            population.push(genome);
        }

        let ids: Vec<GenomeId> = population.ids().collect();
        let representant = population.get(ids[0]).clone();
        let mut species = Species::new(SpeciesId(0), representant);
        for id in ids {
            species.add_member(id);
            population.set_species(id, SpeciesId(0));
        }

        Ok(Neat {
            params,
            rng,
            pool,
            population,
            species: vec![species],
            next_species_id: 1,
            best_ever: None,
            best_ever_age: 0,
            best_genomes: Vec::new(),
        })
    }

    pub fn params(&self) -> &NeatParams {
        &self.params
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn population_mut(&mut self) -> &mut Population {
        &mut self.population
    }

    pub fn species(&self) -> &[Species] {
        &self.species
    }

    pub fn best_ever(&self) -> Option<&Genome> {
        self.best_ever.as_ref()
    }

    pub fn best_genomes_library(&self) -> &[Genome] {
        &self.best_genomes
    }

    /// Convenience evaluator dispatch: decodes and scores every genome in
    /// the current population concurrently via `rayon`, then writes each
    /// result back as that genome's raw fitness. Fitness assignment is
    /// otherwise entirely up to the caller — this is an optional helper
    /// alongside doing the same thing by hand.
    pub fn evaluate_parallel<F>(&mut self, f: F)
    where
        F: Fn(&Genome) -> Real + Sync,
    {
        use rayon::prelude::*;

        let scored: Vec<(GenomeId, Real)> = self
            .population
            .iter()
            .collect::<Vec<_>>()
            .into_par_iter()
            .map(|(id, genome)| (id, f(genome)))
            .collect();

        for (id, fitness) in scored {
            self.population.get_mut(id).fitness = fitness;
        }
    }

    /// Runs one generation. The caller must have already assigned raw
    /// fitness to every genome in `self.population()` — evaluation itself
    /// happens outside the driver, the only requirement is that it
    /// returns after setting every genome's fitness.
    #[tracing::instrument(skip(self))]
    pub fn epoch(&mut self) -> NeatResult<()> {
        if self.population.is_empty() {
            return Err(NeatError::EmptyPopulation);
        }

        // Step 2: update best-ever.
        let (champion_id, champion) = self.population.best().expect("population is non-empty");
        match &self.best_ever {
            Some(stored) if champion.fitness <= stored.fitness => {
                self.best_ever_age += 1;
            }
            _ => {
                self.best_ever = Some(champion.clone());
                self.best_ever_age = 0;
                info!(fitness = champion.fitness, "new best-ever genome");
            }
        }
        let champion_snapshot = champion.clone();

        // Step 3: maintain the bounded best-genomes library.
        self.update_best_genomes_library(&champion_snapshot);

        // Assign each genome to its species's member list for this epoch.
        self.assign_members();

        // Step 4: stagnation update and culling.
        for species in &mut self.species {
            species.update_stagnation(&self.population);
        }
        let champion_species = self.population.species_of(champion_id);
        self.species.retain(|s| {
            !s.is_stagnant(&self.params) || Some(s.id) == champion_species
        });
        if self.species.is_empty() {
            return Err(NeatError::EmptyPopulation);
        }

        // Step 5: adjusted fitnesses and offspring quotas.
        for species in &mut self.species {
            species.adjust_fitnesses(&mut self.population);
        }
        let total_adjusted: Real = self.species.iter().map(|s| s.adjusted_fitness_sum).sum();
        let quotas = self.offspring_quotas(total_adjusted, champion_species);

        // Step 6: reproduce.
        let mut children = Vec::with_capacity(self.params.target_population_size);
        for (species, &quota) in self.species.iter().zip(quotas.iter()) {
            let offspring = species.reproduce(
                quota,
                &self.population,
                &mut self.pool,
                &mut self.rng,
                &self.params,
            );
            children.extend(offspring);
        }
        // Guard against rounding shortfall: top up from the global
        // champion so the population never collapses.
        while children.len() < self.params.target_population_size {
            let mut clone = champion_snapshot.clone();
            clone.mutate(&mut self.rng, &mut self.pool, &self.params);
            children.push(clone);
        }
        children.truncate(self.params.target_population_size);

        self.population.replace_all(children);

        // Step 7: re-speciate.
        self.speciate();

        // Step 8: rotate representants.
        for species in &mut self.species {
            species.pick_representant(&self.population, &mut self.rng, &self.params);
        }

        if self.params.dynamic_compatibility_threshold {
            self.adjust_compatibility_threshold();
        }

        debug!(species = self.species.len(), "epoch complete");
        Ok(())
    }

    fn assign_members(&mut self) {
        for species in &mut self.species {
            species.members.clear();
        }
        self.speciate_ids(self.population.ids().collect());
    }

    fn update_best_genomes_library(&mut self, champion: &Genome) {
        let already_present = self
            .best_genomes
            .iter()
            .any(|g| structurally_equal(g, champion));
        if already_present {
            return;
        }
        if self.best_genomes.len() < self.params.best_genomes_library_max_size {
            self.best_genomes.push(champion.clone());
            return;
        }
        let worst_idx = self
            .best_genomes
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.fitness.partial_cmp(&b.fitness).unwrap())
            .map(|(i, _)| i);
        if let Some(idx) = worst_idx {
            if self.best_genomes[idx].fitness < champion.fitness {
                self.best_genomes[idx] = champion.clone();
            }
        }
    }

    /// Proportional offspring allocation across all species, distributing
    /// any rounding remainder to the fittest species.
    fn offspring_quotas(
        &self,
        total_adjusted: Real,
        champion_species: Option<SpeciesId>,
    ) -> Vec<usize> {
        let mut quotas: Vec<usize> = self
            .species
            .iter()
            .map(|s| {
                s.offspring_quota(
                    total_adjusted,
                    self.params.target_population_size,
                    &self.params,
                    champion_species == Some(s.id),
                )
            })
            .collect();

        let allocated: usize = quotas.iter().sum();
        if allocated < self.params.target_population_size {
            let remainder = self.params.target_population_size - allocated;
            if let Some((fittest_idx, _)) = self
                .species
                .iter()
                .enumerate()
                .max_by(|(_, a), (_, b)| {
                    a.adjusted_fitness_sum
                        .partial_cmp(&b.adjusted_fitness_sum)
                        .unwrap()
                })
            {
                quotas[fittest_idx] += remainder;
            }
        }
        quotas
    }

    /// Places every genome into the first compatible existing species (by
    /// its stored representant), else founds a new one. Emptied species
    /// are dropped.
    fn speciate(&mut self) {
        for species in &mut self.species {
            species.members.clear();
        }
        self.speciate_ids(self.population.ids().collect());
        self.species.retain(|s| !s.members.is_empty());
    }

    fn speciate_ids(&mut self, ids: Vec<GenomeId>) {
        'genome: for id in ids {
            let genome = self.population.get(id).clone();
            for species in &mut self.species {
                if species.is_compatible(&genome, &self.params) {
                    species.add_member(id);
                    self.population.set_species(id, species.id);
                    continue 'genome;
                }
            }
            let new_id = SpeciesId(self.next_species_id);
            self.next_species_id += 1;
            let mut new_species = Species::new(new_id, genome);
            new_species.add_member(id);
            self.population.set_species(id, new_id);
            self.species.push(new_species);
        }
    }

    /// Captures the full logical state needed to resume a run later. The
    /// RNG's internal state is deliberately not part of the snapshot —
    /// `from_snapshot` seeds a fresh generator instead.
    pub fn to_snapshot(&self) -> NeatSnapshot {
        let mut genomes: Vec<(GenomeId, Genome)> =
            self.population.iter().map(|(id, g)| (id, g.clone())).collect();
        genomes.sort_by_key(|(id, _)| id.0);
        let index_of: HashMap<GenomeId, usize> = genomes
            .iter()
            .enumerate()
            .map(|(i, (id, _))| (*id, i))
            .collect();

        let species = self
            .species
            .iter()
            .map(|s| SpeciesSnapshot {
                id: s.id.0,
                representant: s.representant.clone(),
                member_indices: s.members.iter().map(|id| index_of[id]).collect(),
                age: s.age,
                stagnation_counter: s.stagnation_counter,
                best_fitness_ever: s.best_fitness_ever,
                adjusted_fitness_sum: s.adjusted_fitness_sum,
            })
            .collect();

        NeatSnapshot {
            params: self.params.clone(),
            next_species_id: self.next_species_id,
            best_ever_age: self.best_ever_age,
            best_ever: self.best_ever.clone(),
            species,
            best_genomes: self.best_genomes.clone(),
            pool: self.pool.clone(),
            genomes: genomes.into_iter().map(|(_, g)| g).collect(),
        }
    }

    /// Rebuilds a driver from a snapshot, seeding a fresh generator —
    /// continuing an evolutionary run after a restart is deterministic
    /// from the restart point forward, not bit-identical to the original
    /// unbroken run.
    pub fn from_snapshot(snapshot: NeatSnapshot, seed: u64) -> NeatResult<Self> {
        snapshot.params.validate()?;

        let mut population = Population::new(Vec::new());
        for genome in snapshot.genomes {
            population.push(genome);
        }

        let mut species = Vec::with_capacity(snapshot.species.len());
        for s in snapshot.species {
            let species_id = SpeciesId(s.id);
            let mut sp = Species::new(species_id, s.representant);
            sp.age = s.age;
            sp.stagnation_counter = s.stagnation_counter;
            sp.best_fitness_ever = s.best_fitness_ever;
            sp.adjusted_fitness_sum = s.adjusted_fitness_sum;
            for idx in s.member_indices {
                sp.add_member(GenomeId(idx));
                population.set_species(GenomeId(idx), species_id);
            }
            species.push(sp);
        }

        Ok(Neat {
            params: snapshot.params,
            rng: StdRng::seed_from_u64(seed),
            pool: snapshot.pool,
            population,
            species,
            next_species_id: snapshot.next_species_id,
            best_ever: snapshot.best_ever,
            best_ever_age: snapshot.best_ever_age,
            best_genomes: snapshot.best_genomes,
        })
    }

    /// Grows the compatibility threshold when there are too many species,
    /// shrinks it when there are too few, nudging species count toward
    /// `target_species_count` over time.
    fn adjust_compatibility_threshold(&mut self) {
        let target = self.params.target_species_count;
        let current = self.species.len();
        if current > target * 2 {
            self.params.compatibility_threshold *= 1.3;
        } else if current < target / 2 {
            self.params.compatibility_threshold *= 0.95;
        }
    }
}

/// Two genomes are structurally equal when they share the same set of
/// gene innovations with the same enabled flags; weights are allowed to
/// differ.
fn structurally_equal(a: &Genome, b: &Genome) -> bool {
    if a.gene_count() != b.gene_count() {
        return false;
    }
    a.genes().all(|ga| {
        b.get_gene(ga.innov)
            .map(|gb| gb.enabled == ga.enabled)
            .unwrap_or(false)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xor_rows() -> [([Real; 2], Real); 4] {
        [
            ([0.0, 0.0], 0.0),
            ([0.0, 1.0], 1.0),
            ([1.0, 0.0], 1.0),
            ([1.0, 1.0], 0.0),
        ]
    }

    fn evaluate_xor(neat: &mut Neat) {
        use crate::network::{FeedforwardNetwork, NeuralNetwork};

        let ids: Vec<GenomeId> = neat.population().ids().collect();
        for id in ids {
            let genome = neat.population().get(id).clone();
            let mut net = FeedforwardNetwork::new();
            genome.decode(&mut net);
            net.finalize();

            let mut error = 0.0;
            for (inputs, target) in xor_rows() {
                let out = net.activate(&inputs).unwrap();
                error += (target - out[0]).powi(2);
            }
            neat.population_mut().get_mut(id).fitness = 4.0 - error;
        }
    }

    #[test]
    fn epoch_runs_and_tracks_a_best_ever_genome() {
        let mut params = NeatParams::new(2, 1);
        params.initial_population_size = 50;
        params.target_population_size = 50;
        let mut neat = Neat::init(params, 1).unwrap();

        for _ in 0..5 {
            evaluate_xor(&mut neat);
            neat.epoch().unwrap();
        }

        assert!(neat.best_ever().is_some());
        assert!(!neat.population().is_empty());
    }

    #[test]
    fn init_rejects_invalid_config() {
        let params = NeatParams::new(0, 1);
        assert!(Neat::init(params, 1).is_err());
    }

    #[test]
    fn evaluate_parallel_assigns_fitness_to_every_genome() {
        use crate::network::{FeedforwardNetwork, NeuralNetwork};

        let mut params = NeatParams::new(2, 1);
        params.initial_population_size = 20;
        params.target_population_size = 20;
        let mut neat = Neat::init(params, 2).unwrap();

        neat.evaluate_parallel(|genome| {
            let mut net = FeedforwardNetwork::new();
            genome.decode(&mut net);
            net.finalize();
            let mut error = 0.0;
            for (inputs, target) in xor_rows() {
                let out = net.activate(&inputs).unwrap();
                error += (target - out[0]).powi(2);
            }
            4.0 - error
        });

        assert!(neat.population().iter().all(|(_, g)| g.fitness > 0.0));
    }
}

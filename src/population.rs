//! Stable-id storage for the current generation's genomes, plus the
//! reverse mapping from a genome to the species it currently belongs to.

use std::collections::HashMap;

use crate::genome::Genome;
use crate::types::{GenomeId, SpeciesId};

#[derive(Debug, Clone, Default)]
pub struct Population {
    genomes: HashMap<GenomeId, Genome>,
    next_id: usize,
    species_of: HashMap<GenomeId, SpeciesId>,
}

impl Population {
    pub fn new(genomes: Vec<Genome>) -> Self {
        let mut population = Population {
            genomes: HashMap::new(),
            next_id: 0,
            species_of: HashMap::new(),
        };
        for genome in genomes {
            population.push(genome);
        }
        population
    }

    /// Inserts a genome under a freshly allocated id.
    pub fn push(&mut self, genome: Genome) -> GenomeId {
        let id = GenomeId(self.next_id);
        self.next_id += 1;
        self.genomes.insert(id, genome);
        id
    }

    pub fn get(&self, id: GenomeId) -> &Genome {
        self.genomes
            .get(&id)
            .expect("GenomeId must reference a live genome in this population")
    }

    pub fn get_mut(&mut self, id: GenomeId) -> &mut Genome {
        self.genomes
            .get_mut(&id)
            .expect("GenomeId must reference a live genome in this population")
    }

    pub fn len(&self) -> usize {
        self.genomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genomes.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = GenomeId> + '_ {
        self.genomes.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (GenomeId, &Genome)> {
        self.genomes.iter().map(|(&id, g)| (id, g))
    }

    /// The genome with the highest raw fitness, if any genomes exist.
    pub fn best(&self) -> Option<(GenomeId, &Genome)> {
        self.genomes
            .iter()
            .max_by(|(_, a), (_, b)| a.fitness.partial_cmp(&b.fitness).unwrap())
            .map(|(&id, g)| (id, g))
    }

    /// Records which species `id` currently belongs to. Called whenever
    /// speciation assigns a genome to a species.
    pub fn set_species(&mut self, id: GenomeId, species: SpeciesId) {
        self.species_of.insert(id, species);
    }

    /// The species `id` was last assigned to, if any.
    pub fn species_of(&self, id: GenomeId) -> Option<SpeciesId> {
        self.species_of.get(&id).copied()
    }

    /// Replaces the whole generation with `genomes`, reassigning ids from
    /// zero and clearing species assignments (the next speciation pass
    /// rebuilds them). Used by the driver between epochs once reproduction
    /// has produced the next generation's children.
    pub fn replace_all(&mut self, genomes: Vec<Genome>) {
        self.genomes.clear();
        self.species_of.clear();
        self.next_id = 0;
        for genome in genomes {
            self.push(genome);
        }
    }
}

//! The eight mutation operators, selected by weighted sampling with up to
//! two further attempts on failure.

use rand::seq::IteratorRandom;
use rand::RngCore;

use super::Genome;
use crate::config::NeatParams;
use crate::gene::Gene;
use crate::innovation::InnovationPool;
use crate::types::NeuronId;

/// Whether a mutation attempt changed the genome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    Applied,
    NoLegalTarget,
}

/// Picks an index into `weights` by weighted sampling. Falls back to the
/// last index if all weights are zero (defensive; params are expected to
/// carry at least one positive weight).
fn weighted_pick(weights: &[f64], rng: &mut dyn RngCore) -> usize {
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return weights.len() - 1;
    }
    let mut draw = rng.random_range(0.0..total);
    for (i, &w) in weights.iter().enumerate() {
        if draw < w {
            return i;
        }
        draw -= w;
    }
    weights.len() - 1
}

impl Genome {
    /// Attempt one mutation, retrying with a fresh operator draw up to two
    /// more times if the chosen operator has no legal target. If all
    /// attempts fail the genome is left unchanged and no error is raised.
    pub fn mutate(
        &mut self,
        rng: &mut dyn RngCore,
        pool: &mut InnovationPool,
        params: &NeatParams,
    ) -> MutationOutcome {
        for _ in 0..3 {
            if self.mutate_once(rng, pool, params) == MutationOutcome::Applied {
                return MutationOutcome::Applied;
            }
        }
        MutationOutcome::NoLegalTarget
    }

    fn mutate_once(
        &mut self,
        rng: &mut dyn RngCore,
        pool: &mut InnovationPool,
        params: &NeatParams,
    ) -> MutationOutcome {
        let w = &params.mutation_weights;
        let weights = [
            w.add_link,
            w.add_neuron,
            w.one_weight,
            w.all_weights,
            w.reset_weights,
            w.remove_gene,
            w.reenable_gene,
            w.toggle_enable,
        ];
        match weighted_pick(&weights, rng) {
            0 => self.mutate_add_link(rng, pool, params),
            1 => self.mutate_add_neuron(rng, pool, params),
            2 => self.mutate_one_weight(rng, params),
            3 => self.mutate_all_weights(rng, params),
            4 => self.mutate_reset_weights(rng, params),
            5 => self.mutate_remove_gene(rng),
            6 => self.mutate_reenable_gene(rng),
            _ => self.mutate_toggle_enable(rng),
        }
    }

    fn mutate_add_link(
        &mut self,
        rng: &mut dyn RngCore,
        pool: &mut InnovationPool,
        params: &NeatParams,
    ) -> MutationOutcome {
        let from = *self.known_neurons.iter().choose(rng).unwrap();
        let to = match self
            .known_neurons
            .iter()
            .filter(|&&n| !self.is_input_or_bias(n))
            .choose(rng)
        {
            Some(&to) => to,
            None => return MutationOutcome::NoLegalTarget,
        };

        if self.genes.values().any(|g| g.from == from && g.to == to) {
            return MutationOutcome::NoLegalTarget;
        }

        let innov = if let Some(canonical) = pool.find_gene(from, to) {
            canonical.innov
        } else {
            pool.link_innovation(from, to)
        };
        let weight = rng
            .random_range(-params.initial_weight_perturbation..=params.initial_weight_perturbation);
        self.insert_gene(Gene::new(innov, from, to, weight));
        MutationOutcome::Applied
    }

    fn mutate_add_neuron(
        &mut self,
        rng: &mut dyn RngCore,
        pool: &mut InnovationPool,
        _params: &NeatParams,
    ) -> MutationOutcome {
        let chosen_innov = match self
            .genes
            .values()
            .filter(|g| g.enabled)
            .map(|g| g.innov)
            .choose(rng)
        {
            Some(innov) => innov,
            None => return MutationOutcome::NoLegalTarget,
        };

        let (from, to, weight) = {
            let gene = self.genes.get_mut(&chosen_innov).unwrap();
            gene.enabled = false;
            (gene.from, gene.to, gene.weight)
        };

        let (innov_in, innov_out, new_neuron_id) = pool.split_innovation(from, to);
        self.add_known_neuron(new_neuron_id);
        self.insert_gene(Gene::new(innov_in, from, new_neuron_id, weight));
        self.insert_gene(Gene::new(innov_out, new_neuron_id, to, weight));
        MutationOutcome::Applied
    }

    fn mutate_one_weight(&mut self, rng: &mut dyn RngCore, params: &NeatParams) -> MutationOutcome {
        let innov = match self.genes.keys().copied().choose(rng) {
            Some(i) => i,
            None => return MutationOutcome::NoLegalTarget,
        };
        let power = params.weight_mutation_power;
        let gene = self.genes.get_mut(&innov).unwrap();
        gene.weight += rng.random_range(-power..=power);
        MutationOutcome::Applied
    }

    fn mutate_all_weights(&mut self, rng: &mut dyn RngCore, params: &NeatParams) -> MutationOutcome {
        let power = params.weight_mutation_power;
        for gene in self.genes.values_mut() {
            gene.weight += rng.random_range(-power..=power);
        }
        MutationOutcome::Applied
    }

    fn mutate_reset_weights(
        &mut self,
        rng: &mut dyn RngCore,
        params: &NeatParams,
    ) -> MutationOutcome {
        let bound = params.initial_weight_perturbation;
        for gene in self.genes.values_mut() {
            gene.weight = rng.random_range(-bound..=bound);
        }
        MutationOutcome::Applied
    }

    fn mutate_remove_gene(&mut self, rng: &mut dyn RngCore) -> MutationOutcome {
        let innov = match self.genes.keys().copied().choose(rng) {
            Some(i) => i,
            None => return MutationOutcome::NoLegalTarget,
        };
        // known_neurons is intentionally left unpruned here: a removed
        // gene may leave a neuron dangling; decoding tolerates
        // unreferenced neurons.
        self.genes.remove(&innov);
        MutationOutcome::Applied
    }

    fn mutate_reenable_gene(&mut self, rng: &mut dyn RngCore) -> MutationOutcome {
        let innov = match self
            .genes
            .values()
            .filter(|g| !g.enabled)
            .map(|g| g.innov)
            .choose(rng)
        {
            Some(i) => i,
            None => return MutationOutcome::NoLegalTarget,
        };
        self.genes.get_mut(&innov).unwrap().enabled = true;
        MutationOutcome::Applied
    }

    fn mutate_toggle_enable(&mut self, rng: &mut dyn RngCore) -> MutationOutcome {
        let innov = match self.genes.keys().copied().choose(rng) {
            Some(i) => i,
            None => return MutationOutcome::NoLegalTarget,
        };
        let gene = self.genes.get_mut(&innov).unwrap();
        gene.enabled = !gene.enabled;
        MutationOutcome::Applied
    }

    fn is_input_or_bias(&self, id: NeuronId) -> bool {
        id == NeuronId::BIAS || (1..=self.input_count as u32).contains(&id.get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::InnovationNumber;
    use rand::SeedableRng;

    fn rng() -> rand::rngs::StdRng {
        rand::rngs::StdRng::seed_from_u64(7)
    }

    #[test]
    fn mutation_preserves_known_neurons_superset_invariant() {
        let params = NeatParams::new(2, 1);
        let mut pool = InnovationPool::new(4);
        let mut r = rng();
        let mut genome = Genome::seed(2, 1, &mut pool, &mut r, &params);
        for _ in 0..50 {
            genome.mutate(&mut r, &mut pool, &params);
            assert!(genome.well_formed());
        }
    }

    #[test]
    fn add_link_reuses_innovation_across_genomes() {
        let params = NeatParams::new(2, 1);
        let mut pool = InnovationPool::new(4);
        let mut r = rng();
        let from = NeuronId(1);
        let to = NeuronId(3);

        let mut a = Genome::empty(2, 1);
        let outcome_a = a.mutate_add_link_for_test(&mut r, &mut pool, &params, from, to);
        let mut b = Genome::empty(2, 1);
        let outcome_b = b.mutate_add_link_for_test(&mut r, &mut pool, &params, from, to);

        assert_eq!(outcome_a, MutationOutcome::Applied);
        assert_eq!(outcome_b, MutationOutcome::Applied);

        let innov_a = a.genes.values().next().unwrap().innov;
        let innov_b = b.genes.values().next().unwrap().innov;
        assert_eq!(innov_a, innov_b);
    }

    #[test]
    fn add_neuron_splits_gene_with_shared_weight() {
        let mut pool = InnovationPool::new(10);
        let mut genome = Genome::empty(2, 1);
        let innov = InnovationNumber(0);
        genome.insert_gene(Gene::new(innov, NeuronId(2), NeuronId(5), 0.7));
        let mut r = rng();
        let params = NeatParams::new(2, 1);
        let outcome = genome.mutate_add_neuron(&mut r, &mut pool, &params);
        assert_eq!(outcome, MutationOutcome::Applied);

        assert!(!genome.get_gene(innov).unwrap().enabled);
        let new_genes: Vec<&Gene> = genome
            .genes()
            .filter(|g| g.innov != innov)
            .collect();
        assert_eq!(new_genes.len(), 2);
        assert!(new_genes.iter().all(|g| g.weight == 0.7));
        let new_node = new_genes
            .iter()
            .find(|g| g.from == NeuronId(2))
            .unwrap()
            .to;
        assert!(new_genes.iter().any(|g| g.from == new_node && g.to == NeuronId(5)));
    }
}

#[cfg(test)]
impl Genome {
    /// Test-only helper exercising `mutate_add_link` against a specific
    /// (from, to) pair, bypassing the random endpoint selection.
    fn mutate_add_link_for_test(
        &mut self,
        rng: &mut dyn RngCore,
        pool: &mut InnovationPool,
        params: &NeatParams,
        from: NeuronId,
        to: NeuronId,
    ) -> MutationOutcome {
        if self.genes.values().any(|g| g.from == from && g.to == to) {
            return MutationOutcome::NoLegalTarget;
        }
        let innov = if let Some(canonical) = pool.find_gene(from, to) {
            canonical.innov
        } else {
            pool.link_innovation(from, to)
        };
        let weight = rng
            .random_range(-params.initial_weight_perturbation..=params.initial_weight_perturbation);
        self.insert_gene(Gene::new(innov, from, to, weight));
        MutationOutcome::Applied
    }
}

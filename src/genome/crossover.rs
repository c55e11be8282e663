//! The three crossover variants, selected by weighted sampling: matching
//! genes are inherited by coin flip or averaged, disjoint and excess
//! genes are taken from the fitter parent (or either, on a fitness tie).

use rand::RngCore;

use super::Genome;
use crate::config::NeatParams;
use crate::gene::Gene;
use crate::types::InnovationNumber;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Variant {
    Best,
    Rnd,
    Avg,
}

fn pick_variant(params: &NeatParams, rng: &mut dyn RngCore) -> Variant {
    let w = &params.crossover_weights;
    let total = w.multipoint_best + w.multipoint_rnd + w.multipoint_avg;
    let mut draw = if total > 0.0 {
        rng.random_range(0.0..total)
    } else {
        0.0
    };
    if draw < w.multipoint_best {
        return Variant::Best;
    }
    draw -= w.multipoint_best;
    if draw < w.multipoint_rnd {
        return Variant::Rnd;
    }
    Variant::Avg
}

/// A matching pair, or a single-parent (disjoint/excess) gene together
/// with whether it came from the fitter side.
enum Pairing<'a> {
    Matching(&'a Gene, &'a Gene),
    Single(&'a Gene, bool),
}

impl Genome {
    pub fn crossover(&self, other: &Genome, rng: &mut dyn RngCore, params: &NeatParams) -> Genome {
        let equal_fitness = (self.fitness - other.fitness).abs() < f64::EPSILON;
        let (fitter, weaker) = if equal_fitness {
            (self, other)
        } else if self.fitness > other.fitness {
            (self, other)
        } else {
            (other, self)
        };

        let variant = pick_variant(params, rng);
        let mut child = Genome::empty(self.input_count, self.output_count);

        let mut all_innovations: Vec<InnovationNumber> = fitter
            .genes
            .keys()
            .chain(weaker.genes.keys())
            .copied()
            .collect();
        all_innovations.sort();
        all_innovations.dedup();

        for innov in all_innovations {
            let pairing = match (fitter.genes.get(&innov), weaker.genes.get(&innov)) {
                (Some(a), Some(b)) => Pairing::Matching(a, b),
                (Some(a), None) => Pairing::Single(a, true),
                (None, Some(b)) => {
                    if equal_fitness {
                        Pairing::Single(b, false)
                    } else {
                        // Disjoint/excess of the weaker parent only: not
                        // inherited unless fitness is tied.
                        continue;
                    }
                }
                (None, None) => unreachable!(),
            };

            let (from, to, weight, disabled_in_either) = match pairing {
                Pairing::Matching(a, b) => {
                    let weight = match variant {
                        Variant::Best => a.weight,
                        Variant::Rnd => {
                            if rng.random_bool(0.5) {
                                a.weight
                            } else {
                                b.weight
                            }
                        }
                        Variant::Avg => (a.weight + b.weight) / 2.0,
                    };
                    (a.from, a.to, weight, !a.enabled || !b.enabled)
                }
                Pairing::Single(g, _) => (g.from, g.to, g.weight, !g.enabled),
            };

            let enabled = resolve_enabled(disabled_in_either, params, rng);
            child.insert_gene(Gene::new(innov, from, to, weight));
            if !enabled {
                child.genes.get_mut(&innov).unwrap().enabled = false;
            }
        }

        child
    }
}

fn resolve_enabled(disabled_in_either: bool, params: &NeatParams, rng: &mut dyn RngCore) -> bool {
    if !disabled_in_either {
        return true;
    }
    let mut enabled = !rng.random_bool(params.p_inherit_disabled.clamp(0.0, 1.0));
    if !enabled && rng.random_bool(params.p_reenable.clamp(0.0, 1.0)) {
        enabled = true;
    }
    enabled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::innovation::InnovationPool;
    use crate::types::NeuronId;
    use rand::SeedableRng;

    #[test]
    fn every_child_gene_traces_to_a_parent_innovation() {
        let params = NeatParams::new(2, 1);
        let mut pool = InnovationPool::new(4);
        let mut rng = rand::rngs::StdRng::seed_from_u64(3);

        let mut a = Genome::seed(2, 1, &mut pool, &mut rng, &params);
        a.fitness = 2.0;
        let mut b = Genome::seed(2, 1, &mut pool, &mut rng, &params);
        b.fitness = 1.0;
        b.mutate(&mut rng, &mut pool, &params);

        let child = a.crossover(&b, &mut rng, &params);

        for gene in child.genes() {
            let in_a = a.get_gene(gene.innov).is_some();
            let in_b = b.get_gene(gene.innov).is_some();
            assert!(in_a || in_b);
        }
        assert!(child.well_formed());
    }

    #[test]
    fn multipoint_avg_averages_matching_weights() {
        let mut params = NeatParams::new(2, 1);
        params.crossover_weights.multipoint_best = 0.0;
        params.crossover_weights.multipoint_rnd = 0.0;
        params.crossover_weights.multipoint_avg = 1.0;

        let mut pool = InnovationPool::new(10);
        let innov = pool.link_innovation(NeuronId(1), NeuronId(4));

        let mut a = Genome::empty(2, 1);
        a.insert_gene(Gene::new(innov, NeuronId(1), NeuronId(4), 1.0));
        a.fitness = 1.0;
        let mut b = Genome::empty(2, 1);
        b.insert_gene(Gene::new(innov, NeuronId(1), NeuronId(4), 3.0));
        b.fitness = 1.0;

        let mut rng = rand::rngs::StdRng::seed_from_u64(9);
        let child = a.crossover(&b, &mut rng, &params);
        assert_eq!(child.get_gene(innov).unwrap().weight, 2.0);
    }
}

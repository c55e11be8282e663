//! Compatibility distance between two genomes, used to decide species
//! membership.

use super::Genome;
use crate::config::NeatParams;

impl Genome {
    /// Distance = `c1*excess/N + c2*disjoint/N + c3*avg_weight_diff`.
    /// `N` is the size of the larger gene set; if `N <= 4` the genomes are
    /// small enough that they are defined to be at distance 0.
    pub fn distance(&self, other: &Genome, params: &NeatParams) -> f64 {
        let n = self.genes.len().max(other.genes.len());
        if n <= 4 {
            return 0.0;
        }

        let max_innov_self = self.genes.keys().next_back().map(|i| i.get());
        let max_innov_other = other.genes.keys().next_back().map(|i| i.get());

        let mut matching = 0usize;
        let mut disjoint = 0usize;
        let mut excess = 0usize;
        let mut weight_diff_sum = 0.0f64;

        let mut self_iter = self.genes.iter().peekable();
        let mut other_iter = other.genes.iter().peekable();

        loop {
            match (self_iter.peek(), other_iter.peek()) {
                (Some((&ia, ga)), Some((&ib, gb))) => {
                    if ia == ib {
                        matching += 1;
                        weight_diff_sum += (ga.weight - gb.weight).abs();
                        self_iter.next();
                        other_iter.next();
                    } else if ia < ib {
                        classify(ia.get(), max_innov_other, &mut disjoint, &mut excess);
                        self_iter.next();
                    } else {
                        classify(ib.get(), max_innov_self, &mut disjoint, &mut excess);
                        other_iter.next();
                    }
                }
                (Some((&ia, _)), None) => {
                    classify(ia.get(), max_innov_other, &mut disjoint, &mut excess);
                    self_iter.next();
                }
                (None, Some((&ib, _))) => {
                    classify(ib.get(), max_innov_self, &mut disjoint, &mut excess);
                    other_iter.next();
                }
                (None, None) => break,
            }
        }

        let avg_weight_diff = if matching > 0 {
            weight_diff_sum / matching as f64
        } else {
            0.0
        };

        let n = n as f64;
        params.distance_coef_c1 * (excess as f64) / n
            + params.distance_coef_c2 * (disjoint as f64) / n
            + params.distance_coef_c3 * avg_weight_diff
    }

    pub fn is_compatible(&self, other: &Genome, params: &NeatParams) -> bool {
        self.distance(other, params) < params.compatibility_threshold
    }
}

/// A gene present in only one parent is "excess" if its innovation lies
/// beyond the other parent's maximum, else "disjoint".
fn classify(innov: u32, other_max: Option<u32>, disjoint: &mut usize, excess: &mut usize) {
    match other_max {
        Some(max) if innov > max => *excess += 1,
        _ => *disjoint += 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gene::Gene;
    use crate::types::{InnovationNumber, NeuronId};

    fn genome_from_innovs(innovs: &[u32]) -> Genome {
        let mut g = Genome::empty(2, 1);
        for &i in innovs {
            g.genes.insert(
                InnovationNumber(i),
                Gene::new(InnovationNumber(i), NeuronId(1), NeuronId(2), 0.0),
            );
        }
        g
    }

    #[test]
    fn distance_is_symmetric() {
        let params = NeatParams::new(2, 1);
        let a = genome_from_innovs(&[1, 2, 3, 5, 8, 11]);
        let b = genome_from_innovs(&[1, 2, 4, 5, 9, 10, 12]);
        assert_eq!(a.distance(&b, &params), b.distance(&a, &params));
    }

    #[test]
    fn small_genomes_are_not_discriminated() {
        let params = NeatParams::new(2, 1);
        let a = genome_from_innovs(&[1, 2]);
        let b = genome_from_innovs(&[1, 2, 3, 99]);
        assert_eq!(a.distance(&b, &params), 0.0);
    }

    #[test]
    fn disjoint_and_excess_are_counted_correctly() {
        // A={1,2,3,5,8}, B={1,2,4,5,9,10}
        // matching={1,2,5}, disjoint={3,4}, excess={8,9,10}, N=6
        let mut params = NeatParams::new(2, 1);
        params.distance_coef_c1 = 1.0;
        params.distance_coef_c2 = 1.0;
        params.distance_coef_c3 = 1.0;

        let a = genome_from_innovs(&[1, 2, 3, 5, 8]);
        let b = genome_from_innovs(&[1, 2, 4, 5, 9, 10]);
        let d = a.distance(&b, &params);
        assert!((d - (3.0 / 6.0 + 2.0 / 6.0)).abs() < 1e-9);
    }
}

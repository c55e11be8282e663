//! One-shot translation from genome to executable network. Disabled genes
//! are omitted; hidden neurons are allocated in ascending numeric order,
//! which matches their allocation order from the innovation pool.

use std::collections::HashMap;

use crate::network::{NetNeuronId, NetworkBuilder, NodeKind};
use crate::types::NeuronId;

use super::Genome;

impl Genome {
    /// Writes this genome's structure into `builder`, returning the
    /// genome-neuron-id -> network-neuron-id mapping.
    pub fn decode<B: NetworkBuilder>(&self, builder: &mut B) -> HashMap<NeuronId, NetNeuronId> {
        let mut mapping = HashMap::new();
        mapping.insert(NeuronId::BIAS, builder.bias_neuron());

        for i in 1..=self.input_count {
            let id = NeuronId(i as u32);
            mapping.insert(id, builder.add_neuron(NodeKind::Input));
        }
        for i in 0..self.output_count {
            let id = NeuronId((self.input_count + 1 + i) as u32);
            mapping.insert(id, builder.add_neuron(NodeKind::Output));
        }

        let reserved = 1 + self.input_count + self.output_count;
        let mut hidden: Vec<NeuronId> = self
            .known_neurons()
            .iter()
            .copied()
            .filter(|id| id.get() as usize >= reserved)
            .collect();
        hidden.sort();
        for id in hidden {
            mapping.insert(id, builder.add_neuron(NodeKind::Hidden));
        }

        for gene in self.genes() {
            if !gene.enabled {
                continue;
            }
            let from = mapping[&gene.from];
            let to = mapping[&gene.to];
            builder.add_link(from, to, gene.weight);
        }

        mapping
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NeatParams;
    use crate::innovation::InnovationPool;
    use crate::network::FeedforwardNetwork;
    use rand::SeedableRng;

    #[test]
    fn decoded_network_activates() {
        let params = NeatParams::new(2, 1);
        let mut pool = InnovationPool::new(4);
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        let genome = Genome::seed(2, 1, &mut pool, &mut rng, &params);

        let mut net = FeedforwardNetwork::new();
        genome.decode(&mut net);
        net.finalize();

        use crate::network::NeuralNetwork;
        let out = net.activate(&[1.0, 0.0]).unwrap();
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn disabled_genes_are_omitted_from_decode() {
        let mut genome = Genome::empty(1, 1);
        let mut pool = InnovationPool::new(4);
        let innov = pool.link_innovation(NeuronId(1), NeuronId(2));
        genome.insert_gene(crate::gene::Gene::new(innov, NeuronId(1), NeuronId(2), 5.0));
        genome
            .get_gene_mut_for_test(innov)
            .enabled = false;

        let mut net = FeedforwardNetwork::new();
        genome.decode(&mut net);
        net.finalize();
        use crate::network::NeuralNetwork;
        let out = net.activate(&[1.0]).unwrap();
        // With the only link disabled, output should just be sigmoid(0).
        assert!((out[0] - crate::network::sigmoid(0.0)).abs() < 1e-9);
    }
}

#[cfg(test)]
impl Genome {
    fn get_gene_mut_for_test(&mut self, innov: crate::types::InnovationNumber) -> &mut crate::gene::Gene {
        self.genes.get_mut(&innov).unwrap()
    }
}

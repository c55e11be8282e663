//! Process-wide (per-run) bookkeeping that assigns globally consistent
//! innovation numbers and hidden-neuron ids to structural changes, so that
//! two genomes which independently introduce "the same" structural change
//! end up with compatible gene indices.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::gene::Gene;
use crate::types::{InnovationNumber, NeuronId};

/// Key used to deduplicate innovations: which kind of structural event,
/// on which directed pair of *genome*-level neurons (for `NewNeuron` this
/// is the edge being split, not the new neuron's endpoints).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
enum InnovationKey {
    NewLink(NeuronId, NeuronId),
    NewNeuron(NeuronId, NeuronId),
}

/// A record of one structural event, keyed and deduplicated by the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InnovationRecord {
    NewLink {
        innov: InnovationNumber,
        from: NeuronId,
        to: NeuronId,
    },
    NewNeuron {
        innov_in: InnovationNumber,
        innov_out: InnovationNumber,
        from: NeuronId,
        to: NeuronId,
        new_neuron_id: NeuronId,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InnovationPool {
    next_innovation: u32,
    next_hidden_neuron: u32,
    /// First-occurrence canonical gene for a directed pair. Its weight
    /// field is meaningless — consumers re-randomise it on reuse.
    gene_registry: HashMap<(NeuronId, NeuronId), Gene>,
    innovation_registry: HashMap<InnovationKey, InnovationRecord>,
}

impl InnovationPool {
    /// `first_hidden_id` should be `input_count + output_count + 1` (the
    /// bias neuron occupies id 0, inputs occupy `1..=input_count`, outputs
    /// occupy `input_count+1..=input_count+output_count`).
    pub fn new(first_hidden_id: u32) -> Self {
        InnovationPool {
            next_innovation: 0,
            next_hidden_neuron: first_hidden_id,
            gene_registry: HashMap::new(),
            innovation_registry: HashMap::new(),
        }
    }

    pub fn next_innovation(&mut self) -> InnovationNumber {
        let id = self.next_innovation;
        self.next_innovation += 1;
        InnovationNumber(id)
    }

    pub fn next_hidden_neuron(&mut self) -> NeuronId {
        let id = self.next_hidden_neuron;
        self.next_hidden_neuron += 1;
        NeuronId(id)
    }

    pub fn find_gene(&self, from: NeuronId, to: NeuronId) -> Option<Gene> {
        self.gene_registry.get(&(from, to)).copied()
    }

    /// Idempotent by `(from, to)`: the first registration wins, later
    /// registrations for the same pair are silently ignored.
    pub fn register_gene(&mut self, gene: Gene) {
        self.gene_registry
            .entry((gene.from, gene.to))
            .or_insert(gene);
    }

    pub fn find_new_link(&self, from: NeuronId, to: NeuronId) -> Option<InnovationRecord> {
        self.innovation_registry
            .get(&InnovationKey::NewLink(from, to))
            .copied()
    }

    pub fn find_new_neuron(&self, from: NeuronId, to: NeuronId) -> Option<InnovationRecord> {
        self.innovation_registry
            .get(&InnovationKey::NewNeuron(from, to))
            .copied()
    }

    /// Idempotent by `(kind, from, to)`: first write wins.
    pub fn register_innovation(&mut self, record: InnovationRecord) {
        let key = match record {
            InnovationRecord::NewLink { from, to, .. } => InnovationKey::NewLink(from, to),
            InnovationRecord::NewNeuron { from, to, .. } => InnovationKey::NewNeuron(from, to),
        };
        self.innovation_registry.entry(key).or_insert(record);
    }

    /// Allocate (or reuse) the innovation number for a plain link mutation
    /// between `from` and `to`, registering both the canonical gene and the
    /// `NewLink` innovation record on first use.
    pub fn link_innovation(&mut self, from: NeuronId, to: NeuronId) -> InnovationNumber {
        if let Some(InnovationRecord::NewLink { innov, .. }) = self.find_new_link(from, to) {
            return innov;
        }
        let innov = self.next_innovation();
        self.register_innovation(InnovationRecord::NewLink { innov, from, to });
        self.register_gene(Gene::new(innov, from, to, 0.0));
        innov
    }

    /// Allocate (or reuse) the pair of innovation numbers and the new
    /// hidden-neuron id produced by splitting the edge `(from, to)`.
    pub fn split_innovation(
        &mut self,
        from: NeuronId,
        to: NeuronId,
    ) -> (InnovationNumber, InnovationNumber, NeuronId) {
        if let Some(InnovationRecord::NewNeuron {
            innov_in,
            innov_out,
            new_neuron_id,
            ..
        }) = self.find_new_neuron(from, to)
        {
            return (innov_in, innov_out, new_neuron_id);
        }
        let new_neuron_id = self.next_hidden_neuron();
        let innov_in = self.next_innovation();
        let innov_out = self.next_innovation();
        self.register_innovation(InnovationRecord::NewNeuron {
            innov_in,
            innov_out,
            from,
            to,
            new_neuron_id,
        });
        self.register_gene(Gene::new(innov_in, from, new_neuron_id, 0.0));
        self.register_gene(Gene::new(innov_out, new_neuron_id, to, 0.0));
        (innov_in, innov_out, new_neuron_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn innovation_counter_is_strictly_increasing() {
        let mut pool = InnovationPool::new(4);
        let a = pool.next_innovation();
        let b = pool.next_innovation();
        assert!(b.get() > a.get());
    }

    #[test]
    fn hidden_neuron_counter_is_strictly_increasing() {
        let mut pool = InnovationPool::new(4);
        let a = pool.next_hidden_neuron();
        let b = pool.next_hidden_neuron();
        assert!(b.get() > a.get());
    }

    #[test]
    fn link_innovation_is_reused_for_same_pair() {
        let mut pool = InnovationPool::new(4);
        let a = NeuronId(1);
        let b = NeuronId(3);
        let first = pool.link_innovation(a, b);
        let second = pool.link_innovation(a, b);
        assert_eq!(first, second);
    }

    #[test]
    fn split_innovation_is_reused_for_same_edge() {
        let mut pool = InnovationPool::new(4);
        let a = NeuronId(2);
        let b = NeuronId(5);
        let (in1, out1, node1) = pool.split_innovation(a, b);
        let (in2, out2, node2) = pool.split_innovation(a, b);
        assert_eq!(in1, in2);
        assert_eq!(out1, out2);
        assert_eq!(node1, node2);
    }

    #[test]
    fn find_gene_after_register_gene_returns_same_innovation() {
        let mut pool = InnovationPool::new(4);
        let innov = pool.next_innovation();
        let gene = Gene::new(innov, NeuronId(1), NeuronId(4), 0.5);
        pool.register_gene(gene);
        let found = pool.find_gene(NeuronId(1), NeuronId(4)).unwrap();
        assert_eq!(found.innov, innov);
    }
}

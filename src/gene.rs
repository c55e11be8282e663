//! Atomic structural edge between two neurons.

use crate::types::{InnovationNumber, NeuronId, Real};
use serde::{Deserialize, Serialize};

/// A directed, weighted synapse. `from == to` is permitted (self-loop).
/// `to` is never an input or bias neuron — the mutation generator enforces
/// this, the type itself does not.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gene {
    pub innov: InnovationNumber,
    pub from: NeuronId,
    pub to: NeuronId,
    pub weight: Real,
    pub enabled: bool,
}

impl Gene {
    pub fn new(innov: InnovationNumber, from: NeuronId, to: NeuronId, weight: Real) -> Self {
        Gene {
            innov,
            from,
            to,
            weight,
            enabled: true,
        }
    }

    pub fn endpoint_pair(&self) -> (NeuronId, NeuronId) {
        (self.from, self.to)
    }
}

//! Primitive identifiers shared across the crate.

use std::fmt;

/// The floating point type used for weights and fitness throughout the crate.
pub type Real = f64;

/// Identifier for a neuron within a genome.
///
/// Id `0` is reserved for the bias neuron. Ids `1..=input_count` are inputs,
/// `input_count+1..=input_count+output_count` are outputs, and everything
/// above that is a hidden neuron allocated by the innovation pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct NeuronId(pub u32);

impl NeuronId {
    pub const BIAS: NeuronId = NeuronId(0);

    pub fn new(id: u32) -> Self {
        NeuronId(id)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NeuronId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonically increasing identifier for a structural innovation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct InnovationNumber(pub u32);

impl InnovationNumber {
    pub fn new(id: u32) -> Self {
        InnovationNumber(id)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for InnovationNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier for a genome within a single generation's population.
///
/// Stable within a generation only — the driver reassigns ids when it
/// replaces the population at the end of an epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GenomeId(pub usize);

/// Identifier for a species, allocated monotonically for the life of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct SpeciesId(pub usize);

impl fmt::Display for SpeciesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

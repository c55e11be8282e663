//! A NEAT (NeuroEvolution of Augmenting Topologies) engine core: genome
//! encoding and its mutation/crossover operators, a run-scoped innovation
//! pool, speciation, and the epoch-driven evolutionary loop. Network
//! evaluation, persistence format, and configuration loading sit behind
//! narrow boundaries (`NetworkBuilder`/`NeuralNetwork`, `serialize`,
//! `config`) rather than inside the core algorithms.

pub mod config;
pub mod error;
pub mod gene;
pub mod genome;
pub mod innovation;
pub mod network;
pub mod population;
pub mod serialize;
pub mod species;
pub mod types;

mod driver;

pub use config::{CrossoverWeights, MutationWeights, NeatParams, RepresentantPolicy};
pub use driver::Neat;
pub use error::{NeatError, NeatResult};
pub use gene::Gene;
pub use genome::{Genome, MutationOutcome};
pub use innovation::InnovationPool;
pub use network::{
    CtrnnNetwork, FeedforwardNetwork, NetNeuronId, NetworkBuilder, NeuralNetwork, NodeKind,
};
pub use population::Population;
pub use serialize::NeatSnapshot;
pub use species::Species;
pub use types::{GenomeId, InnovationNumber, NeuronId, Real, SpeciesId};

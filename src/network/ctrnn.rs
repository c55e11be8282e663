//! Continuous-Time Recurrent Neural Network decoder, offered alongside
//! `FeedforwardNetwork` behind the same `NeuralNetwork` boundary:
//! Euler-integrated leaky integrator neurons, sigmoid applied to source
//! states.

use crate::error::NetworkError;
use crate::types::Real;

use super::{NetNeuronId, NetworkBuilder, NeuralNetwork, NodeKind};

pub struct CtrnnNetwork {
    states: Vec<Real>,
    time_constants: Vec<Real>,
    biases: Vec<Real>,
    bias_node: NetNeuronId,
    inputs: Vec<NetNeuronId>,
    outputs: Vec<NetNeuronId>,
    connections: Vec<(NetNeuronId, NetNeuronId, Real)>,
    dt: Real,
}

impl CtrnnNetwork {
    pub fn new() -> Self {
        let mut net = CtrnnNetwork {
            states: Vec::new(),
            time_constants: Vec::new(),
            biases: Vec::new(),
            bias_node: NetNeuronId(0),
            inputs: Vec::new(),
            outputs: Vec::new(),
            connections: Vec::new(),
            dt: 0.1,
        };
        net.bias_node = net.push_node();
        net
    }

    fn push_node(&mut self) -> NetNeuronId {
        let id = NetNeuronId(self.states.len());
        self.states.push(0.0);
        self.time_constants.push(1.0);
        self.biases.push(0.0);
        id
    }

    pub fn with_time_step(mut self, dt: Real) -> Self {
        self.dt = dt;
        self
    }

    pub fn set_time_constant(&mut self, node: NetNeuronId, tau: Real) {
        self.time_constants[node.0] = tau;
    }

    pub fn set_bias(&mut self, node: NetNeuronId, bias: Real) {
        self.biases[node.0] = bias;
    }

    fn is_input(&self, id: NetNeuronId) -> bool {
        id == self.bias_node || self.inputs.contains(&id)
    }
}

impl NetworkBuilder for CtrnnNetwork {
    fn bias_neuron(&self) -> NetNeuronId {
        self.bias_node
    }

    fn add_neuron(&mut self, kind: NodeKind) -> NetNeuronId {
        let id = self.push_node();
        match kind {
            NodeKind::Input => self.inputs.push(id),
            NodeKind::Output => self.outputs.push(id),
            NodeKind::Hidden => {}
        }
        id
    }

    fn add_link(&mut self, from: NetNeuronId, to: NetNeuronId, weight: Real) {
        self.connections.push((from, to, weight));
    }
}

impl NeuralNetwork for CtrnnNetwork {
    fn activate(&mut self, inputs: &[Real]) -> Result<Vec<Real>, NetworkError> {
        if inputs.len() != self.inputs.len() {
            return Err(NetworkError::InvalidInput(format!(
                "expected {} inputs, got {}",
                self.inputs.len(),
                inputs.len()
            )));
        }
        for (i, &v) in inputs.iter().enumerate() {
            self.states[self.inputs[i].0] = v;
        }
        self.states[self.bias_node.0] = 1.0;

        let mut next_states = self.states.clone();
        for id in 0..self.states.len() {
            let node = NetNeuronId(id);
            if self.is_input(node) {
                continue;
            }
            let mut weighted_input = self.biases[id];
            for &(from, to, weight) in &self.connections {
                if to == node {
                    weighted_input += super::sigmoid(self.states[from.0]) * weight;
                }
            }
            let tau = self.time_constants[id];
            let dy_dt = (-self.states[id] + weighted_input) / tau;
            next_states[id] = self.states[id] + dy_dt * self.dt;
        }
        self.states = next_states;

        Ok(self
            .outputs
            .iter()
            .map(|&id| super::sigmoid(self.states[id.0]))
            .collect())
    }
}

impl Default for CtrnnNetwork {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settles_toward_driven_input() {
        let mut net = CtrnnNetwork::new().with_time_step(0.5);
        let input = net.add_neuron(NodeKind::Input);
        let output = net.add_neuron(NodeKind::Output);
        net.add_link(input, output, 1.0);

        let mut last = 0.0;
        for _ in 0..200 {
            let out = net.activate(&[1.0]).unwrap();
            last = out[0];
        }
        assert!(last > 0.5);
    }
}

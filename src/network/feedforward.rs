//! Feed-forward decoder: a Kahn's-algorithm topological sort over the
//! decoded graph, ignoring any connection that would close a cycle.

use std::collections::{HashMap, VecDeque};

use crate::error::NetworkError;
use crate::types::Real;

use super::{sigmoid, NetNeuronId, NetworkBuilder, NeuralNetwork, NodeKind};

struct NetNode {
    kind: NodeKind,
}

pub struct FeedforwardNetwork {
    nodes: Vec<NetNode>,
    bias: NetNeuronId,
    inputs: Vec<NetNeuronId>,
    outputs: Vec<NetNeuronId>,
    /// Adjacency as (from, to, weight); built during decode.
    links: Vec<(NetNeuronId, NetNeuronId, Real)>,
    sorted: Vec<NetNeuronId>,
    incoming: HashMap<NetNeuronId, Vec<(NetNeuronId, Real)>>,
}

impl FeedforwardNetwork {
    pub fn new() -> Self {
        let mut net = FeedforwardNetwork {
            nodes: Vec::new(),
            bias: NetNeuronId(0),
            inputs: Vec::new(),
            outputs: Vec::new(),
            links: Vec::new(),
            sorted: Vec::new(),
            incoming: HashMap::new(),
        };
        net.bias = net.push_node(NodeKind::Input);
        net
    }

    fn push_node(&mut self, kind: NodeKind) -> NetNeuronId {
        let id = NetNeuronId(self.nodes.len());
        self.nodes.push(NetNode { kind });
        id
    }

    /// Finalizes the adjacency structures and computes a topological
    /// order, dropping any edge that would close a cycle. Must be called
    /// once decoding (via `NetworkBuilder`) is complete and before
    /// `activate`.
    pub fn finalize(&mut self) {
        let mut out_edges: HashMap<NetNeuronId, Vec<(NetNeuronId, Real)>> = HashMap::new();
        let mut in_degree: HashMap<NetNeuronId, usize> = HashMap::new();
        for i in 0..self.nodes.len() {
            in_degree.insert(NetNeuronId(i), 0);
            out_edges.insert(NetNeuronId(i), Vec::new());
        }
        for &(from, to, weight) in &self.links {
            out_edges.get_mut(&from).unwrap().push((to, weight));
            *in_degree.get_mut(&to).unwrap() += 1;
        }

        let mut working = out_edges.clone();
        let mut queue: VecDeque<NetNeuronId> = in_degree
            .iter()
            .filter(|&(_, &deg)| deg == 0)
            .map(|(&id, _)| id)
            .collect();

        let mut sorted = Vec::with_capacity(self.nodes.len());
        let mut incoming: HashMap<NetNeuronId, Vec<(NetNeuronId, Real)>> = HashMap::new();
        for i in 0..self.nodes.len() {
            incoming.insert(NetNeuronId(i), Vec::new());
        }

        while let Some(node) = queue.pop_front() {
            sorted.push(node);
            let edges = working.get(&node).unwrap().clone();
            for (to, weight) in edges {
                incoming.get_mut(&to).unwrap().push((node, weight));
                let deg = in_degree.get_mut(&to).unwrap();
                *deg -= 1;
                if *deg == 0 {
                    queue.push_back(to);
                }
            }
            working.get_mut(&node).unwrap().clear();
        }
        // Nodes left out of `sorted` sit on a cycle; their incoming edges
        // from within the cycle are simply never evaluated.

        self.sorted = sorted;
        self.incoming = incoming;
    }
}

impl NetworkBuilder for FeedforwardNetwork {
    fn bias_neuron(&self) -> NetNeuronId {
        self.bias
    }

    fn add_neuron(&mut self, kind: NodeKind) -> NetNeuronId {
        let id = self.push_node(kind);
        match kind {
            NodeKind::Input => self.inputs.push(id),
            NodeKind::Output => self.outputs.push(id),
            NodeKind::Hidden => {}
        }
        id
    }

    fn add_link(&mut self, from: NetNeuronId, to: NetNeuronId, weight: Real) {
        self.links.push((from, to, weight));
    }
}

impl NeuralNetwork for FeedforwardNetwork {
    fn activate(&mut self, inputs: &[Real]) -> Result<Vec<Real>, NetworkError> {
        if inputs.len() != self.inputs.len() {
            return Err(NetworkError::InvalidInput(format!(
                "expected {} inputs, got {}",
                self.inputs.len(),
                inputs.len()
            )));
        }

        let mut values = vec![0.0; self.nodes.len()];
        for (i, &id) in self.inputs.iter().enumerate() {
            values[id.0] = inputs[i];
        }
        values[self.bias.0] = 1.0;

        for &id in &self.sorted {
            if self.inputs.contains(&id) || id == self.bias {
                continue;
            }
            let sum: Real = self.incoming[&id]
                .iter()
                .map(|&(from, weight)| values[from.0] * weight)
                .sum();
            values[id.0] = sigmoid(sum);
        }

        Ok(self.outputs.iter().map(|&id| values[id.0]).collect())
    }
}

impl Default for FeedforwardNetwork {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_and_activates_a_simple_network() {
        let mut net = FeedforwardNetwork::new();
        let bias = net.bias_neuron();
        let input = net.add_neuron(NodeKind::Input);
        let output = net.add_neuron(NodeKind::Output);
        net.add_link(input, output, 1.0);
        net.add_link(bias, output, 0.0);
        net.finalize();

        let out = net.activate(&[1.0]).unwrap();
        assert_eq!(out.len(), 1);
        assert!(out[0] > 0.5);
    }

    #[test]
    fn rejects_wrong_input_length() {
        let mut net = FeedforwardNetwork::new();
        net.add_neuron(NodeKind::Input);
        net.add_neuron(NodeKind::Output);
        net.finalize();
        assert!(net.activate(&[]).is_err());
    }
}

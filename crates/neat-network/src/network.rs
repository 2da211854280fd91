// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Phenotype Network
//!
//! Arena-backed directed graph. Nodes and links are stored in flat vectors;
//! every node keeps the arena indices of its incoming and outgoing links,
//! and `link_ends` caches the arena indices of each link's endpoints.
//!
//! ## Activation
//!
//! ```text
//! repeat until every output has fired at least once (and at least once):
//!     pass 1: for each neuron
//!               sum = Σ weight × source output
//!                     (delayed links read the previous-step value)
//!               active = any non-delayed source is active or a sensor
//!     pass 2: for each active neuron
//!               shift history, activation = f(sum), count += 1
//! ```

use crate::error::{NetworkError, NetworkResult};
use crate::link::Link;
use crate::node::{NNode, NeuronType};
use crate::NodeId;
use ahash::AHashMap;
use tracing::{debug, trace};

/// Relaxation passes allowed before activation is reported as a loop
pub const DEFAULT_MAX_ACTIVATION_ATTEMPTS: usize = 20;

/// Recursion ceiling for depth computation
pub const DEFAULT_MAX_DEPTH: usize = 100;

#[derive(Debug, Clone)]
pub struct Network {
    /// Id of the genome this network was built from
    pub id: usize,
    nodes: Vec<NNode>,
    links: Vec<Link>,
    /// (source, target) arena indices per link
    link_ends: Vec<(usize, usize)>,
    /// Sensors (inputs and bias) in genome order
    inputs: Vec<usize>,
    outputs: Vec<usize>,
    index: AHashMap<NodeId, usize>,
    max_activation_attempts: usize,
    max_depth: usize,
}

impl Network {
    /// Build a network from phenotype nodes and links, wiring link indices
    pub fn new(id: usize, nodes: Vec<NNode>, links: Vec<Link>) -> NetworkResult<Self> {
        let mut nodes = nodes;
        let mut index = AHashMap::with_capacity(nodes.len());
        let mut inputs = Vec::new();
        let mut outputs = Vec::new();

        for (i, node) in nodes.iter_mut().enumerate() {
            if index.insert(node.id, i).is_some() {
                return Err(NetworkError::DuplicateNode(node.id));
            }
            node.incoming.clear();
            node.outgoing.clear();
            if node.is_sensor() {
                inputs.push(i);
            } else if node.neuron_type == NeuronType::Output {
                outputs.push(i);
            }
        }

        let mut link_ends = Vec::with_capacity(links.len());
        for (li, link) in links.iter().enumerate() {
            let src = *index
                .get(&link.in_node)
                .ok_or(NetworkError::NodeNotFound(link.in_node))?;
            let dst = *index
                .get(&link.out_node)
                .ok_or(NetworkError::NodeNotFound(link.out_node))?;
            nodes[src].outgoing.push(li);
            nodes[dst].incoming.push(li);
            link_ends.push((src, dst));
        }

        trace!(
            target: "neat-network",
            "Built network {}: {} nodes, {} links, {} inputs, {} outputs",
            id,
            nodes.len(),
            links.len(),
            inputs.len(),
            outputs.len()
        );

        Ok(Self {
            id,
            nodes,
            links,
            link_ends,
            inputs,
            outputs,
            index,
            max_activation_attempts: DEFAULT_MAX_ACTIVATION_ATTEMPTS,
            max_depth: DEFAULT_MAX_DEPTH,
        })
    }

    pub fn with_limits(mut self, max_activation_attempts: usize, max_depth: usize) -> Self {
        self.max_activation_attempts = max_activation_attempts.max(1);
        self.max_depth = max_depth;
        self
    }

    pub fn nodes(&self) -> &[NNode] {
        &self.nodes
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn node(&self, id: NodeId) -> Option<&NNode> {
        self.index.get(&id).map(|&i| &self.nodes[i])
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Node count plus link count
    pub fn complexity(&self) -> usize {
        self.nodes.len() + self.links.len()
    }

    /// Number of sensors, bias included
    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    pub fn outputs(&self) -> impl Iterator<Item = &NNode> {
        self.outputs.iter().map(move |&i| &self.nodes[i])
    }

    pub fn output_values(&self) -> Vec<f64> {
        self.outputs().map(|n| n.activation).collect()
    }

    /// True while any output has never fired
    pub fn output_is_off(&self) -> bool {
        self.outputs
            .iter()
            .any(|&i| self.nodes[i].activations_count == 0)
    }

    /// Load sensor values in sensor order.
    ///
    /// Accepts one value per sensor. As a convenience it also accepts one
    /// value per input neuron, in which case bias sensors are loaded with
    /// 1.0. Any other length is `SensorCountMismatch`.
    pub fn load_sensors(&mut self, values: &[f64]) -> NetworkResult<()> {
        if values.len() == self.inputs.len() {
            for (&i, &v) in self.inputs.iter().zip(values) {
                self.nodes[i].sensor_load(v);
            }
            return Ok(());
        }

        let input_neurons = self
            .inputs
            .iter()
            .filter(|&&i| self.nodes[i].neuron_type == NeuronType::Input)
            .count();
        if values.len() != input_neurons {
            return Err(NetworkError::SensorCountMismatch {
                expected: self.inputs.len(),
                actual: values.len(),
            });
        }

        let mut values = values.iter();
        for &i in &self.inputs {
            let node = &mut self.nodes[i];
            let v = if node.neuron_type == NeuronType::Input {
                values.next().copied().unwrap_or(0.0)
            } else {
                1.0
            };
            node.sensor_load(v);
        }
        Ok(())
    }

    /// Propagate activation until every output has fired
    pub fn activate(&mut self) -> NetworkResult<()> {
        let mut attempts = 0;
        let mut one_time = false;

        while self.output_is_off() || !one_time {
            if attempts >= self.max_activation_attempts {
                debug!(
                    target: "neat-network",
                    "Network {} did not settle after {} attempts", self.id, attempts
                );
                return Err(NetworkError::ActivationLoop {
                    network_id: self.id,
                    attempts,
                });
            }
            attempts += 1;

            for i in 0..self.nodes.len() {
                if !self.nodes[i].is_neuron() {
                    continue;
                }
                let mut sum = 0.0;
                let mut active = false;
                for &li in &self.nodes[i].incoming {
                    let link = &self.links[li];
                    let src = &self.nodes[self.link_ends[li].0];
                    if link.is_delayed() {
                        sum += link.weight * src.active_out_delayed();
                    } else {
                        sum += link.weight * src.active_out();
                        if src.is_active || src.is_sensor() {
                            active = true;
                        }
                    }
                }
                let node = &mut self.nodes[i];
                node.activation_sum = sum;
                node.is_active = active;
            }

            for node in self
                .nodes
                .iter_mut()
                .filter(|n| n.is_neuron() && n.is_active)
            {
                node.fire();
            }

            one_time = true;
        }
        Ok(())
    }

    /// Activate `steps` times in a row
    pub fn forward_steps(&mut self, steps: usize) -> NetworkResult<()> {
        for _ in 0..steps {
            self.activate()?;
        }
        Ok(())
    }

    /// Zero the activation history of every node
    pub fn flush(&mut self) {
        for node in &mut self.nodes {
            node.flushback();
        }
    }

    pub fn flush_check(&self) -> NetworkResult<()> {
        self.nodes.iter().try_for_each(|n| n.flushback_check())
    }

    /// Longest path from any output back to a sensor
    pub fn max_depth(&self) -> NetworkResult<usize> {
        let mut max = 0;
        for &o in &self.outputs {
            max = max.max(self.depth(o, 0)?);
        }
        Ok(max)
    }

    fn depth(&self, node: usize, d: usize) -> NetworkResult<usize> {
        if d > self.max_depth {
            return Err(NetworkError::DepthLoop {
                ceiling: self.max_depth,
            });
        }
        if self.nodes[node].is_sensor() {
            return Ok(d);
        }
        let mut max = d;
        for &li in &self.nodes[node].incoming {
            max = max.max(self.depth(self.link_ends[li].0, d + 1)?);
        }
        Ok(max)
    }

    /// Whether a link `in_id -> out_id` would close a cycle.
    ///
    /// Walks backwards from `in_id` through non-recurrent incoming links;
    /// `count` is incremented on every visit and the walk gives up (returns
    /// false) once it exceeds `thresh`.
    pub fn is_recurrent(
        &self,
        in_id: NodeId,
        out_id: NodeId,
        count: &mut usize,
        thresh: usize,
    ) -> bool {
        match (self.index.get(&in_id), self.index.get(&out_id)) {
            (Some(&i), Some(&o)) => self.is_recurrent_idx(i, o, count, thresh),
            _ => false,
        }
    }

    fn is_recurrent_idx(&self, in_idx: usize, out_idx: usize, count: &mut usize, thresh: usize) -> bool {
        *count += 1;
        if *count > thresh {
            return false;
        }
        if in_idx == out_idx {
            return true;
        }
        self.nodes[in_idx].incoming.iter().any(|&li| {
            !self.links[li].is_recurrent
                && self.is_recurrent_idx(self.link_ends[li].0, out_idx, count, thresh)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::ActivationType;

    fn three_input_network() -> Network {
        let nodes = vec![
            NNode::new(1, NeuronType::Input),
            NNode::new(2, NeuronType::Input),
            NNode::new(3, NeuronType::Input),
            NNode::new(4, NeuronType::Bias),
            NNode::new(5, NeuronType::Output),
        ];
        let links = vec![
            Link::new(1.5, 1, 5, false),
            Link::new(2.5, 2, 5, false),
            Link::new(3.5, 3, 5, false),
        ];
        Network::new(1, nodes, links).unwrap()
    }

    #[test]
    fn test_activate_single_layer() {
        let mut net = three_input_network();
        net.load_sensors(&[1.0, 1.0, 1.0, 0.5]).unwrap();
        net.activate().unwrap();

        let expected = 1.0 / (1.0 + (-4.924273f64 * 7.5).exp());
        let out = net.output_values();
        assert_eq!(out.len(), 1);
        assert!((out[0] - expected).abs() < 1e-12);
    }

    #[test]
    fn test_load_sensors_defaults_bias() {
        let mut net = three_input_network();
        net.load_sensors(&[0.0, 0.0, 0.0]).unwrap();
        assert_eq!(net.node(4).unwrap().activation, 1.0);

        let err = net.load_sensors(&[1.0, 2.0]).unwrap_err();
        assert_eq!(
            err,
            NetworkError::SensorCountMismatch {
                expected: 4,
                actual: 2
            }
        );
    }

    #[test]
    fn test_flush_resets_and_reactivates_identically() {
        let mut net = three_input_network();
        net.load_sensors(&[0.3, 0.6, 0.9, 1.0]).unwrap();
        net.activate().unwrap();
        let first = net.output_values();

        assert!(net.flush_check().is_err());
        net.flush();
        net.flush_check().unwrap();

        net.load_sensors(&[0.3, 0.6, 0.9, 1.0]).unwrap();
        net.activate().unwrap();
        assert_eq!(net.output_values(), first);
    }

    #[test]
    fn test_disconnected_output_loops() {
        let nodes = vec![
            NNode::new(1, NeuronType::Input),
            NNode::new(2, NeuronType::Output),
        ];
        let mut net = Network::new(7, nodes, vec![]).unwrap();
        net.load_sensors(&[1.0]).unwrap();
        let err = net.activate().unwrap_err();
        assert!(err.is_loop());
        assert_eq!(
            err,
            NetworkError::ActivationLoop {
                network_id: 7,
                attempts: DEFAULT_MAX_ACTIVATION_ATTEMPTS
            }
        );
    }

    #[test]
    fn test_ceiling_allows_exactly_max_passes() {
        let mut net = three_input_network().with_limits(1, 100);
        net.load_sensors(&[1.0, 1.0, 1.0, 0.5]).unwrap();
        net.activate().unwrap();

        // output listed before the hidden node only fires on the second pass
        let nodes = || {
            vec![
                NNode::new(1, NeuronType::Input),
                NNode::new(2, NeuronType::Output),
                NNode::new(3, NeuronType::Hidden),
            ]
        };
        let links = || vec![Link::new(1.0, 1, 3, false), Link::new(1.0, 3, 2, false)];

        let mut net = Network::new(3, nodes(), links()).unwrap().with_limits(2, 100);
        net.load_sensors(&[1.0]).unwrap();
        net.activate().unwrap();

        let mut net = Network::new(3, nodes(), links()).unwrap().with_limits(1, 100);
        net.load_sensors(&[1.0]).unwrap();
        assert_eq!(
            net.activate().unwrap_err(),
            NetworkError::ActivationLoop {
                network_id: 3,
                attempts: 1
            }
        );
    }

    #[test]
    fn test_hidden_layer_takes_two_passes() {
        let nodes = vec![
            NNode::new(1, NeuronType::Input),
            NNode::new(2, NeuronType::Hidden).with_activation(ActivationType::Linear),
            NNode::new(3, NeuronType::Output).with_activation(ActivationType::Linear),
        ];
        let links = vec![Link::new(2.0, 1, 2, false), Link::new(3.0, 2, 3, false)];
        let mut net = Network::new(1, nodes, links).unwrap();
        net.load_sensors(&[1.0]).unwrap();

        // the output fires in the same pass as the hidden node, before the
        // hidden value has propagated
        net.activate().unwrap();
        assert_eq!(net.output_values(), vec![0.0]);

        net.activate().unwrap();
        assert!((net.output_values()[0] - 6.0).abs() < 1e-12);
        assert_eq!(net.max_depth().unwrap(), 2);
    }

    #[test]
    fn test_recurrent_link_reads_previous_step() {
        let nodes = vec![
            NNode::new(1, NeuronType::Input),
            NNode::new(2, NeuronType::Output).with_activation(ActivationType::Linear),
        ];
        let links = vec![Link::new(1.0, 1, 2, false), Link::new(1.0, 2, 2, true)];
        let mut net = Network::new(1, nodes, links).unwrap();

        net.load_sensors(&[1.0]).unwrap();
        net.activate().unwrap();
        assert_eq!(net.output_values(), vec![1.0]);

        // second step: count is 1 so the self loop still reads 0
        net.load_sensors(&[1.0]).unwrap();
        net.activate().unwrap();
        assert_eq!(net.output_values(), vec![1.0]);

        net.load_sensors(&[1.0]).unwrap();
        net.activate().unwrap();
        assert_eq!(net.output_values(), vec![2.0]);
    }

    #[test]
    fn test_is_recurrent_detects_cycle() {
        let nodes = vec![
            NNode::new(1, NeuronType::Input),
            NNode::new(2, NeuronType::Hidden),
            NNode::new(3, NeuronType::Output),
        ];
        let links = vec![Link::new(1.0, 1, 2, false), Link::new(1.0, 2, 3, false)];
        let net = Network::new(1, nodes, links).unwrap();
        let thresh = net.node_count() * net.node_count();

        let mut count = 0;
        assert!(net.is_recurrent(3, 2, &mut count, thresh));
        let mut count = 0;
        assert!(!net.is_recurrent(1, 3, &mut count, thresh));
        let mut count = 0;
        assert!(net.is_recurrent(2, 2, &mut count, thresh));
    }

    #[test]
    fn test_depth_loop_on_cycle() {
        let nodes = vec![
            NNode::new(1, NeuronType::Input),
            NNode::new(2, NeuronType::Hidden),
            NNode::new(3, NeuronType::Output),
        ];
        let links = vec![
            Link::new(1.0, 1, 2, false),
            Link::new(1.0, 2, 3, false),
            Link::new(1.0, 3, 2, true),
        ];
        let net = Network::new(1, nodes, links).unwrap().with_limits(20, 10);
        assert_eq!(
            net.max_depth().unwrap_err(),
            NetworkError::DepthLoop { ceiling: 10 }
        );
    }

    #[test]
    fn test_missing_endpoint_rejected() {
        let nodes = vec![NNode::new(1, NeuronType::Input)];
        let err = Network::new(1, nodes, vec![Link::new(1.0, 1, 9, false)]).unwrap_err();
        assert_eq!(err, NetworkError::NodeNotFound(9));
    }
}

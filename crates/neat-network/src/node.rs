// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Network nodes.
//!
//! The same struct serves as a genome node record (genetic fields only) and
//! as a phenotype node (genetic fields plus activation state and arena
//! indices of its links). Equality only looks at the genetic fields.

use crate::activation::ActivationType;
use crate::error::{NetworkError, NetworkResult};
use crate::trait_params::{Trait, NUM_TRAIT_PARAMS};
use crate::{NodeId, TraitId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Structural node kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    Neuron,
    Sensor,
}

impl NodeType {
    pub fn code(self) -> u8 {
        match self {
            NodeType::Neuron => 0,
            NodeType::Sensor => 1,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(NodeType::Neuron),
            1 => Some(NodeType::Sensor),
            _ => None,
        }
    }
}

/// Functional role of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NeuronType {
    Hidden,
    Input,
    Output,
    Bias,
}

impl NeuronType {
    /// Text-format code: 0 hidden, 1 input, 2 output, 3 bias
    pub fn code(self) -> u8 {
        match self {
            NeuronType::Hidden => 0,
            NeuronType::Input => 1,
            NeuronType::Output => 2,
            NeuronType::Bias => 3,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(NeuronType::Hidden),
            1 => Some(NeuronType::Input),
            2 => Some(NeuronType::Output),
            3 => Some(NeuronType::Bias),
            _ => None,
        }
    }

    /// Inputs and bias are sensors, everything else is a neuron
    pub fn node_type(self) -> NodeType {
        match self {
            NeuronType::Input | NeuronType::Bias => NodeType::Sensor,
            NeuronType::Hidden | NeuronType::Output => NodeType::Neuron,
        }
    }
}

impl fmt::Display for NeuronType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NeuronType::Hidden => "HIDN",
            NeuronType::Input => "INPT",
            NeuronType::Output => "OUTP",
            NeuronType::Bias => "BIAS",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NNode {
    pub id: NodeId,
    pub neuron_type: NeuronType,
    #[serde(default)]
    pub activation_type: ActivationType,
    /// Referenced trait; `None` is written as 0 in the text format
    pub trait_id: Option<TraitId>,

    /// Trait parameters copied in at genesis
    #[serde(skip)]
    pub params: [f64; NUM_TRAIT_PARAMS],
    /// Arena indices of incoming links
    #[serde(skip)]
    pub incoming: Vec<usize>,
    /// Arena indices of outgoing links
    #[serde(skip)]
    pub outgoing: Vec<usize>,

    #[serde(skip)]
    pub activation_sum: f64,
    #[serde(skip)]
    pub activation: f64,
    #[serde(skip)]
    pub last_activation: f64,
    #[serde(skip)]
    pub last_activation2: f64,
    #[serde(skip)]
    pub activations_count: u32,
    #[serde(skip)]
    pub is_active: bool,
}

impl NNode {
    pub fn new(id: NodeId, neuron_type: NeuronType) -> Self {
        Self {
            id,
            neuron_type,
            activation_type: ActivationType::default(),
            trait_id: None,
            params: [0.0; NUM_TRAIT_PARAMS],
            incoming: Vec::new(),
            outgoing: Vec::new(),
            activation_sum: 0.0,
            activation: 0.0,
            last_activation: 0.0,
            last_activation2: 0.0,
            activations_count: 0,
            is_active: false,
        }
    }

    pub fn with_trait(mut self, trait_id: Option<TraitId>) -> Self {
        self.trait_id = trait_id;
        self
    }

    pub fn with_activation(mut self, activation_type: ActivationType) -> Self {
        self.activation_type = activation_type;
        self
    }

    /// Fresh phenotype copy of a genome node, carrying the trait snapshot
    pub fn phenotype_copy(&self, source_trait: Option<&Trait>) -> NNode {
        let mut node = NNode::new(self.id, self.neuron_type)
            .with_trait(self.trait_id)
            .with_activation(self.activation_type);
        node.derive_trait(source_trait);
        node
    }

    pub fn derive_trait(&mut self, source_trait: Option<&Trait>) {
        self.params = match source_trait {
            Some(t) => t.params,
            None => [0.0; NUM_TRAIT_PARAMS],
        };
    }

    pub fn node_type(&self) -> NodeType {
        self.neuron_type.node_type()
    }

    pub fn is_sensor(&self) -> bool {
        self.node_type() == NodeType::Sensor
    }

    pub fn is_neuron(&self) -> bool {
        self.node_type() == NodeType::Neuron
    }

    /// Load a sensor value. Returns false for non-sensor nodes.
    pub fn sensor_load(&mut self, value: f64) -> bool {
        if !self.is_sensor() {
            return false;
        }
        self.save_activations();
        self.activations_count += 1;
        self.activation = value;
        true
    }

    /// Output as read through a non-delayed link
    #[inline]
    pub fn active_out(&self) -> f64 {
        if self.activations_count > 0 {
            self.activation
        } else {
            0.0
        }
    }

    /// Output as read through a time-delayed or recurrent link
    #[inline]
    pub fn active_out_delayed(&self) -> f64 {
        if self.activations_count > 1 {
            self.last_activation
        } else {
            0.0
        }
    }

    /// Apply the activation function to the accumulated sum
    pub fn fire(&mut self) {
        self.save_activations();
        self.activation = self.activation_type.apply(self.activation_sum);
        self.activations_count += 1;
    }

    fn save_activations(&mut self) {
        self.last_activation2 = self.last_activation;
        self.last_activation = self.activation;
    }

    /// Zero all activation history
    pub fn flushback(&mut self) {
        self.activations_count = 0;
        self.activation = 0.0;
        self.last_activation = 0.0;
        self.last_activation2 = 0.0;
        self.activation_sum = 0.0;
        self.is_active = false;
    }

    pub fn flushback_check(&self) -> NetworkResult<()> {
        let reason = if self.activations_count > 0 {
            Some(format!("activations count is {}", self.activations_count))
        } else if self.activation != 0.0 {
            Some(format!("activation is {}", self.activation))
        } else if self.last_activation != 0.0 {
            Some(format!("last activation is {}", self.last_activation))
        } else if self.last_activation2 != 0.0 {
            Some(format!("last activation 2 is {}", self.last_activation2))
        } else {
            None
        };
        match reason {
            Some(reason) => Err(NetworkError::NotFlushed {
                id: self.id,
                reason,
            }),
            None => Ok(()),
        }
    }
}

impl PartialEq for NNode {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.neuron_type == other.neuron_type
            && self.activation_type == other.activation_type
            && self.trait_id == other.trait_id
    }
}

impl fmt::Display for NNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({} id:{}, {}, {} -> step: {} = {:.3} {:.3})",
            if self.is_sensor() { "S" } else { "N" },
            self.id,
            self.neuron_type,
            self.activation_type,
            self.activations_count,
            self.activation,
            self.params[0],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        for code in 0..4u8 {
            assert_eq!(NeuronType::from_code(code).unwrap().code(), code);
        }
        assert!(NeuronType::from_code(4).is_none());
        assert_eq!(NeuronType::Bias.node_type(), NodeType::Sensor);
        assert_eq!(NeuronType::Output.node_type(), NodeType::Neuron);
        assert!(NodeType::from_code(2).is_none());
    }

    #[test]
    fn test_sensor_load_only_on_sensors() {
        let mut input = NNode::new(1, NeuronType::Input);
        assert!(input.sensor_load(0.75));
        assert_eq!(input.active_out(), 0.75);
        assert_eq!(input.active_out_delayed(), 0.0);
        assert!(input.sensor_load(0.25));
        assert_eq!(input.active_out_delayed(), 0.75);

        let mut hidden = NNode::new(2, NeuronType::Hidden);
        assert!(!hidden.sensor_load(1.0));
        assert_eq!(hidden.active_out(), 0.0);
    }

    #[test]
    fn test_flushback_zeroes_history() {
        let mut node = NNode::new(5, NeuronType::Output);
        node.activation_sum = 1.0;
        node.fire();
        node.fire();
        assert!(node.flushback_check().is_err());
        node.flushback();
        assert!(node.flushback_check().is_ok());
        assert_eq!(node.activations_count, 0);
        assert_eq!(node.last_activation2, 0.0);
    }

    #[test]
    fn test_equality_ignores_runtime_state() {
        let a = NNode::new(7, NeuronType::Hidden).with_trait(Some(1));
        let mut b = a.clone();
        b.activation = 3.0;
        b.incoming.push(4);
        assert_eq!(a, b);
        assert_ne!(a, NNode::new(7, NeuronType::Hidden));
    }

    #[test]
    fn test_serde_drops_runtime_state() {
        let mut node = NNode::new(3, NeuronType::Output).with_trait(Some(2));
        node.activation_sum = 0.5;
        node.fire();
        node.incoming.push(1);

        let json = serde_json::to_string(&node).unwrap();
        assert!(!json.contains("activation_sum"));
        let back: NNode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, node);
        assert_eq!(back.activations_count, 0);
        assert!(back.incoming.is_empty());
    }
}

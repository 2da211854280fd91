// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Innovation Ledger
//!
//! The historical-marking authority of a population: the next innovation
//! number, the next free node id, and the structural changes recorded during
//! the current generation. Structural mutations look a change up here before
//! minting new numbers, so two genomes that make the same change in one
//! generation get the same markings.
//!
//! The ledger is passed by `&mut` into every structural mutation. Mutation
//! and reproduction therefore run on one thread, while fitness evaluation is
//! free to run in parallel.

use crate::gene::InnovationNum;
use neat_network::{NodeId, TraitId};
use serde::{Deserialize, Serialize};

/// A new link between two existing nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkInnovation {
    pub in_node: NodeId,
    pub out_node: NodeId,
    pub is_recurrent: bool,
    pub innovation_num: InnovationNum,
    pub weight: f64,
    pub trait_id: Option<TraitId>,
}

/// A gene split by a new hidden node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeInnovation {
    pub in_node: NodeId,
    pub out_node: NodeId,
    /// Innovation number of the gene that was split
    pub old_innovation_num: InnovationNum,
    pub new_node_id: NodeId,
    /// Gene into the new node
    pub innovation_num1: InnovationNum,
    /// Gene out of the new node
    pub innovation_num2: InnovationNum,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Innovation {
    NewLink(LinkInnovation),
    NewNode(NodeInnovation),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InnovationLedger {
    next_innovation: InnovationNum,
    next_node_id: NodeId,
    records: Vec<Innovation>,
}

impl InnovationLedger {
    pub fn new(next_innovation: InnovationNum, next_node_id: NodeId) -> Self {
        Self {
            next_innovation,
            next_node_id,
            records: Vec::new(),
        }
    }

    /// Innovation number the next novel gene will get
    pub fn current_innovation(&self) -> InnovationNum {
        self.next_innovation
    }

    pub fn current_node_id(&self) -> NodeId {
        self.next_node_id
    }

    pub fn next_innovation(&mut self) -> InnovationNum {
        let innovation = self.next_innovation;
        self.next_innovation += 1;
        innovation
    }

    pub fn next_node_id(&mut self) -> NodeId {
        let id = self.next_node_id;
        self.next_node_id += 1;
        id
    }

    pub fn find_link(
        &self,
        in_node: NodeId,
        out_node: NodeId,
        is_recurrent: bool,
    ) -> Option<&LinkInnovation> {
        self.records.iter().find_map(|r| match r {
            Innovation::NewLink(l)
                if l.in_node == in_node
                    && l.out_node == out_node
                    && l.is_recurrent == is_recurrent =>
            {
                Some(l)
            }
            _ => None,
        })
    }

    pub fn find_node(
        &self,
        in_node: NodeId,
        out_node: NodeId,
        old_innovation_num: InnovationNum,
    ) -> Option<&NodeInnovation> {
        self.records.iter().find_map(|r| match r {
            Innovation::NewNode(n)
                if n.in_node == in_node
                    && n.out_node == out_node
                    && n.old_innovation_num == old_innovation_num =>
            {
                Some(n)
            }
            _ => None,
        })
    }

    pub fn record_link(&mut self, innovation: LinkInnovation) {
        self.records.push(Innovation::NewLink(innovation));
    }

    pub fn record_node(&mut self, innovation: NodeInnovation) {
        self.records.push(Innovation::NewNode(innovation));
    }

    pub fn records(&self) -> &[Innovation] {
        &self.records
    }

    /// Forget this generation's records; counters keep running
    pub fn clear(&mut self) {
        self.records.clear();
    }
}

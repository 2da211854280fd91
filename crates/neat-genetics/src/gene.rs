// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Genes: links annotated with historical markings

use neat_network::{Link, NodeId, TraitId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Innovation numbers are assigned once per structural mutation event
pub type InnovationNum = u64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gene {
    pub link: Link,
    pub innovation_num: InnovationNum,
    /// Magnitude marker of the last weight perturbation, used by the
    /// compatibility distance
    pub mutation_num: f64,
    /// Disabled genes are kept but not wired into the phenotype
    pub is_enabled: bool,
}

impl Gene {
    pub fn new(
        weight: f64,
        in_node: NodeId,
        out_node: NodeId,
        recurrent: bool,
        innovation_num: InnovationNum,
        mutation_num: f64,
    ) -> Self {
        Self {
            link: Link::new(weight, in_node, out_node, recurrent),
            innovation_num,
            mutation_num,
            is_enabled: true,
        }
    }

    pub fn with_trait(mut self, trait_id: Option<TraitId>) -> Self {
        self.link.trait_id = trait_id;
        self
    }

    pub fn in_node(&self) -> NodeId {
        self.link.in_node
    }

    pub fn out_node(&self) -> NodeId {
        self.link.out_node
    }
}

impl fmt::Display for Gene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let enabled = if self.is_enabled { "" } else { " -DISABLED-" };
        let recurrent = if self.link.is_recurrent { " -RECUR-" } else { "" };
        write!(
            f,
            "[Link ({:4}, {:4}) INNOV ({:4}, {:.3}) Weight {:.3} Trait {}{}{}]",
            self.link.in_node,
            self.link.out_node,
            self.innovation_num,
            self.mutation_num,
            self.link.weight,
            self.link.trait_id.unwrap_or(0),
            enabled,
            recurrent
        )
    }
}

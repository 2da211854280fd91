// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Weighted directed connections between nodes (by node id)

use crate::trait_params::{Trait, NUM_TRAIT_PARAMS};
use crate::{NodeId, TraitId};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    pub weight: f64,
    pub in_node: NodeId,
    pub out_node: NodeId,
    pub is_recurrent: bool,
    /// Forces a one-step delayed read even on a forward link
    #[serde(default)]
    pub time_delay: bool,
    pub trait_id: Option<TraitId>,

    /// Trait parameters copied in at genesis
    #[serde(skip)]
    pub params: [f64; NUM_TRAIT_PARAMS],
}

impl Link {
    pub fn new(weight: f64, in_node: NodeId, out_node: NodeId, is_recurrent: bool) -> Self {
        Self {
            weight,
            in_node,
            out_node,
            is_recurrent,
            time_delay: false,
            trait_id: None,
            params: [0.0; NUM_TRAIT_PARAMS],
        }
    }

    pub fn with_trait(mut self, trait_id: Option<TraitId>) -> Self {
        self.trait_id = trait_id;
        self
    }

    /// Fresh phenotype copy carrying the trait snapshot
    pub fn phenotype_copy(&self, source_trait: Option<&Trait>) -> Link {
        let mut link = self.clone();
        link.params = match source_trait {
            Some(t) => t.params,
            None => [0.0; NUM_TRAIT_PARAMS],
        };
        link
    }

    /// Whether the target reads the source's previous-step activation
    #[inline]
    pub fn is_delayed(&self) -> bool {
        self.is_recurrent || self.time_delay
    }

    /// Same endpoints and same recurrence
    pub fn is_equal_genetically(&self, other: &Link) -> bool {
        self.in_node == other.in_node
            && self.out_node == other.out_node
            && self.is_recurrent == other.is_recurrent
    }
}

impl PartialEq for Link {
    fn eq(&self, other: &Self) -> bool {
        self.weight == other.weight
            && self.in_node == other.in_node
            && self.out_node == other.out_node
            && self.is_recurrent == other.is_recurrent
            && self.time_delay == other.time_delay
            && self.trait_id == other.trait_id
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[Link: ({} <-> {}), weight: {:.3}, recurrent: {}, time delayed: {}]",
            self.in_node, self.out_node, self.weight, self.is_recurrent, self.time_delay
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delayed_when_recurrent_or_time_delay() {
        let mut link = Link::new(0.5, 1, 2, false);
        assert!(!link.is_delayed());
        link.time_delay = true;
        assert!(link.is_delayed());
        assert!(Link::new(0.5, 2, 2, true).is_delayed());
    }

    #[test]
    fn test_genetic_equality_ignores_weight() {
        let a = Link::new(0.5, 1, 2, false);
        let b = Link::new(-3.0, 1, 2, false);
        assert!(a.is_equal_genetically(&b));
        assert!(!a.is_equal_genetically(&Link::new(0.5, 1, 2, true)));
        assert_ne!(a, b);
    }
}

// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Traits: numbered bundles of eight real parameters.
//!
//! Nodes and links reference a trait by id; the phenotype copies the
//! parameters into the element at genesis. A trait is never edited in place,
//! mutation operators produce a perturbed copy.

use crate::TraitId;
use serde::{Deserialize, Serialize};

/// Number of parameters carried by each trait
pub const NUM_TRAIT_PARAMS: usize = 8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trait {
    pub id: TraitId,
    pub params: [f64; NUM_TRAIT_PARAMS],
}

impl Trait {
    /// Trait with all parameters zero
    pub fn new(id: TraitId) -> Self {
        Self {
            id,
            params: [0.0; NUM_TRAIT_PARAMS],
        }
    }

    pub fn with_params(id: TraitId, params: [f64; NUM_TRAIT_PARAMS]) -> Self {
        Self { id, params }
    }

    /// Element-wise mean of two traits; the result keeps the id of `a`
    pub fn average(a: &Trait, b: &Trait) -> Trait {
        let mut params = [0.0; NUM_TRAIT_PARAMS];
        for (i, p) in params.iter_mut().enumerate() {
            *p = (a.params[i] + b.params[i]) / 2.0;
        }
        Trait { id: a.id, params }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_keeps_first_id() {
        let mut a = Trait::new(3);
        a.params[0] = 0.2;
        a.params[7] = 1.0;
        let mut b = Trait::new(9);
        b.params[0] = 0.4;

        let avg = Trait::average(&a, &b);
        assert_eq!(avg.id, 3);
        assert!((avg.params[0] - 0.3).abs() < 1e-12);
        assert!((avg.params[7] - 0.5).abs() < 1e-12);
        assert_eq!(avg.params[3], 0.0);
    }
}

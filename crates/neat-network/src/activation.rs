// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Neuron Activation Functions
//!
//! ```text
//! SigmoidPlain       1 / (1 + e^-x)
//! SigmoidReduced     1 / (1 + e^(-0.5x))
//! SigmoidSteepened   1 / (1 + e^(-4.924273x))      (default)
//! SigmoidBipolar     2 / (1 + e^(-4.924273x)) - 1
//! Tanh               tanh(0.9x)
//! GaussianBipolar    2e^(-(2.5x)^2) - 1
//! Linear             x
//! LinearAbs          |x|
//! Step               0 if x <= 0 else 1
//! Sine / Cosine      sin(x) / cos(x)
//! Null               0
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Slope used by the steepened sigmoid family
pub const STEEPENED_SLOPE: f64 = 4.924273;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ActivationType {
    SigmoidPlain,
    SigmoidReduced,
    #[default]
    SigmoidSteepened,
    SigmoidBipolar,
    Tanh,
    GaussianBipolar,
    Linear,
    LinearAbs,
    Step,
    Sine,
    Cosine,
    Null,
}

impl ActivationType {
    pub const ALL: [ActivationType; 12] = [
        ActivationType::SigmoidPlain,
        ActivationType::SigmoidReduced,
        ActivationType::SigmoidSteepened,
        ActivationType::SigmoidBipolar,
        ActivationType::Tanh,
        ActivationType::GaussianBipolar,
        ActivationType::Linear,
        ActivationType::LinearAbs,
        ActivationType::Step,
        ActivationType::Sine,
        ActivationType::Cosine,
        ActivationType::Null,
    ];

    #[inline]
    pub fn apply(self, x: f64) -> f64 {
        match self {
            ActivationType::SigmoidPlain => 1.0 / (1.0 + (-x).exp()),
            ActivationType::SigmoidReduced => 1.0 / (1.0 + (-0.5 * x).exp()),
            ActivationType::SigmoidSteepened => 1.0 / (1.0 + (-STEEPENED_SLOPE * x).exp()),
            ActivationType::SigmoidBipolar => {
                2.0 / (1.0 + (-STEEPENED_SLOPE * x).exp()) - 1.0
            }
            ActivationType::Tanh => (0.9 * x).tanh(),
            ActivationType::GaussianBipolar => 2.0 * (-(2.5 * x).powi(2)).exp() - 1.0,
            ActivationType::Linear => x,
            ActivationType::LinearAbs => x.abs(),
            ActivationType::Step => {
                if x <= 0.0 {
                    0.0
                } else {
                    1.0
                }
            }
            ActivationType::Sine => x.sin(),
            ActivationType::Cosine => x.cos(),
            ActivationType::Null => 0.0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ActivationType::SigmoidPlain => "SigmoidPlainActivation",
            ActivationType::SigmoidReduced => "SigmoidReducedActivation",
            ActivationType::SigmoidSteepened => "SigmoidSteepenedActivation",
            ActivationType::SigmoidBipolar => "SigmoidBipolarActivation",
            ActivationType::Tanh => "TanhActivation",
            ActivationType::GaussianBipolar => "GaussianBipolarActivation",
            ActivationType::Linear => "LinearActivation",
            ActivationType::LinearAbs => "LinearAbsActivation",
            ActivationType::Step => "StepActivation",
            ActivationType::Sine => "SineActivation",
            ActivationType::Cosine => "CosineActivation",
            ActivationType::Null => "NullActivation",
        }
    }
}

impl fmt::Display for ActivationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ActivationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActivationType::ALL
            .iter()
            .copied()
            .find(|a| a.name() == s)
            .ok_or_else(|| format!("Unknown activation type: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steepened_sigmoid_is_default() {
        assert_eq!(ActivationType::default(), ActivationType::SigmoidSteepened);
        let v = ActivationType::SigmoidSteepened.apply(0.0);
        assert!((v - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_known_values() {
        assert!((ActivationType::SigmoidBipolar.apply(0.0)).abs() < 1e-12);
        assert!((ActivationType::GaussianBipolar.apply(0.0) - 1.0).abs() < 1e-12);
        assert_eq!(ActivationType::LinearAbs.apply(-2.5), 2.5);
        assert_eq!(ActivationType::Step.apply(0.0), 0.0);
        assert_eq!(ActivationType::Step.apply(0.01), 1.0);
        assert_eq!(ActivationType::Null.apply(42.0), 0.0);
        assert!((ActivationType::Tanh.apply(1.0) - 0.9f64.tanh()).abs() < 1e-12);
    }

    #[test]
    fn test_name_round_trip() {
        for a in ActivationType::ALL {
            assert_eq!(a.name().parse::<ActivationType>().unwrap(), a);
        }
        assert!("Bogus".parse::<ActivationType>().is_err());
    }
}

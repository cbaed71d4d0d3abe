//! Named input/output vectors.
//!
//! A vector is an ordered list of named, unit-tagged values used to feed a
//! model's inputs and to read back its outputs after a cycle.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::numeric::Real;

/// One element of an input or output vector.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VectorInfo {
    /// Signal varID this element binds to.
    pub name: String,
    /// Units text; compared verbatim.
    pub units: String,
    pub value: Real,
    /// Allowed absolute deviation when comparing against an expected value.
    pub tolerance: Real,
    pub is_input: bool,
}

impl VectorInfo {
    pub fn input(name: impl Into<String>, units: impl Into<String>, value: Real) -> Self {
        Self {
            name: name.into(),
            units: units.into(),
            value,
            tolerance: 0.0,
            is_input: true,
        }
    }

    pub fn output(name: impl Into<String>, units: impl Into<String>, value: Real) -> Self {
        Self {
            name: name.into(),
            units: units.into(),
            value,
            tolerance: 0.0,
            is_input: false,
        }
    }

    pub fn with_tolerance(mut self, tolerance: Real) -> Self {
        self.tolerance = tolerance.abs();
        self
    }
}

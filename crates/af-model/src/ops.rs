//! Operator families used by the math blocks.
//!
//! Each family parses its textual spelling (as it appears in model markup)
//! and applies itself to already-gathered input values. Numeric edge cases
//! follow IEEE semantics: `arcsin(2.0)` is NaN, `1.0 / 0.0` is infinite.

use std::fmt;
use std::str::FromStr;

use af_core::numeric::{from_bool, is_true};
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Number of inputs an operator accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    AtLeast(usize),
    Between(usize, usize),
}

impl Arity {
    pub fn accepts(self, n: usize) -> bool {
        match self {
            Arity::Exactly(k) => n == k,
            Arity::AtLeast(k) => n >= k,
            Arity::Between(lo, hi) => (lo..=hi).contains(&n),
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            Arity::Exactly(0) => "no",
            Arity::Exactly(1) => "exactly 1",
            Arity::Exactly(2) => "exactly 2",
            Arity::Exactly(_) => "a fixed number of",
            Arity::AtLeast(1) => "at least 1",
            Arity::AtLeast(2) => "at least 2",
            Arity::AtLeast(_) => "more",
            Arity::Between(1, 2) => "1 or 2",
            Arity::Between(..) => "a bounded number of",
        }
    }
}

/// Unary trigonometric/transcendental family plus `power` and `atan2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MathFunction {
    Sin,
    Cos,
    Tan,
    Arcsin,
    Arccos,
    Arctan,
    /// Two-argument arctangent `atan2(y, x)`.
    Atan2,
    Abs,
    Ceiling,
    Floor,
    Exp,
    /// Natural logarithm.
    Ln,
    /// Base-10 logarithm.
    Log,
    Sqrt,
    /// `power(base, exponent)`.
    Power,
}

impl MathFunction {
    pub fn arity(self) -> Arity {
        match self {
            MathFunction::Atan2 | MathFunction::Power => Arity::Exactly(2),
            _ => Arity::Exactly(1),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            MathFunction::Sin => "sin",
            MathFunction::Cos => "cos",
            MathFunction::Tan => "tan",
            MathFunction::Arcsin => "arcsin",
            MathFunction::Arccos => "arccos",
            MathFunction::Arctan => "arctan",
            MathFunction::Atan2 => "atan2",
            MathFunction::Abs => "abs",
            MathFunction::Ceiling => "ceiling",
            MathFunction::Floor => "floor",
            MathFunction::Exp => "exp",
            MathFunction::Ln => "ln",
            MathFunction::Log => "log",
            MathFunction::Sqrt => "sqrt",
            MathFunction::Power => "power",
        }
    }

    /// Apply to `args`, which must match [`arity`](Self::arity).
    pub fn apply(self, args: &[f64]) -> f64 {
        let a = args.first().copied().unwrap_or(f64::NAN);
        let b = args.get(1).copied().unwrap_or(f64::NAN);
        match self {
            MathFunction::Sin => a.sin(),
            MathFunction::Cos => a.cos(),
            MathFunction::Tan => a.tan(),
            MathFunction::Arcsin => a.asin(),
            MathFunction::Arccos => a.acos(),
            MathFunction::Arctan => a.atan(),
            MathFunction::Atan2 => a.atan2(b),
            MathFunction::Abs => a.abs(),
            MathFunction::Ceiling => a.ceil(),
            MathFunction::Floor => a.floor(),
            MathFunction::Exp => a.exp(),
            MathFunction::Ln => a.ln(),
            MathFunction::Log => a.log10(),
            MathFunction::Sqrt => a.sqrt(),
            MathFunction::Power => a.powf(b),
        }
    }
}

impl FromStr for MathFunction {
    type Err = ModelError;

    /// Spellings are exact; `pow` is not `power`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let f = match s.trim() {
            "sin" => MathFunction::Sin,
            "cos" => MathFunction::Cos,
            "tan" => MathFunction::Tan,
            "arcsin" => MathFunction::Arcsin,
            "arccos" => MathFunction::Arccos,
            "arctan" => MathFunction::Arctan,
            "atan2" => MathFunction::Atan2,
            "abs" => MathFunction::Abs,
            "ceiling" => MathFunction::Ceiling,
            "floor" => MathFunction::Floor,
            "exp" => MathFunction::Exp,
            "ln" => MathFunction::Ln,
            "log" => MathFunction::Log,
            "sqrt" | "root" => MathFunction::Sqrt,
            "power" => MathFunction::Power,
            other => {
                return Err(ModelError::UnsupportedFunction {
                    name: other.to_string(),
                });
            }
        };
        Ok(f)
    }
}

impl fmt::Display for MathFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Binary comparison producing `1.0`/`0.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationOp {
    Lt,
    Leq,
    Eq,
    Neq,
    Geq,
    Gt,
}

impl RelationOp {
    pub fn token(self) -> &'static str {
        match self {
            RelationOp::Lt => "lt",
            RelationOp::Leq => "leq",
            RelationOp::Eq => "eq",
            RelationOp::Neq => "neq",
            RelationOp::Geq => "geq",
            RelationOp::Gt => "gt",
        }
    }

    pub fn apply(self, a: f64, b: f64) -> f64 {
        from_bool(match self {
            RelationOp::Lt => a < b,
            RelationOp::Leq => a <= b,
            RelationOp::Eq => a == b,
            RelationOp::Neq => a != b,
            RelationOp::Geq => a >= b,
            RelationOp::Gt => a > b,
        })
    }
}

impl FromStr for RelationOp {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let op = match s.trim().to_ascii_lowercase().as_str() {
            "lt" => RelationOp::Lt,
            "leq" => RelationOp::Leq,
            "eq" => RelationOp::Eq,
            "neq" => RelationOp::Neq,
            "geq" => RelationOp::Geq,
            "gt" => RelationOp::Gt,
            _ => {
                return Err(ModelError::UnknownRelation { op: s.to_string() });
            }
        };
        Ok(op)
    }
}

/// Boolean connectives over `value != 0.0` truth values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicOp {
    Not,
    And,
    Or,
}

impl LogicOp {
    pub fn arity(self) -> Arity {
        match self {
            LogicOp::Not => Arity::Exactly(1),
            LogicOp::And | LogicOp::Or => Arity::AtLeast(2),
        }
    }

    pub fn token(self) -> &'static str {
        match self {
            LogicOp::Not => "not",
            LogicOp::And => "and",
            LogicOp::Or => "or",
        }
    }

    pub fn apply(self, args: &[f64]) -> f64 {
        from_bool(match self {
            LogicOp::Not => !args.first().copied().is_some_and(is_true),
            LogicOp::And => args.iter().copied().all(is_true),
            LogicOp::Or => args.iter().copied().any(is_true),
        })
    }
}

impl FromStr for LogicOp {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "not" => Ok(LogicOp::Not),
            "and" => Ok(LogicOp::And),
            "or" => Ok(LogicOp::Or),
            _ => Err(ModelError::UnknownOperator {
                family: "logic",
                op: s.to_string(),
            }),
        }
    }
}

/// Smallest or largest of one or more inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MinMaxOp {
    Min,
    Max,
}

impl MinMaxOp {
    pub fn token(self) -> &'static str {
        match self {
            MinMaxOp::Min => "min",
            MinMaxOp::Max => "max",
        }
    }

    /// NaN inputs propagate rather than being skipped.
    pub fn apply(self, args: &[f64]) -> f64 {
        let mut it = args.iter().copied();
        let Some(first) = it.next() else {
            return f64::NAN;
        };
        it.fold(first, |acc, v| {
            if acc.is_nan() || v.is_nan() {
                f64::NAN
            } else {
                match self {
                    MinMaxOp::Min => acc.min(v),
                    MinMaxOp::Max => acc.max(v),
                }
            }
        })
    }
}

impl FromStr for MinMaxOp {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "min" => Ok(MinMaxOp::Min),
            "max" => Ok(MinMaxOp::Max),
            _ => Err(ModelError::UnknownOperator {
                family: "minmax",
                op: s.to_string(),
            }),
        }
    }
}

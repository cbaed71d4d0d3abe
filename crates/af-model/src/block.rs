//! Blocks: typed computation nodes.
//!
//! Every block reads zero or more input signals through ordered ports and
//! drives at most one output signal. The variant set is closed; evaluation
//! and code generation dispatch on [`BlockKind`] by pattern match.

use af_core::numeric::is_true;
use af_core::{BlockId, BpSetId, SignalId, TableId, parse_number};

use crate::error::{ModelError, ModelResult};
use crate::ops::{Arity, LogicOp, MathFunction, MinMaxOp, RelationOp};
use crate::table::{BreakpointSet, FuncTable};

/// Block variant and its construction parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockKind {
    /// Model input; value is assigned from outside.
    Input,
    /// Model output; copies its single input.
    Output,
    Constant {
        value: f64,
    },
    Function(MathFunction),
    Sum,
    Product,
    /// One input negates, two inputs subtract the second from the first.
    Minus,
    MinMax(MinMaxOp),
    Logic(LogicOp),
    Relation(RelationOp),
    /// Ordered piecewise selection. Ports are laid out as
    /// `value_0, guard_0, ..., value_{n-1}, guard_{n-1}, otherwise`.
    Switch {
        pieces: usize,
    },
    Limiter {
        lower: f64,
        upper: f64,
    },
    /// Breakpoint locator producing a fractional index.
    Bp {
        bp_set: BpSetId,
    },
    /// Table lookup fed by one BP block per dimension.
    FuncTable {
        table: TableId,
    },
}

impl BlockKind {
    /// Constant parsed from numeric text.
    pub fn constant_text(text: &str) -> ModelResult<Self> {
        Ok(BlockKind::Constant {
            value: parse_number(text)?,
        })
    }

    pub fn function(name: &str) -> ModelResult<Self> {
        Ok(BlockKind::Function(name.parse()?))
    }

    pub fn relation(op: &str) -> ModelResult<Self> {
        Ok(BlockKind::Relation(op.parse()?))
    }

    pub fn logic(op: &str) -> ModelResult<Self> {
        Ok(BlockKind::Logic(op.parse()?))
    }

    pub fn minmax(op: &str) -> ModelResult<Self> {
        Ok(BlockKind::MinMax(op.parse()?))
    }

    /// Limiter with bounds put in order.
    pub fn limiter(lower: f64, upper: f64) -> Self {
        if lower > upper {
            BlockKind::Limiter {
                lower: upper,
                upper: lower,
            }
        } else {
            BlockKind::Limiter { lower, upper }
        }
    }

    /// Number of inputs this kind accepts. Table blocks are checked against
    /// their table's dimension count by the model.
    pub fn arity(&self) -> Arity {
        match self {
            BlockKind::Input | BlockKind::Constant { .. } => Arity::Exactly(0),
            BlockKind::Output | BlockKind::Limiter { .. } | BlockKind::Bp { .. } => {
                Arity::Exactly(1)
            }
            BlockKind::Function(f) => f.arity(),
            BlockKind::Sum | BlockKind::Product | BlockKind::MinMax(_) => Arity::AtLeast(1),
            BlockKind::Minus => Arity::Between(1, 2),
            BlockKind::Logic(op) => op.arity(),
            BlockKind::Relation(_) => Arity::Exactly(2),
            BlockKind::Switch { pieces } => Arity::Exactly(2 * pieces + 1),
            BlockKind::FuncTable { .. } => Arity::AtLeast(1),
        }
    }

    /// Type tag used in descriptions.
    pub fn type_name(&self) -> &'static str {
        match self {
            BlockKind::Input => "input",
            BlockKind::Output => "output",
            BlockKind::Constant { .. } => "constant value",
            BlockKind::Function(_) => "function",
            BlockKind::Sum => "summing",
            BlockKind::Product => "multiplier",
            BlockKind::Minus => "minus",
            BlockKind::MinMax(_) => "minmax",
            BlockKind::Logic(_) => "logic",
            BlockKind::Relation(_) => "relation",
            BlockKind::Switch { .. } => "switch",
            BlockKind::Limiter { .. } => "limiter",
            BlockKind::Bp { .. } => "breakpoint",
            BlockKind::FuncTable { .. } => "function table",
        }
    }
}

/// One input port: the varID it expects and the signal bound to it.
#[derive(Debug, Clone, PartialEq)]
pub struct InputPort {
    pub var_id: String,
    pub signal: Option<SignalId>,
}

/// A computation node in the model graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub(crate) id: BlockId,
    pub(crate) name: String,
    pub(crate) kind: BlockKind,
    pub(crate) inputs: Vec<InputPort>,
    pub(crate) output: Option<SignalId>,
    pub(crate) value: f64,
    pub(crate) ready: bool,
    pub(crate) verbose: bool,
    pub(crate) synthetic: bool,
}

impl Block {
    pub(crate) fn new(id: BlockId, name: String, kind: BlockKind, input_var_ids: &[&str]) -> Self {
        let value = match &kind {
            BlockKind::Constant { value } => *value,
            _ => f64::NAN,
        };
        Self {
            id,
            name,
            kind,
            inputs: input_var_ids
                .iter()
                .map(|v| InputPort {
                    var_id: (*v).to_string(),
                    signal: None,
                })
                .collect(),
            output: None,
            value,
            ready: false,
            verbose: false,
            synthetic: false,
        }
    }

    pub fn id(&self) -> BlockId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &BlockKind {
        &self.kind
    }

    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    pub fn inputs(&self) -> &[InputPort] {
        &self.inputs
    }

    pub fn num_inputs(&self) -> usize {
        self.inputs.len()
    }

    pub fn input_signal(&self, port: usize) -> Option<SignalId> {
        self.inputs.get(port).and_then(|p| p.signal)
    }

    pub fn output(&self) -> Option<SignalId> {
        self.output
    }

    /// Latest computed value; NaN before the first update.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Inserted by the model rather than the builder.
    pub fn is_synthetic(&self) -> bool {
        self.synthetic
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    /// Check if this block generates values without inputs.
    pub fn is_source(&self) -> bool {
        matches!(self.kind, BlockKind::Input | BlockKind::Constant { .. })
    }

    /// Check if this block consumes a value without producing a signal.
    pub fn is_sink(&self) -> bool {
        matches!(self.kind, BlockKind::Output)
    }

    /// True once the value has been computed at least once. Input and
    /// constant blocks are always ready.
    pub fn is_ready(&self) -> bool {
        self.is_source() || self.ready
    }

    pub(crate) fn set_input_value(&mut self, value: f64) {
        self.value = value;
    }

    /// Recompute the value from already-gathered input values.
    pub(crate) fn update(
        &mut self,
        inputs: &[f64],
        bp_sets: &[BreakpointSet],
        tables: &[FuncTable],
    ) -> ModelResult<()> {
        self.value = self.evaluate(inputs, bp_sets, tables)?;
        self.ready = true;
        Ok(())
    }

    fn evaluate(
        &self,
        inputs: &[f64],
        bp_sets: &[BreakpointSet],
        tables: &[FuncTable],
    ) -> ModelResult<f64> {
        let first = || inputs.first().copied().unwrap_or(f64::NAN);
        let v = match &self.kind {
            BlockKind::Input => self.value,
            BlockKind::Constant { value } => *value,
            BlockKind::Output => first(),
            BlockKind::Function(f) => f.apply(inputs),
            BlockKind::Sum => inputs.iter().sum(),
            BlockKind::Product => inputs.iter().product(),
            BlockKind::Minus => match inputs {
                [a] => -a,
                [a, b] => a - b,
                _ => f64::NAN,
            },
            BlockKind::MinMax(op) => op.apply(inputs),
            BlockKind::Logic(op) => op.apply(inputs),
            BlockKind::Relation(op) => match inputs {
                [a, b] => op.apply(*a, *b),
                _ => f64::NAN,
            },
            BlockKind::Switch { pieces } => {
                let chosen = (0..*pieces)
                    .find(|k| inputs.get(2 * k + 1).copied().is_some_and(is_true))
                    .map_or(2 * pieces, |k| 2 * k);
                inputs.get(chosen).copied().unwrap_or(f64::NAN)
            }
            BlockKind::Limiter { lower, upper } => limit(first(), *lower, *upper),
            BlockKind::Bp { bp_set } => bp_sets
                .get(bp_set.index())
                .ok_or_else(|| self.stale("breakpoint set"))?
                .fractional_index(first()),
            BlockKind::FuncTable { table } => tables
                .get(table.index())
                .ok_or_else(|| self.stale("function table"))?
                .interpolate(inputs)?,
        };
        Ok(v)
    }

    fn stale(&self, what: &str) -> ModelError {
        ModelError::UnknownReference {
            what: format!("{} of block '{}'", what, self.name),
        }
    }
}

/// Clamp without panicking on NaN; a NaN input stays NaN.
pub fn limit(x: f64, lower: f64, upper: f64) -> f64 {
    if x < lower {
        lower
    } else if x > upper {
        upper
    } else {
        x
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(kind: BlockKind, inputs: &[&str]) -> Block {
        Block::new(BlockId::from_index(0), "b".to_string(), kind, inputs)
    }

    fn eval(kind: BlockKind, inputs: &[f64]) -> f64 {
        let names: Vec<String> = (0..inputs.len()).map(|i| format!("in{i}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let mut b = block(kind, &refs);
        b.update(inputs, &[], &[]).unwrap();
        b.value()
    }

    #[test]
    fn constant_block() {
        let b = block(BlockKind::Constant { value: 42.0 }, &[]);
        assert!(b.is_source());
        assert!(!b.is_sink());
        assert!(b.is_ready());
        assert_eq!(b.value(), 42.0);
        assert_eq!(b.num_inputs(), 0);
    }

    #[test]
    fn output_block() {
        let b = block(BlockKind::Output, &["x"]);
        assert!(!b.is_source());
        assert!(b.is_sink());
        assert!(!b.is_ready());
        assert!(b.value().is_nan());
    }

    #[test]
    fn minus_arity_dependent() {
        assert_eq!(eval(BlockKind::Minus, &[-3.45]), 3.45);
        assert!((eval(BlockKind::Minus, &[-3.45, 3.45]) + 6.90).abs() < 1e-12);
    }

    #[test]
    fn division_like_edge_cases_propagate() {
        let v = eval(BlockKind::Function(MathFunction::Power), &[0.0, -1.0]);
        assert_eq!(v, f64::INFINITY);
        assert!(eval(BlockKind::Sum, &[f64::NAN, 1.0]).is_nan());
    }

    #[test]
    fn switch_first_match_wins() {
        let kind = BlockKind::Switch { pieces: 2 };
        assert_eq!(eval(kind.clone(), &[10.0, 1.0, 20.0, 1.0, 30.0]), 10.0);
        assert_eq!(eval(kind.clone(), &[10.0, 0.0, 20.0, 1.0, 30.0]), 20.0);
        assert_eq!(eval(kind, &[10.0, 0.0, 20.0, 0.0, 30.0]), 30.0);
    }

    #[test]
    fn limiter_swaps_reversed_bounds() {
        let kind = BlockKind::limiter(2.0, -2.0);
        assert_eq!(
            kind,
            BlockKind::Limiter {
                lower: -2.0,
                upper: 2.0
            }
        );
        assert_eq!(eval(kind.clone(), &[-1000.0]), -2.0);
        assert_eq!(eval(kind.clone(), &[0.0]), 0.0);
        assert_eq!(eval(kind, &[1000.0]), 2.0);
    }

    #[test]
    fn limit_keeps_nan() {
        assert!(limit(f64::NAN, -1.0, 1.0).is_nan());
        assert_eq!(limit(5.0, f64::NEG_INFINITY, 1.0), 1.0);
    }

    #[test]
    fn textual_constructors() {
        assert_eq!(
            BlockKind::constant_text("-3.45").unwrap(),
            BlockKind::Constant { value: -3.45 }
        );
        assert!(matches!(
            BlockKind::function("pow"),
            Err(ModelError::UnsupportedFunction { .. })
        ));
        assert!(matches!(
            BlockKind::relation("approx"),
            Err(ModelError::UnknownRelation { .. })
        ));
        assert!(BlockKind::logic("xor").is_err());
        assert_eq!(
            BlockKind::minmax("MAX").unwrap(),
            BlockKind::MinMax(MinMaxOp::Max)
        );
    }

    #[test]
    fn arity_table() {
        assert!(BlockKind::Minus.arity().accepts(1));
        assert!(BlockKind::Minus.arity().accepts(2));
        assert!(!BlockKind::Minus.arity().accepts(3));
        assert!(BlockKind::Switch { pieces: 2 }.arity().accepts(5));
        assert!(!BlockKind::Function(MathFunction::Power).arity().accepts(1));
    }
}

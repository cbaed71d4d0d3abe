//! One-line block summaries for downstream writers.
//!
//! The text layout is stable:
//!
//! ```text
//! Block "neg" has one input (x), one output (y), value [-4] (deg) and is a minus block (negation).
//! ```

use std::fmt::Write;

use af_core::BlockId;

use crate::block::{Block, BlockKind};
use crate::error::ModelResult;
use crate::model::Model;

impl Model {
    /// Render the summary line for `block`.
    pub fn describe_block(&self, block: BlockId) -> ModelResult<String> {
        let b = self.block(block)?;
        let var = |sid: af_core::SignalId| self.signals[sid.index()].var_id.as_str();

        let inputs: Vec<&str> = b
            .inputs
            .iter()
            .map(|p| p.signal.map_or(p.var_id.as_str(), var))
            .collect();
        let mut out = format!("Block \"{}\" has ", b.name);
        match inputs.as_slice() {
            [] => out.push_str("NO INPUTS"),
            [one] => {
                let _ = write!(out, "one input ({one})");
            }
            many => {
                let _ = write!(out, "{} inputs ({})", many.len(), many.join(", "));
            }
        }
        match b.output {
            Some(sid) => {
                let _ = write!(out, ", one output ({})", var(sid));
            }
            None => out.push_str(", NO OUTPUTS"),
        }
        let _ = write!(out, ", value [{}]", b.value());

        let units = b
            .output
            .or_else(|| b.input_signal(0).filter(|_| b.is_sink()))
            .map_or("", |sid| self.signals[sid.index()].units.as_str());
        if !units.is_empty() {
            let _ = write!(out, " ({units})");
        }

        let type_name = b.type_name();
        let article = if type_name.starts_with(['a', 'e', 'i', 'o', 'u']) {
            "an"
        } else {
            "a"
        };
        let _ = write!(out, " and is {article} {type_name} block{}.", self.detail(b));
        Ok(out)
    }

    fn detail(&self, b: &Block) -> String {
        match &b.kind {
            BlockKind::Function(f) => format!(" applying {f}"),
            BlockKind::Relation(op) => format!(" testing {}", op.token()),
            BlockKind::Logic(op) => format!(" combining with {}", op.token()),
            BlockKind::MinMax(op) => format!(" taking the {}", op.token()),
            BlockKind::Minus if b.inputs.len() == 1 => " (negation)".to_string(),
            BlockKind::Minus => " (difference)".to_string(),
            BlockKind::Switch { pieces } => {
                let noun = if *pieces == 1 { "piece" } else { "pieces" };
                format!(" with {pieces} {noun} and an otherwise branch")
            }
            BlockKind::Limiter { lower, upper } => format!(" with limits [{lower}, {upper}]"),
            BlockKind::Bp { bp_set } => match self.bp_sets.get(bp_set.index()) {
                Some(bp) => format!(" using {} ({} points)", bp.id(), bp.len()),
                None => String::new(),
            },
            BlockKind::FuncTable { table } => match self.tables.get(table.index()) {
                Some(t) => {
                    let dims: Vec<String> = t.dims().iter().map(ToString::to_string).collect();
                    format!(" using {} ({})", t.id(), dims.join("x"))
                }
                None => String::new(),
            },
            BlockKind::Input
            | BlockKind::Output
            | BlockKind::Constant { .. }
            | BlockKind::Sum
            | BlockKind::Product => String::new(),
        }
    }
}

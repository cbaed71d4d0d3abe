//! Code generation over a model's execution order.
//!
//! Each non-derived signal is assigned once per pass, the first time
//! anything needs it; later readers use the bare varID. A derived signal
//! is never assigned: its producer's expression is inlined, parenthesized,
//! at every use. The `defined` flags on the model's signals carry this
//! memo and are cleared at the start of every pass.

use af_core::{BlockId, Dialect, SignalId, sanitize};
use af_model::{BlockKind, CodegenConfig, Model, ModelError, ModelResult};
use tracing::debug;

use crate::code::CodeAndVarNames;
use crate::syntax::{Expr, Syntax, syntax_for};
use crate::tables::{generate_declarations_with, generate_table_data};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodegenOptions {
    pub dialect: Dialect,
    /// Leading spaces for C statements.
    pub indent: usize,
    /// Include breakpoint and table arrays in `generate_source`.
    pub emit_table_data: bool,
}

impl CodegenOptions {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            indent: 4,
            emit_table_data: true,
        }
    }
}

impl Default for CodegenOptions {
    fn default() -> Self {
        Self::new(Dialect::C)
    }
}

impl From<&CodegenConfig> for CodegenOptions {
    fn from(config: &CodegenConfig) -> Self {
        Self {
            dialect: config.dialect,
            indent: config.indent,
            emit_table_data: config.emit_table_data,
        }
    }
}

/// Generate assignment statements for every block of an initialized model.
pub fn generate_code(model: &mut Model, dialect: Dialect) -> ModelResult<CodeAndVarNames> {
    generate_code_with(model, &CodegenOptions::new(dialect))
}

/// [`generate_code`] in the model's own dialect.
pub fn generate_model_code(model: &mut Model) -> ModelResult<CodeAndVarNames> {
    let dialect = model.dialect();
    generate_code(model, dialect)
}

pub fn generate_code_with(
    model: &mut Model,
    options: &CodegenOptions,
) -> ModelResult<CodeAndVarNames> {
    let order = model
        .execution_order()
        .ok_or_else(|| ModelError::NotReady {
            what: format!("model '{}' is not initialized", model.name()),
        })?
        .to_vec();
    model.reset_defined_flags();

    let mut emitter = Emitter {
        model,
        syntax: syntax_for(options.dialect),
        indent: options.indent,
        out: CodeAndVarNames::new(),
    };
    for id in order {
        emitter.visit(id)?;
    }
    debug!(
        model = %emitter.model.name(),
        dialect = %options.dialect,
        vars = emitter.out.var_names().len(),
        "generated code"
    );
    Ok(emitter.out)
}

/// Declarations, table data (if enabled) and statements as one text.
pub fn generate_source(model: &mut Model, options: &CodegenOptions) -> ModelResult<String> {
    let code = generate_code_with(model, options)?;
    let syntax = syntax_for(options.dialect);
    let mut text = syntax.comment(&format!("model {}", model.name()));
    text.push_str(&generate_declarations_with(code.var_names(), options));
    if options.emit_table_data {
        text.push_str(&generate_table_data(model, options.dialect));
    }
    text.push_str(code.code());
    Ok(text)
}

/// Identifier used for a breakpoint or table array.
pub(crate) fn array_name(id: &str) -> String {
    sanitize(id)
}

struct Emitter<'m> {
    model: &'m mut Model,
    syntax: &'static dyn Syntax,
    indent: usize,
    out: CodeAndVarNames,
}

impl Emitter<'_> {
    fn visit(&mut self, id: BlockId) -> ModelResult<()> {
        let block = self.model.block(id)?;
        match block.kind() {
            BlockKind::Input => {
                if let Some(sid) = block.output() {
                    let var = self.model.signal(sid)?.var_id().to_string();
                    self.model.signal_mut(sid)?.set_defined();
                    self.out.add_var_name(&var);
                }
            }
            BlockKind::Output => {
                let Some(sid) = block.input_signal(0) else {
                    return Ok(());
                };
                let s = self.model.signal(sid)?;
                match s.source() {
                    // outputs need a named value even when it would be inlined
                    Some(src) if s.is_derived() && !s.is_defined() => {
                        let var = s.var_id().to_string();
                        self.define(sid, src.block, &var)?;
                    }
                    _ => {
                        self.signal_code(sid)?;
                    }
                }
            }
            _ => {
                let Some(sid) = block.output() else {
                    return Ok(());
                };
                let s = self.model.signal(sid)?;
                if !s.is_derived() && !s.is_defined() {
                    self.signal_code(sid)?;
                }
            }
        }
        Ok(())
    }

    /// Text standing for `sid` at a point of use, emitting its definition
    /// first if needed.
    fn signal_code(&mut self, sid: SignalId) -> ModelResult<Expr> {
        let s = self.model.signal(sid)?;
        let var = s.var_id().to_string();
        let (derived, defined) = (s.is_derived(), s.is_defined());
        let Some(src) = s.source() else {
            self.out.add_var_name(&var);
            return Ok(Expr::number(var));
        };
        if derived {
            return Ok(self.block_expr(src.block)?.parenthesized());
        }
        let from_input = matches!(self.model.block(src.block)?.kind(), BlockKind::Input);
        if !defined && !from_input {
            self.define(sid, src.block, &var)?;
        }
        self.out.add_var_name(&var);
        Ok(Expr::number(var))
    }

    fn define(&mut self, sid: SignalId, producer: BlockId, var: &str) -> ModelResult<()> {
        let expr = self.block_expr(producer)?;
        let stmt = self
            .syntax
            .assignment(var, &self.syntax.as_number(&expr), self.indent);
        self.out.append_code(&stmt);
        self.out.add_var_name(var);
        self.model.signal_mut(sid)?.set_defined();
        Ok(())
    }

    /// Expression computing `id`'s value from its inputs.
    fn block_expr(&mut self, id: BlockId) -> ModelResult<Expr> {
        let block = self.model.block(id)?;
        let kind = block.kind().clone();
        let output_var = block
            .output()
            .map(|sid| self.model.signal(sid).map(|s| s.var_id().to_string()))
            .transpose()?;
        let inputs = (0..block.num_inputs())
            .map(|port| {
                block
                    .input_signal(port)
                    .ok_or_else(|| ModelError::UnconnectedInput {
                        block: block.name().to_string(),
                        port,
                        var_id: block.inputs()[port].var_id.clone(),
                    })
            })
            .collect::<ModelResult<Vec<_>>>()?;

        let args = inputs
            .into_iter()
            .map(|sid| self.signal_code(sid))
            .collect::<ModelResult<Vec<_>>>()?;
        let syn = self.syntax;
        let nums: Vec<String> = args.iter().map(|e| syn.as_number(e)).collect();
        let first = || {
            nums.first()
                .cloned()
                .unwrap_or_else(|| syn.literal(f64::NAN))
        };

        let expr = match kind {
            BlockKind::Input => Expr::number(output_var.unwrap_or_else(|| syn.literal(f64::NAN))),
            BlockKind::Output => args
                .into_iter()
                .next()
                .unwrap_or_else(|| Expr::number(syn.literal(f64::NAN))),
            BlockKind::Constant { value } => Expr::number(syn.literal(value)),
            BlockKind::Function(f) => Expr::number(syn.function(f, &nums)),
            BlockKind::Sum => Expr::number(nums.join(" + ")),
            BlockKind::Product => Expr::number(nums.join(" * ")),
            BlockKind::Minus => match nums.as_slice() {
                [a] => Expr::number(format!("-{a}")),
                [a, b] => Expr::number(format!("{a} - {b}")),
                _ => Expr::number(syn.literal(f64::NAN)),
            },
            BlockKind::MinMax(op) => Expr::number(syn.minmax(op, &nums)),
            BlockKind::Logic(op) => {
                let conds: Vec<String> = args.iter().map(|e| syn.as_condition(e)).collect();
                Expr::condition(syn.logic(op, &conds))
            }
            BlockKind::Relation(op) => match nums.as_slice() {
                [a, b] => Expr::condition(syn.relation(op, a, b)),
                _ => Expr::number(syn.literal(f64::NAN)),
            },
            BlockKind::Switch { pieces } => {
                let pairs: Vec<(String, String)> = args
                    .chunks_exact(2)
                    .take(pieces)
                    .map(|pair| (syn.as_number(&pair[0]), syn.as_condition(&pair[1])))
                    .collect();
                let otherwise = nums
                    .get(2 * pieces)
                    .cloned()
                    .unwrap_or_else(|| syn.literal(f64::NAN));
                Expr::number(syn.select(&pairs, &otherwise))
            }
            BlockKind::Limiter { lower, upper } => {
                let lo = (lower > f64::NEG_INFINITY).then(|| syn.literal(lower));
                let hi = (upper < f64::INFINITY).then(|| syn.literal(upper));
                Expr::number(syn.clamp(&first(), lo.as_deref(), hi.as_deref()))
            }
            BlockKind::Bp { bp_set } => {
                let bp = self.model.breakpoint_set(bp_set)?;
                Expr::number(syn.locate_bp(&first(), &array_name(bp.id()), bp.len()))
            }
            BlockKind::FuncTable { table } => {
                let t = self.model.func_table(table)?;
                Expr::number(syn.interpolate(&array_name(t.id()), t.dims(), &nums))
            }
        };
        Ok(expr)
    }
}

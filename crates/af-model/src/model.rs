//! The model: arenas of blocks, signals and tables plus the builder API.
//!
//! Blocks and signals reference each other through [`BlockId`]/[`SignalId`]
//! handles into the model's vectors, never by ownership. Any graph mutation
//! drops the stored execution order; `initialize` must run again before the
//! next `cycle`.

use std::collections::HashMap;

use af_core::{BlockId, BpSetId, Dialect, NameList, SignalId, TableId};
use tracing::{debug, warn};

use crate::block::{Block, BlockKind};
use crate::config::ModelConfig;
use crate::error::{ModelError, ModelResult};
use crate::ops::Arity;
use crate::signal::Signal;
use crate::table::{BreakpointSet, FuncTable};

/// Dataflow model of blocks connected by signals.
#[derive(Debug, Clone, Default)]
pub struct Model {
    pub(crate) name: String,
    pub(crate) blocks: Vec<Block>,
    pub(crate) signals: Vec<Signal>,
    pub(crate) bp_sets: Vec<BreakpointSet>,
    pub(crate) tables: Vec<FuncTable>,
    pub(crate) var_ids: HashMap<String, SignalId>,
    bp_ids: HashMap<String, BpSetId>,
    table_ids: HashMap<String, TableId>,
    pub(crate) names: NameList,
    pub(crate) cycle_count: u64,
    dialect: Dialect,
    pub(crate) verbose: bool,
    pub(crate) order: Option<Vec<BlockId>>,
}

impl Model {
    /// Create a new empty model.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Create an empty model named and configured from `config`.
    pub fn with_config(config: &ModelConfig) -> Self {
        let mut model = Self::new(config.name.clone());
        model.dialect = config.codegen.dialect;
        model.verbose = config.verbose;
        model
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Default dialect for code generation.
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn set_dialect(&mut self, dialect: Dialect) {
        self.dialect = dialect;
    }

    /// Mark every current and future block verbose.
    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
        for b in &mut self.blocks {
            b.set_verbose(verbose);
        }
    }

    /// Number of completed or attempted evaluation cycles.
    pub fn cycle_count(&self) -> u64 {
        self.cycle_count
    }

    // ── Builder API ─────────────────────────────────────────────────────────

    /// Add a signal. Its varID must be unique within the model.
    pub fn new_signal(
        &mut self,
        name: impl Into<String>,
        var_id: impl Into<String>,
        units: impl Into<String>,
    ) -> ModelResult<SignalId> {
        let var_id = var_id.into();
        if self.var_ids.contains_key(&var_id) {
            return Err(ModelError::DuplicateVarId { var_id });
        }
        let id = SignalId::from_index(self.signals.len());
        self.var_ids.insert(var_id.clone(), id);
        self.signals.push(Signal::new(id, name, var_id, units));
        Ok(id)
    }

    /// Add a breakpoint set. Its id must be unique among breakpoint sets.
    pub fn new_breakpoint_set(
        &mut self,
        id: impl Into<String>,
        name: impl Into<String>,
        values: Vec<f64>,
    ) -> ModelResult<BpSetId> {
        self.add_breakpoint_set(BreakpointSet::new(id, name, values)?)
    }

    pub fn add_breakpoint_set(&mut self, bp: BreakpointSet) -> ModelResult<BpSetId> {
        if self.bp_ids.contains_key(bp.id()) {
            return Err(ModelError::InvalidBreakpoints {
                id: bp.id().to_string(),
            });
        }
        let handle = BpSetId::from_index(self.bp_sets.len());
        self.bp_ids.insert(bp.id().to_string(), handle);
        self.bp_sets.push(bp);
        Ok(handle)
    }

    /// Add a function table over previously added breakpoint sets, named by
    /// id in dimension order.
    pub fn new_func_table(
        &mut self,
        id: impl Into<String>,
        name: impl Into<String>,
        bp_ids: &[&str],
        values: Vec<f64>,
    ) -> ModelResult<TableId> {
        let sets = bp_ids
            .iter()
            .map(|bp| self.breakpoint_set_by_id(bp))
            .collect::<ModelResult<Vec<_>>>()?;
        let table = FuncTable::new(id, name, &sets, values)?;
        self.add_func_table(table)
    }

    pub fn add_func_table(&mut self, table: FuncTable) -> ModelResult<TableId> {
        for bp in table.bp_ids() {
            self.breakpoint_set_by_id(bp)?;
        }
        if self.table_ids.contains_key(table.id()) {
            return Err(ModelError::DimensionMismatch {
                what: format!("table '{}' defined twice", table.id()),
            });
        }
        let handle = TableId::from_index(self.tables.len());
        self.table_ids.insert(table.id().to_string(), handle);
        self.tables.push(table);
        Ok(handle)
    }

    /// Add a block whose input ports expect the given varIDs, in order.
    ///
    /// An empty `name` is replaced by one derived from the block type; every
    /// name is made unique. `wire` later binds the ports to signals.
    pub fn new_block(
        &mut self,
        name: &str,
        kind: BlockKind,
        input_var_ids: &[&str],
    ) -> ModelResult<BlockId> {
        let kind = self.normalize_kind(name, kind)?;
        let requested = if name.is_empty() {
            kind.type_name()
        } else {
            name
        };
        let arity = match &kind {
            BlockKind::FuncTable { table } => Arity::Exactly(self.func_table(*table)?.ndim()),
            other => other.arity(),
        };
        if !arity.accepts(input_var_ids.len()) {
            return Err(ModelError::InvalidArity {
                block: requested.to_string(),
                expected: arity.describe(),
                found: input_var_ids.len(),
            });
        }

        let id = BlockId::from_index(self.blocks.len());
        if let BlockKind::Bp { bp_set } = &kind {
            if let Some(bp) = self.bp_sets.get_mut(bp_set.index()) {
                bp.register_user(id);
            }
        }
        let unique = self.names.get(requested);
        let mut block = Block::new(id, unique, kind, input_var_ids);
        block.set_verbose(self.verbose);
        self.blocks.push(block);
        self.order = None;
        Ok(id)
    }

    fn normalize_kind(&self, name: &str, kind: BlockKind) -> ModelResult<BlockKind> {
        match kind {
            BlockKind::Limiter { lower, upper } if lower > upper => {
                warn!(block = name, lower, upper, "limiter bounds reversed; swapping");
                Ok(BlockKind::limiter(lower, upper))
            }
            BlockKind::Bp { bp_set } => {
                self.breakpoint_set(bp_set)?;
                Ok(kind)
            }
            other => Ok(other),
        }
    }

    /// Bind input `port` of `block` to `signal`, replacing any earlier binding.
    pub fn connect_input(
        &mut self,
        block: BlockId,
        port: usize,
        signal: SignalId,
    ) -> ModelResult<()> {
        self.signal(signal)?;
        let b = self
            .blocks
            .get_mut(block.index())
            .ok_or_else(|| unknown_block(block))?;
        let len = b.inputs.len();
        let slot = b
            .inputs
            .get_mut(port)
            .ok_or_else(|| ModelError::IndexOutOfBounds {
                what: format!("inputs of block '{}'", b.name),
                index: port,
                len,
            })?;
        let previous = slot.signal.replace(signal);
        slot.var_id = self.signals[signal.index()].var_id.clone();
        if let Some(prev) = previous {
            self.signals[prev.index()].remove_sink(block, port);
        }
        self.signals[signal.index()].add_sink(block, port);
        self.order = None;
        Ok(())
    }

    /// Make `block` the source of `signal`.
    pub fn connect_output(&mut self, block: BlockId, signal: SignalId) -> ModelResult<()> {
        self.signal(signal)?;
        let b = self
            .blocks
            .get_mut(block.index())
            .ok_or_else(|| unknown_block(block))?;
        if b.is_sink() {
            return Err(ModelError::InvalidArg {
                what: format!("output block '{}' drives no signal", b.name),
            });
        }
        if let Some(existing) = b.output {
            if existing != signal {
                return Err(ModelError::AlreadyConnected {
                    what: format!(
                        "block '{}' already drives '{}'",
                        b.name,
                        self.signals[existing.index()].var_id
                    ),
                });
            }
        }
        self.signals[signal.index()].set_source(block, 0)?;
        b.output = Some(signal);
        self.order = None;
        debug!(block = %b.name, signal = %self.signals[signal.index()].var_id, "connected output");
        Ok(())
    }

    // ── Accessors ───────────────────────────────────────────────────────────

    pub fn block(&self, id: BlockId) -> ModelResult<&Block> {
        self.blocks.get(id.index()).ok_or_else(|| unknown_block(id))
    }

    pub fn block_mut(&mut self, id: BlockId) -> ModelResult<&mut Block> {
        self.blocks.get_mut(id.index()).ok_or_else(|| unknown_block(id))
    }

    pub fn signal(&self, id: SignalId) -> ModelResult<&Signal> {
        self.signals.get(id.index()).ok_or_else(|| unknown_signal(id))
    }

    /// Mutable signal access for metadata (limits, IC, role, flags).
    pub fn signal_mut(&mut self, id: SignalId) -> ModelResult<&mut Signal> {
        self.signals
            .get_mut(id.index())
            .ok_or_else(|| unknown_signal(id))
    }

    pub fn signal_by_var_id(&self, var_id: &str) -> Option<SignalId> {
        self.var_ids.get(var_id).copied()
    }

    pub fn block_by_name(&self, name: &str) -> Option<BlockId> {
        self.blocks.iter().find(|b| b.name == name).map(|b| b.id)
    }

    pub fn breakpoint_set(&self, id: BpSetId) -> ModelResult<&BreakpointSet> {
        self.bp_sets
            .get(id.index())
            .ok_or_else(|| ModelError::UnknownReference {
                what: format!("breakpoint set handle {id}"),
            })
    }

    pub fn breakpoint_set_by_id(&self, id: &str) -> ModelResult<&BreakpointSet> {
        self.bp_ids
            .get(id)
            .map(|h| &self.bp_sets[h.index()])
            .ok_or_else(|| ModelError::UnknownReference {
                what: format!("breakpoint set '{id}'"),
            })
    }

    pub fn bp_handle(&self, id: &str) -> Option<BpSetId> {
        self.bp_ids.get(id).copied()
    }

    pub fn func_table(&self, id: TableId) -> ModelResult<&FuncTable> {
        self.tables
            .get(id.index())
            .ok_or_else(|| ModelError::UnknownReference {
                what: format!("function table handle {id}"),
            })
    }

    pub fn table_handle(&self, id: &str) -> Option<TableId> {
        self.table_ids.get(id).copied()
    }

    /// All blocks in creation order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    pub fn breakpoint_sets(&self) -> &[BreakpointSet] {
        &self.bp_sets
    }

    pub fn tables(&self) -> &[FuncTable] {
        &self.tables
    }

    /// Execution order computed by `initialize`, if still valid.
    pub fn execution_order(&self) -> Option<&[BlockId]> {
        self.order.as_deref()
    }

    pub fn is_initialized(&self) -> bool {
        self.order.is_some()
    }

    /// Blocks in execution order.
    pub fn sorted_blocks(&self) -> ModelResult<Vec<&Block>> {
        let order = self.order.as_ref().ok_or_else(|| self.not_initialized())?;
        Ok(order.iter().map(|id| &self.blocks[id.index()]).collect())
    }

    /// Clear every signal's `defined` flag ahead of a code generation pass.
    pub fn reset_defined_flags(&mut self) {
        for s in &mut self.signals {
            s.clear_defined();
        }
    }

    pub(crate) fn not_initialized(&self) -> ModelError {
        ModelError::NotReady {
            what: format!("model '{}' is not initialized", self.name),
        }
    }
}

pub(crate) fn unknown_block(id: BlockId) -> ModelError {
    ModelError::UnknownReference {
        what: format!("block handle {id}"),
    }
}

pub(crate) fn unknown_signal(id: SignalId) -> ModelError {
    ModelError::UnknownReference {
        what: format!("signal handle {id}"),
    }
}

//! Graph wiring and boundary hook-up.
//!
//! `wire` binds dangling input ports to signals by varID. `hook_up_io`
//! rewrites the graph at its boundary: sourceless signals get Input (or
//! Constant) blocks, output signals get Output blocks, and every limited
//! signal gets a Limiter spliced between its producer and its consumers.
//! Inserted blocks are marked synthetic, and a spliced limiter's output
//! signal is marked derived. An initial condition moves into the block that
//! now drives the signal, and is dropped from a signal some block already
//! drives. Running `hook_up_io` a second time inserts
//! nothing.

use af_core::{BlockId, SignalId};
use tracing::{debug, warn};

use crate::block::{Block, BlockKind};
use crate::error::ModelResult;
use crate::model::Model;
use crate::signal::SignalRole;

impl Model {
    /// Bind every unbound input port whose varID names a signal.
    ///
    /// Ports with no matching signal stay unbound; `initialize` reports them.
    /// Returns the number of ports bound.
    pub fn wire(&mut self) -> usize {
        let mut bound = 0;
        for bi in 0..self.blocks.len() {
            let block_id = BlockId::from_index(bi);
            for port in 0..self.blocks[bi].inputs.len() {
                let slot = &mut self.blocks[bi].inputs[port];
                if slot.signal.is_some() {
                    continue;
                }
                match self.var_ids.get(&slot.var_id) {
                    Some(&sid) => {
                        slot.signal = Some(sid);
                        self.signals[sid.index()].add_sink(block_id, port);
                        bound += 1;
                    }
                    None => {
                        debug!(
                            block = %self.blocks[bi].name,
                            port,
                            var_id = %self.blocks[bi].inputs[port].var_id,
                            "no signal for input port"
                        );
                    }
                }
            }
        }
        if bound > 0 {
            self.order = None;
        }
        debug!(model = %self.name, bound, "wired input ports");
        bound
    }

    /// Insert boundary and limiter blocks. Returns the number of blocks
    /// inserted.
    pub fn hook_up_io(&mut self) -> ModelResult<usize> {
        let before = self.blocks.len();
        let existing = self.signals.len();

        for si in 0..existing {
            let sid = SignalId::from_index(si);
            self.hook_up_source(sid)?;
            self.hook_up_sink(sid)?;
        }
        for si in 0..existing {
            self.splice_limiter(SignalId::from_index(si))?;
        }

        let inserted = self.blocks.len() - before;
        if inserted > 0 {
            self.order = None;
        }
        debug!(model = %self.name, inserted, "hooked up model boundary");
        Ok(inserted)
    }

    fn hook_up_source(&mut self, sid: SignalId) -> ModelResult<()> {
        let s = &mut self.signals[sid.index()];
        if s.has_source() {
            if let Some(ic) = s.ic.take() {
                warn!(signal = %s.var_id, ic, "dropping initial condition of a driven signal");
            }
            return Ok(());
        }
        let s = &self.signals[sid.index()];
        let is_input_role = s.role().is_some_and(SignalRole::is_model_input);
        if !is_input_role && s.role().is_none() && !s.has_sinks() {
            debug!(signal = %s.var_id, "leaving unused signal unconnected");
            return Ok(());
        }

        let var_id = s.var_id.clone();
        let ic = s.ic();
        match ic {
            Some(value) if !is_input_role => {
                let b = self.insert_synthetic(&var_id, BlockKind::Constant { value }, &[]);
                self.connect_output(b, sid)?;
                self.signals[sid.index()].ic = None;
                debug!(signal = %var_id, value, "inserted constant for initial condition");
            }
            _ => {
                let b = self.insert_synthetic(&var_id, BlockKind::Input, &[]);
                self.blocks[b.index()].set_input_value(ic.unwrap_or(f64::NAN));
                self.connect_output(b, sid)?;
                let s = &mut self.signals[sid.index()];
                s.ic = None;
                s.mark_input();
                debug!(signal = %var_id, "inserted input block");
            }
        }
        Ok(())
    }

    fn hook_up_sink(&mut self, sid: SignalId) -> ModelResult<()> {
        let s = &self.signals[sid.index()];
        let role = s.role();
        let wants_output = role.is_some_and(SignalRole::is_model_output)
            || (!s.has_sinks() && !role.is_some_and(SignalRole::is_model_input));
        if !wants_output || !s.has_source() {
            return Ok(());
        }
        let has_output_block = s
            .sinks()
            .iter()
            .any(|p| self.blocks[p.block.index()].is_sink());
        if has_output_block {
            return Ok(());
        }

        let var_id = s.var_id.clone();
        let b = self.insert_synthetic(&format!("{var_id}_out"), BlockKind::Output, &[var_id.as_str()]);
        self.connect_input(b, 0, sid)?;
        self.signals[sid.index()].mark_output();
        debug!(signal = %var_id, "inserted output block");
        Ok(())
    }

    /// Route `sid`'s producer through a new `<varID>_unlim` signal into a
    /// synthetic limiter that now drives `sid`.
    fn splice_limiter(&mut self, sid: SignalId) -> ModelResult<()> {
        let s = &self.signals[sid.index()];
        if !s.is_limited() {
            return Ok(());
        }
        let Some(source) = s.source() else {
            return Ok(());
        };
        let producer = &self.blocks[source.block.index()];
        if producer.is_synthetic() && matches!(producer.kind(), BlockKind::Limiter { .. }) {
            return Ok(());
        }

        let var_id = s.var_id.clone();
        let (lower, upper) = (s.lower_limit(), s.upper_limit());
        let units = s.units.clone();
        let unlim_var = self.unique_var_id(&format!("{var_id}_unlim"));
        let unlim = self.new_signal(unlim_var.clone(), unlim_var.clone(), units)?;

        // hand the producer's output over to the unlimited signal
        self.blocks[source.block.index()].output = Some(unlim);
        self.signals[unlim.index()].source = Some(source);
        self.signals[sid.index()].source = None;

        let limiter = self.insert_synthetic(
            &format!("{var_id}_limiter"),
            BlockKind::limiter(lower, upper),
            &[unlim_var.as_str()],
        );
        self.connect_input(limiter, 0, unlim)?;
        self.connect_output(limiter, sid)?;
        self.signals[sid.index()].set_derived(true);
        debug!(signal = %var_id, lower, upper, "spliced limiter");
        Ok(())
    }

    fn insert_synthetic(&mut self, name: &str, kind: BlockKind, inputs: &[&str]) -> BlockId {
        let id = BlockId::from_index(self.blocks.len());
        let unique = self.names.get(name);
        let mut block = Block::new(id, unique, kind, inputs);
        block.synthetic = true;
        block.set_verbose(self.verbose);
        self.blocks.push(block);
        id
    }

    fn unique_var_id(&self, base: &str) -> String {
        let mut candidate = base.to_string();
        let mut suffix = 1;
        while self.var_ids.contains_key(&candidate) {
            candidate = format!("{base}_{suffix}");
            suffix += 1;
        }
        candidate
    }
}

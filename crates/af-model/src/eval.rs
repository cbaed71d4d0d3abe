//! Evaluation: per-block updates, cycles and input/output vectors.

use af_core::{BlockId, SignalId, Tolerances, VectorInfo, nearly_equal};
use tracing::{debug, trace};

use crate::block::{Block, BlockKind};
use crate::error::{ModelError, ModelResult};
use crate::model::Model;

impl Model {
    /// Value on `signal`, read from its source block.
    ///
    /// Fails with `NotReady` when the signal has no source or the source has
    /// not been updated yet.
    pub fn source_value(&self, signal: SignalId) -> ModelResult<f64> {
        let s = self.signal(signal)?;
        let src = s.source().ok_or_else(|| ModelError::NotReady {
            what: format!("signal '{}' has no source", s.var_id),
        })?;
        let block = self.block(src.block)?;
        if !block.is_ready() {
            return Err(ModelError::NotReady {
                what: format!(
                    "signal '{}' source block '{}' has not been updated",
                    s.var_id, block.name
                ),
            });
        }
        Ok(block.value())
    }

    /// True if every input port of `block` reads a ready source.
    pub fn all_inputs_ready(&self, block: BlockId) -> ModelResult<bool> {
        let b = self.block(block)?;
        Ok((0..b.inputs.len()).all(|port| self.port_value(b, port).is_some()))
    }

    fn port_value(&self, block: &Block, port: usize) -> Option<f64> {
        let sid = block.input_signal(port)?;
        let src = self.signals.get(sid.index())?.source()?;
        let upstream = self.blocks.get(src.block.index())?;
        upstream.is_ready().then(|| upstream.value())
    }

    /// Recompute one block from its upstream values and return the result.
    pub fn update_block(&mut self, block: BlockId) -> ModelResult<f64> {
        let b = self.block(block)?;
        let values = (0..b.inputs.len())
            .map(|port| {
                self.port_value(b, port)
                    .ok_or_else(|| ModelError::InputNotReady {
                        block: b.name.clone(),
                        port,
                    })
            })
            .collect::<ModelResult<Vec<_>>>()?;

        let Self {
            blocks,
            bp_sets,
            tables,
            cycle_count,
            ..
        } = self;
        let b = &mut blocks[block.index()];
        b.update(&values, bp_sets, tables)?;
        if b.is_verbose() {
            debug!(
                block = %b.name,
                kind = b.type_name(),
                inputs = ?values,
                value = b.value(),
                cycle = *cycle_count,
                "updated block"
            );
        }
        Ok(b.value())
    }

    /// Run one evaluation pass over every block in execution order.
    ///
    /// The first failing block aborts the pass; values already computed
    /// during the pass are kept.
    pub fn cycle(&mut self) -> ModelResult<()> {
        let order = self.order.take().ok_or_else(|| self.not_initialized())?;
        self.cycle_count += 1;
        trace!(model = %self.name, cycle = self.cycle_count, "cycle");
        let result = order
            .iter()
            .try_for_each(|&id| self.update_block(id).map(|_| ()));
        self.order = Some(order);
        result
    }

    // ── Inputs and outputs ──────────────────────────────────────────────────

    /// Set the value of the Input block that feeds `var_id`, looking through
    /// any limiter spliced in by `hook_up_io`.
    pub fn set_input(&mut self, var_id: &str, value: f64) -> ModelResult<()> {
        let id = self
            .input_block_for(var_id)
            .ok_or_else(|| ModelError::UnknownReference {
                what: format!("no input block feeds '{var_id}'"),
            })?;
        self.blocks[id.index()].set_input_value(value);
        Ok(())
    }

    fn input_block_for(&self, var_id: &str) -> Option<BlockId> {
        let mut sid = self.signal_by_var_id(var_id)?;
        loop {
            let src = self.signals[sid.index()].source()?;
            let b = &self.blocks[src.block.index()];
            match b.kind {
                BlockKind::Input => return Some(b.id),
                BlockKind::Limiter { .. } if b.synthetic => sid = b.input_signal(0)?,
                _ => return None,
            }
        }
    }

    /// The varID callers use for `signal`: a signal feeding only a spliced
    /// limiter is known by the limiter's output.
    fn public_signal(&self, mut sid: SignalId) -> SignalId {
        loop {
            let s = &self.signals[sid.index()];
            let [sink] = s.sinks() else {
                return sid;
            };
            let b = &self.blocks[sink.block.index()];
            match (b.synthetic, &b.kind, b.output) {
                (true, BlockKind::Limiter { .. }, Some(out)) => sid = out,
                _ => return sid,
            }
        }
    }

    /// Current model inputs, one per Input block in creation order.
    pub fn input_vector(&self) -> Vec<VectorInfo> {
        self.blocks
            .iter()
            .filter(|b| matches!(b.kind, BlockKind::Input))
            .filter_map(|b| {
                let s = &self.signals[self.public_signal(b.output?).index()];
                Some(VectorInfo::input(&s.var_id, &s.units, b.value()))
            })
            .collect()
    }

    /// Assign every model input from `inputs`.
    ///
    /// The vector must name each Input block exactly once with matching
    /// units; anything else fails with `DimensionMismatch` before any value
    /// is changed.
    pub fn load_input_vector(&mut self, inputs: &[VectorInfo]) -> ModelResult<()> {
        let expected = self
            .blocks
            .iter()
            .filter(|b| matches!(b.kind, BlockKind::Input))
            .count();
        if inputs.len() != expected {
            return Err(ModelError::DimensionMismatch {
                what: format!(
                    "model '{}' has {} inputs, vector has {}",
                    self.name,
                    expected,
                    inputs.len()
                ),
            });
        }

        let mut targets = Vec::with_capacity(inputs.len());
        for info in inputs {
            let id = self
                .input_block_for(&info.name)
                .ok_or_else(|| ModelError::DimensionMismatch {
                    what: format!("'{}' is not a model input", info.name),
                })?;
            let units = self
                .signal_by_var_id(&info.name)
                .map(|sid| self.signals[sid.index()].units.as_str())
                .unwrap_or_default();
            if units != info.units {
                return Err(ModelError::DimensionMismatch {
                    what: format!(
                        "input '{}' is in '{}', vector gives '{}'",
                        info.name, units, info.units
                    ),
                });
            }
            if targets.contains(&id) {
                return Err(ModelError::DimensionMismatch {
                    what: format!("input '{}' given twice", info.name),
                });
            }
            targets.push(id);
        }

        for (id, info) in targets.into_iter().zip(inputs) {
            self.blocks[id.index()].set_input_value(info.value);
        }
        debug!(model = %self.name, count = inputs.len(), "loaded input vector");
        Ok(())
    }

    /// Current model outputs, one per Output block in creation order.
    pub fn output_vector(&self) -> Vec<VectorInfo> {
        self.blocks
            .iter()
            .filter(|b| b.is_sink())
            .filter_map(|b| {
                let s = &self.signals[b.input_signal(0)?.index()];
                Some(VectorInfo::output(&s.var_id, &s.units, b.value()))
            })
            .collect()
    }

    /// Compare `expected` outputs against the current output vector.
    ///
    /// Returns the names whose values differ by more than their tolerance.
    /// Unknown names or units mismatches fail with `DimensionMismatch`.
    pub fn check_outputs(&self, expected: &[VectorInfo]) -> ModelResult<Vec<String>> {
        let actual = self.output_vector();
        let mut failures = Vec::new();
        for want in expected {
            let got = actual
                .iter()
                .find(|o| o.name == want.name)
                .ok_or_else(|| ModelError::DimensionMismatch {
                    what: format!("'{}' is not a model output", want.name),
                })?;
            if got.units != want.units {
                return Err(ModelError::DimensionMismatch {
                    what: format!(
                        "output '{}' is in '{}', expected '{}'",
                        want.name, got.units, want.units
                    ),
                });
            }
            let tol = Tolerances {
                abs: want.tolerance,
                ..Tolerances::default()
            };
            if !nearly_equal(got.value, want.value, tol) {
                debug!(
                    output = %want.name,
                    expected = want.value,
                    actual = got.value,
                    "output outside tolerance"
                );
                failures.push(want.name.clone());
            }
        }
        Ok(failures)
    }
}

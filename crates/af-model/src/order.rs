//! Execution ordering.
//!
//! A block B depends on block A when A's output signal feeds one of B's
//! input ports. `initialize` validates that every port is driven and sorts
//! the blocks with Kahn's algorithm; among blocks whose dependencies are
//! all satisfied, the one created first goes next.

use std::collections::BTreeSet;

use af_core::BlockId;
use tracing::info;

use crate::error::{ModelError, ModelResult};
use crate::model::{Model, unknown_block};
use crate::signal::Signal;

impl Model {
    /// Validate connectivity and compute the execution order.
    ///
    /// Fails with `UnconnectedInput` for any port that is unbound or bound
    /// to a signal without a source, and with `CyclicGraph` when the blocks
    /// cannot be ordered feed-forward. On failure the model is left
    /// uninitialized.
    pub fn initialize(&mut self) -> ModelResult<()> {
        self.order = None;
        let dependents = self.dependency_edges()?;

        let n = self.blocks.len();
        let mut in_degree: Vec<usize> = self.blocks.iter().map(|b| b.inputs.len()).collect();
        let mut ready: BTreeSet<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
        let mut order = Vec::with_capacity(n);

        while let Some(i) = ready.pop_first() {
            order.push(BlockId::from_index(i));
            for &next in &dependents[i] {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    ready.insert(next);
                }
            }
        }

        if order.len() != n {
            let blocks = (0..n)
                .filter(|&i| in_degree[i] > 0)
                .map(|i| self.blocks[i].name.clone())
                .collect();
            return Err(ModelError::CyclicGraph { blocks });
        }

        for b in &mut self.blocks {
            b.ready = false;
        }
        info!(
            model = %self.name,
            blocks = n,
            signals = self.signals.len(),
            "initialized execution order"
        );
        self.order = Some(order);
        Ok(())
    }

    /// For each block, the blocks reading its output, one entry per port.
    fn dependency_edges(&self) -> ModelResult<Vec<Vec<usize>>> {
        let mut dependents = vec![Vec::new(); self.blocks.len()];
        for (bi, block) in self.blocks.iter().enumerate() {
            for (port, input) in block.inputs.iter().enumerate() {
                let source = input
                    .signal
                    .and_then(|sid| self.signals.get(sid.index()))
                    .and_then(Signal::source)
                    .ok_or_else(|| ModelError::UnconnectedInput {
                        block: block.name.clone(),
                        port,
                        var_id: input.var_id.clone(),
                    })?;
                dependents
                    .get_mut(source.block.index())
                    .ok_or_else(|| unknown_block(source.block))?
                    .push(bi);
            }
        }
        Ok(dependents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockKind;

    #[test]
    fn order_follows_dependencies() {
        let mut model = Model::new("m");
        let a = model.new_signal("a", "a", "").unwrap();
        let b = model.new_signal("b", "b", "").unwrap();
        // created downstream-first
        let neg2 = model.new_block("second", BlockKind::Minus, &["b"]).unwrap();
        let neg1 = model.new_block("first", BlockKind::Minus, &["a"]).unwrap();
        let k = model
            .new_block("k", BlockKind::Constant { value: 1.0 }, &[])
            .unwrap();
        model.connect_output(k, a).unwrap();
        model.connect_output(neg1, b).unwrap();
        model.wire();
        model.initialize().unwrap();
        assert_eq!(model.execution_order().unwrap(), &[k, neg1, neg2]);
    }

    #[test]
    fn ties_break_in_creation_order() {
        let mut model = Model::new("m");
        let c1 = model
            .new_block("c1", BlockKind::Constant { value: 1.0 }, &[])
            .unwrap();
        let c2 = model
            .new_block("c2", BlockKind::Constant { value: 2.0 }, &[])
            .unwrap();
        let c3 = model
            .new_block("c3", BlockKind::Constant { value: 3.0 }, &[])
            .unwrap();
        model.initialize().unwrap();
        assert_eq!(model.execution_order().unwrap(), &[c1, c2, c3]);
    }

    #[test]
    fn unbound_port_is_reported() {
        let mut model = Model::new("m");
        model.new_block("neg", BlockKind::Minus, &["ghost"]).unwrap();
        model.wire();
        let err = model.initialize().unwrap_err();
        assert!(matches!(
            err,
            ModelError::UnconnectedInput { ref block, port: 0, ref var_id }
                if block == "neg" && var_id == "ghost"
        ));
        assert!(!model.is_initialized());
    }

    #[test]
    fn cycle_is_reported() {
        let mut model = Model::new("m");
        let a = model.new_signal("a", "a", "").unwrap();
        let b = model.new_signal("b", "b", "").unwrap();
        let n1 = model.new_block("n1", BlockKind::Minus, &["b"]).unwrap();
        let n2 = model.new_block("n2", BlockKind::Minus, &["a"]).unwrap();
        model.connect_output(n1, a).unwrap();
        model.connect_output(n2, b).unwrap();
        model.wire();
        match model.initialize() {
            Err(ModelError::CyclicGraph { blocks }) => assert_eq!(blocks, ["n1", "n2"]),
            other => panic!("expected CyclicGraph, got {other:?}"),
        }
    }

    #[test]
    fn stale_source_handle_is_an_error() {
        let mut model = Model::new("m");
        let x = model.new_signal("x", "x", "").unwrap();
        model.new_block("neg", BlockKind::Minus, &["x"]).unwrap();
        model.signals[x.index()]
            .set_source(BlockId::from_index(99), 0)
            .unwrap();
        model.wire();
        assert!(matches!(
            model.initialize(),
            Err(ModelError::UnknownReference { .. })
        ));
        assert!(!model.is_initialized());
    }

    #[test]
    fn mutation_invalidates_order() {
        let mut model = Model::new("m");
        model
            .new_block("c", BlockKind::Constant { value: 1.0 }, &[])
            .unwrap();
        model.initialize().unwrap();
        assert!(model.is_initialized());
        model.new_signal("x", "x", "").unwrap();
        model
            .new_block("d", BlockKind::Constant { value: 2.0 }, &[])
            .unwrap();
        assert!(!model.is_initialized());
    }
}

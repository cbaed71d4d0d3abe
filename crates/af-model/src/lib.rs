//! Aero model dataflow graph for aeroflow.
//!
//! A [`Model`] owns blocks, signals, breakpoint sets and function tables.
//! An outside builder populates it, then:
//!
//! 1. [`Model::wire`] binds block input ports to signals by varID
//! 2. [`Model::hook_up_io`] adds boundary blocks and splices limiters
//! 3. [`Model::initialize`] validates connectivity and orders the blocks
//! 4. [`Model::cycle`] evaluates every block once, in order
//!
//! Code generation over the same order lives in `af-codegen`.
//!
//! # Architecture
//!
//! - Blocks and signals live in arenas inside the model and refer to each
//!   other through `af_core` handles
//! - Block variants form a closed enum; evaluation is a pattern match
//! - NaN and infinities flow through evaluation as ordinary values

pub mod block;
pub mod config;
mod describe;
pub mod error;
mod eval;
pub mod model;
pub mod ops;
mod order;
pub mod signal;
pub mod table;
mod wiring;

pub use block::{Block, BlockKind, InputPort, limit};
pub use config::{CodegenConfig, ModelConfig};
pub use error::{ModelError, ModelResult};
pub use model::Model;
pub use ops::{Arity, LogicOp, MathFunction, MinMaxOp, RelationOp};
pub use signal::{PortRef, Signal, SignalRole};
pub use table::{BreakpointSet, FuncTable};

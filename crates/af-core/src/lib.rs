//! af-core: stable foundation for aeroflow.
//!
//! Contains:
//! - ids (compact handles for blocks, signals and tables)
//! - numeric (Real + tolerances + float helpers)
//! - parse (number-list text grammar)
//! - names (unique identifier allocation)
//! - vector (named input/output vectors)
//! - dialect (code generation targets)
//! - error (shared error types)

pub mod dialect;
pub mod error;
pub mod ids;
pub mod names;
pub mod numeric;
pub mod parse;
pub mod vector;

// Re-exports: nice ergonomics for downstream crates
pub use dialect::Dialect;
pub use error::{AfError, AfResult};
pub use ids::*;
pub use names::{NameList, sanitize};
pub use numeric::*;
pub use parse::{ParseText, parse_number};
pub use vector::VectorInfo;

//! Error types for model construction, topology and evaluation.

use af_core::AfError;
use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors that can occur while building, ordering or evaluating a model.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Numeric text could not be parsed.
    #[error("Malformed number: '{text}'")]
    MalformedNumber { text: String },

    /// Function name not in the supported set.
    #[error("Unsupported function '{name}'")]
    UnsupportedFunction { name: String },

    /// Relational operator token not recognized.
    #[error("Unknown relation '{op}'")]
    UnknownRelation { op: String },

    /// Logic or min/max operator token not recognized.
    #[error("Unknown {family} operator '{op}'")]
    UnknownOperator { family: &'static str, op: String },

    /// Block constructed with the wrong number of inputs.
    #[error("Block '{block}' expects {expected} inputs, got {found}")]
    InvalidArity {
        block: String,
        expected: &'static str,
        found: usize,
    },

    /// Signal already has a source, or block already has an output.
    #[error("Already connected: {what}")]
    AlreadyConnected { what: String },

    /// Value requested before it has been computed.
    #[error("Not ready: {what}")]
    NotReady { what: String },

    /// Block update attempted before its upstream values exist.
    #[error("Block '{block}' input {port} is not ready")]
    InputNotReady { block: String, port: usize },

    /// No feed-forward execution order exists.
    #[error("Cyclic graph: no execution order for blocks [{}]", blocks.join(", "))]
    CyclicGraph { blocks: Vec<String> },

    /// An input port is unbound or bound to a signal nothing drives.
    #[error("Block '{block}' input {port} ('{var_id}') is not connected")]
    UnconnectedInput {
        block: String,
        port: usize,
        var_id: String,
    },

    /// Table or array access outside its range.
    #[error("Index out of bounds: {what} (index={index}, len={len})")]
    IndexOutOfBounds {
        what: String,
        index: usize,
        len: usize,
    },

    /// Vector length, name or units disagree with the model.
    #[error("Dimension mismatch: {what}")]
    DimensionMismatch { what: String },

    /// Breakpoint values empty or not strictly increasing.
    #[error("Breakpoint set '{id}' must be non-empty and strictly increasing")]
    InvalidBreakpoints { id: String },

    /// A second signal claimed an existing varID.
    #[error("Duplicate signal varID '{var_id}'")]
    DuplicateVarId { var_id: String },

    /// Argument rejected by a core helper.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: String },

    /// Handle, varID or table id does not name anything in the model.
    #[error("Unknown reference: {what}")]
    UnknownReference { what: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<AfError> for ModelError {
    fn from(err: AfError) -> Self {
        match err {
            AfError::MalformedNumber { text } => ModelError::MalformedNumber { text },
            AfError::IndexOutOfBounds { what, index, len } => ModelError::IndexOutOfBounds {
                what: what.to_string(),
                index,
                len,
            },
            AfError::DimensionMismatch { what } => ModelError::DimensionMismatch { what },
            AfError::InvalidArg { what } => ModelError::InvalidArg {
                what: what.to_string(),
            },
        }
    }
}

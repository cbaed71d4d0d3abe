use thiserror::Error;

pub type AfResult<T> = Result<T, AfError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AfError {
    #[error("Malformed number: '{text}'")]
    MalformedNumber { text: String },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Index out of bounds: {what} (index={index}, len={len})")]
    IndexOutOfBounds {
        what: &'static str,
        index: usize,
        len: usize,
    },

    #[error("Dimension mismatch: {what}")]
    DimensionMismatch { what: String },
}

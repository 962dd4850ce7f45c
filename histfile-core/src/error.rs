//! Error types for histfile-core.

use thiserror::Error;

/// Result type alias for histfile model operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for histogram, gate and scaler operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Count buffer length does not match the declared shape.
    #[error("count buffer has {actual} channels, shape declares {expected}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// A shape with a zero or overflowing extent.
    #[error("invalid histogram shape: {0}")]
    InvalidShape(String),

    /// Gate dimensionality does not match its histogram.
    #[error("gate '{gate}' is {gate_dims}-D but histogram '{histogram}' is {histogram_dims}-D")]
    DimensionMismatch {
        gate: String,
        histogram: String,
        gate_dims: u8,
        histogram_dims: u8,
    },

    /// Limits of one kind assigned to a gate of the other kind.
    #[error("{actual}-D limits cannot be set on {expected}-D gate '{gate}'")]
    LimitsMismatch {
        gate: String,
        expected: u8,
        actual: u8,
    },

    /// Referenced histogram is not registered.
    #[error("unknown histogram: {0}")]
    UnknownHistogram(String),
}

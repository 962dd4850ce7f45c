//! I/O error and warning types.

use thiserror::Error;

/// Result type for codec operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Codec error types.
#[derive(Error, Debug)]
pub enum Error {
    /// Bad signature, unknown type tag or implausible field value.
    #[error("invalid file format: {0}")]
    Format(String),

    /// Input ended before a record was complete.
    #[error("unexpected end of input at byte {offset} while reading {context}")]
    Truncated { offset: u64, context: String },

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),

    /// Core model error.
    #[error("core error: {0}")]
    Core(#[from] histfile_core::Error),
}

/// A record that was decoded but could not be applied.
///
/// Warnings never stop a load; they are collected in a
/// [`LoadReport`](crate::LoadReport) and logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// No histogram of this name to reload into.
    MissingHistogram(String),
    /// No gate of this name to reload into.
    MissingGate(String),
    /// No scaler of this name to reload into.
    MissingScaler(String),
    /// Stored histogram shape differs from the registered one.
    ShapeMismatch { histogram: String },
    /// Stored gate kind differs from the registered gate.
    GateKindMismatch { gate: String },
    /// A gate names a histogram number that is not in the file.
    UnresolvedGateOwner { gate: String, number: i32 },
    /// A whole section was decoded and deliberately not applied.
    IgnoredSection { section: &'static str, records: usize },
    /// The stream ended inside a record; the partial record was dropped.
    PartialRecord { offset: u64, context: String },
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::MissingHistogram(name) => write!(f, "histogram '{name}' not found, skipped"),
            Warning::MissingGate(name) => write!(f, "gate '{name}' not found, skipped"),
            Warning::MissingScaler(name) => write!(f, "scaler '{name}' not found, skipped"),
            Warning::ShapeMismatch { histogram } => {
                write!(f, "histogram '{histogram}' has a different shape, skipped")
            }
            Warning::GateKindMismatch { gate } => {
                write!(f, "gate '{gate}' has a different dimensionality, skipped")
            }
            Warning::UnresolvedGateOwner { gate, number } => {
                write!(f, "gate '{gate}' refers to unknown histogram number {number}, skipped")
            }
            Warning::IgnoredSection { section, records } => {
                write!(f, "{records} {section} record(s) not applied in this mode")
            }
            Warning::PartialRecord { offset, context } => {
                write!(f, "stream ends inside {context} at byte {offset}, record dropped")
            }
        }
    }
}

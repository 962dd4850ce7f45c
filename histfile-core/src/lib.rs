//! histfile-core: Histogram, gate and scaler model.
//!
//! This crate provides the in-memory types the file codecs produce and
//! consume, plus the [`Repository`] context object that replaces global
//! lookup tables.
//!

pub mod error;
pub mod gate;
pub mod histogram;
pub mod repository;

pub use error::{Error, Result};
pub use gate::{Gate, GateKind, GateLimits, Scaler};
pub use histogram::{CountKind, Counts, Histogram, Shape, MAX_CHANNELS};
pub use repository::Repository;

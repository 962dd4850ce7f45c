//! histfile-io: Readers and writers for histogram files.
//!
//! Two families of formats are supported:
//!
//! - JHF: a single self-describing big-endian file with histograms, gates
//!   and scalers, in three schema versions ([`jhf`]).
//! - ORNL: a `.drr` directory plus a `.his` sample file, possibly byte
//!   swapped ([`ornl`]).
//!
//! Decoders return plain model objects; [`load`] merges them into a
//! [`Repository`](histfile_core::Repository) in OPEN, RELOAD or ADD mode.
//!

pub mod byte_order;
pub mod config;
mod error;
pub mod field;
pub mod file;
pub mod jhf;
pub mod load;
pub mod ornl;

pub use byte_order::ByteOrder;
pub use config::CodecConfig;
pub use error::{Error, Result, Warning};
pub use file::{load_file, save_file, FileFormat};
pub use jhf::{decode_jhf, encode_jhf, JhfContents, JhfVersion, JhfWriteOptions};
pub use load::{LoadMode, LoadReport};
pub use ornl::{decode_ornl, encode_ornl, OrnlWriteOptions};

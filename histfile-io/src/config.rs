//! Codec configuration.
//!
//! Loaded from JSON; every key is optional:
//!
//! ```json
//! {
//!   "load_mode": "reload",
//!   "jhf": { "write_gates": false },
//!   "ornl": { "description": "run 42" }
//! }
//! ```

use crate::jhf::JhfWriteOptions;
use crate::load::LoadMode;
use crate::ornl::OrnlWriteOptions;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Settings for reading and writing histogram files.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    pub load_mode: LoadMode,
    pub jhf: JhfWriteOptions,
    pub ornl: OrnlWriteOptions,
}

impl CodecConfig {
    /// Loads configuration from a JSON file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        serde_json::from_reader(BufReader::new(file))
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }

    /// Loads configuration from a JSON string.
    ///
    /// # Errors
    /// Returns an error if the string cannot be parsed.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))
    }
}

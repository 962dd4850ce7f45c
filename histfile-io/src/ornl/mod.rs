//! ORNL paired DRR/HIS files.
//!
//! The DRR file is a directory describing each histogram; the HIS file
//! holds the samples. Files written here are big-endian with 32-bit
//! samples. Files from other systems may be byte swapped or use 16-bit
//! samples; both are handled on read.

pub mod drr;
pub mod his;

use crate::byte_order::ByteOrder;
use crate::field::{FieldReader, FieldWriter};
use crate::Result;
use chrono::{Datelike, Local, NaiveDateTime, Timelike};
use drr::Directory;
use histfile_core::{Counts, Histogram};
use log::debug;
use serde::{Deserialize, Serialize};
use std::io::{Read, Seek, Write};

/// Options for [`encode_ornl`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrnlWriteOptions {
    /// Free text stored in the DRR header.
    pub description: String,
    /// Time stamped into the header; the current local time when unset.
    #[serde(skip)]
    pub timestamp: Option<NaiveDateTime>,
}

impl Default for OrnlWriteOptions {
    fn default() -> Self {
        Self {
            description: "histfile ORNL export".to_owned(),
            timestamp: None,
        }
    }
}

impl OrnlWriteOptions {
    /// Header date fields: `[0, year, month, day, hour, minute, second]`.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn date_fields(&self) -> [i32; 7] {
        let stamp = self
            .timestamp
            .unwrap_or_else(|| Local::now().naive_local());
        [
            0,
            stamp.year(),
            stamp.month() as i32,
            stamp.day() as i32,
            stamp.hour() as i32,
            stamp.minute() as i32,
            stamp.second() as i32,
        ]
    }
}

/// Decodes the histograms of a DRR/HIS pair.
///
/// Names and titles come from the directory titles, numbers from the id
/// trailer. Counts are always integer.
///
/// # Errors
/// Returns [`Error::Format`](crate::Error::Format) for a bad signature or
/// unsupported record and [`Error::Truncated`](crate::Error::Truncated) if
/// either file is too short.
pub fn decode_ornl<D: Read, H: Read + Seek>(drr: D, his: H) -> Result<Vec<Histogram>> {
    let (directory, order) = drr::read_directory(drr)?;
    let mut samples = FieldReader::new(his, order);
    let mut histograms = Vec::with_capacity(directory.entries.len());
    for (entry, &id) in directory.entries.iter().zip(&directory.ids) {
        let shape = entry.shape()?;
        let counts = his::read_samples(&mut samples, entry)?;
        let name = if entry.title.is_empty() {
            format!("HIS{id}")
        } else {
            entry.title.clone()
        };
        histograms.push(
            Histogram::new(name.clone(), shape, Counts::Int(counts))?
                .with_title(name)
                .with_number(id),
        );
    }
    debug!("decoded {} ORNL histogram(s)", histograms.len());
    Ok(histograms)
}

/// Encodes histograms as a DRR/HIS pair. Both sinks are flushed.
///
/// Floating-point histograms are rounded to integers; see
/// [`his::write_samples`].
///
/// # Errors
/// Returns an error if either sink fails or a histogram is too large for
/// the directory fields.
pub fn encode_ornl<D: Write, H: Write>(
    histograms: &[Histogram],
    options: &OrnlWriteOptions,
    drr_sink: D,
    his_sink: H,
) -> Result<()> {
    let directory = Directory::for_histograms(histograms, options.date_fields(), &options.description)?;
    drr::write_directory(drr_sink, &directory)?;

    let mut out = FieldWriter::new(his_sink, ByteOrder::NATIVE);
    for histogram in histograms {
        his::write_samples(&mut out, histogram)?;
    }
    out.flush()?;
    debug!(
        "wrote {} ORNL histogram(s), {} half-words",
        histograms.len(),
        directory.header.total_half_words
    );
    Ok(())
}

//! HIS sample files.
//!
//! A HIS file is a bare array of samples. Each histogram's samples start at
//! `offset * 2` bytes, where `offset` comes from its DRR record. 2-D data
//! is stored with Y as the outer index, the transpose of the in-memory
//! layout.

use super::drr::{DirectoryEntry, WordWidth};
use crate::field::{i16_at, i32_at, FieldReader, FieldWriter};
use crate::{Error, Result};
use histfile_core::{Counts, Histogram, Shape};
use std::io::{Read, Seek, Write};

// Samples decoded per read from the HIS file.
const BLOCK_SAMPLES: usize = 1 << 16;

/// Reads the samples described by `entry`.
///
/// Returns an X-major buffer matching [`DirectoryEntry::shape`].
///
/// # Errors
/// Returns [`Error::Format`] for a negative offset or unsupported record,
/// and [`Error::Truncated`] if the HIS file is too short.
pub fn read_samples<R: Read + Seek>(
    fields: &mut FieldReader<R>,
    entry: &DirectoryEntry,
) -> Result<Vec<i32>> {
    let shape = entry.shape()?;
    let width = entry.word_width()?;
    let byte_offset = u64::try_from(entry.offset)
        .map(|half_words| half_words * 2)
        .map_err(|_| Error::Format(format!("'{}' has negative offset {}", entry.title, entry.offset)))?;
    fields.seek_to(byte_offset)?;

    let context = format!("samples of '{}'", entry.title);
    let order = fields.order();
    let sample_len = match width {
        WordWidth::Half => 2,
        WordWidth::Full => 4,
    };
    let n = shape.channel_count();
    let mut file_order = Vec::with_capacity(n.min(BLOCK_SAMPLES));
    let mut block = Vec::new();
    while file_order.len() < n {
        let take = (n - file_order.len()).min(BLOCK_SAMPLES);
        block.resize(take * sample_len, 0);
        fields.fill(&mut block, &context)?;
        for at in (0..block.len()).step_by(sample_len) {
            let sample = match width {
                WordWidth::Half => i16_at(&block, at, order).map(i32::from),
                WordWidth::Full => i32_at(&block, at, order),
            };
            file_order.extend(sample);
        }
    }
    Ok(match shape {
        Shape::OneD { .. } => file_order,
        Shape::TwoD { size_x, size_y } => transpose(&file_order, size_y, size_x),
    })
}

/// Writes one histogram's samples as 32-bit integers.
///
/// Floating-point counts are converted with `(value + 0.5)` truncated
/// toward zero. The conversion is lossy and cannot be undone on read.
///
/// # Errors
/// Returns an error if the sink fails.
pub fn write_samples<W: Write>(out: &mut FieldWriter<W>, histogram: &Histogram) -> Result<()> {
    let samples: Vec<i32> = match histogram.counts() {
        Counts::Int(values) => values.clone(),
        Counts::Double(values) => values.iter().map(|&v| round_half_up(v)).collect(),
    };
    let file_order: Vec<i32> = match histogram.shape() {
        Shape::OneD { .. } => samples,
        Shape::TwoD { size_x, size_y } => (0..size_y)
            .flat_map(|y| (0..size_x).filter_map(move |x| histogram.index(x, y)))
            .map(|i| samples[i])
            .collect(),
    };
    for v in file_order {
        out.write_i32(v)?;
    }
    Ok(())
}

#[allow(clippy::cast_possible_truncation)]
fn round_half_up(value: f64) -> i32 {
    (value + 0.5) as i32
}

/// Transposes a row-major `rows x cols` buffer.
fn transpose(values: &[i32], rows: usize, cols: usize) -> Vec<i32> {
    let mut out = vec![0; values.len()];
    for r in 0..rows {
        for c in 0..cols {
            out[c * rows + r] = values[r * cols + c];
        }
    }
    out
}

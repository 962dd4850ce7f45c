//! DRR directory files.
//!
//! Layout (128-byte header, 128 bytes per histogram, then an id trailer):
//!
//! ```text
//! signature[12] nhist:i32 nhalfwords:i32 date:i32*7 description[80]
//! { dims:i16 halfwords_per_channel:i16 params:i16*4 raw_len:i16*4
//!   scaled_len:i16*4 min_chan:i16*4 max_chan:i16*4 offset:i32
//!   x_label[12] y_label[12] calibration:f32*4 title[40] } * nhist
//! id:i32 * nhist
//! ```
//!
//! The byte order of every field is decided from `nhist`, see
//! [`ByteOrder::detect`].

use crate::byte_order::ByteOrder;
use crate::field::{i32_at, FieldReader, FieldWriter};
use crate::{Error, Result};
use histfile_core::{Histogram, Shape};
use log::debug;
use std::io::{Read, Write};

/// Signature at the start of every DRR file.
pub const SIGNATURE: &[u8; 12] = b"HHIRFDIR0001";
/// Width of the free-text description in the header.
pub const DESCRIPTION_WIDTH: usize = 80;
/// Width of each axis label.
pub const LABEL_WIDTH: usize = 12;
/// Width of the per-histogram title.
pub const TITLE_WIDTH: usize = 40;

const MAX_HISTOGRAMS: usize = 1 << 16;

/// Sample width in the HIS file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordWidth {
    /// 16-bit samples (code 1).
    Half,
    /// 32-bit samples (code 2).
    Full,
}

impl WordWidth {
    /// Parses the half-words-per-channel code.
    ///
    /// # Errors
    /// Returns [`Error::Format`] for codes other than 1 and 2.
    pub fn from_code(code: i16) -> Result<Self> {
        match code {
            1 => Ok(WordWidth::Half),
            2 => Ok(WordWidth::Full),
            _ => Err(Error::Format(format!("unsupported word width code {code}"))),
        }
    }

    #[must_use]
    pub fn code(self) -> i16 {
        match self {
            WordWidth::Half => 1,
            WordWidth::Full => 2,
        }
    }
}

/// DRR file header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrrHeader {
    pub histogram_count: i32,
    pub total_half_words: i32,
    /// `[0, year, month, day, hour, minute, second]` on files we write.
    pub date: [i32; 7],
    pub description: String,
}

/// One histogram's directory record.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectoryEntry {
    pub dimensions: i16,
    pub half_words_per_channel: i16,
    pub params: [i16; 4],
    pub raw_lengths: [i16; 4],
    pub scaled_lengths: [i16; 4],
    pub min_channels: [i16; 4],
    pub max_channels: [i16; 4],
    /// Position of the first sample in the HIS file, in half-words.
    pub offset: i32,
    pub x_label: String,
    pub y_label: String,
    pub calibration: [f32; 4],
    pub title: String,
}

impl DirectoryEntry {
    /// Record for a histogram written with 32-bit samples at `offset`.
    ///
    /// # Errors
    /// Returns [`Error::Format`] if an extent does not fit a 16-bit field.
    pub fn for_histogram(histogram: &Histogram, offset: i32) -> Result<Self> {
        let shape = histogram.shape();
        let size_x = length_field(shape.size_x(), histogram)?;
        let size_y = length_field(shape.size_y(), histogram)?;
        let lengths = [size_x, size_y, 0, 0];
        let max_y = if size_y > 0 { size_y.wrapping_sub(1) } else { 0 };
        Ok(Self {
            dimensions: i16::from(shape.dimensions()),
            half_words_per_channel: WordWidth::Full.code(),
            params: [0; 4],
            raw_lengths: lengths,
            scaled_lengths: lengths,
            min_channels: [0; 4],
            max_channels: [size_x.wrapping_sub(1), max_y, 0, 0],
            offset,
            x_label: String::new(),
            y_label: String::new(),
            calibration: [0.0; 4],
            title: histogram.name().to_owned(),
        })
    }

    #[must_use]
    pub fn size_x(&self) -> usize {
        unsigned_length(self.scaled_lengths[0])
    }

    #[must_use]
    pub fn size_y(&self) -> usize {
        unsigned_length(self.scaled_lengths[1])
    }

    /// Histogram shape described by this record.
    ///
    /// # Errors
    /// Returns [`Error::Format`] for unsupported dimensionality or empty extents.
    pub fn shape(&self) -> Result<Shape> {
        let shape = match self.dimensions {
            1 => Shape::one_d(self.size_x()),
            2 => Shape::two_d(self.size_x(), self.size_y()),
            d => return Err(Error::Format(format!("'{}' has dimensionality {d}", self.title))),
        };
        shape.map_err(|e| Error::Format(format!("'{}': {e}", self.title)))
    }

    /// Sample width of this record.
    ///
    /// # Errors
    /// Returns [`Error::Format`] for an unsupported code.
    pub fn word_width(&self) -> Result<WordWidth> {
        WordWidth::from_code(self.half_words_per_channel)
    }
}

// Lengths are unsigned 16-bit on disk even though they share the i16 slots.
#[allow(clippy::cast_sign_loss)]
fn unsigned_length(field: i16) -> usize {
    usize::from(field as u16)
}

#[allow(clippy::cast_possible_wrap)]
fn length_field(len: usize, histogram: &Histogram) -> Result<i16> {
    u16::try_from(len).map(|v| v as i16).map_err(|_| {
        Error::Format(format!(
            "histogram '{}' extent {len} exceeds 65535",
            histogram.name()
        ))
    })
}

/// A complete directory: header, records and ids in matching order.
#[derive(Debug, Clone, PartialEq)]
pub struct Directory {
    pub header: DrrHeader,
    pub entries: Vec<DirectoryEntry>,
    pub ids: Vec<i32>,
}

impl Directory {
    /// Lays out `histograms` back to back with 32-bit samples.
    ///
    /// Offsets accumulate `2 * channels` half-words per histogram in the
    /// order given; ids are the histogram numbers in the same order.
    ///
    /// # Errors
    /// Returns [`Error::Format`] if the total size does not fit the 32-bit
    /// half-word fields.
    pub fn for_histograms(
        histograms: &[Histogram],
        date: [i32; 7],
        description: &str,
    ) -> Result<Self> {
        let mut offset: i32 = 0;
        let mut entries = Vec::with_capacity(histograms.len());
        for histogram in histograms {
            entries.push(DirectoryEntry::for_histogram(histogram, offset)?);
            offset = i32::try_from(histogram.shape().channel_count())
                .ok()
                .and_then(|n| n.checked_mul(2))
                .and_then(|n| offset.checked_add(n))
                .ok_or_else(|| Error::Format("HIS file exceeds 2^31 half-words".to_owned()))?;
        }
        let histogram_count = i32::try_from(histograms.len())
            .map_err(|_| Error::Format("too many histograms".to_owned()))?;
        Ok(Self {
            header: DrrHeader {
                histogram_count,
                total_half_words: offset,
                date,
                description: description.to_owned(),
            },
            entries,
            ids: histograms.iter().map(Histogram::number).collect(),
        })
    }
}

/// Reads a DRR file, returning the directory and the detected byte order.
///
/// # Errors
/// Returns [`Error::Format`] for a wrong signature or implausible count and
/// [`Error::Truncated`] if the file ends early.
pub fn read_directory<R: Read>(reader: R) -> Result<(Directory, ByteOrder)> {
    let mut fields = FieldReader::new(reader, ByteOrder::NATIVE);
    // Signature and histogram count; the count decides the byte order.
    let prefix: [u8; 16] = fields.read_array("DRR signature")?;
    if &prefix[..SIGNATURE.len()] != SIGNATURE {
        return Err(Error::Format(format!(
            "DRR signature is {:?}, expected {:?}",
            String::from_utf8_lossy(&prefix[..SIGNATURE.len()]),
            String::from_utf8_lossy(SIGNATURE)
        )));
    }

    let mut count_field = [0u8; 4];
    count_field.copy_from_slice(&prefix[SIGNATURE.len()..]);
    let order = ByteOrder::detect(count_field);
    fields.set_order(order);
    let histogram_count = i32_at(&prefix, SIGNATURE.len(), order)
        .ok_or_else(|| Error::Format("DRR header too short".to_owned()))?;
    let count = usize::try_from(histogram_count)
        .ok()
        .filter(|&n| n <= MAX_HISTOGRAMS)
        .ok_or_else(|| Error::Format(format!("implausible histogram count {histogram_count}")))?;

    let total_half_words = fields.read_i32("half-word count")?;
    let mut date = [0i32; 7];
    for slot in &mut date {
        *slot = fields.read_i32("header date")?;
    }
    let description = fields.read_text(DESCRIPTION_WIDTH, "header description")?;
    debug!("DRR header: {count} histogram(s), {total_half_words} half-words, {order:?}");

    let mut entries = Vec::with_capacity(count);
    for i in 0..count {
        entries.push(read_entry(&mut fields, &format!("directory record {i}"))?);
    }
    let mut ids = Vec::with_capacity(count);
    for _ in 0..count {
        ids.push(fields.read_i32("histogram id")?);
    }

    Ok((
        Directory {
            header: DrrHeader {
                histogram_count,
                total_half_words,
                date,
                description,
            },
            entries,
            ids,
        },
        order,
    ))
}

fn read_shorts<R: Read>(fields: &mut FieldReader<R>, context: &str) -> Result<[i16; 4]> {
    let mut out = [0i16; 4];
    for slot in &mut out {
        *slot = fields.read_i16(context)?;
    }
    Ok(out)
}

fn read_entry<R: Read>(fields: &mut FieldReader<R>, context: &str) -> Result<DirectoryEntry> {
    let dimensions = fields.read_i16(context)?;
    let half_words_per_channel = fields.read_i16(context)?;
    let params = read_shorts(fields, context)?;
    let raw_lengths = read_shorts(fields, context)?;
    let scaled_lengths = read_shorts(fields, context)?;
    let min_channels = read_shorts(fields, context)?;
    let max_channels = read_shorts(fields, context)?;
    let offset = fields.read_i32(context)?;
    let x_label = fields.read_text(LABEL_WIDTH, context)?;
    let y_label = fields.read_text(LABEL_WIDTH, context)?;
    let mut calibration = [0f32; 4];
    for slot in &mut calibration {
        *slot = fields.read_f32(context)?;
    }
    let title = fields.read_text(TITLE_WIDTH, context)?;
    Ok(DirectoryEntry {
        dimensions,
        half_words_per_channel,
        params,
        raw_lengths,
        scaled_lengths,
        min_channels,
        max_channels,
        offset,
        x_label,
        y_label,
        calibration,
        title,
    })
}

/// Writes a DRR file in native (big-endian) order and flushes the sink.
///
/// # Errors
/// Returns an error if the sink fails.
pub fn write_directory<W: Write>(writer: W, directory: &Directory) -> Result<()> {
    let mut out = FieldWriter::new(writer, ByteOrder::NATIVE);
    let header = &directory.header;
    out.write_bytes(SIGNATURE)?;
    out.write_i32(header.histogram_count)?;
    out.write_i32(header.total_half_words)?;
    for &field in &header.date {
        out.write_i32(field)?;
    }
    out.write_text(&header.description, DESCRIPTION_WIDTH)?;

    for entry in &directory.entries {
        out.write_i16(entry.dimensions)?;
        out.write_i16(entry.half_words_per_channel)?;
        for group in [
            &entry.params,
            &entry.raw_lengths,
            &entry.scaled_lengths,
            &entry.min_channels,
            &entry.max_channels,
        ] {
            for &v in group {
                out.write_i16(v)?;
            }
        }
        out.write_i32(entry.offset)?;
        out.write_text(&entry.x_label, LABEL_WIDTH)?;
        out.write_text(&entry.y_label, LABEL_WIDTH)?;
        for &c in &entry.calibration {
            out.write_f32(c)?;
        }
        out.write_text(&entry.title, TITLE_WIDTH)?;
    }
    for &id in &directory.ids {
        out.write_i32(id)?;
    }
    out.flush()
}

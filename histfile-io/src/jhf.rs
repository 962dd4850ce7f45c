//! JHF histogram/gate/scaler files.
//!
//! A JHF file is a single big-endian stream. Three layouts exist, selected
//! by the 12-byte magic word at offset 0:
//!
//! | Magic          | Version | Notes                                         |
//! |----------------|---------|-----------------------------------------------|
//! | `JHF VER   02` | V02     | written by [`encode_jhf`]                     |
//! | `JHF VER   01` | V01     | sizes stored one less than the real extent    |
//! | anything else  | V00     | histograms only, no counts, read until EOF    |
//!
//! A V00 stream has no terminator, so the scan stops at the first record
//! the input cannot complete. That record is dropped with a
//! [`Warning::PartialRecord`].
//!
//! V01/V02 layout:
//!
//! ```text
//! magic[12] nhist:i32
//!   { name[15] number:i32 title[50] type:i32 size_x:i32 size_y:i32 samples } * nhist
//! ngate:i32
//!   { len:i32 name[len] number:i32 type:i32 defined:i32 (low:i32 high:i32 | npts:i32 {x:i32 y:i32}*npts) } * ngate
//! nscaler:i32
//!   { len:i32 name[len] number:i32 value:i32 } * nscaler
//! ```
//!
//! Samples are `i32` or `f64`, 2-D buffers with X as the outer index.
//! A gate's number is the number of the histogram it is set on.

use crate::byte_order::ByteOrder;
use crate::field::{decode_text, encode_text, FieldReader, FieldWriter};
use crate::{Error, Result, Warning};
use histfile_core::{CountKind, Counts, Gate, GateKind, GateLimits, Histogram, Scaler, Shape};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::io::{Cursor, Read, Write};

/// Magic word of V01 files.
pub const MAGIC_V01: &[u8; MAGIC_LEN] = b"JHF VER   01";
/// Magic word of V02 files.
pub const MAGIC_V02: &[u8; MAGIC_LEN] = b"JHF VER   02";
/// Width of the magic word.
pub const MAGIC_LEN: usize = 12;
/// Width of the histogram name field.
pub const NAME_WIDTH: usize = 15;
/// Width of the histogram title field.
pub const TITLE_WIDTH: usize = 50;

const MAX_RECORDS: usize = 1 << 20;
const MAX_NAME_LEN: usize = 1024;
const MAX_GATE_POINTS: usize = 1 << 16;
// Buffers for decoded samples grow past this only as data actually arrives.
const PREALLOC_CHANNELS: usize = 1 << 16;

/// On-disk schema version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JhfVersion {
    V00,
    V01,
    V02,
}

impl JhfVersion {
    /// Classifies a file from its first bytes.
    #[must_use]
    pub fn classify(prefix: &[u8]) -> Self {
        match prefix.get(..MAGIC_LEN) {
            Some(magic) if magic == MAGIC_V02 => JhfVersion::V02,
            Some(magic) if magic == MAGIC_V01 => JhfVersion::V01,
            _ => JhfVersion::V00,
        }
    }

    /// Maps a stored size field to the real extent.
    fn extent(self, stored: i32) -> Option<usize> {
        let size = match self {
            JhfVersion::V01 => stored.checked_add(1)?,
            JhfVersion::V00 | JhfVersion::V02 => stored,
        };
        usize::try_from(size).ok()
    }
}

/// Which sections [`encode_jhf`] writes. A disabled section is written as
/// an empty one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JhfWriteOptions {
    pub write_histograms: bool,
    pub write_gates: bool,
    pub write_scalers: bool,
}

impl Default for JhfWriteOptions {
    fn default() -> Self {
        Self {
            write_histograms: true,
            write_gates: true,
            write_scalers: true,
        }
    }
}

/// A gate as stored in the file, before its owner is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateRecord {
    pub name: String,
    /// Number of the histogram the gate is set on.
    pub histogram_number: i32,
    pub kind: GateKind,
    pub limits: Option<GateLimits>,
}

impl GateRecord {
    /// Builds a gate on the named histogram.
    ///
    /// # Errors
    /// Never fails for records produced by the decoder; the kind and limits
    /// always agree.
    pub fn to_gate(&self, histogram: &str) -> Result<Gate> {
        let mut gate = Gate::new(self.name.clone(), histogram, self.kind);
        if let Some(limits) = &self.limits {
            gate.set_limits(limits.clone())?;
        }
        Ok(gate)
    }
}

/// Everything decoded from one JHF stream.
#[derive(Debug, Clone, PartialEq)]
pub struct JhfContents {
    pub version: JhfVersion,
    pub histograms: Vec<Histogram>,
    pub gates: Vec<GateRecord>,
    pub scalers: Vec<Scaler>,
    /// Records the decoder skipped.
    pub warnings: Vec<Warning>,
}

/// Decodes a JHF stream of any version.
///
/// # Errors
/// Returns [`Error::Truncated`] if a V01/V02 stream ends inside a record
/// and [`Error::Format`] for unknown type tags, implausible sizes, or a V00
/// stream without a single complete histogram.
pub fn decode_jhf<R: Read>(mut reader: R) -> Result<JhfContents> {
    let mut magic = Vec::with_capacity(MAGIC_LEN);
    reader
        .by_ref()
        .take(MAGIC_LEN as u64)
        .read_to_end(&mut magic)?;
    let version = JhfVersion::classify(&magic);
    debug!("JHF stream classified as {version:?}");

    // V00 has no magic; its first record starts at byte 0.
    let mut fields = FieldReader::new(Cursor::new(magic).chain(reader), ByteOrder::BigEndian);
    let contents = match version {
        JhfVersion::V00 => decode_v00(&mut fields)?,
        JhfVersion::V01 | JhfVersion::V02 => {
            fields.read_array::<MAGIC_LEN>("magic word")?;
            decode_sections(&mut fields, version)?
        }
    };
    debug!(
        "decoded {} histogram(s), {} gate(s), {} scaler(s)",
        contents.histograms.len(),
        contents.gates.len(),
        contents.scalers.len()
    );
    Ok(contents)
}

fn decode_v00<R: Read>(fields: &mut FieldReader<R>) -> Result<JhfContents> {
    let mut histograms = Vec::new();
    let mut warnings = Vec::new();
    loop {
        match read_v00_record(fields, histograms.len()) {
            Ok(Some(histogram)) => histograms.push(histogram),
            Ok(None) => break,
            Err(Error::Truncated { offset, context }) => {
                let warning = Warning::PartialRecord { offset, context };
                warn!("{warning}");
                warnings.push(warning);
                break;
            }
            Err(e) => return Err(e),
        }
    }
    if histograms.is_empty() {
        return Err(Error::Format(
            "no JHF magic word and no complete histogram record".to_owned(),
        ));
    }
    Ok(JhfContents {
        version: JhfVersion::V00,
        histograms,
        gates: Vec::new(),
        scalers: Vec::new(),
        warnings,
    })
}

/// Reads one V00 record, or `None` at a clean end of stream.
fn read_v00_record<R: Read>(fields: &mut FieldReader<R>, index: usize) -> Result<Option<Histogram>> {
    let mut name = [0u8; NAME_WIDTH];
    if !fields.fill_or_eof(&mut name, &format!("histogram record {index}"))? {
        return Ok(None);
    }
    read_histogram_body(fields, JhfVersion::V00, decode_text(&name)).map(Some)
}

fn decode_sections<R: Read>(fields: &mut FieldReader<R>, version: JhfVersion) -> Result<JhfContents> {
    let count = fields.read_count(MAX_RECORDS, "histogram count")?;
    let mut histograms = Vec::with_capacity(count.min(1024));
    for i in 0..count {
        let name = fields.read_text(NAME_WIDTH, &format!("histogram record {i}"))?;
        histograms.push(read_histogram_body(fields, version, name)?);
    }

    let count = fields.read_count(MAX_RECORDS, "gate count")?;
    let mut gates = Vec::with_capacity(count.min(1024));
    for i in 0..count {
        gates.push(read_gate(fields, i)?);
    }

    let count = fields.read_count(MAX_RECORDS, "scaler count")?;
    let mut scalers = Vec::with_capacity(count.min(1024));
    for i in 0..count {
        let context = format!("scaler record {i}");
        let name = read_prefixed_name(fields, &context)?;
        let number = fields.read_i32(&context)?;
        let value = fields.read_i32(&context)?;
        scalers.push(Scaler::new(name, number).with_value(value));
    }

    Ok(JhfContents {
        version,
        histograms,
        gates,
        scalers,
        warnings: Vec::new(),
    })
}

fn read_histogram_body<R: Read>(
    fields: &mut FieldReader<R>,
    version: JhfVersion,
    name: String,
) -> Result<Histogram> {
    let context = format!("histogram '{name}'");
    let number = fields.read_i32(&context)?;
    let title = fields.read_text(TITLE_WIDTH, &context)?;
    let (dimensions, kind) = parse_type_tag(fields.read_i32(&context)?, &name)?;
    let stored_x = fields.read_i32(&context)?;
    let stored_y = fields.read_i32(&context)?;

    let size_x = version.extent(stored_x);
    let size_y = version.extent(stored_y);
    let shape = match (dimensions, size_x, size_y) {
        (1, Some(x), _) => Shape::one_d(x),
        (2, Some(x), Some(y)) => Shape::two_d(x, y),
        _ => {
            return Err(Error::Format(format!(
                "{context} has invalid size {stored_x}x{stored_y}"
            )))
        }
    }
    .map_err(|e| Error::Format(format!("{context}: {e}")))?;

    let n = shape.channel_count();
    let context = format!("{context} samples");
    let counts = match kind {
        CountKind::Int => {
            let mut values = Vec::with_capacity(n.min(PREALLOC_CHANNELS));
            for _ in 0..n {
                values.push(fields.read_i32(&context)?);
            }
            Counts::Int(values)
        }
        CountKind::Double => {
            let mut values = Vec::with_capacity(n.min(PREALLOC_CHANNELS));
            for _ in 0..n {
                values.push(fields.read_f64(&context)?);
            }
            Counts::Double(values)
        }
    };

    Ok(Histogram::new(name, shape, counts)?
        .with_title(title)
        .with_number(number))
}

fn read_gate<R: Read>(fields: &mut FieldReader<R>, index: usize) -> Result<GateRecord> {
    let context = format!("gate record {index}");
    let name = read_prefixed_name(fields, &context)?;
    let histogram_number = fields.read_i32(&context)?;
    let kind = match fields.read_i32(&context)? {
        1 => GateKind::OneD,
        2 => GateKind::TwoD,
        tag => {
            return Err(Error::Format(format!("gate '{name}' has unknown type {tag}")));
        }
    };
    let defined = fields.read_i32(&context)? != 0;
    let limits = match kind {
        GateKind::OneD => {
            let low = fields.read_i32(&context)?;
            let high = fields.read_i32(&context)?;
            GateLimits::Interval { low, high }
        }
        GateKind::TwoD => {
            let n = fields.read_count(MAX_GATE_POINTS, "gate point count")?;
            let mut points = Vec::with_capacity(n);
            for _ in 0..n {
                let x = fields.read_i32(&context)?;
                let y = fields.read_i32(&context)?;
                points.push((x, y));
            }
            GateLimits::Polygon(points)
        }
    };
    Ok(GateRecord {
        name,
        histogram_number,
        kind,
        limits: defined.then_some(limits),
    })
}

fn read_prefixed_name<R: Read>(fields: &mut FieldReader<R>, context: &str) -> Result<String> {
    let len = fields.read_count(MAX_NAME_LEN, "name length")?;
    fields.read_text(len, context)
}

/// JHF type tag: 1-D int, 2-D int, 1-D double, 2-D double.
fn type_tag(histogram: &Histogram) -> i32 {
    match (histogram.dimensions(), histogram.kind()) {
        (1, CountKind::Int) => 1,
        (_, CountKind::Int) => 2,
        (1, CountKind::Double) => 3,
        (_, CountKind::Double) => 4,
    }
}

fn parse_type_tag(tag: i32, name: &str) -> Result<(u8, CountKind)> {
    match tag {
        1 => Ok((1, CountKind::Int)),
        2 => Ok((2, CountKind::Int)),
        3 => Ok((1, CountKind::Double)),
        4 => Ok((2, CountKind::Double)),
        _ => Err(Error::Format(format!(
            "histogram '{name}' has unknown type {tag}"
        ))),
    }
}

/// Encodes histograms, gates and scalers as a V02 stream.
///
/// Gates must be set on histograms in `histograms`; their owner's number is
/// what links them back on read. The sink is flushed before returning.
///
/// # Errors
/// Returns an error if the sink fails, a gate's histogram is not in
/// `histograms`, or a size does not fit in 32 bits.
pub fn encode_jhf<W: Write>(
    histograms: &[Histogram],
    gates: &[Gate],
    scalers: &[Scaler],
    options: &JhfWriteOptions,
    sink: W,
) -> Result<()> {
    let mut out = FieldWriter::new(sink, ByteOrder::BigEndian);
    out.write_bytes(MAGIC_V02)?;

    let written: &[Histogram] = if options.write_histograms { histograms } else { &[] };
    out.write_len(written.len(), "histogram count")?;
    for histogram in written {
        write_histogram(&mut out, histogram)?;
    }

    let gates: &[Gate] = if options.write_gates { gates } else { &[] };
    out.write_len(gates.len(), "gate count")?;
    for gate in gates {
        write_gate(&mut out, gate, owner_number(histograms, gate)?)?;
    }

    let scalers: &[Scaler] = if options.write_scalers { scalers } else { &[] };
    out.write_len(scalers.len(), "scaler count")?;
    for scaler in scalers {
        write_prefixed_name(&mut out, &scaler.name)?;
        out.write_i32(scaler.number)?;
        out.write_i32(scaler.value)?;
    }

    out.flush()?;
    debug!("wrote {} byte JHF stream", out.position());
    Ok(())
}

fn owner_number(histograms: &[Histogram], gate: &Gate) -> Result<i32> {
    histograms
        .iter()
        .find(|h| h.name() == gate.histogram())
        .map(Histogram::number)
        .ok_or_else(|| histfile_core::Error::UnknownHistogram(gate.histogram().to_owned()).into())
}

fn write_histogram<W: Write>(out: &mut FieldWriter<W>, histogram: &Histogram) -> Result<()> {
    let shape = histogram.shape();
    out.write_text(histogram.name(), NAME_WIDTH)?;
    out.write_i32(histogram.number())?;
    out.write_text(histogram.title(), TITLE_WIDTH)?;
    out.write_i32(type_tag(histogram))?;
    out.write_len(shape.size_x(), "size x")?;
    out.write_len(shape.size_y(), "size y")?;
    match histogram.counts() {
        Counts::Int(values) => {
            for &v in values {
                out.write_i32(v)?;
            }
        }
        Counts::Double(values) => {
            for &v in values {
                out.write_f64(v)?;
            }
        }
    }
    Ok(())
}

fn write_gate<W: Write>(out: &mut FieldWriter<W>, gate: &Gate, owner_number: i32) -> Result<()> {
    write_prefixed_name(out, gate.name())?;
    out.write_i32(owner_number)?;
    out.write_i32(i32::from(gate.kind().dimensions()))?;
    out.write_i32(i32::from(gate.is_defined()))?;
    match (gate.kind(), gate.limits()) {
        (_, Some(GateLimits::Interval { low, high })) => {
            out.write_i32(*low)?;
            out.write_i32(*high)?;
        }
        (_, Some(GateLimits::Polygon(points))) => {
            out.write_len(points.len(), "gate point count")?;
            for &(x, y) in points {
                out.write_i32(x)?;
                out.write_i32(y)?;
            }
        }
        (GateKind::OneD, None) => {
            out.write_i32(0)?;
            out.write_i32(0)?;
        }
        (GateKind::TwoD, None) => out.write_i32(0)?,
    }
    Ok(())
}

fn write_prefixed_name<W: Write>(out: &mut FieldWriter<W>, name: &str) -> Result<()> {
    let field = encode_text(name, name.chars().count().min(MAX_NAME_LEN));
    out.write_len(field.len(), "name length")?;
    out.write_bytes(&field)
}

//! Primitive field codec.
//!
//! Integers, floats and fixed-width text fields, plus position-tracking
//! reader/writer wrappers that turn a short read into
//! [`Error::Truncated`] with the byte offset of the failing field.
//!
//! Text is stored one byte per character (ISO-8859-1). Writers always emit
//! exactly the declared width: short strings are space padded and long
//! strings are truncated, never rejected.

use crate::byte_order::ByteOrder;
use crate::{Error, Result};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};

/// Decodes a 32-bit integer at `offset`, or `None` if out of bounds.
#[must_use]
pub fn i32_at(bytes: &[u8], offset: usize, order: ByteOrder) -> Option<i32> {
    let field: [u8; 4] = bytes.get(offset..offset.checked_add(4)?)?.try_into().ok()?;
    Some(order.i32_from(field))
}

/// Decodes a 16-bit integer at `offset`, or `None` if out of bounds.
#[must_use]
pub fn i16_at(bytes: &[u8], offset: usize, order: ByteOrder) -> Option<i16> {
    let field: [u8; 2] = bytes.get(offset..offset.checked_add(2)?)?.try_into().ok()?;
    Some(order.i16_from(field))
}

/// Encodes `text` into exactly `width` bytes, truncating or space padding.
#[must_use]
pub fn encode_text(text: &str, width: usize) -> Vec<u8> {
    let mut field: Vec<u8> = text
        .chars()
        .take(width)
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect();
    field.resize(width, b' ');
    field
}

/// Decodes a fixed-width field, dropping trailing spaces and NULs.
#[must_use]
pub fn decode_text(field: &[u8]) -> String {
    let text: String = field.iter().map(|&b| char::from(b)).collect();
    text.trim_end_matches([' ', '\0']).to_owned()
}

/// Reads typed fields from a byte stream.
pub struct FieldReader<R> {
    inner: R,
    order: ByteOrder,
    position: u64,
}

impl<R: Read> FieldReader<R> {
    pub fn new(inner: R, order: ByteOrder) -> Self {
        Self {
            inner,
            order,
            position: 0,
        }
    }

    #[must_use]
    pub fn order(&self) -> ByteOrder {
        self.order
    }

    pub fn set_order(&mut self, order: ByteOrder) {
        self.order = order;
    }

    /// Bytes consumed so far.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    fn truncated(&self, context: &str) -> Error {
        Error::Truncated {
            offset: self.position,
            context: context.to_owned(),
        }
    }

    /// Fills `buf` completely.
    ///
    /// # Errors
    /// Returns [`Error::Truncated`] if the stream ends first.
    pub fn fill(&mut self, buf: &mut [u8], context: &str) -> Result<()> {
        match self.inner.read_exact(buf) {
            Ok(()) => {
                self.position += buf.len() as u64;
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => Err(self.truncated(context)),
            Err(e) => Err(e.into()),
        }
    }

    /// Like [`fill`](Self::fill), but a stream that is already exhausted
    /// yields `Ok(false)` instead of an error.
    ///
    /// # Errors
    /// Returns [`Error::Truncated`] if the stream ends part way through `buf`.
    pub fn fill_or_eof(&mut self, buf: &mut [u8], context: &str) -> Result<bool> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
        self.position += filled as u64;
        match filled {
            0 if !buf.is_empty() => Ok(false),
            n if n == buf.len() => Ok(true),
            _ => Err(self.truncated(context)),
        }
    }

    pub fn read_array<const N: usize>(&mut self, context: &str) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.fill(&mut buf, context)?;
        Ok(buf)
    }

    pub fn read_i32(&mut self, context: &str) -> Result<i32> {
        let bytes = self.read_array(context)?;
        Ok(self.order.i32_from(bytes))
    }

    pub fn read_i16(&mut self, context: &str) -> Result<i16> {
        let bytes = self.read_array(context)?;
        Ok(self.order.i16_from(bytes))
    }

    pub fn read_f32(&mut self, context: &str) -> Result<f32> {
        let bytes = self.read_array(context)?;
        Ok(self.order.f32_from(bytes))
    }

    pub fn read_f64(&mut self, context: &str) -> Result<f64> {
        let bytes = self.read_array(context)?;
        Ok(self.order.f64_from(bytes))
    }

    /// Reads a fixed-width text field of `width` bytes.
    pub fn read_text(&mut self, width: usize, context: &str) -> Result<String> {
        let mut buf = vec![0u8; width];
        self.fill(&mut buf, context)?;
        Ok(decode_text(&buf))
    }

    /// Reads a non-negative 32-bit count no larger than `max`.
    ///
    /// # Errors
    /// Returns [`Error::Format`] for a negative or oversized value.
    pub fn read_count(&mut self, max: usize, context: &str) -> Result<usize> {
        let raw = self.read_i32(context)?;
        usize::try_from(raw)
            .ok()
            .filter(|&n| n <= max)
            .ok_or_else(|| Error::Format(format!("implausible {context} {raw}")))
    }
}

impl<R: Read + Seek> FieldReader<R> {
    /// Moves to an absolute byte offset.
    pub fn seek_to(&mut self, offset: u64) -> Result<()> {
        self.position = self.inner.seek(SeekFrom::Start(offset))?;
        Ok(())
    }
}

/// Writes typed fields to a byte sink.
pub struct FieldWriter<W> {
    inner: W,
    order: ByteOrder,
    position: u64,
}

impl<W: Write> FieldWriter<W> {
    pub fn new(inner: W, order: ByteOrder) -> Self {
        Self {
            inner,
            order,
            position: 0,
        }
    }

    /// Bytes written so far.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.write_all(bytes)?;
        self.position += bytes.len() as u64;
        Ok(())
    }

    pub fn write_i32(&mut self, value: i32) -> Result<()> {
        self.write_bytes(&self.order.i32_bytes(value))
    }

    pub fn write_i16(&mut self, value: i16) -> Result<()> {
        self.write_bytes(&self.order.i16_bytes(value))
    }

    pub fn write_f32(&mut self, value: f32) -> Result<()> {
        self.write_bytes(&self.order.f32_bytes(value))
    }

    pub fn write_f64(&mut self, value: f64) -> Result<()> {
        self.write_bytes(&self.order.f64_bytes(value))
    }

    /// Writes `text` as a field of exactly `width` bytes.
    pub fn write_text(&mut self, text: &str, width: usize) -> Result<()> {
        self.write_bytes(&encode_text(text, width))
    }

    /// Writes a collection length as a 32-bit count.
    ///
    /// # Errors
    /// Returns [`Error::Format`] if `len` does not fit in an `i32`.
    pub fn write_len(&mut self, len: usize, context: &str) -> Result<()> {
        let value = i32::try_from(len)
            .map_err(|_| Error::Format(format!("{context} {len} does not fit in 32 bits")))?;
        self.write_i32(value)
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

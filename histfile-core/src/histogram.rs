//! Histogram data types.
//!
//! A [`Histogram`] exclusively owns its count buffer. Two-dimensional
//! buffers are stored flat with X as the outer index, so channel `(x, y)`
//! lives at `x * size_y + y`.

use crate::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Upper bound on the number of channels in a single histogram.
///
/// Far above anything the acquisition hardware produces; used to reject
/// corrupt size fields before any buffer is allocated.
pub const MAX_CHANNELS: usize = 1 << 26;

/// Extent of a histogram along each axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "ShapeFields"))]
pub enum Shape {
    /// One-dimensional spectrum.
    OneD { size_x: usize },
    /// Two-dimensional matrix.
    TwoD { size_x: usize, size_y: usize },
}

impl Shape {
    /// Creates a 1-D shape, validating the extent.
    ///
    /// # Errors
    /// Returns an error if `size_x` is zero or exceeds [`MAX_CHANNELS`].
    pub fn one_d(size_x: usize) -> Result<Self> {
        let shape = Shape::OneD { size_x };
        shape.validate()?;
        Ok(shape)
    }

    /// Creates a 2-D shape, validating the extents.
    ///
    /// # Errors
    /// Returns an error if either extent is zero or the channel count
    /// exceeds [`MAX_CHANNELS`].
    pub fn two_d(size_x: usize, size_y: usize) -> Result<Self> {
        let shape = Shape::TwoD { size_x, size_y };
        shape.validate()?;
        Ok(shape)
    }

    fn validate(self) -> Result<()> {
        let (x, y) = match self {
            Shape::OneD { size_x } => (size_x, 1),
            Shape::TwoD { size_x, size_y } => (size_x, size_y),
        };
        if x == 0 || y == 0 {
            return Err(Error::InvalidShape(format!("zero extent in {self}")));
        }
        match x.checked_mul(y) {
            Some(n) if n <= MAX_CHANNELS => Ok(()),
            _ => Err(Error::InvalidShape(format!(
                "{self} exceeds {MAX_CHANNELS} channels"
            ))),
        }
    }

    /// Number of axes (1 or 2).
    #[must_use]
    pub fn dimensions(self) -> u8 {
        match self {
            Shape::OneD { .. } => 1,
            Shape::TwoD { .. } => 2,
        }
    }

    /// Extent along X.
    #[must_use]
    pub fn size_x(self) -> usize {
        match self {
            Shape::OneD { size_x } | Shape::TwoD { size_x, .. } => size_x,
        }
    }

    /// Extent along Y, zero for 1-D shapes.
    #[must_use]
    pub fn size_y(self) -> usize {
        match self {
            Shape::OneD { .. } => 0,
            Shape::TwoD { size_y, .. } => size_y,
        }
    }

    /// Total number of channels.
    #[must_use]
    pub fn channel_count(self) -> usize {
        match self {
            Shape::OneD { size_x } => size_x,
            Shape::TwoD { size_x, size_y } => size_x * size_y,
        }
    }
}

/// Serialized form of [`Shape`], validated on conversion.
#[cfg(feature = "serde")]
#[derive(Deserialize)]
enum ShapeFields {
    OneD { size_x: usize },
    TwoD { size_x: usize, size_y: usize },
}

#[cfg(feature = "serde")]
impl TryFrom<ShapeFields> for Shape {
    type Error = Error;

    fn try_from(fields: ShapeFields) -> Result<Self> {
        match fields {
            ShapeFields::OneD { size_x } => Shape::one_d(size_x),
            ShapeFields::TwoD { size_x, size_y } => Shape::two_d(size_x, size_y),
        }
    }
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Shape::OneD { size_x } => write!(f, "{size_x}"),
            Shape::TwoD { size_x, size_y } => write!(f, "{size_x}x{size_y}"),
        }
    }
}

/// Element type of a count buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CountKind {
    Int,
    Double,
}

/// Owned count buffer.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Counts {
    Int(Vec<i32>),
    Double(Vec<f64>),
}

impl Counts {
    /// Zero-filled buffer of the given kind.
    #[must_use]
    pub fn zeros(kind: CountKind, len: usize) -> Self {
        match kind {
            CountKind::Int => Counts::Int(vec![0; len]),
            CountKind::Double => Counts::Double(vec![0.0; len]),
        }
    }

    /// Number of channels in the buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Counts::Int(v) => v.len(),
            Counts::Double(v) => v.len(),
        }
    }

    /// Returns true if the buffer holds no channels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element type.
    #[must_use]
    pub fn kind(&self) -> CountKind {
        match self {
            Counts::Int(_) => CountKind::Int,
            Counts::Double(_) => CountKind::Double,
        }
    }

    /// Sum over all channels.
    #[must_use]
    pub fn sum(&self) -> f64 {
        match self {
            Counts::Int(v) => v.iter().map(|&c| f64::from(c)).sum(),
            Counts::Double(v) => v.iter().sum(),
        }
    }

    /// Integer view, if this is an integer buffer.
    #[must_use]
    pub fn as_int(&self) -> Option<&[i32]> {
        match self {
            Counts::Int(v) => Some(v),
            Counts::Double(_) => None,
        }
    }

    /// Floating-point view, if this is a double buffer.
    #[must_use]
    pub fn as_double(&self) -> Option<&[f64]> {
        match self {
            Counts::Int(_) => None,
            Counts::Double(v) => Some(v),
        }
    }
}

/// A named 1-D or 2-D histogram.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "HistogramFields"))]
pub struct Histogram {
    name: String,
    title: String,
    number: i32,
    shape: Shape,
    counts: Counts,
}

/// Serialized form of [`Histogram`]; goes through [`Histogram::new`].
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct HistogramFields {
    name: String,
    title: String,
    number: i32,
    shape: Shape,
    counts: Counts,
}

#[cfg(feature = "serde")]
impl TryFrom<HistogramFields> for Histogram {
    type Error = Error;

    fn try_from(fields: HistogramFields) -> Result<Self> {
        Ok(Histogram::new(fields.name, fields.shape, fields.counts)?
            .with_title(fields.title)
            .with_number(fields.number))
    }
}

impl Histogram {
    /// Creates a histogram with number 0 and the name as its title.
    ///
    /// # Errors
    /// Returns an error if the buffer length does not match the shape.
    pub fn new(name: impl Into<String>, shape: Shape, counts: Counts) -> Result<Self> {
        check_len(shape, &counts)?;
        let name = name.into();
        Ok(Self {
            title: name.clone(),
            name,
            number: 0,
            shape,
            counts,
        })
    }

    /// Creates an empty (all zero) histogram.
    #[must_use]
    pub fn zeroed(name: impl Into<String>, shape: Shape, kind: CountKind) -> Self {
        let name = name.into();
        Self {
            title: name.clone(),
            name,
            number: 0,
            shape,
            counts: Counts::zeros(kind, shape.channel_count()),
        }
    }

    /// Sets the display title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Sets the histogram number.
    #[must_use]
    pub fn with_number(mut self, number: i32) -> Self {
        self.number = number;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn number(&self) -> i32 {
        self.number
    }

    #[must_use]
    pub fn shape(&self) -> Shape {
        self.shape
    }

    #[must_use]
    pub fn dimensions(&self) -> u8 {
        self.shape.dimensions()
    }

    #[must_use]
    pub fn kind(&self) -> CountKind {
        self.counts.kind()
    }

    #[must_use]
    pub fn counts(&self) -> &Counts {
        &self.counts
    }

    /// Consumes the histogram, returning its buffer.
    #[must_use]
    pub fn into_counts(self) -> Counts {
        self.counts
    }

    /// Flat buffer index of channel `(x, y)`; `y` is ignored for 1-D.
    #[must_use]
    pub fn index(&self, x: usize, y: usize) -> Option<usize> {
        match self.shape {
            Shape::OneD { size_x } => (x < size_x).then_some(x),
            Shape::TwoD { size_x, size_y } => (x < size_x && y < size_y).then_some(x * size_y + y),
        }
    }

    /// Replaces the count buffer, keeping name, number and shape.
    ///
    /// The element kind may change; the length may not.
    ///
    /// # Errors
    /// Returns an error if the buffer length does not match the shape.
    pub fn set_counts(&mut self, counts: Counts) -> Result<()> {
        check_len(self.shape, &counts)?;
        self.counts = counts;
        Ok(())
    }

    /// Adds `other` channel by channel, converting to this histogram's kind.
    ///
    /// Integer channels wrap on overflow; doubles added to an integer
    /// histogram are rounded to the nearest integer first.
    ///
    /// # Errors
    /// Returns an error if the buffer length does not match the shape.
    pub fn add_counts(&mut self, other: &Counts) -> Result<()> {
        check_len(self.shape, other)?;
        match (&mut self.counts, other) {
            (Counts::Int(dst), Counts::Int(src)) => {
                for (d, s) in dst.iter_mut().zip(src) {
                    *d = d.wrapping_add(*s);
                }
            }
            (Counts::Int(dst), Counts::Double(src)) => {
                for (d, s) in dst.iter_mut().zip(src) {
                    #[allow(clippy::cast_possible_truncation)]
                    let rounded = s.round() as i32;
                    *d = d.wrapping_add(rounded);
                }
            }
            (Counts::Double(dst), Counts::Int(src)) => {
                for (d, s) in dst.iter_mut().zip(src) {
                    *d += f64::from(*s);
                }
            }
            (Counts::Double(dst), Counts::Double(src)) => {
                for (d, s) in dst.iter_mut().zip(src) {
                    *d += s;
                }
            }
        }
        Ok(())
    }
}

fn check_len(shape: Shape, counts: &Counts) -> Result<()> {
    let expected = shape.channel_count();
    if counts.len() == expected {
        Ok(())
    } else {
        Err(Error::ShapeMismatch {
            expected,
            actual: counts.len(),
        })
    }
}

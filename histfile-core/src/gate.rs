//! Gates (regions of interest) and scalers.

use crate::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Gate dimensionality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum GateKind {
    /// Channel interval on a 1-D histogram.
    OneD,
    /// Polygon ("banana") on a 2-D histogram.
    TwoD,
}

impl GateKind {
    #[must_use]
    pub fn dimensions(self) -> u8 {
        match self {
            GateKind::OneD => 1,
            GateKind::TwoD => 2,
        }
    }
}

/// Gate limits.
///
/// Interval bounds are kept in the order given; polygons are kept open or
/// closed exactly as supplied.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum GateLimits {
    Interval { low: i32, high: i32 },
    Polygon(Vec<(i32, i32)>),
}

impl GateLimits {
    #[must_use]
    pub fn kind(&self) -> GateKind {
        match self {
            GateLimits::Interval { .. } => GateKind::OneD,
            GateLimits::Polygon(_) => GateKind::TwoD,
        }
    }
}

/// A named gate set on one histogram.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "GateFields"))]
pub struct Gate {
    name: String,
    histogram: String,
    kind: GateKind,
    limits: Option<GateLimits>,
}

/// Serialized form of [`Gate`]; limits go through [`Gate::set_limits`].
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct GateFields {
    name: String,
    histogram: String,
    kind: GateKind,
    limits: Option<GateLimits>,
}

#[cfg(feature = "serde")]
impl TryFrom<GateFields> for Gate {
    type Error = Error;

    fn try_from(fields: GateFields) -> Result<Self> {
        let mut gate = Gate::new(fields.name, fields.histogram, fields.kind);
        if let Some(limits) = fields.limits {
            gate.set_limits(limits)?;
        }
        Ok(gate)
    }
}

impl Gate {
    /// Creates an undefined gate on the named histogram.
    pub fn new(name: impl Into<String>, histogram: impl Into<String>, kind: GateKind) -> Self {
        Self {
            name: name.into(),
            histogram: histogram.into(),
            kind,
            limits: None,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the histogram this gate is set on.
    #[must_use]
    pub fn histogram(&self) -> &str {
        &self.histogram
    }

    #[must_use]
    pub fn kind(&self) -> GateKind {
        self.kind
    }

    #[must_use]
    pub fn limits(&self) -> Option<&GateLimits> {
        self.limits.as_ref()
    }

    #[must_use]
    pub fn is_defined(&self) -> bool {
        self.limits.is_some()
    }

    /// Defines the gate.
    ///
    /// # Errors
    /// Returns an error if the limits are of the wrong kind for this gate.
    pub fn set_limits(&mut self, limits: GateLimits) -> Result<()> {
        if limits.kind() != self.kind {
            return Err(Error::LimitsMismatch {
                gate: self.name.clone(),
                expected: self.kind.dimensions(),
                actual: limits.kind().dimensions(),
            });
        }
        self.limits = Some(limits);
        Ok(())
    }

    /// Marks the gate undefined.
    pub fn unset(&mut self) {
        self.limits = None;
    }
}

/// A named counter.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Scaler {
    pub name: String,
    pub number: i32,
    pub value: i32,
}

impl Scaler {
    /// Creates a scaler with value 0.
    pub fn new(name: impl Into<String>, number: i32) -> Self {
        Self {
            name: name.into(),
            number,
            value: 0,
        }
    }

    #[must_use]
    pub fn with_value(mut self, value: i32) -> Self {
        self.value = value;
        self
    }
}

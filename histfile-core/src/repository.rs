//! In-memory registry of histograms, gates and scalers.
//!
//! A [`Repository`] is passed explicitly to every load and save call; the
//! codecs never reach into shared global state.

use crate::{Error, Gate, Histogram, Result, Scaler};

/// Insertion-ordered, name-indexed collection of histograms, gates and scalers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Repository {
    histograms: Vec<Histogram>,
    gates: Vec<Gate>,
    scalers: Vec<Scaler>,
}

impl Repository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.histograms.is_empty() && self.gates.is_empty() && self.scalers.is_empty()
    }

    /// Removes everything.
    pub fn clear(&mut self) {
        self.histograms.clear();
        self.gates.clear();
        self.scalers.clear();
    }

    /// Registers a histogram.
    ///
    /// A histogram with the same name is replaced in place and the gates
    /// set on it are dropped.
    pub fn add_histogram(&mut self, histogram: Histogram) {
        if let Some(pos) = self
            .histograms
            .iter()
            .position(|h| h.name() == histogram.name())
        {
            let name = histogram.name().to_owned();
            self.gates.retain(|g| g.histogram() != name);
            self.histograms[pos] = histogram;
        } else {
            self.histograms.push(histogram);
        }
    }

    #[must_use]
    pub fn histograms(&self) -> &[Histogram] {
        &self.histograms
    }

    #[must_use]
    pub fn histogram(&self, name: &str) -> Option<&Histogram> {
        self.histograms.iter().find(|h| h.name() == name)
    }

    pub fn histogram_mut(&mut self, name: &str) -> Option<&mut Histogram> {
        self.histograms.iter_mut().find(|h| h.name() == name)
    }

    /// First histogram carrying `number`.
    #[must_use]
    pub fn histogram_by_number(&self, number: i32) -> Option<&Histogram> {
        self.histograms.iter().find(|h| h.number() == number)
    }

    /// Registers a gate on an existing histogram, replacing one of the same name.
    ///
    /// # Errors
    /// Returns an error if the histogram is unknown or its dimensionality
    /// differs from the gate's.
    pub fn add_gate(&mut self, gate: Gate) -> Result<()> {
        let histogram = self
            .histogram(gate.histogram())
            .ok_or_else(|| Error::UnknownHistogram(gate.histogram().to_owned()))?;
        if histogram.dimensions() != gate.kind().dimensions() {
            return Err(Error::DimensionMismatch {
                gate: gate.name().to_owned(),
                histogram: histogram.name().to_owned(),
                gate_dims: gate.kind().dimensions(),
                histogram_dims: histogram.dimensions(),
            });
        }
        if let Some(existing) = self.gates.iter_mut().find(|g| g.name() == gate.name()) {
            *existing = gate;
        } else {
            self.gates.push(gate);
        }
        Ok(())
    }

    #[must_use]
    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    #[must_use]
    pub fn gate(&self, name: &str) -> Option<&Gate> {
        self.gates.iter().find(|g| g.name() == name)
    }

    pub fn gate_mut(&mut self, name: &str) -> Option<&mut Gate> {
        self.gates.iter_mut().find(|g| g.name() == name)
    }

    /// Gates set on the named histogram.
    pub fn gates_for<'a>(&'a self, histogram: &'a str) -> impl Iterator<Item = &'a Gate> + 'a {
        self.gates.iter().filter(move |g| g.histogram() == histogram)
    }

    /// Registers a scaler, replacing one of the same name.
    pub fn add_scaler(&mut self, scaler: Scaler) {
        if let Some(existing) = self.scalers.iter_mut().find(|s| s.name == scaler.name) {
            *existing = scaler;
        } else {
            self.scalers.push(scaler);
        }
    }

    #[must_use]
    pub fn scalers(&self) -> &[Scaler] {
        &self.scalers
    }

    #[must_use]
    pub fn scaler(&self, name: &str) -> Option<&Scaler> {
        self.scalers.iter().find(|s| s.name == name)
    }

    pub fn scaler_mut(&mut self, name: &str) -> Option<&mut Scaler> {
        self.scalers.iter_mut().find(|s| s.name == name)
    }
}

//! Applying decoded file contents to a [`Repository`].

use crate::jhf::{JhfContents, JhfVersion};
use crate::{Result, Warning};
use histfile_core::{Counts, Histogram, Repository};
use log::{info, warn};
use serde::{Deserialize, Serialize};

/// How decoded records are merged into a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadMode {
    /// Replace everything with the file's contents.
    #[default]
    Open,
    /// Overwrite counts, gate limits and scaler values of existing objects.
    Reload,
    /// Add counts and scaler values to existing objects.
    Add,
}

/// Outcome of a load: what was applied and what was skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub histograms: usize,
    pub gates: usize,
    pub scalers: usize,
    pub warnings: Vec<Warning>,
}

impl LoadReport {
    fn warn(&mut self, warning: Warning) {
        warn!("{warning}");
        self.warnings.push(warning);
    }
}

/// Applies a decoded JHF stream.
///
/// V01 gate and scaler sections are applied only when reloading or adding.
///
/// # Errors
/// Only fails on internal inconsistencies between a decoded record and its
/// own shape.
pub fn apply_jhf(repo: &mut Repository, contents: JhfContents, mode: LoadMode) -> Result<LoadReport> {
    let JhfContents {
        version,
        histograms,
        gates,
        scalers,
        warnings,
    } = contents;
    let mut report = apply_histograms(repo, histograms, mode)?;
    // Already logged by the decoder.
    report.warnings.extend(warnings);

    match mode {
        LoadMode::Open if version == JhfVersion::V01 => {
            for (section, records) in [("gate", gates.len()), ("scaler", scalers.len())] {
                if records > 0 {
                    report.warn(Warning::IgnoredSection { section, records });
                }
            }
        }
        LoadMode::Open => {
            for record in &gates {
                let owner = repo
                    .histogram_by_number(record.histogram_number)
                    .map(|h| h.name().to_owned());
                let Some(owner) = owner else {
                    report.warn(Warning::UnresolvedGateOwner {
                        gate: record.name.clone(),
                        number: record.histogram_number,
                    });
                    continue;
                };
                if repo.add_gate(record.to_gate(&owner)?).is_ok() {
                    report.gates += 1;
                } else {
                    report.warn(Warning::GateKindMismatch {
                        gate: record.name.clone(),
                    });
                }
            }
            report.scalers = scalers.len();
            for scaler in scalers {
                repo.add_scaler(scaler);
            }
        }
        LoadMode::Reload => {
            for record in gates {
                let Some(gate) = repo.gate_mut(&record.name) else {
                    report.warn(Warning::MissingGate(record.name));
                    continue;
                };
                if gate.kind() != record.kind {
                    report.warn(Warning::GateKindMismatch { gate: record.name });
                    continue;
                }
                match record.limits {
                    Some(limits) => gate.set_limits(limits)?,
                    None => gate.unset(),
                }
                report.gates += 1;
            }
            for record in scalers {
                let Some(scaler) = repo.scaler_mut(&record.name) else {
                    report.warn(Warning::MissingScaler(record.name));
                    continue;
                };
                scaler.value = record.value;
                report.scalers += 1;
            }
        }
        LoadMode::Add => {
            for record in scalers {
                let Some(scaler) = repo.scaler_mut(&record.name) else {
                    report.warn(Warning::MissingScaler(record.name));
                    continue;
                };
                scaler.value = scaler.value.wrapping_add(record.value);
                report.scalers += 1;
            }
        }
    }

    info!(
        "{mode:?}: applied {} histogram(s), {} gate(s), {} scaler(s), {} warning(s)",
        report.histograms,
        report.gates,
        report.scalers,
        report.warnings.len()
    );
    Ok(report)
}

/// Applies decoded histograms.
///
/// # Errors
/// Only fails on internal inconsistencies between a decoded record and its
/// own shape.
pub fn apply_histograms(
    repo: &mut Repository,
    histograms: Vec<Histogram>,
    mode: LoadMode,
) -> Result<LoadReport> {
    let mut report = LoadReport::default();
    if mode == LoadMode::Open {
        repo.clear();
        report.histograms = histograms.len();
        for histogram in histograms {
            repo.add_histogram(histogram);
        }
        return Ok(report);
    }

    for record in histograms {
        let Some(target) = repo.histogram_mut(record.name()) else {
            report.warn(Warning::MissingHistogram(record.name().to_owned()));
            continue;
        };
        if target.shape() != record.shape() {
            report.warn(Warning::ShapeMismatch {
                histogram: record.name().to_owned(),
            });
            continue;
        }
        match mode {
            LoadMode::Add => target.add_counts(record.counts())?,
            _ if target.kind() == record.kind() => target.set_counts(record.into_counts())?,
            _ => {
                // Keep the registered element type.
                target.set_counts(Counts::zeros(target.kind(), target.shape().channel_count()))?;
                target.add_counts(record.counts())?;
            }
        }
        report.histograms += 1;
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use histfile_core::{CountKind, Gate, GateKind, GateLimits, Scaler, Shape};

    fn hist(name: &str, number: i32, counts: Vec<i32>) -> Histogram {
        let shape = Shape::one_d(counts.len()).unwrap();
        Histogram::new(name, shape, Counts::Int(counts))
            .unwrap()
            .with_number(number)
    }

    #[test]
    fn test_open_replaces_everything() {
        let mut repo = Repository::new();
        repo.add_histogram(hist("old", 1, vec![1]));
        repo.add_scaler(Scaler::new("old", 1));
        let report = apply_histograms(&mut repo, vec![hist("new", 1, vec![2, 3])], LoadMode::Open).unwrap();
        assert_eq!(report.histograms, 1);
        assert!(repo.histogram("old").is_none());
        assert!(repo.scaler("old").is_none());
    }

    #[test]
    fn test_reload_and_add_counts() {
        let mut repo = Repository::new();
        repo.add_histogram(hist("a", 1, vec![1, 1]));
        repo.add_histogram(hist("b", 2, vec![0, 0, 0]));

        let incoming = vec![hist("a", 1, vec![5, 6]), hist("b", 2, vec![1, 2]), hist("c", 3, vec![9])];
        let report = apply_histograms(&mut repo, incoming.clone(), LoadMode::Reload).unwrap();
        assert_eq!(report.histograms, 1);
        assert_eq!(
            report.warnings,
            [
                Warning::ShapeMismatch {
                    histogram: "b".to_owned()
                },
                Warning::MissingHistogram("c".to_owned())
            ]
        );
        assert_eq!(repo.histogram("a").unwrap().counts().as_int(), Some(&[5, 6][..]));

        apply_histograms(&mut repo, incoming, LoadMode::Add).unwrap();
        assert_eq!(repo.histogram("a").unwrap().counts().as_int(), Some(&[10, 12][..]));
    }

    #[test]
    fn test_reload_keeps_registered_kind() {
        let mut repo = Repository::new();
        repo.add_histogram(Histogram::zeroed("a", Shape::one_d(2).unwrap(), CountKind::Double));
        apply_histograms(&mut repo, vec![hist("a", 0, vec![3, 4])], LoadMode::Reload).unwrap();
        assert_eq!(repo.histogram("a").unwrap().counts(), &Counts::Double(vec![3.0, 4.0]));
    }

    #[test]
    fn test_v01_open_ignores_gates_and_scalers() {
        let mut repo = Repository::new();
        let contents = JhfContents {
            version: JhfVersion::V01,
            histograms: vec![hist("a", 1, vec![1])],
            gates: vec![crate::jhf::GateRecord {
                name: "g".to_owned(),
                histogram_number: 1,
                kind: GateKind::OneD,
                limits: Some(GateLimits::Interval { low: 0, high: 0 }),
            }],
            scalers: Vec::new(),
            warnings: Vec::new(),
        };
        let report = apply_jhf(&mut repo, contents, LoadMode::Open).unwrap();
        assert!(repo.gates().is_empty());
        assert_eq!(
            report.warnings,
            [Warning::IgnoredSection {
                section: "gate",
                records: 1
            }]
        );
    }

    #[test]
    fn test_add_sums_scalers_and_leaves_gates() {
        let mut repo = Repository::new();
        repo.add_histogram(hist("a", 1, vec![1]));
        let mut gate = Gate::new("g", "a", GateKind::OneD);
        gate.set_limits(GateLimits::Interval { low: 1, high: 2 }).unwrap();
        repo.add_gate(gate).unwrap();
        repo.add_scaler(Scaler::new("clock", 1).with_value(i32::MAX));

        let contents = JhfContents {
            version: JhfVersion::V02,
            histograms: Vec::new(),
            gates: vec![crate::jhf::GateRecord {
                name: "g".to_owned(),
                histogram_number: 1,
                kind: GateKind::OneD,
                limits: None,
            }],
            scalers: vec![Scaler::new("clock", 1).with_value(2)],
            warnings: Vec::new(),
        };
        let report = apply_jhf(&mut repo, contents, LoadMode::Add).unwrap();
        assert!(report.warnings.is_empty());
        assert_eq!(repo.scaler("clock").unwrap().value, i32::MIN + 1);
        assert!(repo.gate("g").unwrap().is_defined());
    }
}

//! Path-based reading and writing.
//!
//! Streams are buffered with [`BUFFER_SIZE`] bytes, enough for a typical
//! 256 x 256 matrix of 32-bit counts, and released on every exit path.
//! Writers are flushed explicitly so that late write errors are reported.

use crate::config::CodecConfig;
use crate::jhf::{self, JhfContents, JhfWriteOptions};
use crate::load::{self, LoadMode, LoadReport};
use crate::ornl::{self, OrnlWriteOptions};
use crate::{Error, Result};
use histfile_core::{Histogram, Repository};
use log::{info, warn};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

/// Stream buffer size in bytes.
pub const BUFFER_SIZE: usize = 256 * 256 * 4;

/// Supported file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// Single `.jhf` file.
    Jhf,
    /// `.drr` directory plus `.his` samples sharing a base name.
    Ornl,
}

impl FileFormat {
    /// Picks the format from the file extension.
    ///
    /// # Errors
    /// Returns [`Error::Format`] for an unknown or missing extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("jhf") => Ok(FileFormat::Jhf),
            Some("drr" | "his") => Ok(FileFormat::Ornl),
            _ => Err(Error::Format(format!(
                "cannot tell format of {} from its extension",
                path.display()
            ))),
        }
    }
}

/// The `.drr` and `.his` paths of the pair `path` belongs to.
#[must_use]
pub fn ornl_paths(path: &Path) -> (PathBuf, PathBuf) {
    (path.with_extension("drr"), path.with_extension("his"))
}

fn open_buffered(path: &Path) -> Result<BufReader<File>> {
    Ok(BufReader::with_capacity(BUFFER_SIZE, File::open(path)?))
}

fn create_buffered(path: &Path) -> Result<BufWriter<File>> {
    Ok(BufWriter::with_capacity(BUFFER_SIZE, File::create(path)?))
}

/// Decodes a JHF file.
///
/// # Errors
/// Returns an error if the file cannot be read or decoded.
pub fn read_jhf_file<P: AsRef<Path>>(path: P) -> Result<JhfContents> {
    jhf::decode_jhf(open_buffered(path.as_ref())?)
}

/// Writes the repository as a JHF file.
///
/// # Errors
/// Returns an error if the file cannot be written; a partial file may remain.
pub fn write_jhf_file<P: AsRef<Path>>(
    path: P,
    repo: &Repository,
    options: &JhfWriteOptions,
) -> Result<()> {
    let sink = create_buffered(path.as_ref())?;
    jhf::encode_jhf(repo.histograms(), repo.gates(), repo.scalers(), options, sink)
}

/// Decodes a DRR/HIS pair given either file's path.
///
/// # Errors
/// Returns an error if either file cannot be read or decoded.
pub fn read_ornl_files<P: AsRef<Path>>(path: P) -> Result<Vec<Histogram>> {
    let (drr, his) = ornl_paths(path.as_ref());
    ornl::decode_ornl(open_buffered(&drr)?, open_buffered(&his)?)
}

/// Writes histograms as a DRR/HIS pair next to `path`.
///
/// # Errors
/// Returns an error if either file cannot be written; partial files may remain.
pub fn write_ornl_files<P: AsRef<Path>>(
    path: P,
    histograms: &[Histogram],
    options: &OrnlWriteOptions,
) -> Result<()> {
    let (drr, his) = ornl_paths(path.as_ref());
    ornl::encode_ornl(histograms, options, create_buffered(&drr)?, create_buffered(&his)?)
}

/// Reads any supported file into `repo`.
///
/// # Errors
/// Returns an error if the file cannot be read or decoded. The repository
/// is left untouched in that case.
pub fn load_file<P: AsRef<Path>>(
    repo: &mut Repository,
    path: P,
    mode: LoadMode,
) -> Result<LoadReport> {
    let path = path.as_ref();
    info!("{mode:?} {}", path.display());
    match FileFormat::from_path(path)? {
        FileFormat::Jhf => load::apply_jhf(repo, read_jhf_file(path)?, mode),
        FileFormat::Ornl => load::apply_histograms(repo, read_ornl_files(path)?, mode),
    }
}

/// Writes `repo` in the format implied by `path`.
///
/// ORNL files hold histograms only; gates and scalers are dropped with a
/// warning.
///
/// # Errors
/// Returns an error if the file cannot be written.
pub fn save_file<P: AsRef<Path>>(repo: &Repository, path: P, config: &CodecConfig) -> Result<()> {
    let path = path.as_ref();
    info!("saving {}", path.display());
    match FileFormat::from_path(path)? {
        FileFormat::Jhf => write_jhf_file(path, repo, &config.jhf),
        FileFormat::Ornl => {
            if !repo.gates().is_empty() || !repo.scalers().is_empty() {
                warn!(
                    "{} gate(s) and {} scaler(s) are not stored in ORNL files",
                    repo.gates().len(),
                    repo.scalers().len()
                );
            }
            write_ornl_files(path, repo.histograms(), &config.ornl)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(FileFormat::from_path(Path::new("run.JHF")).unwrap(), FileFormat::Jhf);
        assert_eq!(FileFormat::from_path(Path::new("a/b.his")).unwrap(), FileFormat::Ornl);
        assert!(FileFormat::from_path(Path::new("notes.txt")).is_err());
        assert!(FileFormat::from_path(Path::new("noext")).is_err());
    }

    #[test]
    fn test_ornl_paths_share_base_name() {
        let (drr, his) = ornl_paths(Path::new("/data/run7.his"));
        assert_eq!(drr, Path::new("/data/run7.drr"));
        assert_eq!(his, Path::new("/data/run7.his"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let mut repo = Repository::new();
        let err = load_file(&mut repo, "/nonexistent/histfile/run.jhf", LoadMode::Open);
        assert!(matches!(err, Err(Error::Io(_))));
    }
}

//! Building a blob and its index from a directory.
//!
//! Every regular file becomes one complete gzip member appended to the
//! blob, and one index record written right after the append. Each member
//! is compressed on its own, so any member can later be decoded from its
//! byte range alone.
//!
//! ## Failure policy
//!
//! Problems with a single source file (it vanished, can't be read, or its
//! name can't be stored in the index) skip that file: a warning is logged,
//! the file is listed in [`BuildReport::skipped`], and nothing is appended
//! for it. Problems with the blob or index themselves abort the build, after
//! the blob has been cut back to the end of the last indexed member.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, LineWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;
use tracing::{debug, info, warn};

use super::index::IndexWriter;
use super::scanner::scan_dir;
use super::structures::{ArchiveEntry, check_name};
use crate::error::{Error, Result};

/// Blob and index paths for a source directory: `<dir>.gz` and `<dir>.idx`,
/// next to the directory itself.
pub fn archive_paths(dir: &Path) -> (PathBuf, PathBuf) {
    // Rebuilding from components drops any trailing separator.
    let base: PathBuf = dir.components().collect();
    let with_suffix = |suffix: &str| {
        let mut name = OsString::from(base.as_os_str());
        name.push(suffix);
        PathBuf::from(name)
    };
    (with_suffix(".gz"), with_suffix(".idx"))
}

/// Compress `data` as one self-contained gzip member.
pub fn compress_member(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

/// A source file left out of the archive.
#[derive(Debug)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub error: Error,
}

/// Outcome of a completed build.
#[derive(Debug)]
pub struct BuildReport {
    /// Records in the order they were written.
    pub entries: Vec<ArchiveEntry>,
    pub skipped: Vec<SkippedFile>,
    pub blob_len: u64,
}

/// State of a build in progress: the open outputs and the blob length
/// observed after the last append.
pub struct ArchiveBuilder {
    blob: File,
    blob_path: PathBuf,
    index: IndexWriter<LineWriter<File>>,
    index_path: PathBuf,
    blob_len: u64,
    entries: Vec<ArchiveEntry>,
    skipped: Vec<SkippedFile>,
}

impl ArchiveBuilder {
    /// Create (or truncate) both outputs.
    pub fn create(blob_path: &Path, index_path: &Path) -> Result<Self> {
        let blob = File::create(blob_path).map_err(|e| Error::io(blob_path, e))?;
        let index = File::create(index_path).map_err(|e| Error::io(index_path, e))?;
        Ok(Self {
            blob,
            blob_path: blob_path.to_path_buf(),
            index: IndexWriter::new(LineWriter::new(index)),
            index_path: index_path.to_path_buf(),
            blob_len: 0,
            entries: Vec::new(),
            skipped: Vec::new(),
        })
    }

    /// Add one scanned path.
    ///
    /// Returns the new record, or `None` if the path was not a regular file
    /// or was skipped. Only failures of the outputs are returned as errors.
    pub fn add_path(&mut self, path: &Path) -> Result<Option<&ArchiveEntry>> {
        let (name, data) = match read_source(path) {
            Ok(Some(source)) => source,
            Ok(None) => {
                debug!(path = %path.display(), "not a regular file, skipping");
                return Ok(None);
            }
            Err(error) => {
                warn!(path = %path.display(), %error, "skipping file");
                self.skipped.push(SkippedFile {
                    path: path.to_path_buf(),
                    error,
                });
                return Ok(None);
            }
        };
        self.append(name, &data).map(Some)
    }

    /// Append `data` as a member named `name` and write its record.
    ///
    /// The name is not checked here; callers outside [`add_path`] must make
    /// sure it satisfies [`check_name`].
    ///
    /// [`add_path`]: Self::add_path
    pub fn append(&mut self, name: String, data: &[u8]) -> Result<&ArchiveEntry> {
        let member = compress_member(data).map_err(|e| Error::io(&self.blob_path, e))?;

        let offset = self.current_blob_len()?;
        if offset != self.blob_len {
            let e = io::Error::other(format!(
                "blob is {offset} bytes, expected {}",
                self.blob_len
            ));
            return Err(self.fatal(e));
        }

        if let Err(e) = self.blob.write_all(&member) {
            return Err(self.fatal(e));
        }

        let new_len = match self.current_blob_len() {
            Ok(len) => len,
            Err(err) => {
                self.rollback();
                return Err(err);
            }
        };
        let length = new_len.saturating_sub(offset);
        if length != member.len() as u64 {
            let e = io::Error::other(format!(
                "appended {} bytes but blob grew by {length}",
                member.len()
            ));
            return Err(self.fatal(e));
        }

        let entry = ArchiveEntry::new(name, offset, length);
        if let Err(e) = self.index.write_entry(&entry) {
            let err = Error::io(&self.index_path, e);
            self.rollback();
            return Err(err);
        }
        debug!(
            name = %entry.name,
            offset,
            length,
            original = data.len(),
            "appended member"
        );

        self.blob_len = new_len;
        let at = self.entries.len();
        self.entries.push(entry);
        Ok(&self.entries[at])
    }

    /// Flush the index and hand back what was built.
    pub fn finish(mut self) -> Result<BuildReport> {
        self.index
            .flush()
            .map_err(|e| Error::io(&self.index_path, e))?;
        self.blob
            .flush()
            .map_err(|e| Error::io(&self.blob_path, e))?;
        debug!(
            index = %self.index_path.display(),
            records = self.index.records(),
            "index written"
        );
        Ok(BuildReport {
            entries: self.entries,
            skipped: self.skipped,
            blob_len: self.blob_len,
        })
    }

    fn current_blob_len(&self) -> Result<u64> {
        self.blob
            .metadata()
            .map(|m| m.len())
            .map_err(|e| Error::io(&self.blob_path, e))
    }

    /// Drop whatever follows the last indexed member and report `e` against
    /// the blob.
    fn fatal(&mut self, e: io::Error) -> Error {
        self.rollback();
        Error::io(&self.blob_path, e)
    }

    fn rollback(&mut self) {
        let keep = self.blob_len;
        let result = self
            .blob
            .set_len(keep)
            .and_then(|()| self.blob.seek(SeekFrom::Start(keep)).map(drop));
        if let Err(error) = result {
            warn!(path = %self.blob_path.display(), %error, keep, "could not truncate blob");
        }
    }
}

/// Read a source file whole. `Ok(None)` means it is not a regular file.
fn read_source(path: &Path) -> Result<Option<(String, Vec<u8>)>> {
    let metadata = fs::metadata(path).map_err(|e| Error::io(path, e))?;
    if !metadata.is_file() {
        return Ok(None);
    }

    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::UnindexableName {
            name: path.to_string_lossy().into_owned(),
            reason: "name is not valid UTF-8",
        })?;
    check_name(name).map_err(|reason| Error::UnindexableName {
        name: name.to_string(),
        reason,
    })?;

    let data = fs::read(path).map_err(|e| Error::io(path, e))?;
    Ok(Some((name.to_string(), data)))
}

/// Build `<dir>.gz` and `<dir>.idx` from the regular files directly inside
/// `dir`, replacing any previous archive of the same name.
pub fn build_archive(dir: &Path) -> Result<BuildReport> {
    let (blob_path, index_path) = archive_paths(dir);
    build_archive_to(dir, &blob_path, &index_path)
}

/// Like [`build_archive`], with explicit output paths.
pub fn build_archive_to(dir: &Path, blob_path: &Path, index_path: &Path) -> Result<BuildReport> {
    let paths = scan_dir(dir)?;
    let mut builder = ArchiveBuilder::create(blob_path, index_path)?;
    for path in &paths {
        builder.add_path(path)?;
    }
    let report = builder.finish()?;
    info!(
        dir = %dir.display(),
        files = report.entries.len(),
        skipped = report.skipped.len(),
        blob_len = report.blob_len,
        "archive built"
    );
    Ok(report)
}

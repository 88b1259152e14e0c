//! Reading and writing the text index.
//!
//! The index is one `name,offset,length` line per member, in the order the
//! members were appended to the blob. Lookups scan it front to back and stop
//! at the first record whose name field matches, so duplicate names resolve
//! to the earliest member.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::structures::{ArchiveEntry, DELIMITER, check_name, parse_fields};
use crate::error::{Error, Result};

/// Writes index records to any sink, one line per entry.
pub struct IndexWriter<W: Write> {
    inner: W,
    records: usize,
}

impl<W: Write> IndexWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, records: 0 }
    }

    pub fn write_entry(&mut self, entry: &ArchiveEntry) -> io::Result<()> {
        self.inner.write_all(entry.to_record().as_bytes())?;
        self.records += 1;
        Ok(())
    }

    /// Number of records written so far.
    pub fn records(&self) -> usize {
        self.records
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Line-oriented reader over an index source.
///
/// `path` is only used to label I/O errors.
pub struct IndexReader<R: BufRead> {
    reader: R,
    path: PathBuf,
    line: usize,
    buf: Vec<u8>,
}

impl IndexReader<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        Ok(Self::new(BufReader::new(file), path))
    }
}

impl<R: BufRead> IndexReader<R> {
    pub fn new(reader: R, path: impl Into<PathBuf>) -> Self {
        Self {
            reader,
            path: path.into(),
            line: 0,
            buf: Vec::new(),
        }
    }

    /// Advance to the next line, returning its 1-based number and its bytes
    /// without the terminator.
    fn next_line(&mut self) -> Result<Option<(usize, &[u8])>> {
        self.buf.clear();
        let n = self
            .reader
            .read_until(b'\n', &mut self.buf)
            .map_err(|e| Error::io(&self.path, e))?;
        if n == 0 {
            return Ok(None);
        }
        self.line += 1;
        let mut line = self.buf.as_slice();
        if let Some(rest) = line.strip_suffix(b"\n") {
            line = rest;
        }
        if let Some(rest) = line.strip_suffix(b"\r") {
            line = rest;
        }
        Ok(Some((self.line, line)))
    }

    /// Find the first record named exactly `name`.
    ///
    /// The name must be followed directly by the delimiter, so `a` never
    /// matches a record for `ab`. Records for other names are skipped
    /// without being parsed. A name that could never have been indexed,
    /// such as one containing the delimiter, is simply not found.
    pub fn lookup(mut self, name: &str) -> Result<ArchiveEntry> {
        if check_name(name).is_err() {
            return Err(Error::NameNotFound {
                name: name.to_string(),
            });
        }

        let mut prefix = Vec::with_capacity(name.len() + 1);
        prefix.extend_from_slice(name.as_bytes());
        prefix.push(DELIMITER as u8);

        while let Some((line_no, line)) = self.next_line()? {
            let Some(fields) = line.strip_prefix(prefix.as_slice()) else {
                continue;
            };
            let malformed = |reason: String| Error::MalformedIndex {
                line: line_no,
                reason,
            };
            let fields = std::str::from_utf8(fields)
                .map_err(|_| malformed("record is not valid UTF-8".to_string()))?;
            let (offset, length) = parse_fields(fields).map_err(malformed)?;
            debug!(name, offset, length, line = line_no, "index record found");
            return Ok(ArchiveEntry::new(name, offset, length));
        }

        Err(Error::NameNotFound {
            name: name.to_string(),
        })
    }

    /// Parse the next record, failing on anything that isn't one.
    /// Blank lines are skipped.
    pub fn next_entry(&mut self) -> Result<Option<ArchiveEntry>> {
        loop {
            let Some((line_no, line)) = self.next_line()? else {
                return Ok(None);
            };
            if line.is_empty() {
                continue;
            }
            let entry = std::str::from_utf8(line)
                .map_err(|_| "record is not valid UTF-8".to_string())
                .and_then(ArchiveEntry::parse_record)
                .map_err(|reason| Error::MalformedIndex {
                    line: line_no,
                    reason,
                })?;
            return Ok(Some(entry));
        }
    }
}

/// Look `name` up in the index file at `path`.
pub fn lookup(path: &Path, name: &str) -> Result<ArchiveEntry> {
    IndexReader::open(path)?.lookup(name)
}

/// A whole index held in memory, for callers doing many lookups.
#[derive(Debug, Default)]
pub struct Index {
    entries: Vec<ArchiveEntry>,
    by_name: HashMap<String, usize>,
}

impl Index {
    pub fn load(path: &Path) -> Result<Self> {
        Self::read(IndexReader::open(path)?)
    }

    pub fn read<R: BufRead>(mut reader: IndexReader<R>) -> Result<Self> {
        let mut index = Self::default();
        while let Some(entry) = reader.next_entry()? {
            index.push(entry);
        }
        Ok(index)
    }

    fn push(&mut self, entry: ArchiveEntry) {
        // Later duplicates stay listed but are never returned by get().
        self.by_name
            .entry(entry.name.clone())
            .or_insert(self.entries.len());
        self.entries.push(entry);
    }

    pub fn get(&self, name: &str) -> Option<&ArchiveEntry> {
        self.by_name.get(name).map(|&i| &self.entries[i])
    }

    /// All records in file order, duplicates included.
    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

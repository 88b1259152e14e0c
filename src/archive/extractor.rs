use std::fs;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use flate2::bufread::GzDecoder;
use tracing::debug;

use super::index::lookup;
use super::structures::{
    ArchiveEntry, GZIP_HEADER_SIZE, GZIP_TRAILER_SIZE, MIN_MEMBER_SIZE, MemberInfo,
    check_member_header,
};
use crate::error::{Error, Result};
use crate::io::{LocalFileReader, ReadAt, SectionReader};

/// Random access to the members of a blob.
pub struct ArchiveExtractor<R: ReadAt> {
    blob: R,
    path: PathBuf,
}

impl ArchiveExtractor<LocalFileReader> {
    pub fn open(path: &Path) -> Result<Self> {
        let blob = LocalFileReader::new(path).map_err(|e| Error::io(path, e))?;
        Ok(Self::new(blob, path))
    }
}

impl<R: ReadAt> ArchiveExtractor<R> {
    /// `path` is only used to label errors.
    pub fn new(blob: R, path: impl Into<PathBuf>) -> Self {
        Self {
            blob,
            path: path.into(),
        }
    }

    pub fn blob_len(&self) -> u64 {
        self.blob.size()
    }

    /// Check that `offset..offset + length` lies inside the blob.
    fn check_range(&self, offset: u64, length: u64) -> Result<()> {
        let size = self.blob.size();
        match offset.checked_add(length) {
            Some(end) if end <= size => Ok(()),
            _ => Err(Error::Seek {
                offset,
                length,
                size,
            }),
        }
    }

    /// Decompress the bytes `offset..offset + length` as one complete gzip
    /// member.
    ///
    /// Nothing outside the window is read. The window must hold exactly one
    /// member: a truncated member, a checksum mismatch, or bytes left over
    /// after the member are all reported as [`Error::CorruptStream`].
    pub fn read_range(&self, offset: u64, length: u64) -> Result<Vec<u8>> {
        self.check_range(offset, length)?;
        let corrupt = |reason: String| Error::CorruptStream {
            offset,
            length,
            reason,
        };
        if length < MIN_MEMBER_SIZE {
            return Err(corrupt(format!(
                "{length} bytes is too short for a gzip member"
            )));
        }
        debug!(blob = %self.path.display(), offset, length, "reading member");

        let section = SectionReader::new(&self.blob, offset, length);
        let mut decoder = GzDecoder::new(BufReader::new(section));
        let mut data = Vec::new();
        decoder
            .read_to_end(&mut data)
            .map_err(|e| self.classify(e, corrupt))?;

        let mut rest = decoder.into_inner();
        let buffered = rest.fill_buf().map_err(|e| Error::io(&self.path, e))?.len() as u64;
        let trailing = buffered + rest.get_ref().remaining();
        if trailing > 0 {
            return Err(corrupt(format!(
                "{trailing} bytes follow the end of the member"
            )));
        }

        debug!(offset, length, decompressed = data.len(), "member decoded");
        Ok(data)
    }

    /// Decoder failures mean the window is not a valid member; anything
    /// else came from reading the blob.
    fn classify(&self, e: io::Error, corrupt: impl FnOnce(String) -> Error) -> Error {
        match e.kind() {
            io::ErrorKind::InvalidInput
            | io::ErrorKind::InvalidData
            | io::ErrorKind::UnexpectedEof => corrupt(e.to_string()),
            _ => Error::io(&self.path, e),
        }
    }

    /// Decompress the member described by `entry`.
    pub fn extract_to_memory(&self, entry: &ArchiveEntry) -> Result<Vec<u8>> {
        self.read_range(entry.offset, entry.length)
    }

    /// Read the CRC32 and uncompressed size stored in a member's trailer,
    /// without decompressing it.
    pub fn inspect(&self, entry: &ArchiveEntry) -> Result<MemberInfo> {
        let (offset, length) = (entry.offset, entry.length);
        self.check_range(offset, length)?;
        let corrupt = |reason: &str| Error::CorruptStream {
            offset,
            length,
            reason: reason.to_string(),
        };
        if length < MIN_MEMBER_SIZE {
            return Err(corrupt("too short for a gzip member"));
        }

        let mut header = [0u8; GZIP_HEADER_SIZE];
        self.blob
            .read_exact_at(offset, &mut header)
            .map_err(|e| Error::io(&self.path, e))?;
        check_member_header(&header).map_err(corrupt)?;

        let mut trailer = [0u8; GZIP_TRAILER_SIZE];
        self.blob
            .read_exact_at(entry.end() - GZIP_TRAILER_SIZE as u64, &mut trailer)
            .map_err(|e| Error::io(&self.path, e))?;
        MemberInfo::from_trailer(&trailer).map_err(corrupt)
    }

    /// Extract a member to disk, creating parent directories as needed.
    ///
    /// The member is fully decoded before the output file is created, so a
    /// corrupt member leaves no file behind.
    pub fn extract_to_file(&self, entry: &ArchiveEntry, output_path: &Path) -> Result<()> {
        let data = self.extract_to_memory(entry)?;

        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
            }
        }
        fs::write(output_path, &data).map_err(|e| Error::io(output_path, e))
    }

    /// Extract a member to `out` (stdout for the CLI).
    pub fn extract_to_writer<W: Write>(&self, entry: &ArchiveEntry, out: &mut W) -> Result<()> {
        let data = self.extract_to_memory(entry)?;
        out.write_all(&data)
            .and_then(|()| out.flush())
            .map_err(|e| Error::io("<output>", e))
    }
}

/// Look `name` up in the index and decompress its member from the blob.
///
/// The blob is not opened unless the name is found.
pub fn retrieve(index_path: &Path, blob_path: &Path, name: &str) -> Result<Vec<u8>> {
    let entry = lookup(index_path, name)?;
    ArchiveExtractor::open(blob_path)?.extract_to_memory(&entry)
}

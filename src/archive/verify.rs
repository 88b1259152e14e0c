use std::fmt;

use tracing::{debug, warn};

use super::extractor::ArchiveExtractor;
use super::index::Index;
use crate::error::Error;
use crate::io::ReadAt;

/// Something wrong with an archive.
#[derive(Debug)]
pub enum Problem {
    /// A member does not start where the previous one ended.
    Misplaced {
        name: String,
        expected: u64,
        offset: u64,
    },
    /// The last member ends before or after the end of the blob.
    BlobLength { indexed_end: u64, blob_len: u64 },
    /// A member could not be decoded.
    Member { name: String, error: Error },
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Problem::Misplaced {
                name,
                expected,
                offset,
            } => write!(f, "{name}: starts at {offset}, expected {expected}"),
            Problem::BlobLength {
                indexed_end,
                blob_len,
            } => write!(
                f,
                "index covers {indexed_end} bytes but the blob is {blob_len} bytes"
            ),
            Problem::Member { name, error } => write!(f, "{name}: {error}"),
        }
    }
}

#[derive(Debug, Default)]
pub struct VerifyReport {
    pub members: usize,
    pub problems: Vec<Problem>,
}

impl VerifyReport {
    pub fn is_ok(&self) -> bool {
        self.problems.is_empty()
    }
}

/// Check that the members listed in `index` tile the blob exactly, in
/// order, and that each one decodes on its own.
pub fn verify<R: ReadAt>(index: &Index, extractor: &ArchiveExtractor<R>) -> VerifyReport {
    let mut report = VerifyReport::default();
    let mut expected = 0u64;

    for entry in index.entries() {
        if entry.offset != expected {
            report.problems.push(Problem::Misplaced {
                name: entry.name.clone(),
                expected,
                offset: entry.offset,
            });
        }
        expected = entry.offset.saturating_add(entry.length);

        match extractor.extract_to_memory(entry) {
            Ok(data) => debug!(name = %entry.name, size = data.len(), "member ok"),
            Err(error) => {
                warn!(name = %entry.name, %error, "member failed to decode");
                report.problems.push(Problem::Member {
                    name: entry.name.clone(),
                    error,
                });
            }
        }
        report.members += 1;
    }

    let blob_len = extractor.blob_len();
    if expected != blob_len {
        report.problems.push(Problem::BlobLength {
            indexed_end: expected,
            blob_len,
        });
    }
    report
}

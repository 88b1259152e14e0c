//! # gzix
//!
//! Pack the files of a directory into one blob of concatenated gzip members
//! and get any single file back without decompressing the others.
//!
//! Building a directory `photos/` writes two files next to it:
//!
//! - `photos.gz`, each file compressed as its own gzip member, end to end
//! - `photos.idx`, one `name,offset,length` line per member
//!
//! Retrieval looks the name up in the index, reads exactly `length` bytes of
//! the blob starting at `offset`, and decompresses them.
//!
//! ## Features
//!
//! - Independent gzip members, so each file is addressable by byte range
//! - Plain text index, easy to inspect or process with other tools
//! - Blob stays readable by standard gzip tools (`zcat` shows every file)
//! - Member sizes and checksums readable from gzip trailers without decoding
//! - Whole-archive verification of offsets and members
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! fn main() -> gzix::Result<()> {
//!     // Writes photos.gz and photos.idx
//!     let report = gzix::build_archive(Path::new("photos"))?;
//!     for entry in &report.entries {
//!         println!("{} at {} ({} bytes)", entry.name, entry.offset, entry.length);
//!     }
//!
//!     let data = gzix::retrieve(Path::new("photos.idx"), Path::new("photos.gz"), "cat.jpg")?;
//!     println!("cat.jpg is {} bytes", data.len());
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod cli;
pub mod error;
pub mod io;

pub use archive::{
    ArchiveBuilder, ArchiveEntry, ArchiveExtractor, BuildReport, Index, build_archive, lookup,
    retrieve, verify,
};
pub use cli::Cli;
pub use error::{Error, ErrorKind, Result};
pub use io::{LocalFileReader, ReadAt, SectionReader};

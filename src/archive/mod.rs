//! Building and reading gzip blob archives.
//!
//! This module provides functionality for packing the files of a directory
//! into a single blob of concatenated gzip members, described by a text
//! index, and for pulling single files back out of it.
//!
//! ## Architecture
//!
//! - [`scanner`]: lists the entries of the source directory
//! - [`builder`]: compresses files one by one and appends them to the blob
//! - [`index`]: writes index records and looks names up in them
//! - [`extractor`]: decodes one member from its byte range of the blob
//! - [`verify`]: checks a whole archive against its index
//!
//! ## Format Overview
//!
//! The blob (`<dir>.gz`) has no header or trailer of its own. It is just
//! gzip members (RFC 1952) laid end to end, one per archived file. Because
//! every member is a complete stream, `zcat <dir>.gz` prints all files
//! concatenated, and any single member can be decoded from its own bytes.
//!
//! The index (`<dir>.idx`) has one line per member, in blob order:
//!
//! ```text
//! name,offset,length
//! ```
//!
//! where `offset` and `length` are decimal byte counts within the blob.
//! Names are stored verbatim, so a file whose name contains `,` or a line
//! break is never archived. Duplicate names are allowed; lookups return the
//! first record.
//!
//! ## Limitations
//!
//! - Only the immediate files of one directory, no recursion
//! - Every build rewrites both files from scratch
//! - Lookups scan the index linearly unless it is loaded into an [`Index`]

pub mod builder;
pub mod extractor;
pub mod index;
pub mod scanner;
pub mod structures;
pub mod verify;

pub use builder::{ArchiveBuilder, BuildReport, SkippedFile, archive_paths, build_archive};
pub use extractor::{ArchiveExtractor, retrieve};
pub use index::{Index, IndexReader, IndexWriter, lookup};
pub use scanner::scan_dir;
pub use structures::{ArchiveEntry, MemberInfo};
pub use verify::{Problem, VerifyReport, verify};

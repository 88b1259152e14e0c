use byteorder::{LittleEndian, ReadBytesExt};
use std::fmt;
use std::io::Cursor;

/// Separator between the fields of an index record.
pub const DELIMITER: char = ',';

/// gzip member signature (RFC 1952, ID1 ID2)
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
/// The only compression method gzip defines (deflate)
pub const GZIP_METHOD_DEFLATE: u8 = 8;
/// Fixed part of a gzip member header
pub const GZIP_HEADER_SIZE: usize = 10;
/// CRC32 + ISIZE
pub const GZIP_TRAILER_SIZE: usize = 8;
/// No complete member can be shorter than its fixed header and trailer.
pub const MIN_MEMBER_SIZE: u64 = (GZIP_HEADER_SIZE + GZIP_TRAILER_SIZE) as u64;

/// Location of one file's compressed member inside the blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    pub offset: u64,
    pub length: u64,
}

impl ArchiveEntry {
    pub fn new(name: impl Into<String>, offset: u64, length: u64) -> Self {
        Self {
            name: name.into(),
            offset,
            length,
        }
    }

    /// First byte past this member.
    pub fn end(&self) -> u64 {
        self.offset + self.length
    }

    /// Serialize as one index line, `name,offset,length\n`.
    ///
    /// The name is written verbatim; see [`check_name`].
    pub fn to_record(&self) -> String {
        format!(
            "{}{DELIMITER}{}{DELIMITER}{}\n",
            self.name, self.offset, self.length
        )
    }

    /// Parse one index line (without its line terminator).
    pub fn parse_record(line: &str) -> Result<Self, String> {
        let (name, fields) = line
            .split_once(DELIMITER)
            .ok_or_else(|| format!("missing {DELIMITER:?} after name"))?;
        if name.is_empty() {
            return Err("empty name".to_string());
        }
        let (offset, length) = parse_fields(fields)?;
        Ok(Self::new(name, offset, length))
    }
}

impl fmt::Display for ArchiveEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {}+{}", self.name, self.offset, self.length)
    }
}

/// Parse the `offset,length` tail of a record.
pub fn parse_fields(fields: &str) -> Result<(u64, u64), String> {
    let (offset, length) = fields
        .split_once(DELIMITER)
        .ok_or_else(|| format!("expected offset{DELIMITER}length, got {fields:?}"))?;
    let offset = offset
        .parse::<u64>()
        .map_err(|e| format!("bad offset {offset:?}: {e}"))?;
    let length = length
        .parse::<u64>()
        .map_err(|e| format!("bad length {length:?}: {e}"))?;
    Ok((offset, length))
}

/// Names that would break the line/field structure of the index can't be
/// recorded.
pub fn check_name(name: &str) -> Result<(), &'static str> {
    if name.is_empty() {
        Err("empty name")
    } else if name.contains(DELIMITER) {
        Err("name contains the index delimiter ','")
    } else if name.contains(['\n', '\r']) {
        Err("name contains a line break")
    } else {
        Ok(())
    }
}

/// Check the fixed gzip header at the start of a member.
pub fn check_member_header(data: &[u8]) -> Result<(), &'static str> {
    if data.len() < GZIP_HEADER_SIZE {
        return Err("member shorter than a gzip header");
    }
    if data[0..2] != GZIP_MAGIC {
        return Err("missing gzip signature");
    }
    if data[2] != GZIP_METHOD_DEFLATE {
        return Err("unsupported gzip compression method");
    }
    Ok(())
}

/// Trailer of a gzip member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberInfo {
    pub crc32: u32,
    /// Uncompressed size modulo 2^32
    pub uncompressed_size: u32,
}

impl MemberInfo {
    pub fn from_trailer(data: &[u8]) -> Result<Self, &'static str> {
        if data.len() != GZIP_TRAILER_SIZE {
            return Err("gzip trailer must be 8 bytes");
        }
        let mut cursor = Cursor::new(data);
        let crc32 = cursor
            .read_u32::<LittleEndian>()
            .map_err(|_| "truncated gzip trailer")?;
        let uncompressed_size = cursor
            .read_u32::<LittleEndian>()
            .map_err(|_| "truncated gzip trailer")?;
        Ok(Self {
            crc32,
            uncompressed_size,
        })
    }
}

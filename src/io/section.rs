use std::io::{self, Read};

use super::ReadAt;

/// A `Read` view over `length` bytes of a [`ReadAt`] source starting at
/// `offset`. Reads never reach past `offset + length`, whatever follows in
/// the underlying source.
pub struct SectionReader<'a, R: ReadAt + ?Sized> {
    source: &'a R,
    offset: u64,
    length: u64,
    pos: u64,
}

impl<'a, R: ReadAt + ?Sized> SectionReader<'a, R> {
    pub fn new(source: &'a R, offset: u64, length: u64) -> Self {
        Self {
            source,
            offset,
            length,
            pos: 0,
        }
    }

    /// Bytes of the window not yet read.
    pub fn remaining(&self) -> u64 {
        self.length - self.pos
    }
}

impl<R: ReadAt + ?Sized> Read for SectionReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let want = buf.len().min(usize::try_from(self.remaining()).unwrap_or(usize::MAX));
        if want == 0 {
            return Ok(0);
        }
        let n = self.source.read_at(self.offset + self.pos, &mut buf[..want])?;
        self.pos += n as u64;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_reads_past_the_window() {
        let data = b"aaaaBBBBcccc".to_vec();
        let mut section = SectionReader::new(&data, 4, 4);
        let mut out = Vec::new();
        section.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"BBBB");
        assert_eq!(section.remaining(), 0);
    }

    #[test]
    fn short_source_ends_early() {
        let data = b"abcdef".to_vec();
        let mut section = SectionReader::new(&data, 4, 10);
        let mut out = Vec::new();
        section.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"ef");
        assert_eq!(section.remaining(), 8);
    }
}

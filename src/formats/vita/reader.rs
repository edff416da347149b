//! Bounds-checked little-endian primitives over a record buffer.

use crate::error::{CoreDumpError, Result};

fn span(buf: &[u8], offset: usize, needed: usize) -> Result<&[u8]> {
    offset
        .checked_add(needed)
        .and_then(|end| buf.get(offset..end))
        .ok_or(CoreDumpError::TruncatedRecord {
            offset,
            needed,
            available: buf.len(),
        })
}

/// Read a little-endian u16 at `offset`.
pub fn read_u16(buf: &[u8], offset: usize) -> Result<u16> {
    let b = span(buf, offset, 2)?;
    Ok(u16::from_le_bytes([b[0], b[1]]))
}

/// Read a little-endian u32 at `offset`.
pub fn read_u32(buf: &[u8], offset: usize) -> Result<u32> {
    let b = span(buf, offset, 4)?;
    Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

/// Read a NUL-terminated string starting at `offset`.
///
/// Stops at the first NUL or at the end of `buf`, whichever comes first.
/// Invalid UTF-8 is replaced rather than rejected: kernel names are
/// display-only.
pub fn read_cstring(buf: &[u8], offset: usize) -> Result<String> {
    let tail = span(buf, offset, 1).map(|_| &buf[offset..])?;
    let len = memchr::memchr(0, tail).unwrap_or(tail.len());
    Ok(String::from_utf8_lossy(&tail[..len]).into_owned())
}

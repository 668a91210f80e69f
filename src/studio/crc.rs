//! Content checksum of a studio model, for comparing against an
//! authoritative copy of the asset.
//!
//! This is plain CRC-32 (the zlib/PNG one) over the first `length` bytes of
//! the file, `length` being the size the header declares. It only looks at
//! raw bytes, so it works on files that fail to decode.

use std::io::{Read, Seek};
use crate::errors::Result;
use crate::studio::read::read_stream;
use crate::util::cur::Cur;

/// Offset of the header's `length` field.
const LENGTH_OFFSET: usize = 4 + 4 + 64;

pub fn compute_crc(buf: &[u8]) -> u32 {
    crc32fast::hash(checksum_region(buf))
}

/// Checksums the whole stream from offset 0.
pub fn compute_crc_stream<R: Read + Seek + ?Sized>(source: &mut R) -> Result<u32> {
    let buf = read_stream(source)?;
    Ok(compute_crc(&buf))
}

/// The declared file, or the whole buffer if the length field is missing
/// or nonsense.
fn checksum_region(buf: &[u8]) -> &[u8] {
    match Cur::new(buf).nth::<i32>(LENGTH_OFFSET / 4) {
        Ok(len) if len > 0 => &buf[..(len as usize).min(buf.len())],
        _ => buf,
    }
}

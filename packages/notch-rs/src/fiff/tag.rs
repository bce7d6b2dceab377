//! FIFF tag primitives: kind/type constants, header parsing and scalar
//! decoding from a big-endian byte buffer.

use crate::error::{NotchError, Result};

/// Tag kinds used by this crate.
pub mod kind {
    pub const FILE_ID: i32 = 100;
    pub const DIR_POINTER: i32 = 101;
    pub const BLOCK_START: i32 = 104;
    pub const BLOCK_END: i32 = 105;
    pub const FREE_LIST: i32 = 106;
    pub const NOP: i32 = 108;
    pub const NCHAN: i32 = 200;
    pub const SFREQ: i32 = 201;
    pub const CH_INFO: i32 = 203;
    pub const MEAS_DATE: i32 = 204;
    pub const FIRST_SAMPLE: i32 = 208;
    pub const LOWPASS: i32 = 219;
    pub const HIGHPASS: i32 = 223;
    pub const LINE_FREQ: i32 = 235;
    pub const DATA_BUFFER: i32 = 300;
    pub const DATA_SKIP: i32 = 301;
    pub const MNE_CH_NAME_LIST: i32 = 3507;
}

/// Block kinds.
pub mod block {
    pub const MEAS: i32 = 100;
    pub const MEAS_INFO: i32 = 101;
    pub const RAW_DATA: i32 = 102;
    pub const BAD_CHANNELS: i32 = 359;
    pub const PROCESSING_HISTORY: i32 = 900;
}

/// Tag data types.
pub mod dtype {
    pub const SHORT: i32 = 2;
    pub const INT: i32 = 3;
    pub const FLOAT: i32 = 4;
    pub const DOUBLE: i32 = 5;
    pub const STRING: i32 = 10;
    pub const CH_INFO_STRUCT: i32 = 30;
    pub const ID_STRUCT: i32 = 31;
}

pub const TAG_HEADER_SIZE: usize = 16;

/// A decoded 16-byte tag header.
#[derive(Debug, Clone, Copy)]
pub struct TagHeader {
    pub kind: i32,
    pub dtype: i32,
    pub size: usize,
    pub next: i32,
}

/// Read the tag header at `pos`.
pub fn read_header(buf: &[u8], pos: usize) -> Result<TagHeader> {
    if pos + TAG_HEADER_SIZE > buf.len() {
        return Err(NotchError::FifParse(format!(
            "truncated tag header at offset {}",
            pos
        )));
    }
    let kind = read_i32(buf, pos)?;
    let dtype = read_i32(buf, pos + 4)?;
    let size = read_i32(buf, pos + 8)?;
    let next = read_i32(buf, pos + 12)?;
    if size < 0 {
        return Err(NotchError::FifParse(format!(
            "negative tag size at offset {}",
            pos
        )));
    }
    let size = size as usize;
    if pos + TAG_HEADER_SIZE + size > buf.len() {
        return Err(NotchError::FifParse(format!(
            "tag data runs past end of file at offset {}",
            pos
        )));
    }
    Ok(TagHeader {
        kind,
        dtype,
        size,
        next,
    })
}

pub fn read_i32(buf: &[u8], pos: usize) -> Result<i32> {
    let bytes: [u8; 4] = buf
        .get(pos..pos + 4)
        .ok_or_else(|| truncated(pos))?
        .try_into()
        .map_err(|_| truncated(pos))?;
    Ok(i32::from_be_bytes(bytes))
}

pub fn read_i16(buf: &[u8], pos: usize) -> Result<i16> {
    let bytes: [u8; 2] = buf
        .get(pos..pos + 2)
        .ok_or_else(|| truncated(pos))?
        .try_into()
        .map_err(|_| truncated(pos))?;
    Ok(i16::from_be_bytes(bytes))
}

pub fn read_f32(buf: &[u8], pos: usize) -> Result<f32> {
    let bytes: [u8; 4] = buf
        .get(pos..pos + 4)
        .ok_or_else(|| truncated(pos))?
        .try_into()
        .map_err(|_| truncated(pos))?;
    Ok(f32::from_be_bytes(bytes))
}

pub fn read_f64(buf: &[u8], pos: usize) -> Result<f64> {
    let bytes: [u8; 8] = buf
        .get(pos..pos + 8)
        .ok_or_else(|| truncated(pos))?
        .try_into()
        .map_err(|_| truncated(pos))?;
    Ok(f64::from_be_bytes(bytes))
}

/// Read a string tag payload. FIFF strings are raw Latin-1-ish bytes,
/// optionally NUL-terminated.
pub fn read_string(buf: &[u8], pos: usize, size: usize) -> Result<String> {
    let bytes = buf
        .get(pos..pos + size)
        .ok_or_else(|| truncated(pos))?;
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    Ok(String::from_utf8_lossy(&bytes[..end]).into_owned())
}

fn truncated(pos: usize) -> NotchError {
    NotchError::FifParse(format!("unexpected end of file at offset {}", pos))
}

/// Byte width of one value of a buffer data type, if supported.
pub fn value_width(dtype: i32) -> Option<usize> {
    match dtype {
        dtype::SHORT => Some(2),
        dtype::INT | dtype::FLOAT => Some(4),
        dtype::DOUBLE => Some(8),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_header_roundtrip() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&kind::NCHAN.to_be_bytes());
        buf.extend_from_slice(&dtype::INT.to_be_bytes());
        buf.extend_from_slice(&4i32.to_be_bytes());
        buf.extend_from_slice(&0i32.to_be_bytes());
        buf.extend_from_slice(&306i32.to_be_bytes());

        let header = read_header(&buf, 0).unwrap();
        assert_eq!(header.kind, kind::NCHAN);
        assert_eq!(header.dtype, dtype::INT);
        assert_eq!(header.size, 4);
        assert_eq!(header.next, 0);
        assert_eq!(read_i32(&buf, TAG_HEADER_SIZE).unwrap(), 306);
    }

    #[test]
    fn test_truncated_header_rejected() {
        let buf = vec![0u8; 8];
        assert!(read_header(&buf, 0).is_err());
    }

    #[test]
    fn test_read_string_stops_at_nul() {
        let bytes = b"MEG 0113\0\0\0\0";
        assert_eq!(read_string(bytes, 0, bytes.len()).unwrap(), "MEG 0113");
    }

    #[test]
    fn test_value_width() {
        assert_eq!(value_width(dtype::SHORT), Some(2));
        assert_eq!(value_width(dtype::FLOAT), Some(4));
        assert_eq!(value_width(dtype::DOUBLE), Some(8));
        assert_eq!(value_width(dtype::STRING), None);
    }
}

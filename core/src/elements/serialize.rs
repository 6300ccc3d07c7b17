//! Byte-level encoding of element headers and framing items.
//!
//! The writers here mirror the parse grammar exactly: explicit VR headers
//! are 8 or 12 bytes depending on the representation, implicit VR headers
//! are always 8 bytes, and item and delimitation headers never carry a
//! value representation.

use crate::bytes;
use crate::dictionary::tags;
use crate::header::{Length, Tag, VR};

/// The number of preamble bytes before the magic code.
pub const PREAMBLE_LENGTH: usize = 128;

/// The magic code identifying a DICOM file after the preamble.
pub const MAGIC: &[u8; 4] = b"DICM";

/// Encode a data element header. Item and delimitation headers are
/// written by passing `None` for the value representation.
pub fn header_bytes(
    tag: Tag,
    vr: Option<VR>,
    length: u32,
    big_endian: bool,
    explicit_vr: bool,
) -> Vec<u8> {
    let mut out = Vec::with_capacity(12);
    bytes::put_tag(&mut out, tag, big_endian);
    match vr {
        Some(vr) if explicit_vr => {
            out.extend_from_slice(&vr.to_bytes());
            if vr.is_long_header() {
                out.extend_from_slice(&[0, 0]);
                bytes::put_u32(&mut out, length, big_endian);
            } else {
                bytes::put_u16(&mut out, length as u16, big_endian);
            }
        }
        _ => bytes::put_u32(&mut out, length, big_endian),
    }
    out
}

/// Encode an item header with the given content length.
pub fn item_bytes(length: Length, big_endian: bool) -> Vec<u8> {
    header_bytes(tags::ITEM, None, length.0, big_endian, false)
}

/// Encode an item delimitation header.
pub fn item_delimitation_bytes(big_endian: bool) -> Vec<u8> {
    header_bytes(tags::ITEM_DELIMITATION_ITEM, None, 0, big_endian, false)
}

/// Encode a sequence delimitation header.
pub fn sequence_delimitation_bytes(big_endian: bool) -> Vec<u8> {
    header_bytes(tags::SEQUENCE_DELIMITATION_ITEM, None, 0, big_endian, false)
}

/// Encode the 132-byte file preamble: 128 zero bytes and the magic code.
pub fn preamble_bytes() -> Vec<u8> {
    let mut out = vec![0u8; PREAMBLE_LENGTH];
    out.extend_from_slice(MAGIC);
    out
}

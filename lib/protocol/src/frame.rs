//! Packet framing: `version(u8) | type(u16 BE) | payload_len(u32 BE) | payload`.
//!
//! Mirrors the header/category split of the original channel framing, minus the
//! encryption and control-frame categories that no longer apply once the wire is
//! plaintext.

use byteorder::{BigEndian, ReadBytesExt};
use std::io;

pub const PROTOCOL_VERSION: u8 = 1;
pub const HEADER_LEN: usize = 1 + 2 + 4;

/// Frames larger than this are treated as a framing fault rather than parsed.
pub const MAX_PAYLOAD_LEN: u32 = 16 * 1024 * 1024;

#[derive(Debug, Eq, PartialEq)]
pub struct FrameHeader {
    pub version: u8,
    pub packet_type: u16,
    pub payload_len: u32,
}

impl FrameHeader {
    #[inline]
    pub fn read(mut buf: &[u8]) -> io::Result<FrameHeader> {
        debug_assert!(buf.len() >= HEADER_LEN);
        let version = buf.read_u8()?;
        let packet_type = buf.read_u16::<BigEndian>()?;
        let payload_len = buf.read_u32::<BigEndian>()?;
        Ok(FrameHeader {
            version,
            packet_type,
            payload_len,
        })
    }
}

/// Outcome of attempting to decode one frame out of a recv buffer.
#[derive(Debug, Eq, PartialEq)]
pub enum ReadOutcome {
    /// Not enough bytes buffered yet for a whole frame.
    NeedMore,
    /// The header claims an oversize payload; a genuine framing fault. The
    /// caller should close the connection.
    Bad,
    /// A version mismatch on an otherwise well-formed header. Tolerated as
    /// transient corruption: the caller skips just the `HEADER_LEN` bytes
    /// and keeps the connection open, not the (unknown-length) payload.
    BadVersion { consumed: usize },
    /// A complete frame was found. `consumed` is the total byte count
    /// (header + payload) the caller should advance its cursor by.
    Ok {
        packet_type: u16,
        payload_start: usize,
        payload_end: usize,
        consumed: usize,
    },
}

/// Attempts to decode exactly one frame starting at the front of `buf`.
///
/// Never mutates `buf`; the caller is responsible for advancing its own
/// cursor by `consumed` bytes once it has finished using the payload slice.
#[inline]
pub fn try_decode_one(buf: &[u8]) -> ReadOutcome {
    if buf.len() < HEADER_LEN {
        return ReadOutcome::NeedMore;
    }

    let header = match FrameHeader::read(buf) {
        Ok(h) => h,
        Err(_) => return ReadOutcome::Bad,
    };

    if header.payload_len > MAX_PAYLOAD_LEN {
        return ReadOutcome::Bad;
    }
    if header.version != PROTOCOL_VERSION {
        return ReadOutcome::BadVersion { consumed: HEADER_LEN };
    }

    let payload_len = header.payload_len as usize;
    let total = HEADER_LEN + payload_len;
    if buf.len() < total {
        return ReadOutcome::NeedMore;
    }

    ReadOutcome::Ok {
        packet_type: header.packet_type,
        payload_start: HEADER_LEN,
        payload_end: total,
        consumed: total,
    }
}

/// Encodes a header + payload into a fresh buffer.
#[inline]
pub fn encode(packet_type: u16, payload: &[u8]) -> Vec<u8> {
    use byteorder::WriteBytesExt;

    let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
    out.write_u8(PROTOCOL_VERSION).unwrap();
    out.write_u16::<BigEndian>(packet_type).unwrap();
    out.write_u32::<BigEndian>(payload.len() as u32).unwrap();
    out.extend_from_slice(payload);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_exact_frame() {
        let bytes = encode(0x0103, b"hello");
        match try_decode_one(&bytes) {
            ReadOutcome::Ok {
                packet_type,
                payload_start,
                payload_end,
                consumed,
            } => {
                assert_eq!(packet_type, 0x0103);
                assert_eq!(&bytes[payload_start..payload_end], b"hello");
                assert_eq!(consumed, bytes.len());
            }
            other => panic!("expected Ok, got {:?}", other),
        }
    }

    #[test]
    fn needs_more_on_partial_header() {
        let bytes = encode(0x0103, b"hello");
        assert_eq!(try_decode_one(&bytes[..3]), ReadOutcome::NeedMore);
    }

    #[test]
    fn needs_more_on_partial_payload() {
        let bytes = encode(0x0103, b"hello");
        assert_eq!(
            try_decode_one(&bytes[..HEADER_LEN + 2]),
            ReadOutcome::NeedMore
        );
    }

    #[test]
    fn wrong_version_skips_header_without_closing() {
        let mut bytes = encode(0x0103, b"hello");
        bytes[0] = 9;
        assert_eq!(try_decode_one(&bytes), ReadOutcome::BadVersion { consumed: HEADER_LEN });
    }

    #[test]
    fn bad_on_oversize_payload_claim() {
        let mut bytes = encode(0x0103, b"hello");
        bytes[3] = 0xFF;
        bytes[4] = 0xFF;
        bytes[5] = 0xFF;
        bytes[6] = 0xFF;
        assert_eq!(try_decode_one(&bytes), ReadOutcome::Bad);
    }
}

//! Frame encoding and decoding for the CZS6147 wire protocol.
//!
//! Every message in either direction is one frame:
//!
//! ```text
//! [ HEAD | LEN | ADDR | CMD | DATA[0..n] | CHECKSUM ]
//! ```
//!
//! `HEAD` is always 0xA0. `LEN` counts everything from the address byte
//! onward (address + command + data + checksum = 3 + n). The checksum is the
//! two's complement of the byte sum of everything before it.

use crate::types::{RfidError, bytes_to_hex};

/// Head marker of every frame.
pub const HEAD: u8 = 0xA0;

/// Smallest possible frame: head, length, address, command, checksum.
pub const MIN_FRAME_LEN: usize = 5;

/// One parsed wire frame. Transient: built fresh per request and per parsed
/// response, never held across calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub address: u8,
    pub opcode: u8,
    pub data: Vec<u8>,
}

impl Packet {
    /// Build a request frame from integer parameters, each encoded as the
    /// minimal number of big-endian bytes holding its magnitude.
    pub fn new(address: u8, opcode: u8, params: &[u32]) -> Self {
        let mut data = Vec::with_capacity(params.len());
        for &p in params {
            data.extend_from_slice(&int_to_min_bytes(p));
        }
        Self {
            address,
            opcode,
            data,
        }
    }

    /// Build a frame around an already-encoded data section.
    pub fn with_data(address: u8, opcode: u8, data: Vec<u8>) -> Self {
        Self {
            address,
            opcode,
            data,
        }
    }

    /// Serialize to the full checksummed wire frame.
    pub fn to_bytes(&self) -> Vec<u8> {
        let len = (3 + self.data.len()) as u8;
        let mut frame = Vec::with_capacity(MIN_FRAME_LEN + self.data.len());
        frame.push(HEAD);
        frame.push(len);
        frame.push(self.address);
        frame.push(self.opcode);
        frame.extend_from_slice(&self.data);
        frame.push(checksum(&frame));
        frame
    }

    /// Parse and validate a single candidate frame.
    ///
    /// The checksum is recomputed over all bytes before the trailing byte and
    /// compared against it; a mismatch is never silently accepted.
    pub fn decode(frame: &[u8]) -> Result<Self, RfidError> {
        if frame.len() < MIN_FRAME_LEN {
            return Err(RfidError::MalformedFrame(format!(
                "frame too short ({} bytes): {}",
                frame.len(),
                bytes_to_hex(frame)
            )));
        }
        if frame[0] != HEAD {
            return Err(RfidError::MalformedFrame(format!(
                "missing head marker: {}",
                bytes_to_hex(frame)
            )));
        }
        let declared = frame[1] as usize;
        if declared != frame.len() - 2 {
            return Err(RfidError::MalformedFrame(format!(
                "length byte {} inconsistent with frame of {} bytes",
                declared,
                frame.len()
            )));
        }
        let computed = checksum(&frame[..frame.len() - 1]);
        let received = frame[frame.len() - 1];
        if computed != received {
            return Err(RfidError::ChecksumMismatch { computed, received });
        }
        Ok(Self {
            address: frame[2],
            opcode: frame[3],
            data: frame[4..frame.len() - 1].to_vec(),
        })
    }
}

/// Two's-complement 8-bit checksum over `bytes`.
pub fn checksum(bytes: &[u8]) -> u8 {
    let sum = bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
    (sum ^ 0xFF).wrapping_add(1)
}

/// Minimal big-endian encoding of an integer: 0-255 take one byte,
/// 256-65535 two, and so on. Zero still takes one byte.
pub fn int_to_min_bytes(value: u32) -> Vec<u8> {
    let needed = ((32 - value.leading_zeros() as usize) + 7) / 8;
    let needed = needed.max(1);
    value.to_be_bytes()[4 - needed..].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_int_widths() {
        assert_eq!(int_to_min_bytes(0), vec![0x00]);
        assert_eq!(int_to_min_bytes(0xFF), vec![0xFF]);
        assert_eq!(int_to_min_bytes(0x100), vec![0x01, 0x00]);
        assert_eq!(int_to_min_bytes(0xFFFF), vec![0xFF, 0xFF]);
        assert_eq!(int_to_min_bytes(0x10000), vec![0x01, 0x00, 0x00]);
        assert_eq!(int_to_min_bytes(865000), vec![0x0D, 0x32, 0xE8]);
        assert_eq!(int_to_min_bytes(0xFFFFFF), vec![0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn test_reset_frame_bytes() {
        let frame = Packet::new(0x01, 0x70, &[]).to_bytes();
        assert_eq!(frame, [0xA0, 0x03, 0x01, 0x70, 0xEC]);
    }

    #[test]
    fn test_length_counts_data() {
        let frame = Packet::new(0x01, 0x78, &[4, 50, 10, 865_000]).to_bytes();
        // 1 + 1 + 1 + 3 data bytes
        assert_eq!(frame[1] as usize, 3 + 6);
        assert_eq!(frame.len(), 2 + frame[1] as usize);
    }

    #[test]
    fn test_decode_recovers_fields() {
        let packet = Packet::decode(&[0xA0, 0x03, 0x01, 0x70, 0xEC]).unwrap();
        assert_eq!(packet.address, 0x01);
        assert_eq!(packet.opcode, 0x70);
        assert!(packet.data.is_empty());
    }

    #[test]
    fn test_decode_rejects_short_frame() {
        assert!(matches!(
            Packet::decode(&[0xA0, 0x03, 0x01]),
            Err(RfidError::MalformedFrame(_))
        ));
    }

    #[test]
    fn test_decode_rejects_inconsistent_length() {
        // Length byte claims one data byte that is not there.
        assert!(matches!(
            Packet::decode(&[0xA0, 0x04, 0x01, 0x70, 0xEC]),
            Err(RfidError::MalformedFrame(_))
        ));
    }

    #[test]
    fn test_decode_rejects_bad_checksum() {
        let err = Packet::decode(&[0xA0, 0x03, 0x01, 0x70, 0xED]).unwrap_err();
        assert!(matches!(
            err,
            RfidError::ChecksumMismatch {
                computed: 0xEC,
                received: 0xED
            }
        ));
    }
}

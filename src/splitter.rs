//! Splits one raw transport read into individual validated frames.
//!
//! The reader frequently answers with several frames back to back: an
//! inventory round returns one frame per tag sighting followed by a summary
//! frame, all delivered in whatever chunks the serial layer hands us. The
//! splitter locates head markers, carves the buffer into candidates, and
//! validates each independently.

use crate::packet::{HEAD, Packet};
use crate::types::RfidError;

/// Split `buffer` into candidate frames and decode each one.
///
/// Candidates start at every 0xA0 byte and run to the byte before the next
/// 0xA0, or to the end of the buffer. Bytes ahead of the first marker are
/// noise left over from a previous exchange and are discarded. A checksum or
/// framing failure marks only that candidate invalid; siblings still decode,
/// so one corrupted tag report never costs the rest of the batch. Order of
/// arrival is preserved.
pub fn split(buffer: &[u8]) -> Vec<Result<Packet, RfidError>> {
    let starts: Vec<usize> = buffer
        .iter()
        .enumerate()
        .filter_map(|(i, &b)| (b == HEAD).then_some(i))
        .collect();

    let mut frames = Vec::with_capacity(starts.len());
    for (n, &start) in starts.iter().enumerate() {
        let end = starts.get(n + 1).copied().unwrap_or(buffer.len());
        frames.push(Packet::decode(&buffer[start..end]));
    }
    frames
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACK_BODY: [u8; 5] = [0xA0, 0x04, 0x01, 0x76, 0x10]; // sans checksum

    fn valid_frame() -> Vec<u8> {
        let mut f = ACK_BODY.to_vec();
        f.push(crate::packet::checksum(&f));
        f
    }

    #[test]
    fn test_empty_buffer_yields_nothing() {
        assert!(split(&[]).is_empty());
    }

    #[test]
    fn test_single_frame() {
        let frames = split(&valid_frame());
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].as_ref().unwrap().opcode, 0x76);
    }

    #[test]
    fn test_concatenated_frames_keep_order() {
        let mut buffer = valid_frame();
        buffer.extend_from_slice(&[0xA0, 0x03, 0x01, 0x70, 0xEC]);
        let frames = split(&buffer);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].as_ref().unwrap().opcode, 0x76);
        assert_eq!(frames[1].as_ref().unwrap().opcode, 0x70);
    }

    #[test]
    fn test_leading_noise_is_discarded() {
        let mut buffer = vec![0x00, 0x12, 0xFF];
        buffer.extend_from_slice(&valid_frame());
        let frames = split(&buffer);
        assert_eq!(frames.len(), 1);
        assert!(frames[0].is_ok());
    }

    #[test]
    fn test_corrupt_frame_does_not_take_siblings() {
        let mut buffer = valid_frame();
        let tail = buffer.len() - 1;
        buffer[tail] ^= 0x01; // break the first frame's checksum
        buffer.extend_from_slice(&[0xA0, 0x03, 0x01, 0x70, 0xEC]);
        let frames = split(&buffer);
        assert_eq!(frames.len(), 2);
        assert!(matches!(
            frames[0],
            Err(RfidError::ChecksumMismatch { .. })
        ));
        assert_eq!(frames[1].as_ref().unwrap().opcode, 0x70);
    }
}

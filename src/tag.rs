//! Decoders for the tag-bearing response shapes: inventory streams and
//! tag memory reads.

use log::warn;

use crate::command::ResponseKind;
use crate::packet::Packet;
use crate::tables::{frequency_mhz, rssi_dbm, status_error};
use crate::types::{
    InventoryBatch, InventorySummary, MemoryReadRecord, RfidError, TagRecord, bytes_to_hex,
};

/// Split a packed frequency/antenna byte: high six bits are the channel
/// index, low two bits the antenna port.
fn split_freq_ant(byte: u8) -> (u8, u8) {
    (byte >> 2, byte & 0x03)
}

/// Decode one tag sighting frame.
///
/// Data layout: `[freqAnt][PC;2][EPC;n][RSSI]`. The EPC length is implied by
/// the frame: everything between the PC word and the RSSI byte.
pub fn decode_tag(packet: &Packet) -> Result<TagRecord, RfidError> {
    let data = &packet.data;
    if data.len() < 5 {
        return Err(RfidError::MalformedFrame(format!(
            "tag frame carries {} data byte(s), expected at least 5: {}",
            data.len(),
            bytes_to_hex(data)
        )));
    }
    let (channel, antenna_id) = split_freq_ant(data[0]);
    let rssi_code = data[data.len() - 1];
    Ok(TagRecord {
        antenna_id,
        frequency_mhz: frequency_mhz(channel)?,
        pc: [data[1], data[2]],
        epc: data[3..data.len() - 1].to_vec(),
        rssi_dbm: rssi_dbm(rssi_code)?,
    })
}

/// Decode the summary frame that terminates an inventory batch.
///
/// Data layout: `[antenna][readRate;2][totalRead;4]`, with a trailing
/// `[tagCount;2]` only on the duration-bounded inventory variant.
pub fn decode_summary(packet: &Packet, has_tag_count: bool) -> Result<InventorySummary, RfidError> {
    let data = &packet.data;
    let expected = if has_tag_count { 9 } else { 7 };
    if data.len() != expected {
        return Err(RfidError::MalformedFrame(format!(
            "inventory summary carries {} data byte(s), expected {}: {}",
            data.len(),
            expected,
            bytes_to_hex(data)
        )));
    }
    Ok(InventorySummary {
        antenna_id: data[0],
        read_rate: u16::from_be_bytes([data[1], data[2]]),
        total_read: u32::from_be_bytes([data[3], data[4], data[5], data[6]]),
        tag_count: has_tag_count.then(|| u16::from_be_bytes([data[7], data[8]])),
    })
}

/// Decode a full inventory exchange from the already-split frame list.
///
/// The last intact frame is the round summary; every intact frame before it
/// is a tag sighting. Frames that failed framing or checksum validation are
/// logged and skipped, so one corrupted sighting never discards the batch.
/// A single one-byte frame is the device reporting a status failure for the
/// whole round.
pub fn decode_batch(
    frames: &[Result<Packet, RfidError>],
    has_tag_count: bool,
) -> Result<InventoryBatch, RfidError> {
    let mut intact: Vec<&Packet> = Vec::with_capacity(frames.len());
    for frame in frames {
        match frame {
            Ok(packet) => intact.push(packet),
            Err(e) => warn!("dropping corrupted inventory frame: {}", e),
        }
    }
    let summary_frame = intact.pop().ok_or(RfidError::NoResponse)?;
    if summary_frame.data.len() == 1 && intact.is_empty() {
        return Err(status_error(summary_frame.data[0]));
    }
    let summary = decode_summary(summary_frame, has_tag_count)?;
    let mut tags = Vec::with_capacity(intact.len());
    for packet in intact {
        match decode_tag(packet) {
            Ok(tag) => tags.push(tag),
            Err(e) => warn!("dropping undecodable tag frame: {}", e),
        }
    }
    Ok(InventoryBatch { tags, summary })
}

/// Decode the reply to a tag memory read.
///
/// Data layout:
/// `[tagCount;2][dataLen][data;dataLen][readLen][freqAnt][readCount]` where
/// `data` itself is `[PC;2][EPC;12][CRC;2][payload...]`. A one-byte data
/// section is the device reporting a status failure instead.
pub fn decode_memory_read(packet: &Packet) -> Result<MemoryReadRecord, RfidError> {
    let data = &packet.data;
    if data.len() == 1 {
        return Err(status_error(data[0]));
    }
    if data.len() < 3 {
        return Err(RfidError::MalformedFrame(format!(
            "memory read response carries {} data byte(s): {}",
            data.len(),
            bytes_to_hex(data)
        )));
    }
    let tag_count = u16::from_be_bytes([data[0], data[1]]);
    let data_len = data[2] as usize;
    if data_len < 16 || data.len() != 3 + data_len + 3 {
        return Err(RfidError::MalformedFrame(format!(
            "memory read data length byte {} inconsistent with {} data byte(s)",
            data_len,
            data.len()
        )));
    }
    let section = &data[3..3 + data_len];
    let (channel, antenna_id) = split_freq_ant(data[3 + data_len + 1]);
    Ok(MemoryReadRecord {
        tag_count,
        antenna_id,
        frequency_mhz: frequency_mhz(channel)?,
        read_count: data[3 + data_len + 2],
        pc: [section[0], section[1]],
        epc: section[2..14].to_vec(),
        crc: [section[14], section[15]],
        payload: section[16..].to_vec(),
    })
}

/// Pick the right decoder for a tag-bearing response kind, as named by a
/// command descriptor.
pub fn summary_has_tag_count(kind: ResponseKind) -> Option<bool> {
    match kind {
        ResponseKind::TagStream {
            summary_has_tag_count,
        } => Some(summary_has_tag_count),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::splitter::split;

    const TAG_FRAME: [u8; 21] = [
        0xA0, 0x13, 0x01, 0x89, 0x0C, 0x30, 0x00, 0xE2, 0x00, 0x00, 0x15, 0x24, 0x02, 0x02, 0x19,
        0x15, 0x20, 0x7F, 0x39, 0x52, 0x10,
    ];
    const SUMMARY_RT: [u8; 12] = [
        0xA0, 0x0A, 0x01, 0x89, 0x00, 0x00, 0x14, 0x00, 0x00, 0x00, 0x0D, 0xAB,
    ];
    const SUMMARY_BOUNDED: [u8; 14] = [
        0xA0, 0x0C, 0x01, 0x80, 0x00, 0x00, 0x14, 0x00, 0x00, 0x00, 0x0D, 0x00, 0x02, 0xB0,
    ];

    #[test]
    fn test_decode_tag_fields() {
        let packet = Packet::decode(&TAG_FRAME).unwrap();
        let tag = decode_tag(&packet).unwrap();
        assert_eq!(tag.antenna_id, 0);
        assert_eq!(tag.frequency_mhz, 866.5);
        assert_eq!(tag.pc, [0x30, 0x00]);
        assert_eq!(tag.epc_hex(), "E20000152402021915207F39");
        assert_eq!(tag.rssi_dbm, -48);
    }

    #[test]
    fn test_freq_ant_split() {
        // channel 34, antenna 2
        assert_eq!(split_freq_ant(0x8A), (34, 2));
    }

    #[test]
    fn test_decode_summary_realtime_has_no_tag_count() {
        let packet = Packet::decode(&SUMMARY_RT).unwrap();
        let summary = decode_summary(&packet, false).unwrap();
        assert_eq!(summary.antenna_id, 0);
        assert_eq!(summary.read_rate, 20);
        assert_eq!(summary.total_read, 13);
        assert_eq!(summary.tag_count, None);
    }

    #[test]
    fn test_decode_summary_bounded_reports_tag_count() {
        let packet = Packet::decode(&SUMMARY_BOUNDED).unwrap();
        let summary = decode_summary(&packet, true).unwrap();
        assert_eq!(summary.tag_count, Some(2));
    }

    #[test]
    fn test_decode_batch_orders_tags_before_summary() {
        let mut buffer = TAG_FRAME.to_vec();
        buffer.extend_from_slice(&SUMMARY_RT);
        let batch = decode_batch(&split(&buffer), false).unwrap();
        assert_eq!(batch.tags.len(), 1);
        assert_eq!(batch.summary.total_read, 13);
    }

    #[test]
    fn test_decode_batch_survives_one_corrupt_frame() {
        let mut corrupt = TAG_FRAME.to_vec();
        corrupt[10] ^= 0xFF;
        let mut buffer = corrupt;
        buffer.extend_from_slice(&TAG_FRAME);
        buffer.extend_from_slice(&SUMMARY_RT);
        let batch = decode_batch(&split(&buffer), false).unwrap();
        assert_eq!(batch.tags.len(), 1);
        assert_eq!(batch.summary.read_rate, 20);
    }

    #[test]
    fn test_decode_batch_reports_device_status() {
        // inventory error: single status frame, no summary shape
        let frame = Packet::with_data(0x01, 0x89, vec![0x31]).to_bytes();
        let err = decode_batch(&split(&frame), false).unwrap_err();
        assert!(matches!(err, RfidError::DeviceStatus { code: 0x31, .. }));
    }

    #[test]
    fn test_decode_batch_empty_is_no_response() {
        assert!(matches!(
            decode_batch(&[], false),
            Err(RfidError::NoResponse)
        ));
    }

    #[test]
    fn test_decode_memory_read_record() {
        let frame: [u8; 31] = [
            0xA0, 0x1D, 0x01, 0x81, 0x00, 0x01, 0x14, 0x30, 0x00, 0xE2, 0x00, 0x00, 0x19, 0x11,
            0x05, 0x01, 0x07, 0x11, 0x10, 0x51, 0x25, 0xC5, 0xA9, 0xDE, 0xAD, 0xBE, 0xEF, 0x02,
            0x14, 0x01, 0x0F,
        ];
        let packet = Packet::decode(&frame).unwrap();
        let record = decode_memory_read(&packet).unwrap();
        assert_eq!(record.tag_count, 1);
        assert_eq!(record.pc, [0x30, 0x00]);
        assert_eq!(record.epc.len(), 12);
        assert_eq!(record.crc, [0xC5, 0xA9]);
        assert_eq!(record.payload, [0xDE, 0xAD, 0xBE, 0xEF]);
        assert_eq!(record.antenna_id, 0);
        assert_eq!(record.frequency_mhz, 867.5);
        assert_eq!(record.read_count, 1);
    }

    #[test]
    fn test_decode_memory_read_status_failure() {
        let frame: [u8; 6] = [0xA0, 0x04, 0x01, 0x81, 0x32, 0xA8];
        let packet = Packet::decode(&frame).unwrap();
        let err = decode_memory_read(&packet).unwrap_err();
        assert!(matches!(err, RfidError::DeviceStatus { code: 0x32, .. }));
    }
}

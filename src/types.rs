//! Value types produced by the protocol decoders, and the crate error type.

/// Errors that can occur while building commands, talking to the reader, or
/// decoding its responses.
#[derive(Debug, thiserror::Error)]
pub enum RfidError {
    /// Transport layer error (serial port, UART, etc.)
    #[error("transport error: {0}")]
    Transport(String),
    /// A parameter is outside its documented range. Raised before any I/O.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    /// The logical command name is not registered. Raised before any I/O.
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    /// A frame's trailing byte does not match the recomputed checksum.
    #[error("checksum mismatch: computed {computed:#04X}, received {received:#04X}")]
    ChecksumMismatch { computed: u8, received: u8 },
    /// Frame shorter than the minimum, or the length byte disagrees with the
    /// actual frame size.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),
    /// The device answered with a recognized non-success status code.
    #[error("device status {code:#04X} ({name}): {message}")]
    DeviceStatus {
        code: u8,
        name: &'static str,
        message: &'static str,
    },
    /// No bytes arrived within the read window.
    #[error("no response from reader within the read window")]
    NoResponse,
    /// An RSSI code or frequency channel index falls outside its table.
    #[error("value {value} outside the {table} table domain")]
    UnmappedValue { table: &'static str, value: u8 },
}

/// One tag sighting from an inventory round.
#[derive(Debug, Clone)]
pub struct TagRecord {
    /// Antenna port (0-3) that identified the tag.
    pub antenna_id: u8,
    /// RF channel center frequency in MHz, resolved from the 6-bit channel index.
    pub frequency_mhz: f32,
    /// Protocol Control word.
    pub pc: [u8; 2],
    /// Electronic Product Code, variable length.
    pub epc: Vec<u8>,
    /// Signal strength in dBm, resolved from the raw device code.
    pub rssi_dbm: i8,
}

impl PartialEq for TagRecord {
    fn eq(&self, other: &Self) -> bool {
        self.epc == other.epc
    }
}

impl TagRecord {
    /// EPC as an uppercase hex string.
    pub fn epc_hex(&self) -> String {
        bytes_to_hex(&self.epc)
    }
}

/// Round statistics, sent as the last frame of an inventory response batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventorySummary {
    /// Antenna port of this inventory round.
    pub antenna_id: u8,
    /// Tag read rate of the round, tags/second.
    pub read_rate: u16,
    /// Total identification count, duplicates included.
    pub total_read: u32,
    /// Distinct tag count. Only the duration-bounded inventory reports this;
    /// the real-time variant leaves it `None`.
    pub tag_count: Option<u16>,
}

/// Decoded result of one inventory exchange: tag sightings plus the trailing
/// summary frame.
#[derive(Debug, Clone)]
pub struct InventoryBatch {
    pub tags: Vec<TagRecord>,
    pub summary: InventorySummary,
}

/// Decoded reply to the read-memory command.
#[derive(Debug, Clone)]
pub struct MemoryReadRecord {
    pub tag_count: u16,
    pub antenna_id: u8,
    pub frequency_mhz: f32,
    pub read_count: u8,
    pub pc: [u8; 2],
    pub epc: Vec<u8>,
    pub crc: [u8; 2],
    /// Memory words past the PC/EPC/CRC prefix.
    pub payload: Vec<u8>,
}

/// Current frequency configuration reported by the reader.
#[derive(Debug, Clone, PartialEq)]
pub enum FrequencyRegion {
    /// One of the fixed regulatory bands (1 FCC, 2 ETSI, 3 CHN) with a
    /// start/end channel index window into the 60-entry channel table.
    Band {
        region: u8,
        start_channel: u8,
        end_channel: u8,
    },
    /// User-defined spectrum plan.
    UserDefined {
        /// Channel spacing in units of 10 kHz.
        space: u8,
        /// Number of channels.
        quantity: u8,
        /// Start frequency in kHz.
        start_khz: u32,
    },
}

/// Convert bytes to uppercase hex string
pub(crate) fn bytes_to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02X}", b)).collect()
}

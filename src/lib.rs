//! Driver for IND903/CZS6147 UHF RFID reader controllers.
//!
//! Talks the controller's half-duplex binary protocol over any byte
//! transport: every exchange writes one `0xA0`-framed request, waits out the
//! command's settle window, then splits and validates the reply frames.
//! Commands are table-driven; parameter ranges are checked before any I/O
//! and reply checksums are always recomputed and compared.
//!
//! # Features
//!
//! - `serial` - Serial port transport for desktop using serialport crate
//!
//! # Example
//!
//! ```ignore
//! use czs6147::{Reader, SerialTransport};
//!
//! let transport = SerialTransport::new("/dev/ttyUSB0", 115200)?;
//! let mut reader = Reader::new(transport, 0x01);
//!
//! reader.set_output_power(26)?;
//! let batch = reader.rt_inventory(10)?;
//! for tag in &batch.tags {
//!     println!("{} @ {} dBm", tag.epc_hex(), tag.rssi_dbm);
//! }
//! ```

mod command;
mod packet;
mod reader;
mod splitter;
mod tables;
mod tag;
mod transport;
mod types;

#[cfg(feature = "serial")]
mod serial;

// Re-exports
pub use command::{
    CommandDescriptor, CommandRegistry, CommandResponse, ParamSpec, ResponseKind, SettlePolicy,
};
pub use packet::{Packet, checksum};
pub use reader::Reader;
pub use splitter::split;
pub use tables::{frequency_mhz, rssi_dbm, status_detail};
pub use transport::RfidTransport;
pub use types::{
    FrequencyRegion, InventoryBatch, InventorySummary, MemoryReadRecord, RfidError, TagRecord,
};

#[cfg(feature = "serial")]
pub use serial::SerialTransport;

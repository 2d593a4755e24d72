//! Half-duplex session driver.
//!
//! [`Reader`] owns its transport exclusively and runs one exchange at a time:
//! clear stale input, write the request frame, sleep for the command's settle
//! window, then drain whatever reply bytes arrive and hand them to the
//! splitter. The link never carries unsolicited traffic, so every byte read
//! belongs to the command just written.

use log::{debug, error};
use std::time::{Duration, Instant};

use crate::command::{CommandRegistry, CommandResponse, decode_simple};
use crate::packet::Packet;
use crate::splitter::split;
use crate::tag::{decode_batch, decode_memory_read, summary_has_tag_count};
use crate::transport::RfidTransport;
use crate::types::{
    FrequencyRegion, InventoryBatch, MemoryReadRecord, RfidError, bytes_to_hex,
};

/// Per-chunk read window while draining a reply.
const CHUNK_TIMEOUT_MS: u32 = 100;
/// Give up waiting for the first reply byte after this long past the settle
/// window.
const MAX_SILENT_WAIT: Duration = Duration::from_secs(1);

pub struct Reader<T: RfidTransport> {
    transport: T,
    registry: CommandRegistry,
    address: u8,
}

impl<T: RfidTransport> Reader<T> {
    /// Wrap `transport`, addressing the reader at `address` (factory default
    /// is 0x01; 0xFF broadcasts).
    pub fn new(transport: T, address: u8) -> Self {
        Self {
            transport,
            registry: CommandRegistry::standard(),
            address,
        }
    }

    /// Address used on every outgoing frame.
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Mutable access to the command table, for registering vendor commands.
    pub fn registry_mut(&mut self) -> &mut CommandRegistry {
        &mut self.registry
    }

    /// Give the transport back, e.g. to reopen it at a new baud rate.
    pub fn into_transport(self) -> T {
        self.transport
    }

    fn transport_err(e: T::Error) -> RfidError {
        RfidError::Transport(format!("{:?}", e))
    }

    /// One full request/response exchange, returning the split (but not yet
    /// interpreted) reply frames.
    fn exchange(
        &mut self,
        name: &str,
        args: &[u32],
    ) -> Result<Vec<Result<Packet, RfidError>>, RfidError> {
        let frame = self.registry.build(name, self.address, args)?;
        let settle = self.registry.get(name)?.settle.delay(args);

        self.transport
            .clear_input()
            .map_err(Self::transport_err)?;
        debug!("{} -> {}", name, bytes_to_hex(&frame));
        self.transport
            .write(&frame)
            .map_err(Self::transport_err)?;
        std::thread::sleep(settle);

        let mut buffer = Vec::new();
        let started = Instant::now();
        loop {
            let mut chunk = [0u8; 256];
            match self.transport.read(&mut chunk, CHUNK_TIMEOUT_MS) {
                Ok(n) if n > 0 => {
                    buffer.extend_from_slice(&chunk[..n]);
                    if self
                        .transport
                        .bytes_available()
                        .map_err(Self::transport_err)?
                        == 0
                    {
                        break;
                    }
                }
                Ok(_) => {
                    // quiet window: done if we have a reply, give up after
                    // the silence budget otherwise
                    if !buffer.is_empty() || started.elapsed() >= MAX_SILENT_WAIT {
                        break;
                    }
                }
                Err(e) => {
                    error!("read failed after {}: {:?}", name, e);
                    return Err(Self::transport_err(e));
                }
            }
        }
        debug!("{} <- {} byte(s): {}", name, buffer.len(), bytes_to_hex(&buffer));
        Ok(split(&buffer))
    }

    /// Run a fixed-shape command and decode its single reply frame.
    ///
    /// This is also the escape hatch for descriptors registered through
    /// [`Reader::registry_mut`].
    pub fn execute(&mut self, name: &str, args: &[u32]) -> Result<CommandResponse, RfidError> {
        let descriptor = *self.registry.get(name)?;
        let frames = self.exchange(name, args)?;
        let mut first_err = None;
        for frame in frames {
            match frame {
                Ok(packet) => return decode_simple(&descriptor, &packet),
                Err(e) => first_err = first_err.or(Some(e)),
            }
        }
        Err(first_err.unwrap_or(RfidError::NoResponse))
    }

    fn unexpected(name: &str, response: CommandResponse) -> RfidError {
        RfidError::MalformedFrame(format!("{} produced unexpected reply {:?}", name, response))
    }

    /// Reboot the controller. The device drops the link while restarting and
    /// often never acks, so an empty reply counts as success.
    pub fn reset(&mut self) -> Result<(), RfidError> {
        let descriptor = *self.registry.get("reset")?;
        let frames = self.exchange("reset", &[])?;
        match frames.into_iter().find_map(|frame| frame.ok()) {
            Some(packet) => decode_simple(&descriptor, &packet).map(|_| ()),
            None => Ok(()),
        }
    }

    /// Firmware version as (major, minor).
    pub fn firmware_version(&mut self) -> Result<(u8, u8), RfidError> {
        match self.execute("get-firmware-version", &[])? {
            CommandResponse::Version { major, minor } => Ok((major, minor)),
            other => Err(Self::unexpected("get-firmware-version", other)),
        }
    }

    /// Switch the UART to a supported baud rate (38400 or 115200). The new
    /// rate applies after the ack; reopen the transport accordingly.
    pub fn set_uart_baudrate(&mut self, baud: u32) -> Result<(), RfidError> {
        self.execute("set-uart-baudrate", &[baud]).map(|_| ())
    }

    /// Assign a new bus address. On success subsequent frames use it.
    pub fn set_reader_address(&mut self, address: u8) -> Result<(), RfidError> {
        self.execute("set-reader-address", &[address as u32])?;
        self.address = address;
        Ok(())
    }

    pub fn set_work_antenna(&mut self, antenna: u8) -> Result<(), RfidError> {
        self.execute("set-work-antenna", &[antenna as u32]).map(|_| ())
    }

    pub fn work_antenna(&mut self) -> Result<u8, RfidError> {
        match self.execute("get-work-antenna", &[])? {
            CommandResponse::Byte(antenna) => Ok(antenna),
            other => Err(Self::unexpected("get-work-antenna", other)),
        }
    }

    /// Set the persistent output power in dBm (18-26).
    pub fn set_output_power(&mut self, dbm: u8) -> Result<(), RfidError> {
        self.execute("set-output-power", &[dbm as u32]).map(|_| ())
    }

    pub fn output_power(&mut self) -> Result<u8, RfidError> {
        match self.execute("get-output-power", &[])? {
            CommandResponse::Byte(dbm) => Ok(dbm),
            other => Err(Self::unexpected("get-output-power", other)),
        }
    }

    /// Set output power in dBm (20-33) without writing it to flash.
    pub fn set_temporary_output_power(&mut self, dbm: u8) -> Result<(), RfidError> {
        self.execute("set-temporary-output-power", &[dbm as u32])
            .map(|_| ())
    }

    /// Select a regulatory band (1 FCC, 2 ETSI, 3 CHN) with a start/end
    /// window into the 60-entry channel table.
    pub fn set_frequency_region(
        &mut self,
        region: u8,
        start_channel: u8,
        end_channel: u8,
    ) -> Result<(), RfidError> {
        self.execute(
            "set-frequency-region",
            &[region as u32, start_channel as u32, end_channel as u32],
        )
        .map(|_| ())
    }

    /// Configure a user-defined spectrum plan: channel spacing in 10 kHz
    /// units, channel count, and start frequency in kHz.
    pub fn set_frequency_user_defined(
        &mut self,
        space: u16,
        quantity: u16,
        start_khz: u32,
    ) -> Result<(), RfidError> {
        self.execute(
            "set-frequency-user-defined",
            &[4, space as u32, quantity as u32, start_khz],
        )
        .map(|_| ())
    }

    pub fn frequency_region(&mut self) -> Result<FrequencyRegion, RfidError> {
        match self.execute("get-frequency-region", &[])? {
            CommandResponse::FrequencyRegion(region) => Ok(region),
            other => Err(Self::unexpected("get-frequency-region", other)),
        }
    }

    /// 0 quiet, 1 beep per inventory round, 2 beep per tag.
    pub fn set_beeper_mode(&mut self, mode: u8) -> Result<(), RfidError> {
        self.execute("set-beeper-mode", &[mode as u32]).map(|_| ())
    }

    /// Internal temperature in °C.
    pub fn temperature(&mut self) -> Result<i16, RfidError> {
        match self.execute("get-reader-temperature", &[])? {
            CommandResponse::Temperature(celsius) => Ok(celsius),
            other => Err(Self::unexpected("get-reader-temperature", other)),
        }
    }

    /// 12-byte factory identifier.
    pub fn identifier(&mut self) -> Result<Vec<u8>, RfidError> {
        match self.execute("get-reader-identifier", &[])? {
            CommandResponse::Identifier(id) => Ok(id),
            other => Err(Self::unexpected("get-reader-identifier", other)),
        }
    }

    pub fn rf_link_profile(&mut self) -> Result<u8, RfidError> {
        match self.execute("get-rf-link-profile", &[])? {
            CommandResponse::Byte(profile) => Ok(profile),
            other => Err(Self::unexpected("get-rf-link-profile", other)),
        }
    }

    /// Return loss of the current antenna port, in dB.
    pub fn rf_port_return_loss(&mut self) -> Result<u8, RfidError> {
        match self.execute("get-rf-port-return-loss", &[])? {
            CommandResponse::Byte(db) => Ok(db),
            other => Err(Self::unexpected("get-rf-port-return-loss", other)),
        }
    }

    /// Levels of GPIO3 and GPIO4.
    pub fn read_gpio(&mut self) -> Result<(u8, u8), RfidError> {
        match self.execute("read-gpio", &[])? {
            CommandResponse::GpioLevels { gpio3, gpio4 } => Ok((gpio3, gpio4)),
            other => Err(Self::unexpected("read-gpio", other)),
        }
    }

    /// Drive GPIO3 or GPIO4 low or high.
    pub fn write_gpio(&mut self, pin: u8, level: u8) -> Result<(), RfidError> {
        self.execute("write-gpio", &[pin as u32, level as u32])
            .map(|_| ())
    }

    fn run_inventory(&mut self, name: &str, duration: u8) -> Result<InventoryBatch, RfidError> {
        let descriptor = *self.registry.get(name)?;
        let has_tag_count = summary_has_tag_count(descriptor.response).ok_or_else(|| {
            RfidError::InvalidParameter(format!("{} is not an inventory command", name))
        })?;
        let frames = self.exchange(name, &[duration as u32])?;
        decode_batch(&frames, has_tag_count)
    }

    /// Duration-bounded inventory round. The summary reports the distinct
    /// tag count.
    pub fn inventory(&mut self, repeat: u8) -> Result<InventoryBatch, RfidError> {
        self.run_inventory("inventory", repeat)
    }

    /// Real-time inventory round; sightings stream as they happen and the
    /// summary carries no distinct tag count.
    pub fn rt_inventory(&mut self, duration: u8) -> Result<InventoryBatch, RfidError> {
        self.run_inventory("rt-inventory", duration)
    }

    /// Read tag memory: `bank` 0-3 (reserved/EPC/TID/user), starting word
    /// address, word count. One record per answering tag.
    pub fn read_memory(
        &mut self,
        bank: u8,
        word_address: u8,
        word_count: u8,
    ) -> Result<Vec<MemoryReadRecord>, RfidError> {
        let frames = self.exchange(
            "read-memory",
            &[bank as u32, word_address as u32, word_count as u32],
        )?;
        let mut records = Vec::new();
        let mut first_err = None;
        for frame in frames {
            match frame {
                Ok(packet) => match decode_memory_read(&packet) {
                    Ok(record) => records.push(record),
                    Err(e) => first_err = first_err.or(Some(e)),
                },
                Err(e) => first_err = first_err.or(Some(e)),
            }
        }
        if records.is_empty() {
            Err(first_err.unwrap_or(RfidError::NoResponse))
        } else {
            Ok(records)
        }
    }
}

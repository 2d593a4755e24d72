//! Declarative command layer.
//!
//! The controller exposes a few dozen operations that differ only in opcode,
//! parameter ranges, reply shape, and how long the device needs before its
//! reply is on the wire. Rather than one type per command, each operation is
//! a [`CommandDescriptor`] row in a [`CommandRegistry`], and one generic
//! build/decode engine serves them all. Only the structurally distinct reply
//! shapes (tag stream, memory read) get their own decoders, in
//! [`crate::tag`].

use std::collections::HashMap;
use std::time::Duration;

use crate::packet::Packet;
use crate::tables::{STATUS_SUCCESS, status_error};
use crate::types::{FrequencyRegion, RfidError};

/// Wait after a plain get/set before reading the reply.
const SETTLE_SHORT: Duration = Duration::from_millis(100);
/// Tag memory access keeps the RF channel open noticeably longer.
const SETTLE_MEMORY: Duration = Duration::from_millis(500);
/// Base settle for scan commands, on top of the declared scan duration.
const SETTLE_SCAN_BASE: Duration = Duration::from_millis(500);

/// Constraint on one logical command argument.
#[derive(Debug, Clone, Copy)]
pub enum ParamSpec {
    /// Inclusive range; the argument goes on the wire unchanged.
    Range {
        name: &'static str,
        min: u32,
        max: u32,
    },
    /// Enumerated options, each mapped to a fixed wire code.
    OneOf {
        name: &'static str,
        options: &'static [(u32, u32)],
    },
}

impl ParamSpec {
    fn name(&self) -> &'static str {
        match self {
            ParamSpec::Range { name, .. } | ParamSpec::OneOf { name, .. } => name,
        }
    }

    fn resolve(&self, value: u32) -> Result<u32, RfidError> {
        match self {
            ParamSpec::Range { name, min, max } => {
                if (*min..=*max).contains(&value) {
                    Ok(value)
                } else {
                    Err(RfidError::InvalidParameter(format!(
                        "{} must be in range {}-{}, got {}",
                        name, min, max, value
                    )))
                }
            }
            ParamSpec::OneOf { name, options } => options
                .iter()
                .find(|(input, _)| *input == value)
                .map(|(_, wire)| *wire)
                .ok_or_else(|| {
                    RfidError::InvalidParameter(format!(
                        "{} must be one of {:?}, got {}",
                        name,
                        options.iter().map(|(i, _)| *i).collect::<Vec<_>>(),
                        value
                    ))
                }),
        }
    }
}

/// How long the caller must wait between writing a request and reading the
/// reply. Exposed as data so a session driver never hard-codes per-command
/// sleeps.
#[derive(Debug, Clone, Copy)]
pub enum SettlePolicy {
    Fixed(Duration),
    /// The device holds the radio channel open for the requested duration
    /// before replying; the first argument is that duration in the
    /// protocol's (unconfirmed) decisecond unit.
    DurationScaled { base: Duration },
}

impl SettlePolicy {
    /// Concrete delay for a call with the given (already validated) args.
    pub fn delay(&self, args: &[u32]) -> Duration {
        match self {
            SettlePolicy::Fixed(d) => *d,
            SettlePolicy::DurationScaled { base } => {
                let deciseconds = args.first().copied().unwrap_or(0) as u64;
                *base + Duration::from_millis(deciseconds * 100)
            }
        }
    }
}

/// Shape of a command's reply, used to pick the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    /// Single status byte; anything but 0x10 resolves through the catalog.
    Status,
    /// Single plain value byte.
    Byte,
    /// Firmware major/minor pair.
    Version,
    /// Sign byte plus magnitude. Sign zero means below freezing; the
    /// datasheet documents the opposite but hardware disagrees.
    Temperature,
    /// GPIO3 and GPIO4 levels.
    GpioLevels,
    /// 12-byte reader identifier.
    Identifier,
    /// Band or user-defined frequency configuration.
    FrequencyRegion,
    /// Variable multi-frame stream: tag reports plus a trailing summary.
    TagStream { summary_has_tag_count: bool },
    /// Read-memory record.
    MemoryRead,
}

/// One row of the command table.
#[derive(Debug, Clone, Copy)]
pub struct CommandDescriptor {
    pub name: &'static str,
    pub opcode: u8,
    pub params: &'static [ParamSpec],
    pub response: ResponseKind,
    pub settle: SettlePolicy,
}

/// Decoded reply of a simple (single-frame) command.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandResponse {
    Status,
    Byte(u8),
    Version { major: u8, minor: u8 },
    Temperature(i16),
    GpioLevels { gpio3: u8, gpio4: u8 },
    Identifier(Vec<u8>),
    FrequencyRegion(FrequencyRegion),
}

const DESCRIPTORS: &[CommandDescriptor] = &[
    CommandDescriptor {
        name: "reset",
        opcode: 0x70,
        params: &[],
        response: ResponseKind::Status,
        settle: SettlePolicy::Fixed(SETTLE_SHORT),
    },
    CommandDescriptor {
        name: "set-uart-baudrate",
        opcode: 0x71,
        params: &[ParamSpec::OneOf {
            name: "baud rate",
            options: &[(38_400, 0x03), (115_200, 0x04)],
        }],
        response: ResponseKind::Status,
        settle: SettlePolicy::Fixed(SETTLE_SHORT),
    },
    CommandDescriptor {
        name: "get-firmware-version",
        opcode: 0x72,
        params: &[],
        response: ResponseKind::Version,
        settle: SettlePolicy::Fixed(SETTLE_SHORT),
    },
    CommandDescriptor {
        name: "set-reader-address",
        opcode: 0x73,
        params: &[ParamSpec::Range {
            name: "reader address",
            min: 0,
            max: 255,
        }],
        response: ResponseKind::Status,
        settle: SettlePolicy::Fixed(SETTLE_SHORT),
    },
    CommandDescriptor {
        name: "set-work-antenna",
        opcode: 0x74,
        params: &[ParamSpec::Range {
            name: "antenna id",
            min: 0,
            max: 3,
        }],
        response: ResponseKind::Status,
        settle: SettlePolicy::Fixed(SETTLE_SHORT),
    },
    CommandDescriptor {
        name: "get-work-antenna",
        opcode: 0x75,
        params: &[],
        response: ResponseKind::Byte,
        settle: SettlePolicy::Fixed(SETTLE_SHORT),
    },
    CommandDescriptor {
        name: "set-output-power",
        opcode: 0x76,
        params: &[ParamSpec::Range {
            name: "output power (dBm)",
            min: 18,
            max: 26,
        }],
        response: ResponseKind::Status,
        settle: SettlePolicy::Fixed(SETTLE_SHORT),
    },
    CommandDescriptor {
        name: "get-output-power",
        opcode: 0x77,
        params: &[],
        response: ResponseKind::Byte,
        settle: SettlePolicy::Fixed(SETTLE_SHORT),
    },
    CommandDescriptor {
        name: "set-temporary-output-power",
        opcode: 0x66,
        params: &[ParamSpec::Range {
            name: "temporary output power (dBm)",
            min: 20,
            max: 33,
        }],
        response: ResponseKind::Status,
        settle: SettlePolicy::Fixed(SETTLE_SHORT),
    },
    CommandDescriptor {
        name: "set-frequency-region",
        opcode: 0x78,
        params: &[
            ParamSpec::Range {
                name: "frequency region",
                min: 1,
                max: 3,
            },
            ParamSpec::Range {
                name: "start channel",
                min: 0,
                max: 59,
            },
            ParamSpec::Range {
                name: "end channel",
                min: 0,
                max: 59,
            },
        ],
        response: ResponseKind::Status,
        settle: SettlePolicy::Fixed(SETTLE_SHORT),
    },
    CommandDescriptor {
        name: "set-frequency-user-defined",
        opcode: 0x78,
        params: &[
            ParamSpec::Range {
                name: "frequency region",
                min: 4,
                max: 4,
            },
            ParamSpec::Range {
                name: "frequency space (10 kHz)",
                min: 0,
                max: 1000,
            },
            ParamSpec::Range {
                name: "frequency quantity",
                min: 1,
                max: 1000,
            },
            ParamSpec::Range {
                name: "start frequency (kHz)",
                min: 865_000,
                max: 928_000,
            },
        ],
        response: ResponseKind::Status,
        settle: SettlePolicy::Fixed(SETTLE_SHORT),
    },
    CommandDescriptor {
        name: "get-frequency-region",
        opcode: 0x79,
        params: &[],
        response: ResponseKind::FrequencyRegion,
        settle: SettlePolicy::Fixed(SETTLE_SHORT),
    },
    CommandDescriptor {
        name: "set-beeper-mode",
        opcode: 0x7A,
        params: &[ParamSpec::Range {
            name: "beeper mode",
            min: 0,
            max: 2,
        }],
        response: ResponseKind::Status,
        settle: SettlePolicy::Fixed(SETTLE_SHORT),
    },
    CommandDescriptor {
        name: "get-reader-temperature",
        opcode: 0x7B,
        params: &[],
        response: ResponseKind::Temperature,
        settle: SettlePolicy::Fixed(SETTLE_SHORT),
    },
    CommandDescriptor {
        name: "get-reader-identifier",
        opcode: 0x68,
        params: &[],
        response: ResponseKind::Identifier,
        settle: SettlePolicy::Fixed(SETTLE_SHORT),
    },
    CommandDescriptor {
        name: "get-rf-link-profile",
        opcode: 0x6A,
        params: &[],
        response: ResponseKind::Byte,
        settle: SettlePolicy::Fixed(SETTLE_SHORT),
    },
    CommandDescriptor {
        name: "get-rf-port-return-loss",
        opcode: 0x7E,
        params: &[],
        response: ResponseKind::Byte,
        settle: SettlePolicy::Fixed(SETTLE_SHORT),
    },
    CommandDescriptor {
        name: "read-gpio",
        opcode: 0x60,
        params: &[],
        response: ResponseKind::GpioLevels,
        settle: SettlePolicy::Fixed(SETTLE_SHORT),
    },
    CommandDescriptor {
        name: "write-gpio",
        opcode: 0x61,
        params: &[
            ParamSpec::Range {
                name: "gpio pin",
                min: 3,
                max: 4,
            },
            ParamSpec::Range {
                name: "gpio level",
                min: 0,
                max: 1,
            },
        ],
        response: ResponseKind::Status,
        settle: SettlePolicy::Fixed(SETTLE_SHORT),
    },
    CommandDescriptor {
        name: "inventory",
        opcode: 0x80,
        params: &[ParamSpec::Range {
            name: "repeat interval",
            min: 1,
            max: 255,
        }],
        response: ResponseKind::TagStream {
            summary_has_tag_count: true,
        },
        settle: SettlePolicy::DurationScaled {
            base: SETTLE_SCAN_BASE,
        },
    },
    CommandDescriptor {
        name: "rt-inventory",
        opcode: 0x89,
        params: &[ParamSpec::Range {
            name: "scan duration",
            min: 1,
            max: 255,
        }],
        response: ResponseKind::TagStream {
            summary_has_tag_count: false,
        },
        settle: SettlePolicy::DurationScaled {
            base: SETTLE_SCAN_BASE,
        },
    },
    CommandDescriptor {
        name: "read-memory",
        opcode: 0x81,
        params: &[
            ParamSpec::Range {
                name: "memory bank",
                min: 0,
                max: 3,
            },
            ParamSpec::Range {
                name: "word address",
                min: 0,
                max: 255,
            },
            ParamSpec::Range {
                name: "word count",
                min: 1,
                max: 255,
            },
        ],
        response: ResponseKind::MemoryRead,
        settle: SettlePolicy::Fixed(SETTLE_MEMORY),
    },
];

/// Table of command descriptors keyed by logical name. Loaded once with the
/// standard CZS6147 set; callers may register additional rows via
/// [`CommandRegistry::define`].
pub struct CommandRegistry {
    commands: HashMap<&'static str, CommandDescriptor>,
}

impl CommandRegistry {
    /// The standard command set.
    pub fn standard() -> Self {
        let mut registry = Self {
            commands: HashMap::with_capacity(DESCRIPTORS.len()),
        };
        for descriptor in DESCRIPTORS {
            registry.define(*descriptor);
        }
        registry
    }

    /// Register (or replace) a descriptor.
    pub fn define(&mut self, descriptor: CommandDescriptor) {
        self.commands.insert(descriptor.name, descriptor);
    }

    /// Registered command names.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.commands.keys().copied()
    }

    /// Look up a descriptor by logical name.
    pub fn get(&self, name: &str) -> Result<&CommandDescriptor, RfidError> {
        self.commands
            .get(name)
            .ok_or_else(|| RfidError::UnknownCommand(name.to_string()))
    }

    /// Validate `args` against the descriptor and build the request frame.
    /// Fails before any I/O on arity or range violations.
    pub fn build(&self, name: &str, address: u8, args: &[u32]) -> Result<Vec<u8>, RfidError> {
        let descriptor = self.get(name)?;
        if args.len() != descriptor.params.len() {
            return Err(RfidError::InvalidParameter(format!(
                "{} takes {} argument(s) ({}), got {}",
                name,
                descriptor.params.len(),
                descriptor
                    .params
                    .iter()
                    .map(|p| p.name())
                    .collect::<Vec<_>>()
                    .join(", "),
                args.len()
            )));
        }
        let mut wire = Vec::with_capacity(args.len());
        for (spec, &arg) in descriptor.params.iter().zip(args) {
            wire.push(spec.resolve(arg)?);
        }
        Ok(Packet::new(address, descriptor.opcode, &wire).to_bytes())
    }
}

/// Decode the single response frame of a fixed-shape command.
///
/// Tag streams and memory reads have their own decoders in [`crate::tag`];
/// handing one of those descriptors here is a caller bug and reports as a
/// malformed frame.
pub fn decode_simple(
    descriptor: &CommandDescriptor,
    packet: &Packet,
) -> Result<CommandResponse, RfidError> {
    if packet.opcode != descriptor.opcode {
        return Err(RfidError::MalformedFrame(format!(
            "response opcode {:#04X} does not match {} ({:#04X})",
            packet.opcode, descriptor.name, descriptor.opcode
        )));
    }
    let data = &packet.data;
    let need = |n: usize| -> Result<(), RfidError> {
        if data.len() < n {
            Err(RfidError::MalformedFrame(format!(
                "{} response carries {} data byte(s), expected at least {}",
                descriptor.name,
                data.len(),
                n
            )))
        } else {
            Ok(())
        }
    };
    match descriptor.response {
        ResponseKind::Status => {
            need(1)?;
            if data[0] == STATUS_SUCCESS {
                Ok(CommandResponse::Status)
            } else {
                Err(status_error(data[0]))
            }
        }
        ResponseKind::Byte => {
            need(1)?;
            Ok(CommandResponse::Byte(data[0]))
        }
        ResponseKind::Version => {
            need(2)?;
            Ok(CommandResponse::Version {
                major: data[0],
                minor: data[1],
            })
        }
        ResponseKind::Temperature => {
            need(2)?;
            // magnitude is an unsigned byte; widen before applying the sign
            let magnitude = data[1] as i16;
            Ok(CommandResponse::Temperature(if data[0] == 0 {
                -magnitude
            } else {
                magnitude
            }))
        }
        ResponseKind::GpioLevels => {
            need(2)?;
            Ok(CommandResponse::GpioLevels {
                gpio3: data[0],
                gpio4: data[1],
            })
        }
        ResponseKind::Identifier => {
            need(12)?;
            Ok(CommandResponse::Identifier(data[..12].to_vec()))
        }
        ResponseKind::FrequencyRegion => {
            need(3)?;
            if data[0] == 4 {
                need(6)?;
                Ok(CommandResponse::FrequencyRegion(
                    FrequencyRegion::UserDefined {
                        space: data[1],
                        quantity: data[2],
                        start_khz: u32::from_be_bytes([0, data[3], data[4], data[5]]),
                    },
                ))
            } else {
                Ok(CommandResponse::FrequencyRegion(FrequencyRegion::Band {
                    region: data[0],
                    start_channel: data[1],
                    end_channel: data[2],
                }))
            }
        }
        ResponseKind::TagStream { .. } | ResponseKind::MemoryRead => {
            Err(RfidError::MalformedFrame(format!(
                "{} is a streaming command and has no simple response",
                descriptor.name
            )))
        }
    }
}

//! Fixed lookup tables from the CZS6147 protocol documentation: RF channel
//! frequencies, the RSSI code chart, and the device status catalog.
//!
//! All three are process-wide immutable constants; nothing in the crate ever
//! mutates them.

use crate::types::RfidError;

/// Status code the reader returns on success.
pub const STATUS_SUCCESS: u8 = 0x10;

/// RF channel center frequencies in MHz, indexed by the 6-bit channel index.
///
/// Indices 0-6 are the ETSI block (865.0-868.0 MHz), 7-59 the FCC block
/// (902.0-928.0 MHz), both in 0.5 MHz steps.
pub const FREQUENCY_TABLE: [f32; 60] = [
    865.0, 865.5, 866.0, 866.5, 867.0, 867.5, 868.0, // 0x00-0x06
    902.0, 902.5, 903.0, 903.5, 904.0, 904.5, 905.0, 905.5, 906.0, // 0x07-0x0F
    906.5, 907.0, 907.5, 908.0, 908.5, 909.0, 909.5, 910.0, // 0x10-0x17
    910.5, 911.0, 911.5, 912.0, 912.5, 913.0, 913.5, 914.0, // 0x18-0x1F
    914.5, 915.0, 915.5, 916.0, 916.5, 917.0, 917.5, 918.0, // 0x20-0x27
    918.5, 919.0, 919.5, 920.0, 920.5, 921.0, 921.5, 922.0, // 0x28-0x2F
    922.5, 923.0, 923.5, 924.0, 924.5, 925.0, 925.5, 926.0, // 0x30-0x37
    926.5, 927.0, 927.5, 928.0, // 0x38-0x3B
];

/// Lowest raw RSSI code the chart defines.
const RSSI_CODE_MIN: u8 = 31;
/// Highest raw RSSI code the chart defines.
const RSSI_CODE_MAX: u8 = 98;

/// RSSI chart from the protocol documentation, indexed by `code - 31`.
///
/// The mapping is not uniformly stepped (the chart skips -43 dBm between
/// codes 86 and 87), so it is carried verbatim rather than derived.
const RSSI_TABLE: [i8; 68] = [
    -99, -98, -97, -96, -95, -94, -93, -92, -91, -90, // 31-40
    -89, -88, -87, -86, -85, -84, -83, -82, -81, -80, // 41-50
    -79, -78, -77, -76, -75, -74, -73, -72, -71, -70, // 51-60
    -69, -68, -67, -66, -65, -64, -63, -62, -61, -60, // 61-70
    -59, -58, -57, -56, -55, -54, -53, -52, -51, -50, // 71-80
    -49, -48, -47, -46, -45, -44, // 81-86
    -42, -41, -40, -39, -38, -37, -36, -35, -34, -33, -32, -31, // 87-98
];

/// Resolve a 6-bit channel index to its center frequency in MHz.
pub fn frequency_mhz(channel: u8) -> Result<f32, RfidError> {
    FREQUENCY_TABLE
        .get(channel as usize)
        .copied()
        .ok_or(RfidError::UnmappedValue {
            table: "frequency",
            value: channel,
        })
}

/// Resolve a raw RSSI code (31-98) to dBm.
pub fn rssi_dbm(code: u8) -> Result<i8, RfidError> {
    if !(RSSI_CODE_MIN..=RSSI_CODE_MAX).contains(&code) {
        return Err(RfidError::UnmappedValue {
            table: "rssi",
            value: code,
        });
    }
    Ok(RSSI_TABLE[(code - RSSI_CODE_MIN) as usize])
}

/// Name and description for a device status code, per the protocol document.
pub fn status_detail(code: u8) -> Option<(&'static str, &'static str)> {
    let entry = match code {
        0x10 => ("command_success", "Command succeeded"),
        0x11 => ("command_fail", "Command failed"),
        0x20 => ("mcu_reset_error", "CPU reset error"),
        0x21 => ("cw_on_error", "Turn on CW error"),
        0x22 => ("antenna_missing_error", "Antenna is missing"),
        0x23 => ("write_flash_error", "Write flash error"),
        0x24 => ("read_flash_error", "Read flash error"),
        0x25 => ("set_output_power_error", "Set output power error"),
        0x31 => ("tag_inventory_error", "Tag inventory error"),
        0x32 => ("tag_read_error", "Tag read error"),
        0x33 => ("tag_write_error", "Tag write error"),
        0x34 => ("tag_lock_error", "Tag lock error"),
        0x35 => ("tag_kill_error", "Tag kill error"),
        0x36 => ("no_tag_error", "No operable tag found"),
        0x37 => (
            "inventory_ok_but_access_fail",
            "Inventory completed but tag access failed",
        ),
        0x38 => ("buffer_is_empty_error", "Buffer is empty"),
        0x40 => (
            "access_or_password_error",
            "Tag access failed or wrong password",
        ),
        0x41 => ("parameter_invalid", "Invalid parameter"),
        0x42 => (
            "parameter_invalid_wordcnt_too_long",
            "WordCnt parameter too long",
        ),
        0x43 => (
            "parameter_invalid_membank_out_of_range",
            "MemBank parameter out of range",
        ),
        0x44 => (
            "parameter_invalid_lock_region_out_of_range",
            "Lock region parameter out of range",
        ),
        0x45 => (
            "parameter_invalid_lock_action_out_of_range",
            "LockType parameter out of range",
        ),
        0x46 => (
            "parameter_reader_address_invalid",
            "Reader address invalid",
        ),
        0x47 => (
            "parameter_invalid_antenna_id_out_of_range",
            "Antenna ID out of range",
        ),
        0x48 => (
            "parameter_invalid_output_power_out_of_range",
            "Output power parameter out of range",
        ),
        0x49 => (
            "parameter_invalid_frequency_region_out_of_range",
            "Frequency region parameter out of range",
        ),
        0x4A => (
            "parameter_invalid_baudrate_out_of_range",
            "Baud rate parameter out of range",
        ),
        0x4B => (
            "parameter_beeper_mode_out_of_range",
            "Beeper mode parameter out of range",
        ),
        0x4C => (
            "parameter_epc_match_len_too_long",
            "EPC match length too long",
        ),
        0x4D => ("parameter_epc_match_len_error", "EPC match length error"),
        0x4E => (
            "parameter_invalid_epc_match_mode",
            "EPC match mode invalid",
        ),
        0x4F => (
            "parameter_invalid_frequency_range",
            "Frequency range parameter invalid",
        ),
        0x50 => (
            "fail_to_get_rn16_from_tag",
            "Failed to receive RN16 from tag",
        ),
        0x51 => ("parameter_invalid_drm_mode", "DRM mode parameter invalid"),
        0x52 => ("pll_lock_fail", "PLL failed to lock"),
        0x53 => ("rf_chip_fail_to_response", "No response from RF chip"),
        0x54 => (
            "fail_to_achieve_desired_output_power",
            "Could not reach the requested output power",
        ),
        0x55 => (
            "copyright_authentication_fail",
            "Firmware copyright authentication failed",
        ),
        0x56 => ("spectrum_regulation_error", "Spectrum regulation error"),
        0x57 => ("output_power_too_low", "Output power too low"),
        _ => return None,
    };
    Some(entry)
}

/// Turn a non-success status byte into the matching [`RfidError`].
pub fn status_error(code: u8) -> RfidError {
    match status_detail(code) {
        Some((name, message)) => RfidError::DeviceStatus {
            code,
            name,
            message,
        },
        None => RfidError::DeviceStatus {
            code,
            name: "unknown_status",
            message: "Status code not in the catalog",
        },
    }
}

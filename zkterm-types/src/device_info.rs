//! Device identification

use std::fmt;

/// Identification strings reported by a terminal
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Serial number (`~SerialNumber`)
    pub serial_number: String,

    /// Firmware version (`CMD_GET_VERSION`)
    pub firmware_version: String,

    /// Platform name (`~Platform`)
    pub platform: Option<String>,

    /// Product code (`~DeviceName`)
    pub device_name: Option<String>,

    /// OEM vendor (`~OEMVendor`)
    pub vendor: Option<String>,

    /// Fabrication time (`~ProductTime`)
    pub product_time: Option<String>,
}

impl DeviceInfo {
    pub fn new(serial_number: String, firmware_version: String) -> Self {
        Self {
            serial_number,
            firmware_version,
            ..Self::default()
        }
    }
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Device[SN: {}, FW: {}",
            self.serial_number, self.firmware_version
        )?;
        if let Some(name) = &self.device_name {
            write!(f, ", Model: {}", name)?;
        }
        if let Some(platform) = &self.platform {
            write!(f, ", Platform: {}", platform)?;
        }
        write!(f, "]")
    }
}

/// Value part of an options reply (`Name=Value\0`)
///
/// Replies without `=` are returned whole, minus NUL padding.
pub fn option_value(reply: &[u8]) -> String {
    let text = String::from_utf8_lossy(reply);
    let value = text.rsplit('=').next().unwrap_or_default();
    value.trim_end_matches('\0').to_string()
}

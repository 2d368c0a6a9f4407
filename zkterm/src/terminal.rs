//! Terminal parameters, identity, clock and status

use bytes::Bytes;
use chrono::{Local, NaiveDateTime};
use tracing::debug;
use zkterm_core::Command;
use zkterm_types::{
    DeviceInfo, DeviceStatus,
    device_info::option_value,
    error::Error as TypesError,
    time::{decode_time, encode_time},
};

use crate::{Device, Result};

/// Read one option (`~SerialNumber`, `~PIN2Width`, ...)
pub async fn get_option(device: &mut Device, name: &str) -> Result<String> {
    let request = format!("{}\0", name);
    let reply = device.command_ack(Command::OptionsRrq, request.into_bytes()).await?;

    let value = option_value(reply.payload());
    debug!(name, value = %value, "Read option");
    Ok(value)
}

/// Write one option and make the terminal reload its options
pub async fn set_option(device: &mut Device, name: &str, value: &str) -> Result<()> {
    let request = format!("{}={}\0", name, value);
    device.command_ack(Command::OptionsWrq, request.into_bytes()).await?;
    device.command_ack(Command::RefreshOption, Bytes::new()).await?;
    Ok(())
}

pub async fn firmware_version(device: &mut Device) -> Result<String> {
    let reply = device.command_ack(Command::GetVersion, Bytes::new()).await?;
    Ok(String::from_utf8_lossy(reply.payload())
        .trim_end_matches('\0')
        .to_string())
}

pub async fn serial_number(device: &mut Device) -> Result<String> {
    get_option(device, "~SerialNumber").await
}

/// Product code
pub async fn device_name(device: &mut Device) -> Result<String> {
    get_option(device, "~DeviceName").await
}

pub async fn vendor(device: &mut Device) -> Result<String> {
    get_option(device, "~OEMVendor").await
}

pub async fn platform(device: &mut Device) -> Result<String> {
    get_option(device, "~Platform").await
}

/// Fabrication time, as the terminal formats it
pub async fn product_time(device: &mut Device) -> Result<String> {
    get_option(device, "~ProductTime").await
}

/// Maximum length of a user id
pub async fn pin_width(device: &mut Device) -> Result<u8> {
    let value = get_option(device, "~PIN2Width").await?;
    let width = value
        .trim()
        .parse()
        .map_err(|_| TypesError::Parse(format!("~PIN2Width is not a number: {:?}", value)))?;
    Ok(width)
}

/// Collect the identification strings in one go
pub async fn device_info(device: &mut Device) -> Result<DeviceInfo> {
    let mut info = DeviceInfo::new(serial_number(device).await?, firmware_version(device).await?);
    info.platform = Some(platform(device).await?);
    info.device_name = Some(device_name(device).await?);
    info.vendor = Some(vendor(device).await?);
    info.product_time = Some(product_time(device).await?);

    debug!("Device info: {}", info);
    Ok(info)
}

pub async fn get_time(device: &mut Device) -> Result<NaiveDateTime> {
    let reply = device.command_ack(Command::GetTime, Bytes::new()).await?;

    let raw = reply.payload().get(..4).ok_or(TypesError::Truncated {
        what: "device time",
        expected: 4,
        actual: reply.payload().len(),
    })?;
    let value = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
    Ok(decode_time(value)?)
}

pub async fn set_time(device: &mut Device, time: &NaiveDateTime) -> Result<()> {
    let value = encode_time(time)?;
    device
        .command_ack(Command::SetTime, Bytes::copy_from_slice(&value.to_le_bytes()))
        .await?;
    Ok(())
}

/// Set the terminal clock to the local time of this host
pub async fn sync_time(device: &mut Device) -> Result<()> {
    set_time(device, &Local::now().naive_local()).await
}

/// Counters and capacities (`CMD_GET_FREE_SIZES`)
pub async fn device_status(device: &mut Device) -> Result<DeviceStatus> {
    let reply = device.command_ack(Command::GetFreeSizes, Bytes::new()).await?;
    Ok(DeviceStatus::new(reply.into_payload()))
}

/// Terminal state code, carried in the session slot of the reply
pub async fn device_state(device: &mut Device) -> Result<u16> {
    let reply = device.command(Command::StateRrq, Bytes::new()).await?;
    Ok(reply.session_id())
}

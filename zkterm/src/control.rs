//! Device control: enable, disable, restart, power
//!
//! # Examples
//!
//! ```no_run
//! use zkterm::{Device, control};
//!
//! # async fn run(device: &mut Device) -> zkterm::Result<()> {
//! // Show "Working..." and block the keypad for 30 seconds at most
//! control::disable_device(device, Some(30)).await?;
//! // ... bulk work ...
//! control::enable_device(device).await?;
//! # Ok(())
//! # }
//! ```

use bytes::Bytes;
use tracing::{debug, warn};
use zkterm_core::Command;

use crate::{Device, Result};

/// Resume normal operation
pub async fn enable_device(device: &mut Device) -> Result<()> {
    debug!("Enabling device...");
    device.command_ack(Command::EnableDevice, Bytes::new()).await?;
    Ok(())
}

/// Lock the terminal UI, optionally only for `timer` seconds
pub async fn disable_device(device: &mut Device, timer: Option<u32>) -> Result<()> {
    debug!(?timer, "Disabling device...");

    let payload = match timer {
        Some(seconds) => Bytes::copy_from_slice(&seconds.to_le_bytes()),
        None => Bytes::new(),
    };
    device.command_ack(Command::DisableDevice, payload).await?;
    Ok(())
}

/// Restart the terminal
///
/// The terminal drops the session without replying, so the device is
/// disconnected afterwards.
pub async fn restart(device: &mut Device) -> Result<()> {
    warn!("Restarting device...");

    device.send_command(Command::Restart, Bytes::new()).await?;
    device.abandon().await;
    Ok(())
}

/// Power the terminal off and end the session
pub async fn power_off(device: &mut Device) -> Result<()> {
    warn!("Powering off device...");

    device.command(Command::PowerOff, Bytes::new()).await?;
    device.disconnect().await
}

/// Remove the administrator flag from every user
pub async fn clear_admins(device: &mut Device) -> Result<()> {
    device.command_ack(Command::ClearAdmin, Bytes::new()).await?;
    refresh_data(device).await
}

/// Make the terminal reload users, templates and logs
pub async fn refresh_data(device: &mut Device) -> Result<()> {
    device.command_ack(Command::RefreshData, Bytes::new()).await?;
    Ok(())
}

/// Make the terminal reload its options
pub async fn refresh_options(device: &mut Device) -> Result<()> {
    device.command_ack(Command::RefreshOption, Bytes::new()).await?;
    Ok(())
}

/// Switch the terminal to identification mode
pub async fn start_identify(device: &mut Device) -> Result<()> {
    device.command_ack(Command::StartVerify, Bytes::new()).await?;
    Ok(())
}

/// Abort a running enrolment or capture
pub async fn cancel_capture(device: &mut Device) -> Result<()> {
    device.command_ack(Command::CancelCapture, Bytes::new()).await?;
    Ok(())
}

//! Users, fingerprint templates and logs
//!
//! Bulk reads go through `CMD_DATA_WRRQ` and [`Device::receive_long_reply`];
//! writes are single commands followed by a data refresh.

use bytes::{BufMut, Bytes, BytesMut};
use tracing::{debug, info};
use zkterm_core::{
    Command, Packet,
    constants::{VerifyStyle, data_types},
};
use zkterm_types::{
    AttendanceRecord, FingerprintTemplate, OperationRecord, User,
    error::Error as TypesError,
    record::{parse_attendance_log, parse_operation_log},
    user::{parse_templates, parse_users},
};

use crate::{Device, Result, control};

/// Size of a `CMD_VERIFY_WRQ` payload
const VERIFY_WRQ_SIZE: usize = 24;

/// Size of a `CMD_DEL_FPTMP` payload: user id field + finger index
const DEL_FPTMP_SIZE: usize = 25;

/// Datasets readable through `CMD_DATA_WRRQ`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dataset {
    Users,
    FingerprintTemplates,
    AttendanceLog,
    OperationLog,
}

impl Dataset {
    /// Request payload: `0x01 | command u16 | fct u32 | ext u32`
    pub fn request(self) -> Bytes {
        let (command, fct) = match self {
            Self::Users => (Command::UserTempRrq, data_types::FCT_USER),
            Self::FingerprintTemplates => (Command::DbRrq, data_types::FCT_FINGERTMP),
            Self::AttendanceLog => (Command::AttLogRrq, 0),
            Self::OperationLog => (Command::OpLogRrq, 0),
        };

        let mut buf = BytesMut::with_capacity(11);
        buf.put_u8(0x01);
        buf.put_u16_le(command.code());
        buf.put_u32_le(u32::from(fct));
        buf.put_u32_le(0);
        buf.freeze()
    }
}

/// Read one raw dataset
pub async fn read_dataset(device: &mut Device, dataset: Dataset) -> Result<Bytes> {
    debug!(?dataset, "Requesting dataset");

    device.send_command(Command::DataWrrq, dataset.request()).await?;
    let data = device.receive_long_reply().await?;

    info!(?dataset, len = data.len(), "Dataset received");
    Ok(data)
}

pub async fn read_users(device: &mut Device) -> Result<Vec<User>> {
    let data = read_dataset(device, Dataset::Users).await?;
    Ok(parse_users(&data)?)
}

/// Find a user by its visible id
pub async fn find_user(device: &mut Device, user_id: &str) -> Result<Option<User>> {
    let users = read_users(device).await?;
    Ok(users.into_iter().find(|u| u.user_id == user_id))
}

pub async fn read_fingerprint_templates(device: &mut Device) -> Result<Vec<FingerprintTemplate>> {
    let data = read_dataset(device, Dataset::FingerprintTemplates).await?;
    Ok(parse_templates(&data)?)
}

pub async fn read_attendance_log(device: &mut Device) -> Result<Vec<AttendanceRecord>> {
    let data = read_dataset(device, Dataset::AttendanceLog).await?;
    Ok(parse_attendance_log(&data)?)
}

pub async fn read_operation_log(device: &mut Device) -> Result<Vec<OperationRecord>> {
    let data = read_dataset(device, Dataset::OperationLog).await?;
    Ok(parse_operation_log(&data)?)
}

/// Template of one finger of one user
pub async fn download_fingerprint(device: &mut Device, user_sn: u16, finger_index: u8) -> Result<Bytes> {
    let mut payload = BytesMut::with_capacity(3);
    payload.put_u16_le(user_sn);
    payload.put_u8(finger_index);

    device.send_command(Command::UserTempRrq, payload.freeze()).await?;
    device.receive_long_reply().await
}

/// Store a fingerprint template
///
/// The template goes into the terminal's transfer buffer first and is
/// then committed for the user. The terminal is disabled for the duration
/// and enabled again even when a step fails.
pub async fn upload_fingerprint(device: &mut Device, template: &FingerprintTemplate) -> Result<()> {
    let commit = template.write_request()?;
    if template.template.len() > Packet::MAX_PAYLOAD_SIZE {
        return Err(TypesError::Validation(format!(
            "template of {} bytes does not fit one packet (max {})",
            template.template.len(),
            Packet::MAX_PAYLOAD_SIZE
        ))
        .into());
    }

    control::disable_device(device, None).await?;
    let stored = store_template(device, template, commit).await;
    let enabled = control::enable_device(device).await;
    stored.and(enabled)
}

async fn store_template(device: &mut Device, template: &FingerprintTemplate, commit: Bytes) -> Result<()> {
    let mut prepare = BytesMut::with_capacity(4);
    prepare.put_u16_le(template.template.len() as u16);
    prepare.put_u16_le(0);
    device.command_ack(Command::PrepareData, prepare.freeze()).await?;
    device.command_ack(Command::Data, template.template.clone()).await?;

    // Checksum of the buffer; not verified
    device.command(Command::ChecksumBuffer, Bytes::new()).await?;

    device.command_ack(Command::TmpWrite, commit).await?;
    device.command_ack(Command::FreeData, Bytes::new()).await?;

    control::refresh_data(device).await
}

/// Remove one finger of a user, addressed by visible user id
pub async fn delete_fingerprint(device: &mut Device, user_id: &str, finger_index: u8) -> Result<()> {
    if user_id.len() >= DEL_FPTMP_SIZE - 1 {
        return Err(TypesError::Validation(format!("user id {:?} is too long", user_id)).into());
    }

    let mut payload = [0u8; DEL_FPTMP_SIZE];
    payload[..user_id.len()].copy_from_slice(user_id.as_bytes());
    payload[DEL_FPTMP_SIZE - 1] = finger_index;

    device
        .command_ack(Command::DelFpTmp, Bytes::copy_from_slice(&payload))
        .await?;
    control::refresh_data(device).await
}

/// Create or overwrite a user
pub async fn upload_user(device: &mut Device, user: &User) -> Result<()> {
    device.command_ack(Command::UserWrq, user.encode()?).await?;
    control::refresh_data(device).await
}

pub async fn delete_user(device: &mut Device, user_sn: u16) -> Result<()> {
    device
        .command_ack(Command::DeleteUser, Bytes::copy_from_slice(&user_sn.to_le_bytes()))
        .await?;
    control::refresh_data(device).await
}

pub async fn get_verify_style(device: &mut Device, user_sn: u16) -> Result<VerifyStyle> {
    let reply = device
        .command_ack(Command::VerifyRrq, Bytes::copy_from_slice(&user_sn.to_le_bytes()))
        .await?;

    let raw = *reply.payload().get(2).ok_or(TypesError::Truncated {
        what: "verify style",
        expected: 3,
        actual: reply.payload().len(),
    })?;
    let style = VerifyStyle::try_from(raw)
        .map_err(|v| TypesError::Parse(format!("unknown verify style 0x{:02X}", v)))?;
    Ok(style)
}

pub async fn set_verify_style(device: &mut Device, user_sn: u16, style: VerifyStyle) -> Result<()> {
    let mut payload = [0u8; VERIFY_WRQ_SIZE];
    payload[..2].copy_from_slice(&user_sn.to_le_bytes());
    payload[2] = style as u8;

    device
        .command_ack(Command::VerifyWrq, Bytes::copy_from_slice(&payload))
        .await?;
    Ok(())
}

/// Erase stored data; `kind` is one of the `FCT_*` selectors, or everything
pub async fn clear_data(device: &mut Device, kind: Option<u8>) -> Result<()> {
    let payload = match kind {
        Some(kind) => Bytes::copy_from_slice(&[kind]),
        None => Bytes::new(),
    };
    device.command_ack(Command::ClearData, payload).await?;
    control::refresh_data(device).await
}

pub async fn clear_attendance_log(device: &mut Device) -> Result<()> {
    device.command_ack(Command::ClearAttLog, Bytes::new()).await?;
    control::refresh_data(device).await
}

pub async fn clear_operation_log(device: &mut Device) -> Result<()> {
    device.command_ack(Command::ClearOpLog, Bytes::new()).await?;
    control::refresh_data(device).await
}

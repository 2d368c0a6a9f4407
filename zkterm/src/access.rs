//! Access control: groups, time zones, unlock combinations, the door
//!
//! Users are addressed by their internal index (`user_sn`), as listed by
//! [`crate::data::read_users`].

use bytes::{BufMut, Bytes, BytesMut};
use zkterm_core::Command;
use zkterm_types::{GroupInfo, TimeZone, UnlockCombination, UserTimeZones, error::Error as TypesError};

use crate::{Device, Result, control};

/// Group a user belongs to
pub async fn get_user_group(device: &mut Device, user_sn: u32) -> Result<u8> {
    let reply = device
        .command_ack(Command::UserGrpRrq, Bytes::copy_from_slice(&user_sn.to_le_bytes()))
        .await?;
    first_byte("user group", reply.payload())
}

pub async fn set_user_group(device: &mut Device, user_sn: u32, group: u8) -> Result<()> {
    let mut payload = BytesMut::with_capacity(5);
    payload.put_u32_le(user_sn);
    payload.put_u8(group);

    device.command_ack(Command::UserGrpWrq, payload.freeze()).await?;
    control::refresh_data(device).await
}

pub async fn get_time_zone(device: &mut Device, tz_no: u32) -> Result<TimeZone> {
    let reply = device
        .command_ack(Command::TzRrq, TimeZone::read_request(tz_no))
        .await?;
    Ok(TimeZone::parse(reply.payload())?)
}

pub async fn set_time_zone(device: &mut Device, tz_no: u32, tz: &TimeZone) -> Result<()> {
    device.command_ack(Command::TzWrq, tz.write_request(tz_no)).await?;
    control::refresh_data(device).await
}

pub async fn get_unlock_combination(device: &mut Device, number: u8) -> Result<UnlockCombination> {
    let reply = device
        .command_ack(Command::UlgRrq, UnlockCombination::read_request(number))
        .await?;
    Ok(UnlockCombination::parse(number, reply.payload())?)
}

pub async fn set_unlock_combination(device: &mut Device, combination: &UnlockCombination) -> Result<()> {
    device
        .command_ack(Command::UlgWrq, combination.write_request()?)
        .await?;
    control::refresh_data(device).await
}

pub async fn get_group(device: &mut Device, group: u8) -> Result<GroupInfo> {
    let reply = device
        .command_ack(Command::GrpTzRrq, GroupInfo::read_request(group))
        .await?;
    Ok(GroupInfo::parse(group, reply.payload())?)
}

pub async fn set_group(device: &mut Device, info: &GroupInfo) -> Result<()> {
    device.command_ack(Command::GrpTzWrq, info.write_request()?).await?;
    control::refresh_data(device).await
}

/// Personal time zones of a user; empty when the user follows its group
pub async fn get_user_time_zones(device: &mut Device, user_sn: u32) -> Result<UserTimeZones> {
    let reply = device
        .command_ack(Command::UserTzRrq, UserTimeZones::read_request(user_sn))
        .await?;
    Ok(UserTimeZones::parse(reply.payload())?)
}

/// Pass an empty list to make the user follow its group again
pub async fn set_user_time_zones(device: &mut Device, user_sn: u32, tzs: &UserTimeZones) -> Result<()> {
    device
        .command_ack(Command::UserTzWrq, tzs.write_request(user_sn)?)
        .await?;
    control::refresh_data(device).await
}

/// Release the lock for `seconds`
pub async fn unlock_door(device: &mut Device, seconds: u32) -> Result<()> {
    device
        .command_ack(Command::Unlock, Bytes::copy_from_slice(&seconds.to_le_bytes()))
        .await?;
    Ok(())
}

/// Raw door sensor state
pub async fn door_state(device: &mut Device) -> Result<u8> {
    let reply = device.command_ack(Command::DoorStateRrq, Bytes::new()).await?;
    first_byte("door state", reply.payload())
}

fn first_byte(what: &'static str, payload: &[u8]) -> Result<u8> {
    payload.first().copied().ok_or_else(|| {
        TypesError::Truncated {
            what,
            expected: 1,
            actual: 0,
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{SID, connected};
    use pretty_assertions::assert_eq;
    use zkterm_types::DayWindow;

    #[tokio::test]
    async fn test_user_group() {
        let (transport, mut device) = connected().await;
        transport.push_reply(Command::AckOk, SID, 3, &[4]);
        transport.push_reply(Command::AckOk, SID, 4, &[]);
        transport.push_reply(Command::AckOk, SID, 5, &[]);

        assert_eq!(get_user_group(&mut device, 12).await.unwrap(), 4);
        set_user_group(&mut device, 12, 2).await.unwrap();

        let sent = transport.sent_packets();
        assert_eq!(sent[0].payload().as_ref(), &[12, 0, 0, 0]);
        assert_eq!(sent[1].code(), Command::UserGrpWrq.code());
        assert_eq!(sent[1].payload().as_ref(), &[12, 0, 0, 0, 2]);
        assert_eq!(sent[2].code(), Command::RefreshData.code());
    }

    #[tokio::test]
    async fn test_time_zone() {
        let (transport, mut device) = connected().await;
        let mut reply = vec![0u8, 0];
        for _ in 0..7 {
            reply.extend_from_slice(&[9, 0, 18, 0]);
        }
        transport.push_reply(Command::AckOk, SID, 3, &reply);

        let tz = get_time_zone(&mut device, 2).await.unwrap();
        assert_eq!(tz.days, [DayWindow::new(9, 0, 18, 0); 7]);
        assert_eq!(transport.sent_packets()[0].payload().as_ref(), &[2, 0, 0, 0]);
    }

    #[tokio::test]
    async fn test_missing_time_zone_is_rejected() {
        let (transport, mut device) = connected().await;
        transport.push_reply(Command::AckError, SID, 3, &[]);

        assert!(matches!(
            get_time_zone(&mut device, 40).await,
            Err(crate::Error::DeviceRejected { .. })
        ));
    }

    #[tokio::test]
    async fn test_set_group() {
        let (transport, mut device) = connected().await;
        transport.push_reply(Command::AckOk, SID, 3, &[]);
        transport.push_reply(Command::AckOk, SID, 4, &[]);

        let info = GroupInfo {
            group: 3,
            time_zones: vec![1],
            verify_style: 0,
            holidays: true,
        };
        set_group(&mut device, &info).await.unwrap();

        assert_eq!(
            transport.sent_packets()[0].payload().as_ref(),
            &[3, 1, 0, 0, 0, 0, 0, 0x80]
        );
    }

    #[tokio::test]
    async fn test_user_time_zones() {
        let (transport, mut device) = connected().await;
        transport.push_reply(Command::AckOk, SID, 3, &[0, 0, 0, 0, 0, 0, 0, 0]);

        let tzs = get_user_time_zones(&mut device, 8).await.unwrap();
        assert!(tzs.uses_group());
    }

    #[tokio::test]
    async fn test_unlock_and_door_state() {
        let (transport, mut device) = connected().await;
        transport.push_reply(Command::AckOk, SID, 3, &[]);
        transport.push_reply(Command::AckOk, SID, 4, &[1]);

        unlock_door(&mut device, 5).await.unwrap();
        assert_eq!(door_state(&mut device).await.unwrap(), 1);
        assert_eq!(transport.sent_packets()[0].payload().as_ref(), &[5, 0, 0, 0]);
    }
}

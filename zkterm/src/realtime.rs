//! Realtime events
//!
//! After [`enable_realtime`] the terminal pushes events on its own. While
//! listening, do not issue commands on the same device.
//!
//! ```no_run
//! use zkterm::{Device, RealtimeEvent, realtime};
//!
//! # async fn run(device: &mut Device) -> zkterm::Result<()> {
//! realtime::enable_realtime(device).await?;
//! loop {
//!     if let RealtimeEvent::Attendance { user_id, time, .. } = realtime::next_event(device).await? {
//!         println!("{} at {}", user_id, time);
//!     }
//! }
//! # }
//! ```

use bytes::Bytes;
use tracing::debug;
use zkterm_core::{Command, EventFlags};
use zkterm_types::RealtimeEvent;

use crate::{Device, Result};

/// Mask registered by [`enable_realtime`]
const ALL_EVENTS: [u8; 4] = [0xFF, 0xFF, 0x00, 0x00];

/// Register for every event type
pub async fn enable_realtime(device: &mut Device) -> Result<()> {
    device
        .command_ack(Command::RegEvent, Bytes::from_static(&ALL_EVENTS))
        .await?;
    debug!("Realtime events enabled");
    Ok(())
}

/// Wait for the next event, acknowledge it and decode it
pub async fn next_event(device: &mut Device) -> Result<RealtimeEvent> {
    let packet = device.receive_event().await?;
    Ok(RealtimeEvent::parse(packet.session_id(), packet.payload())?)
}

/// Wait for the score of the next fingerprint sample, skipping other events
pub async fn wait_for_finger_score(device: &mut Device) -> Result<u8> {
    loop {
        let packet = device.receive_event().await?;
        if packet.session_id() == EventFlags::FPFTR.bits() {
            if let RealtimeEvent::FingerScore(score) =
                RealtimeEvent::parse(packet.session_id(), packet.payload())?
            {
                return Ok(score);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{SID, connected};
    use pretty_assertions::assert_eq;
    use zkterm_core::Packet;

    fn event(flag: EventFlags, payload: &[u8]) -> Packet {
        Packet::with_payload(Command::RegEvent, flag.bits(), 0, payload.to_vec())
    }

    #[tokio::test]
    async fn test_enable_realtime() {
        let (transport, mut device) = connected().await;
        transport.push_reply(Command::AckOk, SID, 3, &[]);

        enable_realtime(&mut device).await.unwrap();
        assert_eq!(
            transport.sent_packets()[0].payload().as_ref(),
            &[0xFF, 0xFF, 0x00, 0x00]
        );
    }

    #[tokio::test]
    async fn test_next_event_decodes_and_acks() {
        let (transport, mut device) = connected().await;
        transport.push_packet(&event(EventFlags::VERIFY, &[7, 0, 0, 0, 1]));

        let decoded = next_event(&mut device).await.unwrap();
        assert_eq!(decoded, RealtimeEvent::Verify { user_sn: 7 });

        let acks = transport.sent_packets();
        assert_eq!(acks.len(), 1);
        assert_eq!(acks[0].reply_counter(), 0);
    }

    #[tokio::test]
    async fn test_wait_for_finger_score() {
        let (transport, mut device) = connected().await;
        transport.push_packet(&event(EventFlags::FINGER, &[]));
        transport.push_packet(&event(EventFlags::FPFTR, &[100]));

        assert_eq!(wait_for_finger_score(&mut device).await.unwrap(), 100);
        // Both events were acknowledged
        assert_eq!(transport.sent_packets().len(), 2);
        assert_eq!(device.last_event_code(), Some(EventFlags::FPFTR.bits()));
    }
}

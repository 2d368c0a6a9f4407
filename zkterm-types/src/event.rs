//! Realtime event payloads
//!
//! An event packet carries its flag in the session slot and a
//! flag-specific payload. [`RealtimeEvent::parse`] turns the pair into a
//! typed value; flags without a known layout are kept raw.

use bytes::Bytes;
use chrono::NaiveDateTime;
use zkterm_core::EventFlags;

use crate::error::{Result, ascii_field, ensure_len};
use crate::time::decode_event_stamp;

/// Extra detail carried by duress alarms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DuressAlarm {
    pub alarm_type: u16,
    pub user_sn: u16,
    pub match_type: u32,
}

/// Decoded realtime event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RealtimeEvent {
    /// A user was logged by the terminal
    Attendance {
        user_id: String,
        verify_type: u16,
        time: NaiveDateTime,
    },

    /// Finger placed on the sensor
    Finger,

    /// User enrolment finished
    EnrollUser,

    /// Fingerprint enrolment finished
    EnrollFinger {
        success: bool,
        user_id: String,
        finger_index: u8,
        template_size: u16,
    },

    /// Fingerprint sample scored (100 = usable, 0 = rejected)
    FingerScore(u8),

    /// User matched
    Verify { user_sn: u32 },

    Alarm {
        alarm_type: u32,
        duress: Option<DuressAlarm>,
    },

    Button,

    Unlock,

    /// Flag without a decoded layout
    Other { code: u16, payload: Bytes },
}

impl RealtimeEvent {
    /// Decode the payload of an event whose session slot held `code`
    pub fn parse(code: u16, payload: &[u8]) -> Result<Self> {
        let Some(flag) = EventFlags::from_bits(code).filter(|f| f.bits().count_ones() == 1) else {
            return Ok(Self::Other {
                code,
                payload: Bytes::copy_from_slice(payload),
            });
        };

        let event = if flag == EventFlags::ATTLOG {
            ensure_len("attendance event", payload, 32)?;
            Self::Attendance {
                user_id: ascii_field(&payload[0..9]),
                verify_type: u16::from_le_bytes([payload[24], payload[25]]),
                time: decode_event_stamp(&payload[26..32])?,
            }
        } else if flag == EventFlags::ENROLL_FINGER {
            ensure_len("enroll finger event", payload, 14)?;
            Self::EnrollFinger {
                success: u16::from_le_bytes([payload[0], payload[1]]) == 0,
                template_size: u16::from_le_bytes([payload[2], payload[3]]),
                user_id: ascii_field(&payload[4..13]),
                finger_index: payload[13],
            }
        } else if flag == EventFlags::FPFTR {
            ensure_len("finger score event", payload, 1)?;
            Self::FingerScore(payload[0])
        } else if flag == EventFlags::VERIFY {
            ensure_len("verify event", payload, 4)?;
            Self::Verify {
                user_sn: u32::from_le_bytes([payload[0], payload[1], payload[2], payload[3]]),
            }
        } else if flag == EventFlags::ALARM {
            ensure_len("alarm event", payload, 4)?;
            let duress = (payload.len() >= 12).then(|| DuressAlarm {
                alarm_type: u16::from_le_bytes([payload[4], payload[5]]),
                user_sn: u16::from_le_bytes([payload[6], payload[7]]),
                match_type: u32::from_le_bytes([payload[8], payload[9], payload[10], payload[11]]),
            });
            Self::Alarm {
                alarm_type: u32::from_le_bytes([payload[0], payload[1], payload[2], payload[3]]),
                duress,
            }
        } else if flag == EventFlags::FINGER {
            Self::Finger
        } else if flag == EventFlags::ENROLL_USER {
            Self::EnrollUser
        } else if flag == EventFlags::BUTTON {
            Self::Button
        } else if flag == EventFlags::UNLOCK {
            Self::Unlock
        } else {
            Self::Other {
                code,
                payload: Bytes::copy_from_slice(payload),
            }
        };

        Ok(event)
    }
}

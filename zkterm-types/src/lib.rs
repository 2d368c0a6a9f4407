//! Typed payloads for ZKTeco terminals
//!
//! Layouts of the structures carried inside packets: device identity and
//! status, the terminal clock, access-control records, users, logs and
//! realtime events.

pub mod access;
pub mod device_info;
pub mod error;
pub mod event;
pub mod record;
pub mod status;
pub mod time;
pub mod user;

pub use access::{DayWindow, GroupInfo, TimeZone, UnlockCombination, UserTimeZones};
pub use device_info::DeviceInfo;
pub use error::{Error, Result};
pub use event::{DuressAlarm, RealtimeEvent};
pub use record::{AttendanceRecord, OperationRecord};
pub use status::{DeviceStatus, StatusField};
pub use user::{FingerprintTemplate, Privilege, User};

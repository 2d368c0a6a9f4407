//! # zkterm
//!
//! Client for the binary protocol spoken by standalone ZKTeco biometric
//! terminals.
//!
//! ## Features
//!
//! - Async/await API using Tokio
//! - Reassembly of packets split or coalesced by the stream
//! - All three dataset transfer shapes, including the streamed ready/data/free exchange
//! - Realtime event listening
//! - Command groups for control, terminal parameters, access control and data
//!
//! ## Quick Start
//!
//! ```no_run
//! use zkterm::{Device, data, terminal};
//!
//! #[tokio::main]
//! async fn main() -> zkterm::Result<()> {
//!     let mut device = Device::new("192.168.1.201", 4370);
//!     device.connect().await?;
//!
//!     let info = terminal::device_info(&mut device).await?;
//!     println!("{}", info);
//!
//!     for user in data::read_users(&mut device).await? {
//!         println!("{}", user);
//!     }
//!
//!     device.disconnect().await?;
//!     Ok(())
//! }
//! ```

pub mod access;
pub mod control;
pub mod data;
pub mod device;
pub mod error;
pub mod realtime;
pub mod terminal;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports
pub use device::Device;
pub use error::{ConnectError, Error, Result};

pub use zkterm_core::{Command, DEFAULT_PORT, EventFlags, Packet, constants::VerifyStyle};
pub use zkterm_transport::{TcpTransport, Transport};
pub use zkterm_types::{
    AttendanceRecord, DeviceInfo, DeviceStatus, FingerprintTemplate, GroupInfo, OperationRecord,
    RealtimeEvent, StatusField, TimeZone, UnlockCombination, User, UserTimeZones,
};

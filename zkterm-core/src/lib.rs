//! # zkterm-core
//!
//! Core protocol implementation for ZKTeco standalone terminals.
//!
//! This crate provides the I/O-free protocol primitives:
//! - Checksum calculation
//! - Packet structure and encoding/decoding
//! - Command definitions
//! - Session bookkeeping (session id, reply counter, last reply)
//! - The bulk dataset transfer state machine

pub mod checksum;
pub mod command;
pub mod constants;
pub mod error;
pub mod packet;
pub mod session;
pub mod transfer;

pub use command::Command;
pub use constants::{DEFAULT_PORT, EventFlags, HEADER_SIZE};
pub use error::{Error, Result};
pub use packet::Packet;
pub use session::{LastReply, Session, SessionState};
pub use transfer::{LongReply, Step, TransferState};

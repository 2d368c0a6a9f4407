//! Bulk dataset transfer
//!
//! Terminals answer a dataset request in one of three ways, told apart by
//! the code of the first reply:
//!
//! | First reply        | Shape                                              |
//! |--------------------|----------------------------------------------------|
//! | `CMD_DATA`         | dataset inline in that reply                       |
//! | `CMD_PREPARE_DATA` | one more packet carries the dataset, then an ACK   |
//! | `CMD_ACK_OK`       | payload announces a size; ready/data.../free steps |
//!
//! This module holds the I/O-free half of the exchange: classification of
//! the first reply and accumulation of streamed data packets.

use bytes::{Bytes, BytesMut};
use tracing::warn;

use crate::{
    command::{self, Command},
    constants::{DEFAULT_DATASET_READ, TRANSFER_SIZE_OFFSET},
    error::{Error, Result},
    packet::Packet,
};

/// How the terminal is going to deliver a dataset
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LongReply {
    /// The dataset arrived in the first reply
    Inline(Bytes),

    /// The next packet carries the whole dataset, followed by an acknowledge
    Prepared,

    /// The dataset streams in `CMD_DATA` packets after a ready handshake
    Streamed { size: u32 },
}

impl LongReply {
    /// Classify the first reply of a dataset request
    ///
    /// # Errors
    ///
    /// - [`Error::TruncatedPayload`] if an ACK is too short to carry a size
    /// - [`Error::UnexpectedReply`] for any other reply code
    pub fn classify(first: &Packet) -> Result<Self> {
        match first.command() {
            Some(Command::Data) => Ok(Self::Inline(first.payload().clone())),
            Some(Command::PrepareData) => Ok(Self::Prepared),
            Some(Command::AckOk) => {
                let end = TRANSFER_SIZE_OFFSET + 4;
                let size = first
                    .payload()
                    .get(TRANSFER_SIZE_OFFSET..end)
                    .ok_or(Error::TruncatedPayload {
                        expected: end,
                        actual: first.payload().len(),
                    })?;
                let size = u32::from_le_bytes([size[0], size[1], size[2], size[3]]);
                Ok(Self::Streamed { size })
            }
            _ => Err(Error::UnexpectedReply {
                reply: command::describe(first.code()),
                context: "waiting for a dataset",
            }),
        }
    }
}

/// Payload of `CMD_DATA_RDY`: four zero bytes, then the total size
pub fn ready_payload(size: u32) -> [u8; 8] {
    let mut payload = [0u8; 8];
    payload[4..].copy_from_slice(&size.to_le_bytes());
    payload
}

/// Most a transfer reserves before any data has arrived
const MAX_PREALLOCATION: usize = DEFAULT_DATASET_READ * 16;

/// Outcome of feeding one packet to a [`TransferState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// A data packet was appended; more may follow
    Continue,

    /// A non-data packet ended the stream
    Finished,
}

/// Accumulator for one streamed dataset
///
/// Lives only for the duration of a single transfer.
#[derive(Debug)]
pub struct TransferState {
    expected_size: usize,
    buffer: BytesMut,
}

impl TransferState {
    /// Start accumulating a dataset of the announced size
    pub fn new(expected_size: u32) -> Self {
        let expected_size = expected_size as usize;
        Self {
            expected_size,
            buffer: BytesMut::with_capacity(expected_size.min(MAX_PREALLOCATION)),
        }
    }

    /// Bytes announced by the terminal
    pub fn expected_size(&self) -> usize {
        self.expected_size
    }

    /// Bytes received so far
    pub fn accumulated(&self) -> usize {
        self.buffer.len()
    }

    /// Feed the next packet of the stream
    pub fn accept(&mut self, packet: &Packet) -> Step {
        if packet.code() == Command::Data.code() {
            self.buffer.extend_from_slice(packet.payload());
            Step::Continue
        } else {
            Step::Finished
        }
    }

    /// Close the transfer and hand out the dataset
    ///
    /// # Errors
    ///
    /// [`Error::TruncatedPayload`] if fewer bytes arrived than announced.
    pub fn finish(self) -> Result<Bytes> {
        let accumulated = self.accumulated();

        if accumulated < self.expected_size {
            return Err(Error::TruncatedPayload {
                expected: self.expected_size,
                actual: accumulated,
            });
        }

        if accumulated > self.expected_size {
            warn!(
                expected = self.expected_size,
                accumulated, "Terminal sent more data than announced"
            );
        }

        Ok(self.buffer.freeze())
    }
}

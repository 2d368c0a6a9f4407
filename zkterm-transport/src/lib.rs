//! Transport layer for the terminal protocol
//!
//! Provides the byte-stream seam between a client session and a terminal.
//! Packet framing lives above this layer; a transport only moves bytes.

pub mod error;
pub mod tcp;

pub use error::{Error, Result};
pub use tcp::TcpTransport;

use async_trait::async_trait;
use bytes::BytesMut;

/// Byte-stream connection to a terminal
///
/// Reads are allowed to return fewer bytes than a full packet; callers
/// reassemble frames themselves.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open the connection
    async fn connect(&mut self) -> Result<()>;

    /// Close the connection
    async fn disconnect(&mut self) -> Result<()>;

    /// Check if connected
    fn is_connected(&self) -> bool;

    /// Write all of `data`
    async fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Read at most `max_bytes`, waiting until at least one byte arrives
    ///
    /// End of stream is reported as [`Error::ConnectionClosed`].
    async fn receive(&mut self, max_bytes: usize) -> Result<BytesMut>;

    /// Get remote address
    fn remote_addr(&self) -> String;
}

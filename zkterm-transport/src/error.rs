//! Transport errors
//!
//! Every variant is fatal to the session that owns the transport.

use std::io;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Operation needs an open stream
    #[error("Not connected")]
    NotConnected,

    #[error("Already connected")]
    AlreadyConnected,

    /// Stream could not be opened in time
    #[error("Connection timeout after {0:?}")]
    ConnectionTimeout(std::time::Duration),

    /// No bytes arrived within the stream read deadline
    #[error("Read timeout after {0:?}")]
    ReadTimeout(std::time::Duration),

    /// Remote closed the stream (EOF)
    #[error("Connection closed by remote")]
    ConnectionClosed,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}

impl Error {
    /// Deadline expiry rather than a broken stream
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::ConnectionTimeout(_) | Self::ReadTimeout(_))
    }
}

//! Client errors
//!
//! Lower layers keep their own error types; this enum wraps them and adds
//! the failures that only exist once a session is involved.

use zkterm_core::command;

pub type Result<T> = std::result::Result<T, Error>;

/// Why a session could not be opened
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    /// The stream did not open
    #[error("stream could not be opened: {0}")]
    Stream(#[source] zkterm_transport::Error),

    /// The handshake was answered with something other than an ACK
    #[error("handshake answered with {reply}")]
    Rejected { reply: String },

    /// The connect exchange broke down after the stream opened
    #[error("handshake failed: {0}")]
    Handshake(#[source] Box<Error>),
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Connect failed: {0}")]
    Connect(#[from] ConnectError),

    /// Malformed packet or broken exchange
    #[error("Protocol error: {0}")]
    Protocol(#[from] zkterm_core::Error),

    /// The stream failed; the session is gone
    #[error("Transport error: {0}")]
    Transport(#[from] zkterm_transport::Error),

    /// A payload structure could not be read or built
    #[error("Type error: {0}")]
    Types(#[from] zkterm_types::Error),

    #[error("Device not connected")]
    NotConnected,

    /// The terminal answered a command with something other than an ACK
    #[error("{command} rejected by terminal: {reply}")]
    DeviceRejected { command: String, reply: String },
}

impl Error {
    /// Report a failure inside the connect exchange as a connect error
    pub(crate) fn during_connect(self) -> Self {
        match self {
            Self::Connect(_) => self,
            other => ConnectError::Handshake(Box::new(other)).into(),
        }
    }

    pub(crate) fn rejected(command: impl Into<u16>, reply: u16) -> Self {
        Self::DeviceRejected {
            command: command::describe(command.into()),
            reply: command::describe(reply),
        }
    }

    /// Wrong magic tag or impossible framing
    pub fn is_format_error(&self) -> bool {
        matches!(self, Self::Protocol(e) if e.is_format_error())
    }

    /// Corrupt packet
    pub fn is_checksum_error(&self) -> bool {
        matches!(self, Self::Protocol(e) if e.is_checksum_error())
    }

    /// Whether the session has to be re-established before the next command
    pub fn is_fatal_to_session(&self) -> bool {
        match self {
            Self::Connect(_) | Self::Transport(_) | Self::NotConnected => true,
            Self::Protocol(e) => e.desynchronizes_session(),
            Self::Types(_) | Self::DeviceRejected { .. } => false,
        }
    }
}

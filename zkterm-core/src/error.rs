//! Error types for zkterm-core

/// Result type alias for zkterm-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core protocol errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Packet is too short to be valid
    #[error("Packet too short: expected at least {expected} bytes, got {actual} bytes")]
    PacketTooShort { expected: usize, actual: usize },

    /// First four bytes are not the stream magic
    #[error("Bad start tag: {found:02X?}")]
    BadTag { found: [u8; 4] },

    /// Size field cannot describe a valid packet
    #[error("Invalid size field: {0}")]
    InvalidSize(u16),

    /// Checksum over the inner header and payload is not zero
    #[error("Bad checksum: span sums to 0x{residue:04X}")]
    BadChecksum { residue: u16 },

    /// Unknown command code
    #[error("Unknown command code: {0}")]
    UnknownCommand(u16),

    /// Payload does not fit the 16-bit size field
    #[error("Payload too large: {size} bytes (max: {max} bytes)")]
    PayloadTooLarge { size: usize, max: usize },

    /// A structure inside a payload is shorter than its layout
    #[error("Truncated payload: expected {expected} bytes, got {actual} bytes")]
    TruncatedPayload { expected: usize, actual: usize },

    /// Reply code does not fit the exchange in progress
    #[error("Unexpected reply {reply} while {context}")]
    UnexpectedReply { reply: String, context: &'static str },

    /// Reply does not echo the counter its command was stamped with
    #[error("Reply counter mismatch: expected {expected}, got {actual}")]
    ReplyCounterMismatch { expected: u16, actual: u16 },

    /// Invalid session state
    #[error("Invalid session state: {0}")]
    InvalidSessionState(String),
}

impl Error {
    /// Bad framing: wrong magic, impossible size or short buffer
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            Self::BadTag { .. } | Self::InvalidSize(_) | Self::PacketTooShort { .. }
        )
    }

    /// Corrupt packet
    pub fn is_checksum_error(&self) -> bool {
        matches!(self, Self::BadChecksum { .. })
    }

    /// The session can no longer be trusted to be in step with the terminal
    pub fn desynchronizes_session(&self) -> bool {
        matches!(
            self,
            Self::ReplyCounterMismatch { .. } | Self::InvalidSessionState(_)
        )
    }
}

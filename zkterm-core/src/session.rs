//! Session bookkeeping for the terminal protocol
//!
//! A session tracks:
//! - Session ID (assigned by the terminal on connect)
//! - Reply counter (advanced once per counted reply)
//! - The fields of the last reply and the last event
//!
//! The session never touches the stream. The transport stamps outgoing
//! packets through [`Session::stamp`] and reports every received packet back
//! through one of the `record_*` methods, which are the only writers of the
//! session id and reply counter.

use bytes::Bytes;
use tracing::trace;

use crate::{
    command::{self, Command},
    error::{Error, Result},
    packet::Packet,
};

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Not connected
    Disconnected,

    /// Connect handshake acknowledged
    Connected,
}

/// Fields of the last decoded reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastReply {
    /// Reply code
    pub code: u16,

    /// Session slot of the reply (event type on events, state on some replies)
    pub session_code: u16,

    /// Reply counter as sent by the terminal
    pub reply_counter: u16,

    /// Payload
    pub payload: Bytes,
}

impl From<&Packet> for LastReply {
    fn from(packet: &Packet) -> Self {
        Self {
            code: packet.code(),
            session_code: packet.session_id(),
            reply_counter: packet.reply_counter(),
            payload: packet.payload().clone(),
        }
    }
}

/// Session state for one terminal connection
///
/// Owned by exactly one client; not shared across tasks.
#[derive(Debug, Clone)]
pub struct Session {
    session_id: u16,
    reply_counter: u16,
    state: SessionState,
    last_sent_counter: Option<u16>,
    last_reply: Option<LastReply>,
    last_event_code: Option<u16>,
}

impl Session {
    /// Reply counter of a fresh session
    pub const INITIAL_REPLY_COUNTER: u16 = 0;

    /// Reply counter used on event acknowledgements
    pub const EVENT_ACK_COUNTER: u16 = 0;

    /// Create a new disconnected session
    pub fn new() -> Self {
        Self {
            session_id: 0,
            reply_counter: Self::INITIAL_REPLY_COUNTER,
            state: SessionState::Disconnected,
            last_sent_counter: None,
            last_reply: None,
            last_event_code: None,
        }
    }

    /// Current session ID (0 before connect)
    pub fn session_id(&self) -> u16 {
        self.session_id
    }

    /// Counter the next outgoing command will carry
    pub fn reply_counter(&self) -> u16 {
        self.reply_counter
    }

    /// Get current state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Check if connected
    pub fn is_connected(&self) -> bool {
        self.state == SessionState::Connected
    }

    /// Fields of the last reply, if any
    pub fn last_reply(&self) -> Option<&LastReply> {
        self.last_reply.as_ref()
    }

    /// Code of the last reply
    pub fn last_reply_code(&self) -> Option<u16> {
        self.last_reply.as_ref().map(|r| r.code)
    }

    /// Session slot of the last reply
    pub fn last_session_code(&self) -> Option<u16> {
        self.last_reply.as_ref().map(|r| r.session_code)
    }

    /// Payload of the last reply (empty if none)
    pub fn last_payload(&self) -> Bytes {
        self.last_reply
            .as_ref()
            .map(|r| r.payload.clone())
            .unwrap_or_default()
    }

    /// Type of the last received event
    pub fn last_event_code(&self) -> Option<u16> {
        self.last_event_code
    }

    /// Check whether the last reply was `CMD_ACK_OK`
    pub fn last_reply_is_ack(&self) -> bool {
        self.last_reply_code() == Some(Command::AckOk.code())
    }

    /// Build an outgoing packet with the current session id and counter
    pub fn stamp(&mut self, code: impl Into<u16>, payload: impl Into<Bytes>) -> Packet {
        let packet = Packet::with_payload(code, self.session_id, self.reply_counter, payload);
        self.last_sent_counter = Some(self.reply_counter);
        packet
    }

    /// Build the acknowledgement for a received event
    ///
    /// Events are outside the reply sequence; the acknowledge always
    /// carries counter 0 and leaves the running counter alone.
    pub fn event_ack(&self) -> Packet {
        Packet::new(Command::AckOk, self.session_id, Self::EVENT_ACK_COUNTER)
    }

    /// Record a reply to the last stamped command and advance the counter
    ///
    /// With `check_echo`, the reply must carry the counter its command was
    /// stamped with; on mismatch nothing is recorded.
    pub fn record_reply(&mut self, packet: &Packet, check_echo: bool) -> Result<()> {
        if check_echo {
            if let Some(expected) = self.last_sent_counter {
                if packet.reply_counter() != expected {
                    return Err(Error::ReplyCounterMismatch {
                        expected,
                        actual: packet.reply_counter(),
                    });
                }
            }
        }

        self.record_counted(packet);
        Ok(())
    }

    /// Record a packet that counts against the sequence, without echo check
    pub fn record_counted(&mut self, packet: &Packet) {
        self.last_reply = Some(LastReply::from(packet));
        self.reply_counter = self.reply_counter.wrapping_add(1);

        trace!(
            code = %command::describe(packet.code()),
            reply_counter = self.reply_counter,
            "Recorded counted reply"
        );
    }

    /// Record a packet that does not count against the sequence
    pub fn record_uncounted(&mut self, packet: &Packet) {
        self.last_reply = Some(LastReply::from(packet));
    }

    /// Record a realtime event; its type travels in the session slot
    pub fn record_event(&mut self, packet: &Packet) {
        self.last_event_code = Some(packet.session_id());
        self.last_reply = Some(LastReply::from(packet));
    }

    /// Adopt the session id assigned by the terminal
    pub fn establish(&mut self, session_id: u16) -> Result<()> {
        if self.state != SessionState::Disconnected {
            return Err(Error::InvalidSessionState(format!(
                "Cannot establish from state: {:?}",
                self.state
            )));
        }

        self.session_id = session_id;
        self.state = SessionState::Connected;
        Ok(())
    }

    /// Reset to a fresh disconnected session
    pub fn close(&mut self) {
        *self = Self::new();
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

//! Terminal packet structure and encoding/decoding

use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;

use crate::{
    checksum,
    command::{self, Command},
    constants::{HEADER_SIZE, INNER_HEADER_SIZE, PREFIX_SIZE, START_TAG},
    error::{Error, Result},
};

/// Terminal protocol packet
///
/// # Packet Structure
///
/// ```text
/// ┌──────────┬────────┬──────────┬─────────┬──────────┬───────────┬─────────┬─────────┐
/// │   Tag    │  Size  │ Reserved │  Code   │ Checksum │ SessionID │ ReplyNo │ Payload │
/// │ 4 bytes  │ 2 bytes│ 2 bytes  │ 2 bytes │ 2 bytes  │  2 bytes  │ 2 bytes │ N bytes │
/// └──────────┴────────┴──────────┴─────────┴──────────┴───────────┴─────────┴─────────┘
///  ◄──── stream prefix ────────►◄─────────── checksum span, `Size` bytes ──────────────►
/// ```
///
/// All multi-byte values are little-endian. `Size` counts everything after
/// the prefix, so the payload is `Size - 8` bytes long.
///
/// A packet cannot be changed once built, so its checksum always matches
/// its other fields.
///
/// # Examples
///
/// ```
/// use zkterm_core::{Command, Packet};
///
/// let packet = Packet::new(Command::Connect, 0, 0);
/// let encoded = packet.encode().unwrap();
///
/// let decoded = Packet::decode(&encoded).unwrap();
/// assert_eq!(decoded.command(), Some(Command::Connect));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Packet {
    code: u16,
    checksum: u16,
    session_id: u16,
    reply_counter: u16,
    payload: Bytes,
}

impl Packet {
    /// Largest payload the 16-bit size field can describe
    pub const MAX_PAYLOAD_SIZE: usize = u16::MAX as usize - INNER_HEADER_SIZE;

    /// Create a new packet with empty payload
    pub fn new(code: impl Into<u16>, session_id: u16, reply_counter: u16) -> Self {
        Self::with_payload(code, session_id, reply_counter, Bytes::new())
    }

    /// Create a packet with payload
    ///
    /// # Examples
    ///
    /// ```
    /// use zkterm_core::{Command, Packet};
    ///
    /// let packet = Packet::with_payload(Command::OptionsRrq, 1234, 7, &b"~Platform\0"[..]);
    /// assert_eq!(packet.payload().len(), 10);
    /// ```
    pub fn with_payload(
        code: impl Into<u16>,
        session_id: u16,
        reply_counter: u16,
        payload: impl Into<Bytes>,
    ) -> Self {
        let code = code.into();
        let payload = payload.into();
        let checksum = span_checksum(code, session_id, reply_counter, &payload);
        Self {
            code,
            checksum,
            session_id,
            reply_counter,
            payload,
        }
    }

    /// Command code, or reply code on responses
    pub fn code(&self) -> u16 {
        self.code
    }

    /// Checksum over the span from offset 8, as stamped on the wire
    pub fn checksum(&self) -> u16 {
        self.checksum
    }

    /// Session identifier; carries the event type on realtime events
    pub fn session_id(&self) -> u16 {
        self.session_id
    }

    pub fn reply_counter(&self) -> u16 {
        self.reply_counter
    }

    /// Command-specific data
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Take the payload, dropping the header fields
    pub fn into_payload(self) -> Bytes {
        self.payload
    }

    /// Typed command for the code slot, if it is a known code
    pub fn command(&self) -> Option<Command> {
        Command::try_from(self.code).ok()
    }

    /// Encode the packet for the stream
    ///
    /// The checksum is always recomputed from the current fields.
    ///
    /// # Errors
    ///
    /// [`Error::PayloadTooLarge`] if the payload cannot be described by the
    /// 16-bit size field.
    pub fn encode(&self) -> Result<BytesMut> {
        encode(self.code, &self.payload, self.session_id, self.reply_counter)
    }

    /// Decode one packet from the start of `buf`
    ///
    /// Bytes past the frame announced by the size field are ignored; the
    /// input is never modified.
    ///
    /// # Errors
    ///
    /// - [`Error::BadTag`] if the first four bytes are not the magic tag
    /// - [`Error::PacketTooShort`] / [`Error::InvalidSize`] on framing errors
    /// - [`Error::BadChecksum`] if the span from offset 8 does not sum to zero
    pub fn decode(buf: &[u8]) -> Result<Self> {
        let frame_len = Self::frame_len(buf)?.ok_or(Error::PacketTooShort {
            expected: HEADER_SIZE,
            actual: buf.len(),
        })?;

        if buf.len() < frame_len {
            return Err(Error::PacketTooShort {
                expected: frame_len,
                actual: buf.len(),
            });
        }

        let span = &buf[PREFIX_SIZE..frame_len];
        if !checksum::is_valid_payload(span) {
            return Err(Error::BadChecksum {
                residue: checksum::checksum16(span),
            });
        }

        let field = |offset: usize| u16::from_le_bytes([buf[offset], buf[offset + 1]]);

        Ok(Self {
            code: field(8),
            checksum: field(10),
            session_id: field(12),
            reply_counter: field(14),
            payload: Bytes::copy_from_slice(&buf[HEADER_SIZE..frame_len]),
        })
    }

    /// Length of the frame at the start of a receive buffer
    ///
    /// Returns `Ok(None)` while the 8-byte stream prefix is incomplete, and
    /// the total frame length (prefix included) once it is known.
    pub fn frame_len(buf: &[u8]) -> Result<Option<usize>> {
        if buf.len() >= START_TAG.len() && buf[..START_TAG.len()] != START_TAG {
            let mut found = [0u8; 4];
            found.copy_from_slice(&buf[..4]);
            return Err(Error::BadTag { found });
        }

        if buf.len() < PREFIX_SIZE {
            return Ok(None);
        }

        let size = u16::from_le_bytes([buf[4], buf[5]]);
        if (size as usize) < INNER_HEADER_SIZE {
            return Err(Error::InvalidSize(size));
        }

        Ok(Some(PREFIX_SIZE + size as usize))
    }

    /// Check if this is a reply packet (ACK family)
    pub fn is_response(&self) -> bool {
        self.command().is_some_and(Command::is_response)
    }

    /// Check if this is a success reply
    pub fn is_success(&self) -> bool {
        self.command().is_some_and(Command::is_success)
    }

    /// Check if this is an error reply
    pub fn is_error(&self) -> bool {
        self.command().is_some_and(Command::is_error)
    }

    /// Total encoded size
    pub fn size(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }
}

/// Encode a packet from its fields
///
/// Writes the tag, zeroed size/reserved/checksum slots, the code, session id,
/// reply counter and payload, then backpatches the size with `len - 8` and
/// the checksum with the checksum of everything from offset 8.
pub fn encode(
    code: u16,
    payload: &[u8],
    session_id: u16,
    reply_counter: u16,
) -> Result<BytesMut> {
    if payload.len() > Packet::MAX_PAYLOAD_SIZE {
        return Err(Error::PayloadTooLarge {
            size: payload.len(),
            max: Packet::MAX_PAYLOAD_SIZE,
        });
    }

    let mut buf = BytesMut::with_capacity(HEADER_SIZE + payload.len());
    buf.put_slice(&START_TAG);
    buf.put_u16_le(0); // size
    buf.put_u16_le(0); // reserved
    buf.put_u16_le(code);
    buf.put_u16_le(0); // checksum
    buf.put_u16_le(session_id);
    buf.put_u16_le(reply_counter);
    buf.put_slice(payload);

    let size = (buf.len() - PREFIX_SIZE) as u16;
    buf[4..6].copy_from_slice(&size.to_le_bytes());

    let checksum = checksum::checksum16(&buf[PREFIX_SIZE..]);
    buf[10..12].copy_from_slice(&checksum.to_le_bytes());

    Ok(buf)
}

fn span_checksum(code: u16, session_id: u16, reply_counter: u16, payload: &[u8]) -> u16 {
    let mut span = Vec::with_capacity(INNER_HEADER_SIZE + payload.len());
    span.extend_from_slice(&code.to_le_bytes());
    span.extend_from_slice(&[0, 0]);
    span.extend_from_slice(&session_id.to_le_bytes());
    span.extend_from_slice(&reply_counter.to_le_bytes());
    span.extend_from_slice(payload);
    checksum::checksum16(&span)
}

impl fmt::Debug for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Packet")
            .field("code", &command::describe(self.code))
            .field("session_id", &format!("0x{:04X}", self.session_id))
            .field("reply_counter", &self.reply_counter)
            .field("checksum", &format!("0x{:04X}", self.checksum))
            .field("payload_len", &self.payload.len())
            .finish()
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Packet[{}](session={}, reply={}, len={})",
            command::describe(self.code),
            self.session_id,
            self.reply_counter,
            self.payload.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn roundtrip(len: usize) {
        let payload: Vec<u8> = (0..len).map(|i| (i * 7 + 3) as u8).collect();
        let encoded = encode(Command::UserWrq.code(), &payload, 0xF1F2, 42).unwrap();
        let decoded = Packet::decode(&encoded).unwrap();

        assert_eq!(decoded.code(), Command::UserWrq.code());
        assert_eq!(decoded.session_id(), 0xF1F2);
        assert_eq!(decoded.reply_counter(), 42);
        assert_eq!(decoded.payload().as_ref(), payload.as_slice());
    }

    #[test]
    fn test_roundtrip_payload_sizes() {
        for len in [0, 1, 71, 72, 4096] {
            roundtrip(len);
        }
    }

    #[test]
    fn test_connect_layout() {
        let encoded = Packet::new(Command::Connect, 0, 0).encode().unwrap();

        assert_eq!(
            encoded.as_ref(),
            &[
                0x50, 0x50, 0x82, 0x7D, // tag
                0x08, 0x00, // size
                0x00, 0x00, // reserved
                0xE8, 0x03, // CMD_CONNECT
                0x17, 0xFC, // checksum
                0x00, 0x00, // session
                0x00, 0x00, // reply counter
            ][..]
        );
    }

    #[test]
    fn test_size_field_excludes_prefix() {
        let encoded = encode(2000, &[1, 2, 3], 1, 1).unwrap();
        assert_eq!(u16::from_le_bytes([encoded[4], encoded[5]]), 11);
        assert_eq!(encoded.len(), 19);
    }

    #[test]
    fn test_constructor_checksum_matches_wire() {
        let packet = Packet::with_payload(Command::AckOk, 0x1234, 9, vec![9, 8, 7]);
        let encoded = packet.encode().unwrap();
        assert_eq!(
            u16::from_le_bytes([encoded[10], encoded[11]]),
            packet.checksum()
        );
        assert_eq!(Packet::decode(&encoded).unwrap(), packet);
    }

    #[test]
    fn test_accessors_reflect_wire_fields() {
        let encoded = encode(1501, &[4, 5], 0x0A0B, 77).unwrap();
        let decoded = Packet::decode(&encoded).unwrap();

        assert_eq!(decoded.code(), 1501);
        assert_eq!(decoded.session_id(), 0x0A0B);
        assert_eq!(decoded.reply_counter(), 77);
        assert_eq!(
            decoded.checksum(),
            u16::from_le_bytes([encoded[10], encoded[11]])
        );
        assert_eq!(decoded, Packet::with_payload(1501u16, 0x0A0B, 77, vec![4, 5]));
        assert_eq!(decoded.into_payload().as_ref(), &[4, 5]);
    }

    #[test]
    fn test_bad_tag() {
        let mut encoded = Packet::new(Command::AckOk, 1, 1).encode().unwrap();
        encoded[0] = 0x51;

        let err = Packet::decode(&encoded).unwrap_err();
        assert!(err.is_format_error());
        assert!(matches!(err, Error::BadTag { found } if found == [0x51, 0x50, 0x82, 0x7D]));
    }

    #[test]
    fn test_bad_checksum() {
        let mut encoded = Packet::with_payload(Command::AckOk, 1, 1, vec![1, 2])
            .encode()
            .unwrap();
        encoded[17] ^= 0x40;

        let err = Packet::decode(&encoded).unwrap_err();
        assert!(err.is_checksum_error());
    }

    #[test]
    fn test_packet_too_short() {
        assert!(matches!(
            Packet::decode(&[0x50, 0x50]),
            Err(Error::PacketTooShort { .. })
        ));

        let encoded = encode(2000, &[1, 2, 3, 4], 1, 1).unwrap();
        assert!(matches!(
            Packet::decode(&encoded[..encoded.len() - 1]),
            Err(Error::PacketTooShort { expected: 20, actual: 19 })
        ));
    }

    #[test]
    fn test_invalid_size() {
        let mut encoded = Packet::new(Command::AckOk, 1, 1).encode().unwrap();
        encoded[4] = 4;
        assert!(matches!(Packet::decode(&encoded), Err(Error::InvalidSize(4))));
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        let first = encode(1501, &[0xAA; 5], 3, 4).unwrap();
        let second = encode(2000, &[], 3, 5).unwrap();
        let mut joined = first.clone();
        joined.extend_from_slice(&second);

        assert_eq!(Packet::frame_len(&joined).unwrap(), Some(first.len()));
        assert_eq!(Packet::decode(&joined).unwrap().payload().as_ref(), &[0xAA; 5]);
    }

    #[test]
    fn test_frame_len_partial() {
        let encoded = encode(2000, &[1, 2, 3], 1, 1).unwrap();
        assert_eq!(Packet::frame_len(&encoded[..3]).unwrap(), None);
        assert_eq!(Packet::frame_len(&encoded[..7]).unwrap(), None);
        assert_eq!(Packet::frame_len(&encoded[..8]).unwrap(), Some(19));
    }

    #[test]
    fn test_payload_too_large() {
        let payload = vec![0u8; Packet::MAX_PAYLOAD_SIZE + 1];
        assert!(matches!(
            encode(1501, &payload, 0, 0),
            Err(Error::PayloadTooLarge { .. })
        ));
        assert!(encode(1501, &payload[1..], 0, 0).is_ok());
    }

    #[test]
    fn test_unknown_code_is_kept() {
        let encoded = encode(0x4242, &[], 1, 1).unwrap();
        let decoded = Packet::decode(&encoded).unwrap();
        assert_eq!(decoded.code(), 0x4242);
        assert_eq!(decoded.command(), None);
        assert!(!decoded.is_response());
    }

    #[test]
    fn test_is_response() {
        assert!(Packet::new(Command::AckOk, 0, 0).is_response());
        assert!(Packet::new(Command::AckError, 0, 0).is_error());
        assert!(Packet::new(Command::AckData, 0, 0).is_success());
        assert!(!Packet::new(Command::Connect, 0, 0).is_response());
    }

    proptest! {
        #[test]
        fn prop_roundtrip(
            code in any::<u16>(),
            session_id in any::<u16>(),
            reply_counter in any::<u16>(),
            payload in proptest::collection::vec(any::<u8>(), 0..2048),
        ) {
            let encoded = encode(code, &payload, session_id, reply_counter).unwrap();
            prop_assert!(checksum::is_valid_payload(&encoded[PREFIX_SIZE..]));

            let decoded = Packet::decode(&encoded).unwrap();
            prop_assert_eq!(decoded.code(), code);
            prop_assert_eq!(decoded.session_id(), session_id);
            prop_assert_eq!(decoded.reply_counter(), reply_counter);
            prop_assert_eq!(decoded.payload().as_ref(), payload.as_slice());
        }

        #[test]
        fn prop_flipped_bit_fails_checksum(
            payload in proptest::collection::vec(any::<u8>(), 0..256),
            position in any::<prop::sample::Index>(),
            bit in 0u8..8,
        ) {
            let mut encoded = encode(2000, &payload, 0x0102, 3).unwrap();
            let offset = PREFIX_SIZE + position.index(encoded.len() - PREFIX_SIZE);
            encoded[offset] ^= 1 << bit;

            let err = Packet::decode(&encoded).unwrap_err();
            prop_assert!(err.is_checksum_error());
        }

        #[test]
        fn prop_bad_tag_regardless_of_payload(
            tag in any::<[u8; 4]>().prop_filter("not the magic", |t| *t != START_TAG),
            payload in proptest::collection::vec(any::<u8>(), 0..128),
        ) {
            let mut encoded = encode(2000, &payload, 1, 1).unwrap();
            encoded[..4].copy_from_slice(&tag);

            let err = Packet::decode(&encoded).unwrap_err();
            prop_assert!(err.is_format_error());
            prop_assert!(
                matches!(err, Error::BadTag { .. }),
                "expected BadTag, got {:?}",
                err
            );
        }
    }
}

//! Scripted in-memory transport and helpers for session tests

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use zkterm_core::{Command, Packet};
use zkterm_transport::{Error, Result, Transport};

use crate::Device;

/// Session id handed out by the scripted terminal
pub(crate) const SID: u16 = 0x2F41;

/// Queue the replies of a full connect: handshake, option write, refresh
pub(crate) fn script_connect(transport: &ScriptedTransport) {
    transport.push_reply(Command::AckOk, SID, 0, &[]);
    transport.push_reply(Command::AckOk, SID, 1, &[]);
    transport.push_reply(Command::AckOk, SID, 2, &[]);
}

/// A device past its connect handshake, reply counter at 3, nothing sent yet
pub(crate) async fn connected() -> (ScriptedTransport, Device) {
    let transport = ScriptedTransport::new();
    script_connect(&transport);

    let mut device = Device::with_transport(Box::new(transport.clone()));
    device.connect().await.unwrap();
    transport.clear_sent();

    (transport, device)
}

#[derive(Debug)]
enum Inbound {
    Chunk(Bytes),
    Fail,
}

#[derive(Debug, Default)]
struct Script {
    connected: bool,
    refuse_connect: bool,
    fail_sends: bool,
    inbound: VecDeque<Inbound>,
    sent: Vec<Bytes>,
}

/// Replays queued inbound chunks and records every outbound write
///
/// Clones share the same script, so a test keeps one handle while the
/// device owns another.
#[derive(Debug, Clone, Default)]
pub(crate) struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue raw bytes, delivered as one read (split if the read is smaller)
    pub fn push_chunk(&self, bytes: impl Into<Bytes>) {
        self.script
            .lock()
            .unwrap()
            .inbound
            .push_back(Inbound::Chunk(bytes.into()));
    }

    /// Queue one encoded packet
    pub fn push_packet(&self, packet: &Packet) {
        self.push_chunk(packet.encode().unwrap().freeze());
    }

    /// Queue a reply with the given code, echoing `reply_counter`
    pub fn push_reply(&self, code: Command, session_id: u16, reply_counter: u16, payload: &[u8]) {
        self.push_packet(&Packet::with_payload(
            code,
            session_id,
            reply_counter,
            payload.to_vec(),
        ));
    }

    /// Queue an I/O failure
    pub fn push_error(&self) {
        self.script.lock().unwrap().inbound.push_back(Inbound::Fail);
    }

    /// Make every later send fail
    pub fn fail_sends(&self) {
        self.script.lock().unwrap().fail_sends = true;
    }

    pub fn refuse_connect(&self) {
        self.script.lock().unwrap().refuse_connect = true;
    }

    /// Decoded outbound packets, in order
    pub fn sent_packets(&self) -> Vec<Packet> {
        self.script
            .lock()
            .unwrap()
            .sent
            .iter()
            .map(|raw| Packet::decode(raw).unwrap())
            .collect()
    }

    /// Outbound codes, in order
    pub fn sent_codes(&self) -> Vec<u16> {
        self.sent_packets().iter().map(|p| p.code()).collect()
    }

    pub fn clear_sent(&self) {
        self.script.lock().unwrap().sent.clear();
    }

    /// Inbound chunks not consumed yet
    pub fn pending(&self) -> usize {
        self.script.lock().unwrap().inbound.len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn connect(&mut self) -> Result<()> {
        let mut script = self.script.lock().unwrap();
        if script.refuse_connect {
            return Err(Error::Io(std::io::Error::from(
                std::io::ErrorKind::ConnectionRefused,
            )));
        }
        if script.connected {
            return Err(Error::AlreadyConnected);
        }
        script.connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.script.lock().unwrap().connected = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.script.lock().unwrap().connected
    }

    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let mut script = self.script.lock().unwrap();
        if !script.connected {
            return Err(Error::NotConnected);
        }
        if script.fail_sends {
            return Err(Error::Io(std::io::Error::from(std::io::ErrorKind::BrokenPipe)));
        }
        script.sent.push(Bytes::copy_from_slice(data));
        Ok(())
    }

    async fn receive(&mut self, max_bytes: usize) -> Result<BytesMut> {
        let mut script = self.script.lock().unwrap();
        if !script.connected {
            return Err(Error::NotConnected);
        }

        match script.inbound.pop_front() {
            None => Err(Error::ConnectionClosed),
            Some(Inbound::Fail) => Err(Error::Io(std::io::Error::from(
                std::io::ErrorKind::ConnectionReset,
            ))),
            Some(Inbound::Chunk(mut chunk)) => {
                if chunk.len() > max_bytes {
                    let rest = chunk.split_off(max_bytes);
                    script.inbound.push_front(Inbound::Chunk(rest));
                }
                Ok(BytesMut::from(&chunk[..]))
            }
        }
    }

    fn remote_addr(&self) -> String {
        "scripted".to_string()
    }
}

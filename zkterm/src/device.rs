//! Session transport for a single terminal
//!
//! [`Device`] owns one stream and the protocol bookkeeping that goes with
//! it. Everything else in the crate is built on its four primitives:
//! [`Device::send_command`], [`Device::receive_reply`],
//! [`Device::receive_long_reply`] and [`Device::receive_event`].

use bytes::{Bytes, BytesMut};
use tracing::{debug, info, trace, warn};

use zkterm_core::{
    Command, LongReply, Packet, Session, Step, TransferState, command,
    constants::{DEFAULT_DATASET_READ, DEFAULT_REPLY_READ},
    transfer,
};
use zkterm_transport::{TcpTransport, Transport};

use crate::error::{ConnectError, Error, Result};

/// Vendor option written during connect to identify the client
const CLIENT_IDENTITY: (&str, &str) = ("SDKBuild", "1");

/// ZKTeco terminal
///
/// One connection, one session, one command in flight at a time.
///
/// # Examples
///
/// ```no_run
/// use zkterm::{Device, terminal};
///
/// #[tokio::main]
/// async fn main() -> zkterm::Result<()> {
///     let mut device = Device::new("192.168.1.201", 4370);
///
///     device.connect().await?;
///     println!("Firmware: {}", terminal::firmware_version(&mut device).await?);
///
///     device.disconnect().await?;
///     Ok(())
/// }
/// ```
pub struct Device {
    transport: Box<dyn Transport>,
    session: Session,
    read_buf: BytesMut,
    reply_read: usize,
    dataset_read: usize,
    strict_sequencing: bool,
    client_identity: Option<(String, String)>,
}

impl Device {
    /// Create a device reached over TCP
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self::with_transport(Box::new(TcpTransport::new(host, port)))
    }

    /// Create a device on top of any transport
    pub fn with_transport(transport: Box<dyn Transport>) -> Self {
        Self {
            transport,
            session: Session::new(),
            read_buf: BytesMut::with_capacity(DEFAULT_DATASET_READ),
            reply_read: DEFAULT_REPLY_READ,
            dataset_read: DEFAULT_DATASET_READ,
            strict_sequencing: true,
            client_identity: Some((CLIENT_IDENTITY.0.into(), CLIENT_IDENTITY.1.into())),
        }
    }

    /// Bytes requested per stream read while waiting for a reply or event
    pub fn with_max_read(mut self, max: usize) -> Self {
        self.reply_read = max.max(1);
        self
    }

    /// Bytes requested per stream read during a dataset transfer
    pub fn with_max_dataset_read(mut self, max: usize) -> Self {
        self.dataset_read = max.max(1);
        self
    }

    /// Require every reply to echo the counter of its command (default on)
    pub fn with_strict_sequencing(mut self, strict: bool) -> Self {
        self.strict_sequencing = strict;
        self
    }

    /// Option written during connect, `SDKBuild=1` by default
    pub fn with_client_identity(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.client_identity = Some((name.into(), value.into()));
        self
    }

    /// Skip the identification write during connect
    pub fn without_client_identity(mut self) -> Self {
        self.client_identity = None;
        self
    }

    /// Check if connected
    pub fn is_connected(&self) -> bool {
        self.session.is_connected() && self.transport.is_connected()
    }

    /// Session id assigned by the terminal (0 before connect)
    pub fn session_id(&self) -> u16 {
        self.session.session_id()
    }

    /// Counter the next command will carry
    pub fn reply_counter(&self) -> u16 {
        self.session.reply_counter()
    }

    /// Code of the last reply
    pub fn last_reply_code(&self) -> Option<u16> {
        self.session.last_reply_code()
    }

    /// Session slot of the last reply
    pub fn last_session_code(&self) -> Option<u16> {
        self.session.last_session_code()
    }

    /// Payload of the last reply
    pub fn last_payload(&self) -> Bytes {
        self.session.last_payload()
    }

    /// Type of the last event
    pub fn last_event_code(&self) -> Option<u16> {
        self.session.last_event_code()
    }

    /// Whether the last reply was `CMD_ACK_OK`
    pub fn last_reply_is_ack(&self) -> bool {
        self.session.last_reply_is_ack()
    }

    pub fn remote_addr(&self) -> String {
        self.transport.remote_addr()
    }

    /// Open the stream and run the connect handshake
    ///
    /// # Errors
    ///
    /// - [`ConnectError::Stream`] if the stream does not open
    /// - [`ConnectError::Rejected`] if the terminal does not acknowledge
    /// - [`ConnectError::Handshake`] if the exchange fails after the stream
    ///   opened (corrupt reply, counter mismatch, stream error)
    pub async fn connect(&mut self) -> Result<()> {
        if self.session.is_connected() {
            return Err(zkterm_core::Error::InvalidSessionState(
                "connect called on an open session".into(),
            )
            .into());
        }

        info!("Connecting to {}...", self.transport.remote_addr());

        self.transport
            .connect()
            .await
            .map_err(ConnectError::Stream)?;
        self.read_buf.clear();

        if let Err(e) = self.handshake().await {
            self.teardown().await;
            return Err(e.during_connect());
        }

        info!(
            session_id = self.session.session_id(),
            "Connected to {}",
            self.transport.remote_addr()
        );

        if let Some((name, value)) = self.client_identity.clone() {
            if let Err(e) = self.identify(&name, &value).await {
                self.teardown().await;
                return Err(e.during_connect());
            }
        }

        Ok(())
    }

    async fn handshake(&mut self) -> Result<()> {
        let packet = self.session.stamp(Command::Connect, Bytes::new());
        self.write_packet(&packet).await?;

        let reply = self.receive_reply().await?;
        if reply.command() != Some(Command::AckOk) {
            return Err(ConnectError::Rejected {
                reply: command::describe(reply.code()),
            }
            .into());
        }

        self.session.establish(reply.session_id())?;
        Ok(())
    }

    /// Write the client identification option; a refusal is only logged
    async fn identify(&mut self, name: &str, value: &str) -> Result<()> {
        let option = format!("{}={}\0", name, value);

        self.send_command(Command::OptionsWrq, option.into_bytes())
            .await?;
        self.receive_reply().await?;
        let written = self.last_reply_is_ack();

        self.send_command(Command::RefreshOption, Bytes::new())
            .await?;
        self.receive_reply().await?;

        if !(written && self.last_reply_is_ack()) {
            warn!("Terminal did not acknowledge client identity {}={}", name, value);
        }
        Ok(())
    }

    /// Leave the session and close the stream
    ///
    /// The exit exchange is best effort; the stream is closed and the
    /// session reset whatever happens to it.
    pub async fn disconnect(&mut self) -> Result<()> {
        if !self.session.is_connected() && !self.transport.is_connected() {
            return Ok(());
        }

        info!("Disconnecting from {}...", self.transport.remote_addr());

        if self.session.is_connected() {
            if let Err(e) = self.exit().await {
                warn!("Exit command failed: {}", e);
            }
        }

        self.teardown().await;

        info!("Disconnected");
        Ok(())
    }

    async fn exit(&mut self) -> Result<()> {
        self.send_command(Command::Exit, Bytes::new()).await?;
        self.receive_reply().await?;
        Ok(())
    }

    async fn teardown(&mut self) {
        if let Err(e) = self.transport.disconnect().await {
            warn!("Failed to close stream: {}", e);
        }
        self.session.close();
        self.read_buf.clear();
    }

    /// Forget the session after a command that makes the terminal drop it
    pub(crate) async fn abandon(&mut self) {
        self.teardown().await;
    }

    /// Send one command with the current session id and reply counter
    ///
    /// Does not wait for the reply.
    pub async fn send_command(
        &mut self,
        code: impl Into<u16>,
        payload: impl Into<Bytes>,
    ) -> Result<()> {
        self.ensure_connected()?;

        let packet = self.session.stamp(code, payload);
        debug!(
            code = %command::describe(packet.code()),
            reply_counter = packet.reply_counter(),
            len = packet.payload().len(),
            "Sending command"
        );

        self.write_packet(&packet).await
    }

    /// Receive the reply to the last command
    ///
    /// Advances the reply counter and becomes the last reply.
    ///
    /// # Errors
    ///
    /// - [`Error::Protocol`] on a malformed packet, or on a counter that does
    ///   not echo the command's when strict sequencing is on
    /// - [`Error::Transport`] if the stream fails
    pub async fn receive_reply(&mut self) -> Result<Packet> {
        let packet = self.read_packet(self.reply_read).await?;
        self.session.record_reply(&packet, self.strict_sequencing)?;

        debug!(
            code = %command::describe(packet.code()),
            len = packet.payload().len(),
            "Received reply"
        );
        Ok(packet)
    }

    /// Receive a dataset that may span several packets
    ///
    /// The first reply decides how the dataset arrives; see
    /// [`LongReply`]. A failure part way through aborts the whole read.
    pub async fn receive_long_reply(&mut self) -> Result<Bytes> {
        let first = self.read_packet(self.dataset_read).await?;
        self.session.record_reply(&first, self.strict_sequencing)?;

        match LongReply::classify(&first)? {
            LongReply::Inline(data) => {
                debug!(len = data.len(), "Dataset arrived inline");
                Ok(data)
            }
            LongReply::Prepared => {
                let data = self.read_packet(self.dataset_read).await?;
                self.session.record_uncounted(&data);

                let ack = self.read_packet(self.reply_read).await?;
                self.session.record_uncounted(&ack);

                debug!(len = data.payload().len(), "Received prepared dataset");
                Ok(data.into_payload())
            }
            LongReply::Streamed { size: 0 } => {
                debug!("Terminal announced an empty dataset");
                Ok(Bytes::new())
            }
            LongReply::Streamed { size } => self.receive_streamed(size).await,
        }
    }

    /// Run the ready/data/free exchange for an announced dataset
    ///
    /// Every data packet, the packet that ends the stream and the free
    /// acknowledgement each advance the reply counter by one.
    pub async fn receive_streamed(&mut self, size: u32) -> Result<Bytes> {
        self.ensure_connected()?;
        debug!(size, "Streaming dataset");

        let ready = self
            .session
            .stamp(Command::DataReady, Bytes::copy_from_slice(&transfer::ready_payload(size)));
        self.write_packet(&ready).await?;

        let prepare = self.read_packet(self.reply_read).await?;
        self.session.record_uncounted(&prepare);

        let mut state = TransferState::new(size);
        loop {
            let packet = self.read_packet(self.dataset_read).await?;
            self.session.record_counted(&packet);

            if state.accept(&packet) == Step::Finished {
                break;
            }
            trace!(
                accumulated = state.accumulated(),
                expected = state.expected_size(),
                "Received data packet"
            );
        }

        let free = self.session.stamp(Command::FreeData, Bytes::new());
        self.write_packet(&free).await?;

        let ack = self.read_packet(self.reply_read).await?;
        self.session.record_counted(&ack);
        if ack.command() != Some(Command::AckOk) {
            warn!(
                reply = %command::describe(ack.code()),
                "Terminal did not acknowledge the transfer buffer release"
            );
        }

        let data = state.finish()?;
        debug!(len = data.len(), "Dataset complete");
        Ok(data)
    }

    /// Wait for one realtime event and acknowledge it
    ///
    /// The event type is kept as [`Device::last_event_code`]. The
    /// acknowledgement carries reply counter 0 and the running counter is
    /// left alone.
    pub async fn receive_event(&mut self) -> Result<Packet> {
        self.ensure_connected()?;

        let packet = self.read_packet(self.reply_read).await?;
        self.session.record_event(&packet);

        debug!(
            event = packet.session_id(),
            len = packet.payload().len(),
            "Received event"
        );

        let ack = self.session.event_ack();
        self.write_packet(&ack).await?;

        Ok(packet)
    }

    /// Send a command and wait for its reply
    pub(crate) async fn command(
        &mut self,
        code: Command,
        payload: impl Into<Bytes>,
    ) -> Result<Packet> {
        self.send_command(code, payload).await?;
        self.receive_reply().await
    }

    /// Send a command and require `CMD_ACK_OK`
    pub(crate) async fn command_ack(
        &mut self,
        code: Command,
        payload: impl Into<Bytes>,
    ) -> Result<Packet> {
        let reply = self.command(code, payload).await?;
        if reply.command() != Some(Command::AckOk) {
            return Err(Error::rejected(code, reply.code()));
        }
        Ok(reply)
    }

    fn ensure_connected(&self) -> Result<()> {
        if !self.is_connected() {
            return Err(Error::NotConnected);
        }
        Ok(())
    }

    async fn write_packet(&mut self, packet: &Packet) -> Result<()> {
        let data = packet.encode()?;
        trace!("Sending {} bytes: {}", data.len(), hex::encode(&data));

        self.transport.send(&data).await?;
        Ok(())
    }

    /// Next complete packet from the stream
    ///
    /// Reads at most `max` bytes at a time; bytes past the packet stay
    /// buffered for the next call. A frame with a bad tag or size poisons
    /// the buffer, so it is dropped along with the error.
    async fn read_packet(&mut self, max: usize) -> Result<Packet> {
        loop {
            match Packet::frame_len(&self.read_buf) {
                Ok(Some(len)) if self.read_buf.len() >= len => {
                    let frame = self.read_buf.split_to(len);
                    trace!("Received {} bytes: {}", frame.len(), hex::encode(&frame));
                    return Ok(Packet::decode(&frame)?);
                }
                Ok(_) => {}
                Err(e) => {
                    self.read_buf.clear();
                    return Err(e.into());
                }
            }

            let chunk = self.transport.receive(max).await?;
            self.read_buf.extend_from_slice(&chunk);
        }
    }
}

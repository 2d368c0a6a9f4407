//! End-to-end session against a simulated terminal on loopback TCP

use std::time::Duration;

use bytes::BytesMut;
use pretty_assertions::assert_eq;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use zkterm::{Command, Device, EventFlags, Packet, RealtimeEvent, TcpTransport, realtime, terminal};

const SID: u16 = 0x5A17;

struct Terminal {
    stream: TcpStream,
    buf: BytesMut,
}

impl Terminal {
    async fn recv(&mut self) -> Packet {
        loop {
            if let Some(len) = Packet::frame_len(&self.buf).unwrap() {
                if self.buf.len() >= len {
                    let frame = self.buf.split_to(len);
                    return Packet::decode(&frame).unwrap();
                }
            }
            let n = self.stream.read_buf(&mut self.buf).await.unwrap();
            assert!(n > 0, "client closed the stream early");
        }
    }

    async fn send(&mut self, packets: &[Packet]) {
        let mut out = BytesMut::new();
        for packet in packets {
            out.extend_from_slice(&packet.encode().unwrap());
        }
        self.stream.write_all(&out).await.unwrap();
    }

    /// Receive a command and answer it with a plain ACK echoing its counter
    async fn ack(&mut self, expected: Command) -> Packet {
        let request = self.recv().await;
        assert_eq!(request.command(), Some(expected));
        self.send(&[Packet::new(Command::AckOk, SID, request.reply_counter())])
            .await;
        request
    }
}

async fn run_terminal(listener: TcpListener, dataset: Vec<u8>) -> Vec<Packet> {
    let (stream, _) = listener.accept().await.unwrap();
    let mut term = Terminal {
        stream,
        buf: BytesMut::new(),
    };
    let mut seen = Vec::new();

    // Handshake and client identity
    let connect = term.recv().await;
    assert_eq!(connect.command(), Some(Command::Connect));
    term.send(&[Packet::new(Command::AckOk, SID, connect.reply_counter())])
        .await;
    seen.push(connect);
    seen.push(term.ack(Command::OptionsWrq).await);
    seen.push(term.ack(Command::RefreshOption).await);

    // One plain command
    let version = term.recv().await;
    term.send(&[Packet::with_payload(
        Command::AckOk,
        SID,
        version.reply_counter(),
        b"Ver 6.60 Sep 2020\0".to_vec(),
    )])
    .await;
    seen.push(version);

    // Streamed dataset
    let request = term.recv().await;
    assert_eq!(request.command(), Some(Command::DataWrrq));
    let mut announce = vec![0u8];
    announce.extend_from_slice(&(dataset.len() as u32).to_le_bytes());
    term.send(&[Packet::with_payload(
        Command::AckOk,
        SID,
        request.reply_counter(),
        announce,
    )])
    .await;
    seen.push(request);

    let ready = term.recv().await;
    assert_eq!(ready.command(), Some(Command::DataReady));
    let mut stream = vec![Packet::new(Command::AckOk, SID, ready.reply_counter())];
    for chunk in dataset.chunks(40) {
        stream.push(Packet::with_payload(
            Command::Data,
            SID,
            ready.reply_counter(),
            chunk.to_vec(),
        ));
    }
    stream.push(Packet::new(Command::AckOk, SID, ready.reply_counter()));
    term.send(&stream).await;
    seen.push(ready);

    seen.push(term.ack(Command::FreeData).await);

    // Event while the client listens
    let mut payload = vec![0u8; 32];
    payload[..3].copy_from_slice(b"314");
    payload[24] = 1;
    payload[26..32].copy_from_slice(&[25, 1, 2, 8, 30, 0]);
    term.send(&[Packet::with_payload(
        Command::RegEvent,
        EventFlags::ATTLOG.bits(),
        0,
        payload,
    )])
    .await;
    seen.push(term.recv().await);

    seen.push(term.ack(Command::Exit).await);
    seen
}

#[tokio::test]
async fn test_full_session_over_tcp() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let dataset: Vec<u8> = (0..100u8).collect();
    let terminal_task = tokio::spawn(run_terminal(listener, dataset.clone()));

    let transport = TcpTransport::new("127.0.0.1", port).with_read_timeout(Duration::from_secs(5));
    let mut device = Device::with_transport(Box::new(transport)).with_max_read(64);

    device.connect().await.unwrap();
    assert!(device.is_connected());
    assert_eq!(device.session_id(), SID);

    assert_eq!(
        terminal::firmware_version(&mut device).await.unwrap(),
        "Ver 6.60 Sep 2020"
    );

    device
        .send_command(Command::DataWrrq, zkterm::data::Dataset::Users.request())
        .await
        .unwrap();
    let counter = device.reply_counter();
    let received = device.receive_long_reply().await.unwrap();
    assert_eq!(received.as_ref(), dataset.as_slice());
    // Announcement, three data packets, terminator, free ack
    assert_eq!(device.reply_counter(), counter + 6);

    let event = realtime::next_event(&mut device).await.unwrap();
    assert!(matches!(event, RealtimeEvent::Attendance { ref user_id, .. } if user_id == "314"));
    assert_eq!(device.reply_counter(), counter + 6);

    device.disconnect().await.unwrap();
    assert!(!device.is_connected());

    let seen = terminal_task.await.unwrap();
    let counters: Vec<u16> = seen.iter().map(|p| p.reply_counter()).collect();
    // connect, option, refresh, version, request, ready, free, event ack, exit
    assert_eq!(counters, vec![0, 1, 2, 3, 4, 5, 9, 0, 10]);
    assert!(seen.iter().skip(1).all(|p| p.session_id() == SID));

    let event_ack = &seen[7];
    assert_eq!(event_ack.command(), Some(Command::AckOk));
    assert_eq!(event_ack.reply_counter(), 0);
}

#[tokio::test]
async fn test_connect_refused_by_terminal() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut term = Terminal {
            stream,
            buf: BytesMut::new(),
        };
        let connect = term.recv().await;
        term.send(&[Packet::new(Command::AckUnauth, SID, connect.reply_counter())])
            .await;
    });

    let mut device = Device::new("127.0.0.1", port);
    let err = device.connect().await.unwrap_err();

    assert!(matches!(err, zkterm::Error::Connect(_)));
    assert!(!device.is_connected());
}

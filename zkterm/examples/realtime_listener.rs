//! Print realtime events until interrupted

use tracing_subscriber::EnvFilter;
use zkterm::{Device, RealtimeEvent, TcpTransport, realtime};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let ip = std::env::var("DEVICE_IP").unwrap_or_else(|_| "192.168.1.201".to_string());

    // Events arrive whenever someone walks up; reads must not time out
    let transport = TcpTransport::new(ip, zkterm::DEFAULT_PORT).without_read_timeout();
    let mut device = Device::with_transport(Box::new(transport));
    device.connect().await?;

    realtime::enable_realtime(&mut device).await?;
    println!("Listening for events (Ctrl-C to stop)...");

    loop {
        tokio::select! {
            event = realtime::next_event(&mut device) => match event? {
                RealtimeEvent::Attendance { user_id, verify_type, time } => {
                    println!("{} checked in at {} (verify {})", user_id, time, verify_type);
                }
                RealtimeEvent::Alarm { alarm_type, .. } => println!("Alarm {:#x}", alarm_type),
                other => println!("{:?}", other),
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    device.disconnect().await?;
    Ok(())
}

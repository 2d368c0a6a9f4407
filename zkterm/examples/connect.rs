//! Connect, print the terminal identity and status, disconnect

use tracing_subscriber::EnvFilter;
use zkterm::{Device, StatusField, terminal};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let ip = std::env::var("DEVICE_IP").unwrap_or_else(|_| "192.168.1.201".to_string());
    let port = std::env::var("DEVICE_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(zkterm::DEFAULT_PORT);

    println!("Connecting to {}:{}...", ip, port);

    let mut device = Device::new(ip, port);
    device.connect().await?;
    println!("✓ Connected (session {:#06x})", device.session_id());

    let info = terminal::device_info(&mut device).await?;
    println!("✓ Device: {}", info);
    println!("  Clock: {}", terminal::get_time(&mut device).await?);

    let status = terminal::device_status(&mut device).await?;
    for (field, value) in status.fields() {
        println!("  {:<18} {}", field, value);
    }
    if let Some(users) = status.get(StatusField::UserCount) {
        println!("✓ {} users enrolled", users);
    }

    device.disconnect().await?;
    println!("✓ Disconnected");

    Ok(())
}

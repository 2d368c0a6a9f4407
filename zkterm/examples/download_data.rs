//! Download users and the attendance log

use tracing_subscriber::EnvFilter;
use zkterm::{Device, control, data};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let ip = std::env::var("DEVICE_IP").unwrap_or_else(|_| "192.168.1.201".to_string());

    let mut device = Device::new(ip, zkterm::DEFAULT_PORT);
    device.connect().await?;

    // Keep the keypad quiet while the datasets stream
    control::disable_device(&mut device, None).await?;

    let users = data::read_users(&mut device).await;
    let log = data::read_attendance_log(&mut device).await;

    control::enable_device(&mut device).await?;
    device.disconnect().await?;

    let users = users?;
    println!("{} users:", users.len());
    for user in &users {
        println!("  {}", user);
    }

    let log = log?;
    println!("{} attendance records:", log.len());
    for record in log.iter().rev().take(20) {
        println!("  {} {} (verify {})", record.time, record.user_id, record.verify_type);
    }

    Ok(())
}

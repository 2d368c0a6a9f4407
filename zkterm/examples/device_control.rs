//! Device control example

use std::time::Duration;

use tokio::time::sleep;
use tracing_subscriber::EnvFilter;
use zkterm::{Device, access, control};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let ip = std::env::var("DEVICE_IP").unwrap_or_else(|_| "192.168.1.201".to_string());

    let mut device = Device::new(ip, zkterm::DEFAULT_PORT);
    device.connect().await?;

    println!("Device connected!");

    // Disable device (show "Working...")
    println!("Disabling device...");
    control::disable_device(&mut device, None).await?;
    sleep(Duration::from_secs(3)).await;

    // Enable device (resume normal operation)
    println!("Enabling device...");
    control::enable_device(&mut device).await?;

    println!("Door state: {}", access::door_state(&mut device).await?);
    println!("Unlocking door for 3 seconds...");
    access::unlock_door(&mut device, 3).await?;

    println!("Done!");

    device.disconnect().await?;

    Ok(())
}

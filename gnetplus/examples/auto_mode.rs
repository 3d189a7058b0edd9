//! Print card UIDs as the reader reports them in auto mode
//!
//! ```text
//! GNETPLUS_PORT=/dev/ttyUSB0 cargo run --example auto_mode
//! ```

use std::time::Duration;

use gnetplus::{Device, ErrorKind};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let port = std::env::var("GNETPLUS_PORT").unwrap_or_else(|_| "/dev/ttyUSB0".to_string());

    let mut device = Device::serial(port).with_timeout(Duration::from_millis(500));
    device.connect().await?;
    device.set_auto_mode(true).await?;

    println!("Waiting for cards (Ctrl+C to stop)...");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            card = device.wait_for_card(Duration::from_secs(10)) => match card {
                Ok(uid) => println!("Card in: {}", uid),
                Err(e) if e.kind() == Some(ErrorKind::Timeout) => continue,
                Err(e) => {
                    eprintln!("Reader error: {}", e);
                    break;
                }
            },
        }
    }

    device.set_auto_mode(false).await?;
    device.disconnect().await?;

    Ok(())
}

//! Read the UID of the card on the reader
//!
//! ```text
//! GNETPLUS_PORT=/dev/ttyUSB0 cargo run --example read_card
//! ```

use anyhow::Context;
use gnetplus::{Device, ErrorKind};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let port = std::env::var("GNETPLUS_PORT").unwrap_or_else(|_| "/dev/ttyUSB0".to_string());

    let mut device = Device::serial(&port);
    device
        .connect()
        .await
        .with_context(|| format!("no reader answering on {}", port))?;

    let info = device.get_device_info().await?;
    println!("{}", info);

    match device.request_card_uid().await {
        Ok(uid) => println!("Card UID: {} ({} bytes)", uid, uid.as_bytes().len()),
        Err(e) if e.kind() == Some(ErrorKind::NegativeAcknowledge) => println!("No card in field"),
        Err(e) => return Err(e.into()),
    }

    device.disconnect().await?;

    Ok(())
}

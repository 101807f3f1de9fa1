//! Continuous radon monitoring example
//!
//! Run with: cargo run --example radon_monitor -- <device-id-or-name>

use radoneye_rust_ble::{
    BleTransport, MeasurementSink, RadonReading, RadonSync, Result, SyncConfig,
};
use std::time::Duration;

struct ConsoleSink;

#[async_trait::async_trait]
impl MeasurementSink for ConsoleSink {
    async fn publish(&self, reading: RadonReading) -> Result<()> {
        println!(
            "[{}] {} (firmware {})",
            reading.captured_at.format("%H:%M:%S"),
            reading,
            reading.variant
        );
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (minimal)
    tracing_subscriber::fmt().with_env_filter("warn").init();

    let device_id = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "FR:R20:SN12345".to_string());

    println!("Radon Monitor");
    println!("=============\n");
    println!("Polling {} every 5 minutes...", device_id);
    println!("Press Ctrl+C to exit.\n");

    let transport = BleTransport::new().await?;
    let sync = RadonSync::with_config(
        device_id,
        transport,
        ConsoleSink,
        SyncConfig {
            interval: Duration::from_secs(5 * 60),
        },
    );

    sync.start();
    tokio::signal::ctrl_c().await.ok();

    println!("\nExiting...");
    sync.stop().await;

    Ok(())
}

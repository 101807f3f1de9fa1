// Allow unusual byte groupings for UUIDs which have standard format
#![allow(clippy::unusual_byte_groupings)]

//! # radoneye-rust-ble
//!
//! A cross-platform Rust library for polling RadonEye RD200 radon sensors
//! via Bluetooth Low Energy.
//!
//! RD200 units ship with three incompatible firmware generations (V1, V2,
//! V3) that speak different GATT services and response layouts. This
//! library detects the generation on every poll cycle, issues the matching
//! command, decodes the radon concentration, and publishes it to a
//! [`MeasurementSink`] on a fixed schedule.
//!
//! ## Features
//!
//! - **Firmware dispatch**: One codec covering all three wire formats
//! - **Session management**: Discovery, connection, service probing, and
//!   cleanup for every poll cycle
//! - **Overlap protection**: At most one in-flight cycle per device;
//!   late triggers are skipped, never queued
//! - **Retry at next tick**: Transient failures release the link and wait
//!   for the next scheduled poll
//! - **Hardware-free testing**: A mock transport with failure injection
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use radoneye_rust_ble::{BleTransport, MeasurementSink, RadonReading, RadonSync, Result};
//!
//! struct ConsoleSink;
//!
//! #[async_trait::async_trait]
//! impl MeasurementSink for ConsoleSink {
//!     async fn publish(&self, reading: RadonReading) -> Result<()> {
//!         println!("Radon: {}", reading);
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let transport = BleTransport::new().await?;
//!     let sync = RadonSync::new("FR:R20:SN12345", transport, ConsoleSink);
//!
//!     // Immediate first cycle, then every 5 minutes.
//!     sync.start();
//!     tokio::signal::ctrl_c().await.ok();
//!     sync.stop().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Platform Notes
//!
//! ### macOS
//! Requires Bluetooth permission. Add `NSBluetoothAlwaysUsageDescription`
//! to your Info.plist for bundled apps.
//!
//! ### Linux
//! Requires BlueZ. User may need to be in the `bluetooth` group.
//!
//! ### Windows
//! Requires Windows 10 or later with Bluetooth LE support.
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization for data types

// Public modules
pub mod ble;
pub mod error;
pub mod mock;
pub mod protocol;
pub mod sink;
pub mod sync;
pub mod transport;

// Re-exports for convenience
pub use ble::BleTransport;
pub use error::{Error, Result};
pub use sink::{MeasurementSink, RadonReading};
pub use sync::{RadonSync, SyncConfig, DEFAULT_SYNC_INTERVAL};
pub use transport::{CandidateProtocol, ExchangeSpec, Transport};

// Re-export commonly used types from submodules
pub use protocol::{
    detect_firmware_variant, parse_device_identity, parse_radon_value, DeviceIdentity,
    FirmwareVariant,
};

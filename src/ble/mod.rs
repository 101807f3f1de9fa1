//! BLE communication module.
//!
//! This module provides the btleplug-backed transport for discovering and
//! communicating with RadonEye sensors.

pub mod adapter;
pub mod uuids;

pub use adapter::BleTransport;
pub use uuids::*;

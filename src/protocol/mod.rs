//! RadonEye wire protocol: codec and command tables.
//!
//! Pure functions over byte buffers plus the constant exchange
//! definitions for both firmware families. No I/O, no state.

pub mod codec;
pub mod commands;

pub use codec::{
    detect_firmware_variant, parse_device_identity, parse_radon_value, DeviceIdentity,
    FirmwareVariant,
};
pub use commands::{V1_RESPONSE_LEN, V1_TRIGGER_EXCHANGE, V2_STATUS_EXCHANGE};

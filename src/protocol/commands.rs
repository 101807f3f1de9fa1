//! Wire command tables for both protocol families.
//!
//! Values are bit-exact against the physical hardware; see the codec for
//! the matching response layouts.

use crate::ble::uuids::*;
use crate::transport::ExchangeSpec;

/// V1 measurement trigger byte.
pub const TRIGGER_COMMAND_V1: [u8; 1] = [0x50];

/// V2/V3 status query byte.
pub const STATUS_COMMAND_V2: [u8; 1] = [0x40];

/// Exact response length of the V1 trigger/read exchange.
pub const V1_RESPONSE_LEN: usize = 20;

/// Legacy exchange: trigger a measurement, read the 20-byte response.
pub const V1_TRIGGER_EXCHANGE: ExchangeSpec = ExchangeSpec {
    service: SERVICE_UUID_V1,
    write_characteristic: TRIGGER_UUID_V1,
    read_characteristic: DATA_UUID_V1,
    command: &TRIGGER_COMMAND_V1,
};

/// Modern exchange: request status, read the status response that carries
/// both the variant markers and the radon value.
pub const V2_STATUS_EXCHANGE: ExchangeSpec = ExchangeSpec {
    service: SERVICE_UUID_V2,
    write_characteristic: COMMAND_UUID_V2,
    read_characteristic: STATUS_UUID_V2,
    command: &STATUS_COMMAND_V2,
};

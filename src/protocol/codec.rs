//! Firmware-variant-dispatching response decoding.
//!
//! RadonEye RD200 units ship with three incompatible firmware generations
//! that share one product line. The codec here is pure and stateless: it
//! detects which generation produced a status buffer and extracts the radon
//! concentration (and, where available, the device identity) from the
//! variant-specific byte layout.

use crate::error::{Error, Result};

/// Conversion factor from pCi/L to Bq/m³, baked into the V1 firmware's
/// raw float.
const PCI_L_TO_BQ_M3: f64 = 37.0;

/// Minimum response length for a V1 value read (float32 at offset 2).
pub const V1_MIN_RESPONSE_LEN: usize = 20;

/// Minimum response length for a V2/V3 value read (uint16 at offset 33).
pub const V2_MIN_RESPONSE_LEN: usize = 35;

/// Firmware generation spoken by a physical RD200 unit.
///
/// The variant determines the command bytes, response layout, and parsing
/// offsets. It is re-detected at the start of every poll cycle because the
/// device is rediscovered each time and firmware can change across power
/// cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FirmwareVariant {
    /// First-generation firmware: 20-byte trigger/read exchange, value as
    /// little-endian float32 in pCi/L.
    V1,
    /// Second-generation firmware: status exchange, value as little-endian
    /// uint16 in Bq/m³.
    V2,
    /// Third-generation firmware: same value layout as V2, different
    /// identity layout.
    V3,
    /// Not yet detected.
    #[default]
    Unknown,
}

impl FirmwareVariant {
    /// Whether this variant uses the V2/V3 status exchange.
    pub fn is_modern(&self) -> bool {
        matches!(self, Self::V2 | Self::V3)
    }
}

impl std::fmt::Display for FirmwareVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::V1 => write!(f, "V1"),
            Self::V2 => write!(f, "V2"),
            Self::V3 => write!(f, "V3"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Serial and model strings reported by V2/V3 firmware.
///
/// Advisory only: identity never affects control flow, it is parsed for
/// logging. V1 firmware carries no identity at all.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceIdentity {
    /// Device serial number.
    pub serial: String,
    /// Device model string.
    pub model: String,
}

impl DeviceIdentity {
    /// Sentinel identity for variants that carry none.
    pub fn unknown() -> Self {
        Self {
            serial: "unknown".to_string(),
            model: "unknown".to_string(),
        }
    }
}

impl std::fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.serial, self.model)
    }
}

/// Detect the firmware variant from a status response.
///
/// The input is the response to a status query issued over the V2/V3
/// command channel. Checked in order, first match wins:
///
/// - length ≥ 16 and `data[15] == 0x06` → V2
/// - length ≥ 15 and `data[14] == 0x07` → V3
/// - otherwise → V1
///
/// Buffers shorter than the marker offsets fall through to V1 rather than
/// indexing out of range. The legacy 20-byte trigger/read exchange never
/// reaches this detector; V1 doubles as the fallback default.
pub fn detect_firmware_variant(data: &[u8]) -> FirmwareVariant {
    if data.len() >= 16 && data[15] == 0x06 {
        FirmwareVariant::V2
    } else if data.len() >= 15 && data[14] == 0x07 {
        FirmwareVariant::V3
    } else {
        FirmwareVariant::V1
    }
}

/// Parse the radon concentration in Bq/m³ from a value response.
///
/// - V1: little-endian float32 at offset 2, multiplied by 37 (the hardware
///   reports pCi/L). Sensor underflow can report a small negative float;
///   the result is clamped to 0.0 so the published concentration is
///   always non-negative.
/// - V2/V3: little-endian uint16 at offset 33, already Bq/m³.
///
/// # Errors
///
/// Returns [`Error::MalformedResponse`] if the buffer is shorter than the
/// variant's minimum length, and [`Error::UnsupportedVariant`] for
/// [`FirmwareVariant::Unknown`].
pub fn parse_radon_value(data: &[u8], variant: FirmwareVariant) -> Result<f64> {
    match variant {
        FirmwareVariant::V1 => {
            if data.len() < V1_MIN_RESPONSE_LEN {
                return Err(Error::MalformedResponse {
                    expected: V1_MIN_RESPONSE_LEN,
                    actual: data.len(),
                });
            }
            let raw = f32::from_le_bytes([data[2], data[3], data[4], data[5]]);
            Ok((raw as f64 * PCI_L_TO_BQ_M3).max(0.0))
        }
        FirmwareVariant::V2 | FirmwareVariant::V3 => {
            if data.len() < V2_MIN_RESPONSE_LEN {
                return Err(Error::MalformedResponse {
                    expected: V2_MIN_RESPONSE_LEN,
                    actual: data.len(),
                });
            }
            let raw = u16::from_le_bytes([data[33], data[34]]);
            Ok(raw as f64)
        }
        FirmwareVariant::Unknown => Err(Error::UnsupportedVariant { variant }),
    }
}

/// Read an ASCII substring out of a status buffer.
///
/// Returns `None` when the range falls outside the buffer or contains
/// non-printable bytes.
fn read_ascii(data: &[u8], offset: usize, len: usize) -> Option<String> {
    let bytes = data.get(offset..offset + len)?;
    if !bytes.iter().all(|b| b.is_ascii() && !b.is_ascii_control()) {
        return None;
    }
    Some(String::from_utf8_lossy(bytes).into_owned())
}

/// Parse the device identity from a status response.
///
/// - V2: the serial is assembled from three discontiguous fragments in the
///   fixed order offset 8 (3 bytes), offset 2 (6 bytes), offset 11
///   (4 bytes) — a hardware quirk, preserved exactly. Model at offset 16
///   (6 bytes).
/// - V3: serial at offset 2 (12 bytes), model at offset 15 (7 bytes).
/// - V1/Unknown: the sentinel identity.
///
/// Identity is log-only, so this never fails: truncated or non-ASCII
/// buffers also degrade to the sentinel.
pub fn parse_device_identity(data: &[u8], variant: FirmwareVariant) -> DeviceIdentity {
    let parsed = match variant {
        FirmwareVariant::V2 => {
            let serial = read_ascii(data, 8, 3)
                .zip(read_ascii(data, 2, 6))
                .zip(read_ascii(data, 11, 4))
                .map(|((a, b), c)| format!("{a}{b}{c}"));
            serial.zip(read_ascii(data, 16, 6))
        }
        FirmwareVariant::V3 => read_ascii(data, 2, 12).zip(read_ascii(data, 15, 7)),
        FirmwareVariant::V1 | FirmwareVariant::Unknown => None,
    };

    match parsed {
        Some((serial, model)) => DeviceIdentity { serial, model },
        None => DeviceIdentity::unknown(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn v1_response(value_pci_l: f32) -> Vec<u8> {
        let mut data = vec![0u8; 20];
        data[2..6].copy_from_slice(&value_pci_l.to_le_bytes());
        data
    }

    fn modern_response(marker14: u8, marker15: u8, value: u16) -> Vec<u8> {
        let mut data = vec![0u8; 35];
        data[14] = marker14;
        data[15] = marker15;
        data[33..35].copy_from_slice(&value.to_le_bytes());
        data
    }

    #[test]
    fn test_detect_v2() {
        let data = modern_response(0x00, 0x06, 0);
        assert_eq!(detect_firmware_variant(&data), FirmwareVariant::V2);
    }

    #[test]
    fn test_detect_v3() {
        let data = modern_response(0x07, 0x00, 0);
        assert_eq!(detect_firmware_variant(&data), FirmwareVariant::V3);
    }

    #[test]
    fn test_detect_v2_wins_over_v3() {
        // Both markers set: the V2 check runs first.
        let data = modern_response(0x07, 0x06, 0);
        assert_eq!(detect_firmware_variant(&data), FirmwareVariant::V2);
    }

    #[test]
    fn test_detect_falls_back_to_v1() {
        assert_eq!(detect_firmware_variant(&[]), FirmwareVariant::V1);
        assert_eq!(detect_firmware_variant(&[0u8; 14]), FirmwareVariant::V1);
        assert_eq!(
            detect_firmware_variant(&modern_response(0x00, 0x00, 0)),
            FirmwareVariant::V1
        );
    }

    #[test]
    fn test_detect_exactly_15_bytes_checks_v3_only() {
        // A 15-byte buffer has no byte 15; only the V3 marker at byte 14
        // is reachable.
        let mut data = vec![0u8; 15];
        data[14] = 0x07;
        assert_eq!(detect_firmware_variant(&data), FirmwareVariant::V3);
        data[14] = 0x06;
        assert_eq!(detect_firmware_variant(&data), FirmwareVariant::V1);
    }

    #[test]
    fn test_parse_v1_value() {
        // Scenario A: 50.0 pCi/L * 37 = 1850.0 Bq/m³.
        let data = v1_response(50.0);
        let value = parse_radon_value(&data, FirmwareVariant::V1).unwrap();
        assert_eq!(value, 1850.0);
    }

    #[test]
    fn test_parse_v1_deterministic() {
        let data = v1_response(2.7);
        let first = parse_radon_value(&data, FirmwareVariant::V1).unwrap();
        let second = parse_radon_value(&data, FirmwareVariant::V1).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, 2.7f32 as f64 * 37.0);
    }

    #[test]
    fn test_parse_v1_negative_float_clamps_to_zero() {
        let data = v1_response(-0.4);
        let value = parse_radon_value(&data, FirmwareVariant::V1).unwrap();
        assert_eq!(value, 0.0);
    }

    #[test]
    fn test_parse_v2_value() {
        // Scenario B: uint16 120 at offset 33.
        let data = modern_response(0x00, 0x06, 120);
        assert_eq!(detect_firmware_variant(&data), FirmwareVariant::V2);
        let value = parse_radon_value(&data, FirmwareVariant::V2).unwrap();
        assert_eq!(value, 120.0);
    }

    #[test]
    fn test_parse_v3_value() {
        // Scenario C: uint16 85 at offset 33.
        let data = modern_response(0x07, 0x00, 85);
        assert_eq!(detect_firmware_variant(&data), FirmwareVariant::V3);
        let value = parse_radon_value(&data, FirmwareVariant::V3).unwrap();
        assert_eq!(value, 85.0);
    }

    #[test]
    fn test_parse_v1_short_buffer() {
        let err = parse_radon_value(&[0u8; 12], FirmwareVariant::V1).unwrap_err();
        assert!(matches!(
            err,
            Error::MalformedResponse {
                expected: 20,
                actual: 12
            }
        ));
    }

    #[test]
    fn test_parse_modern_short_buffer() {
        let err = parse_radon_value(&[0u8; 34], FirmwareVariant::V2).unwrap_err();
        assert!(matches!(
            err,
            Error::MalformedResponse {
                expected: 35,
                actual: 34
            }
        ));
    }

    #[test]
    fn test_parse_unknown_variant() {
        let err = parse_radon_value(&[0u8; 35], FirmwareVariant::Unknown).unwrap_err();
        assert!(matches!(err, Error::UnsupportedVariant { .. }));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_v2_identity_fragment_order() {
        // Serial fragments at offsets 8, 2, 11 concatenate in that order.
        let mut data = vec![b'.'; 35];
        data[2..8].copy_from_slice(b"BBBBBB");
        data[8..11].copy_from_slice(b"AAA");
        data[11..15].copy_from_slice(b"CCCC");
        data[16..22].copy_from_slice(b"RD200N");
        let identity = parse_device_identity(&data, FirmwareVariant::V2);
        assert_eq!(identity.serial, "AAABBBBBBCCCC");
        assert_eq!(identity.model, "RD200N");
    }

    #[test]
    fn test_v3_identity() {
        let mut data = vec![b'.'; 35];
        data[2..14].copy_from_slice(b"SN1234567890");
        data[15..22].copy_from_slice(b"RD200V3");
        let identity = parse_device_identity(&data, FirmwareVariant::V3);
        assert_eq!(identity.serial, "SN1234567890");
        assert_eq!(identity.model, "RD200V3");
    }

    #[test]
    fn test_identity_sentinel_for_v1_and_unknown() {
        let data = v1_response(1.0);
        assert_eq!(
            parse_device_identity(&data, FirmwareVariant::V1),
            DeviceIdentity::unknown()
        );
        assert_eq!(
            parse_device_identity(&data, FirmwareVariant::Unknown),
            DeviceIdentity::unknown()
        );
    }

    #[test]
    fn test_identity_never_faults_on_short_or_binary_buffers() {
        assert_eq!(
            parse_device_identity(&[0u8; 4], FirmwareVariant::V2),
            DeviceIdentity::unknown()
        );
        // Non-ASCII bytes in the serial range degrade to the sentinel.
        let mut data = vec![b'.'; 35];
        data[3] = 0xFF;
        assert_eq!(
            parse_device_identity(&data, FirmwareVariant::V2),
            DeviceIdentity::unknown()
        );
    }

    proptest! {
        #[test]
        fn detect_never_panics(data in proptest::collection::vec(any::<u8>(), 0..64)) {
            let _ = detect_firmware_variant(&data);
        }

        #[test]
        fn parse_never_reads_out_of_bounds(
            data in proptest::collection::vec(any::<u8>(), 0..64),
        ) {
            for variant in [
                FirmwareVariant::V1,
                FirmwareVariant::V2,
                FirmwareVariant::V3,
                FirmwareVariant::Unknown,
            ] {
                let _ = parse_radon_value(&data, variant);
                let _ = parse_device_identity(&data, variant);
            }
        }

        #[test]
        fn v1_value_is_le_float_times_37_and_never_negative(raw in any::<f32>()) {
            prop_assume!(raw.is_finite());
            let mut data = vec![0u8; 20];
            data[2..6].copy_from_slice(&raw.to_le_bytes());
            let value = parse_radon_value(&data, FirmwareVariant::V1).unwrap();
            prop_assert_eq!(value, (raw as f64 * 37.0).max(0.0));
            prop_assert!(value >= 0.0);
        }
    }
}

//! BLE Service and Characteristic UUIDs.
//!
//! Contains all UUID constants used for RadonEye RD200 communication.
//! First-generation units expose a vendor-custom 128-bit service; V2/V3
//! units moved to handles under the Bluetooth SIG base UUID.

use uuid::Uuid;

// Legacy service (V1 firmware, vendor-custom base)
/// V1 RadonEye service UUID.
pub const SERVICE_UUID_V1: Uuid = Uuid::from_u128(0x0000_1523_1212_efde_1523_785f_eabc_d123);
/// V1 trigger characteristic UUID (write `0x50` to request a measurement).
pub const TRIGGER_UUID_V1: Uuid = Uuid::from_u128(0x0000_1524_1212_efde_1523_785f_eabc_d123);
/// V1 data characteristic UUID (read the 20-byte measurement response).
pub const DATA_UUID_V1: Uuid = Uuid::from_u128(0x0000_1525_1212_efde_1523_785f_eabc_d123);

// Modern service (V2/V3 firmware, SIG base)
/// V2/V3 RadonEye service UUID.
pub const SERVICE_UUID_V2: Uuid = Uuid::from_u128(0x0000_1523_0000_1000_8000_00805f9b34fb);
/// V2/V3 command characteristic UUID (write `0x40` to request status).
pub const COMMAND_UUID_V2: Uuid = Uuid::from_u128(0x0000_1524_0000_1000_8000_00805f9b34fb);
/// V2/V3 status characteristic UUID (read the status response).
pub const STATUS_UUID_V2: Uuid = Uuid::from_u128(0x0000_1525_0000_1000_8000_00805f9b34fb);

/// Check if a service UUID belongs to any RadonEye protocol family.
pub fn is_radoneye_service(uuid: &Uuid) -> bool {
    *uuid == SERVICE_UUID_V1 || *uuid == SERVICE_UUID_V2
}

/// Check if a service UUID is the modern (V2/V3) RadonEye service.
pub fn is_modern_service(uuid: &Uuid) -> bool {
    *uuid == SERVICE_UUID_V2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uuid_format() {
        assert_eq!(
            SERVICE_UUID_V1.to_string(),
            "00001523-1212-efde-1523-785feabcd123"
        );
        assert_eq!(
            SERVICE_UUID_V2.to_string(),
            "00001523-0000-1000-8000-00805f9b34fb"
        );
    }

    #[test]
    fn test_is_radoneye_service() {
        assert!(is_radoneye_service(&SERVICE_UUID_V1));
        assert!(is_radoneye_service(&SERVICE_UUID_V2));
        assert!(!is_radoneye_service(&TRIGGER_UUID_V1));
    }

    #[test]
    fn test_is_modern_service() {
        assert!(is_modern_service(&SERVICE_UUID_V2));
        assert!(!is_modern_service(&SERVICE_UUID_V1));
    }

    #[test]
    fn test_characteristics_share_service_base() {
        // Trigger/data handles differ from the service only in the short id.
        let service = SERVICE_UUID_V1.as_u128();
        let trigger = TRIGGER_UUID_V1.as_u128();
        assert_eq!(service & !(0xFFFF << 96), trigger & !(0xFFFF << 96));
    }
}

//! Error types for the radoneye-rust-ble crate.

use thiserror::Error;

use crate::protocol::FirmwareVariant;

/// The main error type for this crate.
#[derive(Error, Debug)]
pub enum Error {
    /// Bluetooth-related error from the underlying BLE library.
    #[error("Bluetooth error: {0}")]
    Bluetooth(#[from] btleplug::Error),

    /// Bluetooth is not available or is disabled on this system.
    #[error("Bluetooth not available or disabled")]
    BluetoothUnavailable,

    /// The advertisement for the specified device was not found.
    #[error("Device not found: {identifier}")]
    DeviceNotFound {
        /// The identifier that was searched for.
        identifier: String,
    },

    /// Failed to establish a connection to the sensor.
    #[error("Connection failed: {reason}")]
    ConnectionFailed {
        /// Description of why the connection failed.
        reason: String,
    },

    /// The connected device exposes neither the legacy nor the modern
    /// RadonEye service, so no command protocol can be selected.
    #[error("Unknown protocol: device exposes no RadonEye service")]
    UnknownProtocol,

    /// Service not found on the device.
    #[error("Service not found: {uuid}")]
    ServiceNotFound {
        /// The UUID of the service that was not found.
        uuid: String,
    },

    /// Characteristic not found on the device.
    #[error("Characteristic not found: {uuid}")]
    CharacteristicNotFound {
        /// The UUID of the characteristic that was not found.
        uuid: String,
    },

    /// A write or read against the link failed, or the read returned no data.
    #[error("I/O failed: {context}")]
    Io {
        /// Description of the operation that failed.
        context: String,
    },

    /// A response was received but has the wrong length for the expected
    /// firmware variant.
    #[error("Malformed response: need {expected} bytes, got {actual}")]
    MalformedResponse {
        /// Minimum number of bytes the variant's layout requires.
        expected: usize,
        /// Number of bytes actually received.
        actual: usize,
    },

    /// A decode was requested for a variant the codec does not implement.
    /// This indicates a logic defect rather than a transient condition.
    #[error("Unsupported firmware variant: {variant}")]
    UnsupportedVariant {
        /// The variant that was requested.
        variant: FirmwareVariant,
    },

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether the next scheduled poll cycle can be expected to recover
    /// from this error.
    ///
    /// Everything except [`Error::UnsupportedVariant`] and
    /// [`Error::Internal`] is transient: the sensor may be out of range,
    /// mid-boot, or the link may have dropped, and the next tick simply
    /// retries.
    pub fn is_transient(&self) -> bool {
        !matches!(self, Error::UnsupportedVariant { .. } | Error::Internal(_))
    }
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

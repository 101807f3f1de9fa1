//! Transport seam between the sync orchestrator and the wireless stack.
//!
//! The orchestrator never talks to btleplug directly; it drives one poll
//! cycle through the four operations of [`Transport`]. This keeps the
//! state machine testable against [`crate::mock::MockTransport`] while the
//! production implementation lives in [`crate::ble::BleTransport`].

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;

/// Which command protocol the connected unit speaks, as classified by
/// service discovery.
///
/// `Modern` is a candidate only: the status response refines it to V2 or
/// V3 before any value parsing happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateProtocol {
    /// Only the legacy V1 service is present.
    Legacy,
    /// The V2/V3 family service is present.
    Modern,
}

impl std::fmt::Display for CandidateProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Legacy => write!(f, "legacy (V1)"),
            Self::Modern => write!(f, "modern (V2/V3)"),
        }
    }
}

/// One write-then-read exchange against a named service/characteristic
/// pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeSpec {
    /// Service owning both characteristics.
    pub service: Uuid,
    /// Characteristic the command bytes are written to.
    pub write_characteristic: Uuid,
    /// Characteristic the response is read from.
    pub read_characteristic: Uuid,
    /// Command bytes to write.
    pub command: &'static [u8],
}

/// Narrow interface over the platform wireless-peripheral capability.
///
/// Each operation is independently retryable by the caller; the
/// orchestrator retries nothing within a cycle and relies on the next
/// scheduled tick instead.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Handle for a discovered-but-unconnected peripheral.
    type Advertisement: Send + Sync;
    /// Handle for one connect-to-disconnect session.
    type Link: Send + Sync;

    /// Look up the advertisement for a device identifier.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::DeviceNotFound`] when the device is not
    /// currently advertising.
    async fn locate(&self, device_id: &str) -> Result<Self::Advertisement>;

    /// Connect, assert the link is live, and discover services to classify
    /// which command protocol the unit currently speaks.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ConnectionFailed`] when the link cannot be
    /// established and [`crate::Error::UnknownProtocol`] when neither
    /// RadonEye service is present (the link is released before the error
    /// is returned).
    async fn open(
        &self,
        advertisement: &Self::Advertisement,
    ) -> Result<(Self::Link, CandidateProtocol)>;

    /// Issue one write then one read against the named pair.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Io`] when the write or read fails or the
    /// read returns no data.
    async fn exchange(&self, link: &Self::Link, spec: &ExchangeSpec) -> Result<Vec<u8>>;

    /// Best-effort disconnect. Failures are logged by the implementation
    /// and never propagated; a failed disconnect must not prevent the next
    /// cycle from starting.
    async fn close(&self, link: &Self::Link);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_protocol_display() {
        assert_eq!(format!("{}", CandidateProtocol::Legacy), "legacy (V1)");
        assert_eq!(format!("{}", CandidateProtocol::Modern), "modern (V2/V3)");
    }
}

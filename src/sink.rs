//! Published measurement type and the capability sink seam.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::protocol::FirmwareVariant;

/// One decoded radon measurement, the sole externally visible artifact of
/// a successful poll cycle.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RadonReading {
    /// Radon concentration in Bq/m³.
    pub becquerels: f64,
    /// Firmware variant the response was decoded under.
    pub variant: FirmwareVariant,
    /// When the value was read from the sensor.
    pub captured_at: DateTime<Utc>,
}

impl RadonReading {
    /// Create a reading captured now.
    pub fn new(becquerels: f64, variant: FirmwareVariant) -> Self {
        Self {
            becquerels,
            variant,
            captured_at: Utc::now(),
        }
    }
}

impl std::fmt::Display for RadonReading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1} Bq/m³", self.becquerels)
    }
}

/// External capability that receives decoded measurements.
///
/// Implemented by the host integration (home-automation capability value,
/// MQTT topic, console, ...). Publish failures are logged by the
/// orchestrator and never fail the cycle.
#[async_trait]
pub trait MeasurementSink: Send + Sync {
    /// Publish one reading.
    async fn publish(&self, reading: RadonReading) -> Result<()>;
}

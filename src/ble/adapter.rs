//! btleplug implementation of the transport seam.
//!
//! Wraps discovery, connection, service probing, GATT exchange, and
//! disconnect behind [`Transport`] so the sync orchestrator stays free of
//! platform BLE details.

use async_trait::async_trait;
use btleplug::api::{
    Central, CentralEvent, Characteristic, Manager as _, Peripheral as _, ScanFilter, WriteType,
};
use btleplug::platform::{Adapter, Manager, Peripheral};
use futures::stream::StreamExt;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

use crate::ble::uuids::{is_modern_service, SERVICE_UUID_V1, SERVICE_UUID_V2};
use crate::error::{Error, Result};
use crate::transport::{CandidateProtocol, ExchangeSpec, Transport};

/// Production transport backed by the platform BLE stack.
pub struct BleTransport {
    /// The BLE adapter to use.
    adapter: Adapter,
    /// Upper bound on one discovery window.
    scan_timeout: Duration,
}

impl BleTransport {
    /// Default length of one discovery window.
    pub const DEFAULT_SCAN_TIMEOUT: Duration = Duration::from_secs(10);

    /// Create a transport on the first available Bluetooth adapter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BluetoothUnavailable`] if no adapter is present.
    pub async fn new() -> Result<Self> {
        let manager = Manager::new()
            .await
            .map_err(|_e| Error::BluetoothUnavailable)?;

        let adapters = manager.adapters().await.map_err(Error::Bluetooth)?;

        let adapter = adapters
            .into_iter()
            .next()
            .ok_or(Error::BluetoothUnavailable)?;

        info!(
            "Using Bluetooth adapter: {:?}",
            adapter.adapter_info().await.ok()
        );

        Ok(Self::with_adapter(adapter))
    }

    /// Create a transport on a specific adapter.
    pub fn with_adapter(adapter: Adapter) -> Self {
        Self {
            adapter,
            scan_timeout: Self::DEFAULT_SCAN_TIMEOUT,
        }
    }

    /// Change the discovery window length.
    pub fn set_scan_timeout(&mut self, timeout: Duration) {
        self.scan_timeout = timeout;
    }

    /// Check whether a peripheral matches the stored device identifier,
    /// by peripheral id or by advertised local name.
    async fn matches(peripheral: &Peripheral, device_id: &str) -> bool {
        if peripheral.id().to_string() == device_id {
            return true;
        }
        match peripheral.properties().await {
            Ok(Some(properties)) => properties.local_name.as_deref() == Some(device_id),
            _ => false,
        }
    }

    /// One pass over the currently known peripherals.
    async fn find_peripheral(&self, device_id: &str) -> Result<Option<Peripheral>> {
        for peripheral in self.adapter.peripherals().await.map_err(Error::Bluetooth)? {
            if Self::matches(&peripheral, device_id).await {
                return Ok(Some(peripheral));
            }
        }
        Ok(None)
    }

    /// Resolve a characteristic from the discovered GATT table.
    fn characteristic(link: &Peripheral, spec: &ExchangeSpec, uuid: uuid::Uuid) -> Result<Characteristic> {
        let service = link
            .services()
            .into_iter()
            .find(|s| s.uuid == spec.service)
            .ok_or_else(|| Error::ServiceNotFound {
                uuid: spec.service.to_string(),
            })?;

        service
            .characteristics
            .into_iter()
            .find(|c| c.uuid == uuid)
            .ok_or_else(|| Error::CharacteristicNotFound {
                uuid: uuid.to_string(),
            })
    }

    /// Classify the command protocol from the discovered services.
    fn classify(link: &Peripheral) -> Option<CandidateProtocol> {
        let services = link.services();

        if services.iter().any(|s| is_modern_service(&s.uuid)) {
            Some(CandidateProtocol::Modern)
        } else if services.iter().any(|s| s.uuid == SERVICE_UUID_V1) {
            Some(CandidateProtocol::Legacy)
        } else {
            None
        }
    }

    /// Assert the link is live and classify the command protocol.
    ///
    /// Runs after `connect()` has succeeded; any failure here must be
    /// followed by a disconnect, since the orchestrator never sees a link
    /// from a failed `open` and cannot close it.
    async fn probe_link(link: &Peripheral) -> Result<CandidateProtocol> {
        if !link.is_connected().await.unwrap_or(false) {
            return Err(Error::ConnectionFailed {
                reason: "link not live after connect".to_string(),
            });
        }

        link.discover_services()
            .await
            .map_err(|e| Error::ConnectionFailed {
                reason: format!("service discovery failed: {e}"),
            })?;

        Self::classify(link).ok_or(Error::UnknownProtocol)
    }
}

#[async_trait]
impl Transport for BleTransport {
    type Advertisement = Peripheral;
    type Link = Peripheral;

    async fn locate(&self, device_id: &str) -> Result<Peripheral> {
        debug!("Scanning for device {}", device_id);

        let mut events = self.adapter.events().await.map_err(Error::Bluetooth)?;

        let filter = ScanFilter {
            services: vec![SERVICE_UUID_V1, SERVICE_UUID_V2],
        };
        self.adapter
            .start_scan(filter)
            .await
            .map_err(Error::Bluetooth)?;

        // Peripherals cached from an earlier window short-circuit the scan.
        let mut found = self.find_peripheral(device_id).await?;

        let deadline = tokio::time::sleep(self.scan_timeout);
        tokio::pin!(deadline);

        while found.is_none() {
            tokio::select! {
                Some(event) = events.next() => {
                    let (CentralEvent::DeviceDiscovered(id)
                        | CentralEvent::DeviceUpdated(id)) = event else { continue };

                    trace!("Device advertisement: {:?}", id);
                    if let Ok(peripheral) = self.adapter.peripheral(&id).await {
                        if Self::matches(&peripheral, device_id).await {
                            found = Some(peripheral);
                        }
                    }
                }
                _ = &mut deadline => break,
            }
        }

        if let Err(e) = self.adapter.stop_scan().await {
            debug!("Failed to stop scan: {}", e);
        }

        found.ok_or_else(|| Error::DeviceNotFound {
            identifier: device_id.to_string(),
        })
    }

    async fn open(&self, advertisement: &Peripheral) -> Result<(Peripheral, CandidateProtocol)> {
        let link = advertisement.clone();

        link.connect().await.map_err(|e| Error::ConnectionFailed {
            reason: e.to_string(),
        })?;

        match Self::probe_link(&link).await {
            Ok(candidate) => {
                debug!("Connected, device speaks {} protocol", candidate);
                Ok((link, candidate))
            }
            Err(e) => {
                // Release the link before surfacing the probe failure so
                // the cycle's cleanup has nothing left to undo. The unit
                // accepts a single connection; a leaked link would starve
                // every following cycle.
                if let Err(de) = link.disconnect().await {
                    warn!("Disconnect after failed probe also failed: {}", de);
                }
                Err(e)
            }
        }
    }

    async fn exchange(&self, link: &Peripheral, spec: &ExchangeSpec) -> Result<Vec<u8>> {
        let write_char = Self::characteristic(link, spec, spec.write_characteristic)?;
        let read_char = Self::characteristic(link, spec, spec.read_characteristic)?;

        link.write(&write_char, spec.command, WriteType::WithResponse)
            .await
            .map_err(|e| Error::Io {
                context: format!("write to {}: {e}", spec.write_characteristic),
            })?;

        trace!(
            "Wrote {:02X?} to {}, reading {}",
            spec.command,
            spec.write_characteristic,
            spec.read_characteristic
        );

        let data = link.read(&read_char).await.map_err(|e| Error::Io {
            context: format!("read from {}: {e}", spec.read_characteristic),
        })?;

        if data.is_empty() {
            return Err(Error::Io {
                context: format!("no data from {}", spec.read_characteristic),
            });
        }

        trace!("Read {} bytes: {:02X?}", data.len(), data);

        Ok(data)
    }

    async fn close(&self, link: &Peripheral) {
        match link.disconnect().await {
            Ok(()) => debug!("Disconnected from device"),
            // A failed disconnect must never block the next cycle.
            Err(e) => warn!("Disconnect failed: {}", e),
        }
    }
}

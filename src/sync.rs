//! Per-device sync orchestrator.
//!
//! Drives one polling cycle end-to-end: acquire a session, probe the
//! protocol family, issue the variant-specific command, decode the
//! response, publish the reading, and release the session. Owns the
//! mutual-exclusion flag that keeps cycles for the same device from
//! overlapping, and the periodic timer that triggers them.
//!
//! There is no in-cycle retry and no backoff: any transient failure is
//! logged, the link is released, and the next scheduled tick retries.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::protocol::{
    detect_firmware_variant, parse_device_identity, parse_radon_value, FirmwareVariant,
    V1_RESPONSE_LEN, V1_TRIGGER_EXCHANGE, V2_STATUS_EXCHANGE,
};
use crate::sink::{MeasurementSink, RadonReading};
use crate::transport::{CandidateProtocol, Transport};

/// Default poll interval (5 minutes).
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Orchestrator configuration.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Fixed interval between poll cycles.
    pub interval: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_SYNC_INTERVAL,
        }
    }
}

/// Per-device mutable state.
///
/// `operation_in_progress` is the mutual-exclusion flag guarding
/// overlapping poll cycles. The variant is a hint for logging only; it is
/// re-detected every cycle and never trusted for parsing decisions.
struct DeviceState {
    operation_in_progress: AtomicBool,
    last_known_variant: RwLock<FirmwareVariant>,
}

impl DeviceState {
    fn new() -> Self {
        Self {
            operation_in_progress: AtomicBool::new(false),
            last_known_variant: RwLock::new(FirmwareVariant::Unknown),
        }
    }
}

/// Cycle internals, shared with the background timer task.
struct SyncInner<T, S> {
    device_id: String,
    transport: T,
    sink: S,
    state: DeviceState,
}

impl<T, S> SyncInner<T, S>
where
    T: Transport,
    S: MeasurementSink,
{
    /// Run one poll cycle, unless one is already in flight.
    ///
    /// A trigger that arrives while a cycle is in progress is skipped, not
    /// queued; the flag is cleared unconditionally once the cycle ends.
    async fn sync_once(&self) -> Result<()> {
        if self
            .state
            .operation_in_progress
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!(
                device = %self.device_id,
                "Sync already in progress, skipping this trigger"
            );
            return Ok(());
        }

        let outcome = self.run_cycle().await;
        self.state
            .operation_in_progress
            .store(false, Ordering::SeqCst);

        if let Err(e) = &outcome {
            if e.is_transient() {
                warn!(
                    device = %self.device_id,
                    "Sync cycle failed, will retry at next interval: {}", e
                );
            } else {
                error!(device = %self.device_id, "Sync cycle hit a logic fault: {}", e);
            }
        }

        outcome
    }

    /// Locate, open, poll, publish, and release the link.
    ///
    /// Once `open` has returned a link, `close` runs exactly once on every
    /// path out of this function.
    async fn run_cycle(&self) -> Result<()> {
        debug!(device = %self.device_id, "Starting sync cycle");

        let advertisement = self.transport.locate(&self.device_id).await?;
        let (link, candidate) = self.transport.open(&advertisement).await?;

        let outcome = self.poll_link(&link, candidate).await;

        if let Ok(reading) = &outcome {
            info!(device = %self.device_id, "Sync cycle complete: {}", reading);
            if let Err(e) = self.sink.publish(reading.clone()).await {
                warn!(device = %self.device_id, "Failed to publish reading: {}", e);
            }
        }

        self.transport.close(&link).await;

        outcome.map(|_| ())
    }

    /// Command the device and decode the response.
    ///
    /// The legacy path expects the exact 20-byte trigger response. The
    /// modern path refines the candidate to V2 or V3 from the status
    /// response it just read; that refinement is authoritative for the
    /// cycle and is never re-probed.
    async fn poll_link(&self, link: &T::Link, candidate: CandidateProtocol) -> Result<RadonReading> {
        let (data, variant) = match candidate {
            CandidateProtocol::Legacy => {
                let data = self.transport.exchange(link, &V1_TRIGGER_EXCHANGE).await?;
                if data.len() != V1_RESPONSE_LEN {
                    return Err(Error::MalformedResponse {
                        expected: V1_RESPONSE_LEN,
                        actual: data.len(),
                    });
                }
                (data, FirmwareVariant::V1)
            }
            CandidateProtocol::Modern => {
                let data = self.transport.exchange(link, &V2_STATUS_EXCHANGE).await?;
                let variant = detect_firmware_variant(&data);
                if variant.is_modern() {
                    let identity = parse_device_identity(&data, variant);
                    debug!(
                        device = %self.device_id,
                        "Detected {} firmware, identity {}", variant, identity
                    );
                }
                (data, variant)
            }
        };

        let previous = *self.state.last_known_variant.read();
        if previous != FirmwareVariant::Unknown && previous != variant {
            info!(
                device = %self.device_id,
                "Firmware variant changed: {} -> {}", previous, variant
            );
        }

        let becquerels = parse_radon_value(&data, variant)?;
        *self.state.last_known_variant.write() = variant;

        Ok(RadonReading::new(becquerels, variant))
    }
}

/// Periodic poll orchestrator for one RadonEye device.
///
/// Created with a device identifier (captured at pairing time), a
/// [`Transport`], and a [`MeasurementSink`]. `start` begins periodic
/// scheduling with an immediate first cycle; `stop` cancels the timer
/// without interrupting an in-flight cycle.
pub struct RadonSync<T, S> {
    inner: Arc<SyncInner<T, S>>,
    config: SyncConfig,
    running: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
    task: RwLock<Option<tokio::task::JoinHandle<()>>>,
}

impl<T, S> RadonSync<T, S>
where
    T: Transport + 'static,
    S: MeasurementSink + 'static,
{
    /// Create an orchestrator with the default 5-minute interval.
    pub fn new(device_id: impl Into<String>, transport: T, sink: S) -> Self {
        Self::with_config(device_id, transport, sink, SyncConfig::default())
    }

    /// Create an orchestrator with a custom configuration.
    pub fn with_config(
        device_id: impl Into<String>,
        transport: T,
        sink: S,
        config: SyncConfig,
    ) -> Self {
        Self {
            inner: Arc::new(SyncInner {
                device_id: device_id.into(),
                transport,
                sink,
                state: DeviceState::new(),
            }),
            config,
            running: Arc::new(AtomicBool::new(false)),
            shutdown: Arc::new(Notify::new()),
            task: RwLock::new(None),
        }
    }

    /// The device identifier this orchestrator polls.
    pub fn device_id(&self) -> &str {
        &self.inner.device_id
    }

    /// Whether a cycle is currently in flight.
    pub fn is_busy(&self) -> bool {
        self.inner.state.operation_in_progress.load(Ordering::SeqCst)
    }

    /// The variant detected by the most recent successful decode.
    ///
    /// A hint for hosts and logs; parsing never relies on it.
    pub fn last_known_variant(&self) -> FirmwareVariant {
        *self.inner.state.last_known_variant.read()
    }

    /// Run a single poll cycle now.
    ///
    /// Skipped as a no-op if a cycle is already in flight.
    pub async fn sync_once(&self) -> Result<()> {
        self.inner.sync_once().await
    }

    /// Begin periodic polling with an immediate first cycle.
    pub fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            debug!(device = %self.inner.device_id, "Already started");
            return;
        }

        info!(
            device = %self.inner.device_id,
            "Starting periodic sync every {:?}", self.config.interval
        );

        let inner = self.inner.clone();
        let running = self.running.clone();
        let shutdown = self.shutdown.clone();
        let interval = self.config.interval;

        let handle = tokio::spawn(async move {
            while running.load(Ordering::SeqCst) {
                let _ = inner.sync_once().await;

                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    _ = shutdown.notified() => break,
                }
            }
            debug!(device = %inner.device_id, "Sync task ended");
        });

        *self.task.write() = Some(handle);
    }

    /// Stop periodic polling.
    ///
    /// An in-flight cycle is allowed to finish (or fault); nothing is
    /// rescheduled afterwards.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }

        info!(device = %self.inner.device_id, "Stopping periodic sync");
        self.shutdown.notify_one();

        // Take the handle out before awaiting so the lock guard is not
        // held across the suspension point.
        let handle = self.task.write().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}

//! Mock transport and sink for testing without BLE hardware.
//!
//! [`MockTransport`] implements the [`Transport`] trait, allowing the sync
//! orchestrator to run against scripted responses. Supports failure
//! injection per operation, simulated latency, and per-operation call
//! counters so tests can assert exactly which transport calls a cycle
//! made.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::sink::{MeasurementSink, RadonReading};
use crate::transport::{CandidateProtocol, ExchangeSpec, Transport};

/// A scripted transport double.
pub struct MockTransport {
    /// Protocol family reported by `open`.
    candidate: Mutex<CandidateProtocol>,
    /// Bytes returned by `exchange`.
    response: Mutex<Vec<u8>>,
    fail_locate: AtomicBool,
    fail_open: AtomicBool,
    report_unknown_protocol: AtomicBool,
    fail_exchange: AtomicBool,
    /// Simulated locate latency in milliseconds (0 = no delay).
    locate_latency_ms: AtomicU64,
    locate_calls: AtomicU32,
    open_calls: AtomicU32,
    exchange_calls: AtomicU32,
    close_calls: AtomicU32,
    /// Links handed out by `open` and not yet closed.
    outstanding_links: AtomicI32,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    /// Create a mock that reports a legacy (V1) device with an all-zero
    /// 20-byte response.
    pub fn new() -> Self {
        Self {
            candidate: Mutex::new(CandidateProtocol::Legacy),
            response: Mutex::new(vec![0u8; 20]),
            fail_locate: AtomicBool::new(false),
            fail_open: AtomicBool::new(false),
            report_unknown_protocol: AtomicBool::new(false),
            fail_exchange: AtomicBool::new(false),
            locate_latency_ms: AtomicU64::new(0),
            locate_calls: AtomicU32::new(0),
            open_calls: AtomicU32::new(0),
            exchange_calls: AtomicU32::new(0),
            close_calls: AtomicU32::new(0),
            outstanding_links: AtomicI32::new(0),
        }
    }

    /// Set the protocol family `open` reports.
    pub fn set_candidate(&self, candidate: CandidateProtocol) {
        *self.candidate.lock() = candidate;
    }

    /// Set the bytes `exchange` returns.
    pub fn set_response(&self, response: Vec<u8>) {
        *self.response.lock() = response;
    }

    /// Make `locate` fail with [`Error::DeviceNotFound`].
    pub fn fail_locate(&self, fail: bool) {
        self.fail_locate.store(fail, Ordering::SeqCst);
    }

    /// Make `open` fail with [`Error::ConnectionFailed`].
    pub fn fail_open(&self, fail: bool) {
        self.fail_open.store(fail, Ordering::SeqCst);
    }

    /// Make `open` fail with [`Error::UnknownProtocol`].
    pub fn report_unknown_protocol(&self, unknown: bool) {
        self.report_unknown_protocol.store(unknown, Ordering::SeqCst);
    }

    /// Make `exchange` fail with [`Error::Io`].
    pub fn fail_exchange(&self, fail: bool) {
        self.fail_exchange.store(fail, Ordering::SeqCst);
    }

    /// Add artificial delay to `locate`, to hold a cycle in flight.
    pub fn set_locate_latency(&self, latency: Duration) {
        self.locate_latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    /// Number of `locate` calls made.
    pub fn locate_calls(&self) -> u32 {
        self.locate_calls.load(Ordering::SeqCst)
    }

    /// Number of `open` calls made.
    pub fn open_calls(&self) -> u32 {
        self.open_calls.load(Ordering::SeqCst)
    }

    /// Number of `exchange` calls made.
    pub fn exchange_calls(&self) -> u32 {
        self.exchange_calls.load(Ordering::SeqCst)
    }

    /// Number of `close` calls made.
    pub fn close_calls(&self) -> u32 {
        self.close_calls.load(Ordering::SeqCst)
    }

    /// Links handed out by `open` and not yet released by `close`.
    ///
    /// Zero after a finished cycle regardless of outcome; a failed `open`
    /// releases its connection itself and never hands out a link.
    pub fn outstanding_links(&self) -> i32 {
        self.outstanding_links.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for MockTransport {
    type Advertisement = String;
    type Link = ();

    async fn locate(&self, device_id: &str) -> Result<String> {
        self.locate_calls.fetch_add(1, Ordering::SeqCst);

        let latency = self.locate_latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }

        if self.fail_locate.load(Ordering::SeqCst) {
            return Err(Error::DeviceNotFound {
                identifier: device_id.to_string(),
            });
        }
        Ok(device_id.to_string())
    }

    async fn open(&self, _advertisement: &String) -> Result<((), CandidateProtocol)> {
        self.open_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_open.load(Ordering::SeqCst) {
            return Err(Error::ConnectionFailed {
                reason: "mock connect failure".to_string(),
            });
        }
        if self.report_unknown_protocol.load(Ordering::SeqCst) {
            return Err(Error::UnknownProtocol);
        }
        self.outstanding_links.fetch_add(1, Ordering::SeqCst);
        Ok(((), *self.candidate.lock()))
    }

    async fn exchange(&self, _link: &(), _spec: &ExchangeSpec) -> Result<Vec<u8>> {
        self.exchange_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_exchange.load(Ordering::SeqCst) {
            return Err(Error::Io {
                context: "mock exchange failure".to_string(),
            });
        }
        Ok(self.response.lock().clone())
    }

    async fn close(&self, _link: &()) {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        self.outstanding_links.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A sink that records every published reading.
pub struct RecordingSink {
    published: Mutex<Vec<RadonReading>>,
    fail: AtomicBool,
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingSink {
    /// Create an empty recording sink.
    pub fn new() -> Self {
        Self {
            published: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
        }
    }

    /// Make `publish` fail with [`Error::Internal`].
    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// All readings published so far.
    pub fn published(&self) -> Vec<RadonReading> {
        self.published.lock().clone()
    }

    /// The most recently published reading.
    pub fn last(&self) -> Option<RadonReading> {
        self.published.lock().last().cloned()
    }
}

#[async_trait]
impl MeasurementSink for RecordingSink {
    async fn publish(&self, reading: RadonReading) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Internal("mock sink failure".to_string()));
        }
        self.published.lock().push(reading);
        Ok(())
    }
}

//! Scriptable in-memory peripheral for tests.
//!
//! The mock records every call it receives and lets a test drive the
//! transport from the outside: inject notification payloads, fire an
//! unsolicited disconnect, park discovery behind a gate, or close the
//! payload stream to simulate a transport fault while subscribed.
//!
//! It ships as a regular module (not `#[cfg(test)]`) so the integration
//! tests in `tests/` can use it through the public crate API.

use std::sync::Mutex;

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::sync::Notify;
use uuid::Uuid;

use bletail_core::GattService;

use super::{BleError, BlePeripheral, EventStream, PayloadStream, PeripheralEvent};

/// What the mock does when `connect` is called.
#[derive(Debug, Clone)]
enum ConnectBehavior {
    Succeed,
    Reject(String),
    /// Never completes; used to exercise the connect timeout.
    Hang,
}

/// One recorded call on the mock, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Connect,
    DiscoverServices,
    Notifications(Uuid),
    Subscribe(Uuid),
    Unsubscribe(Uuid),
    Disconnect,
}

/// In-memory [`BlePeripheral`] double.
pub struct MockPeripheral {
    name: String,
    services: Vec<GattService>,
    connect_behavior: ConnectBehavior,
    gate_discovery: bool,
    subscribe_fails: bool,
    discovery_gate: Notify,
    events_tx: Mutex<Option<mpsc::UnboundedSender<PeripheralEvent>>>,
    events_rx: Mutex<Option<mpsc::UnboundedReceiver<PeripheralEvent>>>,
    payloads_tx: Mutex<Option<mpsc::UnboundedSender<Vec<u8>>>>,
    payloads_rx: Mutex<Option<mpsc::UnboundedReceiver<Vec<u8>>>>,
    calls: Mutex<Vec<MockCall>>,
}

impl MockPeripheral {
    /// Mock whose connect succeeds immediately.
    pub fn new(name: &str, services: Vec<GattService>) -> Self {
        Self::with_behavior(name, services, ConnectBehavior::Succeed)
    }

    /// Mock whose connect fails with `reason`.
    pub fn rejecting(name: &str, services: Vec<GattService>, reason: &str) -> Self {
        Self::with_behavior(name, services, ConnectBehavior::Reject(reason.to_string()))
    }

    /// Mock whose connect never completes.
    pub fn hanging(name: &str, services: Vec<GattService>) -> Self {
        Self::with_behavior(name, services, ConnectBehavior::Hang)
    }

    fn with_behavior(name: &str, services: Vec<GattService>, behavior: ConnectBehavior) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (payloads_tx, payloads_rx) = mpsc::unbounded_channel();
        Self {
            name: name.to_string(),
            services,
            connect_behavior: behavior,
            gate_discovery: false,
            subscribe_fails: false,
            discovery_gate: Notify::new(),
            events_tx: Mutex::new(Some(events_tx)),
            events_rx: Mutex::new(Some(events_rx)),
            payloads_tx: Mutex::new(Some(payloads_tx)),
            payloads_rx: Mutex::new(Some(payloads_rx)),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Makes `discover_services` park until [`Self::release_discovery`].
    pub fn with_gated_discovery(mut self) -> Self {
        self.gate_discovery = true;
        self
    }

    /// Makes `subscribe` fail.
    pub fn with_failing_subscribe(mut self) -> Self {
        self.subscribe_fails = true;
        self
    }

    /// Unparks a gated `discover_services` call (also works if discovery
    /// has not reached the gate yet).
    pub fn release_discovery(&self) {
        self.discovery_gate.notify_one();
    }

    /// Injects one raw notification payload.
    pub fn push_payload(&self, bytes: &[u8]) {
        if let Some(tx) = self.payloads_tx.lock().unwrap().as_ref() {
            let _ = tx.send(bytes.to_vec());
        }
    }

    /// Fires an unsolicited disconnect event.
    pub fn emit_disconnect(&self) {
        if let Some(tx) = self.events_tx.lock().unwrap().as_ref() {
            let _ = tx.send(PeripheralEvent::Disconnected);
        }
    }

    /// Ends the payload stream without a disconnect event, simulating a
    /// transport fault while subscribed.
    pub fn close_payload_stream(&self) {
        *self.payloads_tx.lock().unwrap() = None;
    }

    /// Snapshot of all recorded calls, in arrival order.
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: MockCall) {
        self.calls.lock().unwrap().push(call);
    }
}

fn stream_from_unbounded<T: Send + 'static>(
    rx: mpsc::UnboundedReceiver<T>,
) -> BoxStream<'static, T> {
    futures::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|item| (item, rx))
    })
    .boxed()
}

#[async_trait]
impl BlePeripheral for MockPeripheral {
    fn name(&self) -> String {
        self.name.clone()
    }

    async fn connect(&self) -> Result<(), BleError> {
        self.record(MockCall::Connect);
        match &self.connect_behavior {
            ConnectBehavior::Succeed => Ok(()),
            ConnectBehavior::Reject(reason) => Err(BleError::Backend(reason.clone())),
            ConnectBehavior::Hang => {
                std::future::pending::<()>().await;
                Ok(())
            }
        }
    }

    async fn disconnect(&self) -> Result<(), BleError> {
        self.record(MockCall::Disconnect);
        Ok(())
    }

    async fn events(&self) -> Result<EventStream, BleError> {
        let rx = self
            .events_rx
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| BleError::Backend("event stream already taken".to_string()))?;
        Ok(stream_from_unbounded(rx))
    }

    async fn discover_services(&self) -> Result<Vec<GattService>, BleError> {
        self.record(MockCall::DiscoverServices);
        if self.gate_discovery {
            self.discovery_gate.notified().await;
        }
        Ok(self.services.clone())
    }

    async fn subscribe(&self, characteristic: Uuid) -> Result<(), BleError> {
        self.record(MockCall::Subscribe(characteristic));
        if self.subscribe_fails {
            return Err(BleError::Backend("CCCD write refused".to_string()));
        }
        Ok(())
    }

    async fn unsubscribe(&self, characteristic: Uuid) -> Result<(), BleError> {
        self.record(MockCall::Unsubscribe(characteristic));
        Ok(())
    }

    async fn notifications(&self, characteristic: Uuid) -> Result<PayloadStream, BleError> {
        // Single-channel mock: every injected payload belongs to the
        // subscribed characteristic.
        self.record(MockCall::Notifications(characteristic));
        let rx = self
            .payloads_rx
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| BleError::Backend("payload stream already taken".to_string()))?;
        Ok(stream_from_unbounded(rx))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

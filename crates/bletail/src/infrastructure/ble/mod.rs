//! BLE transport seam.
//!
//! The session manager never talks to the platform BLE stack directly; it
//! holds an `Arc<dyn BlePeripheral>` supplied by the discovery collaborator.
//! The trait models exactly the operations one session needs, in the order
//! the lifecycle uses them: connect, watch connection-state events, discover
//! the GATT tree, subscribe to one characteristic, stream its payloads, and
//! disconnect.
//!
//! Two implementations exist:
//! - [`btleplug_backend::BtleplugPeripheral`] wraps a real peripheral.
//! - [`mock::MockPeripheral`] is the scriptable in-memory double the
//!   integration tests drive.

use async_trait::async_trait;
use futures::stream::BoxStream;
use thiserror::Error;
use uuid::Uuid;

use bletail_core::GattService;

pub mod btleplug_backend;
pub mod mock;

/// Raw notification payloads from one subscribed characteristic.
pub type PayloadStream = BoxStream<'static, Vec<u8>>;

/// Connection-state events pushed by the platform stack.
pub type EventStream = BoxStream<'static, PeripheralEvent>;

/// Unsolicited connection-state change of the peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeripheralEvent {
    /// The link dropped without a local `disconnect` call (peripheral
    /// powered off, out of range, link loss).
    Disconnected,
}

/// Error type for the BLE transport layer.
#[derive(Debug, Error)]
pub enum BleError {
    /// No Bluetooth adapter is present on this machine.
    #[error("no Bluetooth adapter available")]
    NoAdapter,

    /// The scan window elapsed without a matching peripheral advertising.
    #[error("no peripheral matching name prefix {0:?} found")]
    NoMatchingPeripheral(String),

    /// The requested characteristic does not exist on the peripheral.
    #[error("characteristic {0} not present on peripheral")]
    UnknownCharacteristic(Uuid),

    /// Any error surfaced by the underlying BLE stack.
    #[error("{0}")]
    Backend(String),
}

/// One connectable BLE peripheral, as the session manager sees it.
///
/// Exactly one session owns a peripheral at a time.  All methods are
/// cancel-safe from the caller's point of view: aborting a pending call
/// leaves the implementation free to finish or fail it in the background.
#[async_trait]
pub trait BlePeripheral: Send + Sync {
    /// Human-readable identifier used in logs and status lines.
    fn name(&self) -> String;

    /// Establishes the transport link.
    async fn connect(&self) -> Result<(), BleError>;

    /// Closes the transport link.  Safe to call on a link that never came
    /// up or already dropped.
    async fn disconnect(&self) -> Result<(), BleError>;

    /// Stream of unsolicited connection-state events for this peripheral.
    ///
    /// Must be obtainable before `connect` is issued so no disconnect can
    /// fall into the gap between connecting and listening.
    async fn events(&self) -> Result<EventStream, BleError>;

    /// Runs GATT discovery and returns an immutable snapshot of the tree.
    async fn discover_services(&self) -> Result<Vec<GattService>, BleError>;

    /// Enables notifications/indications on one characteristic.
    async fn subscribe(&self, characteristic: Uuid) -> Result<(), BleError>;

    /// Disables notifications/indications on one characteristic.
    async fn unsubscribe(&self, characteristic: Uuid) -> Result<(), BleError>;

    /// Stream of raw payloads for one characteristic, filtered so payloads
    /// of other characteristics never leak through.
    async fn notifications(&self, characteristic: Uuid) -> Result<PayloadStream, BleError>;
}

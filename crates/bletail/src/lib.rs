//! bletail library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does bletail do?
//!
//! BleTail is a notification tail for a single BLE peripheral.  It:
//!
//! 1. Receives an already-chosen peripheral from the discovery collaborator.
//! 2. Connects to it, discovers its GATT tree, and deterministically picks
//!    one characteristic to subscribe to (the application's well-known
//!    `0xABF0`/`0xABF2` channel when present, otherwise the first
//!    notify/indicate-capable characteristic).
//! 3. Decodes every inbound notification as best-effort UTF-8 text and
//!    appends it to a bounded, newest-first message log.
//! 4. Mirrors the session state and the latest message into the platform
//!    keepalive facility so the device stays visible while the application
//!    is backgrounded.
//! 5. Survives unsolicited disconnects by tearing the session down to a
//!    clean `Disconnected` state from which `connect` can simply be retried.

/// Application layer: the session state machine, the subscription pipeline,
/// and the visibility bridge.
pub mod application;

/// Infrastructure layer: the BLE transport seam, the keepalive seam, TOML
/// configuration, and the presentation-facing DTO bridge.
pub mod infrastructure;

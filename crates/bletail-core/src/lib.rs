//! # bletail-core
//!
//! Shared library for BleTail containing the session domain model, the
//! bounded message log, and the GATT channel-selection policy.
//!
//! This crate is consumed by the `bletail` application crate. It has zero
//! dependencies on OS APIs, the BLE stack, or the async runtime, so every
//! rule in it can be unit-tested synchronously on any platform.
//!
//! # Architecture overview
//!
//! BleTail connects to a single BLE peripheral, subscribes to one data
//! characteristic on it, and tails the notifications it pushes into an
//! in-memory log while the application is backgrounded.  This crate defines
//! the pieces of that system that are pure logic:
//!
//! - **`domain`** – The session lifecycle enum (`Disconnected` →
//!   `Connecting` → `Connected`), the error kinds a session can fail with,
//!   and the newest-first, capacity-bounded `MessageLog`.
//!
//! - **`gatt`** – An immutable snapshot of a peripheral's discovered
//!   service/characteristic tree, Bluetooth base-UUID expansion helpers,
//!   and the deterministic policy that picks the one characteristic to
//!   subscribe to.

pub mod domain;
pub mod gatt;

// Re-export the most-used types at the crate root so callers can write
// `bletail_core::SessionState` instead of `bletail_core::domain::session::SessionState`.
pub use domain::message::{MessageEntry, MessageLog, MESSAGE_LOG_CAPACITY};
pub use domain::session::{SessionError, SessionState};
pub use gatt::selector::select_data_channel;
pub use gatt::{CharacteristicProps, GattCharacteristic, GattService};

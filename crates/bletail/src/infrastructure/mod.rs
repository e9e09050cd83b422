//! Infrastructure layer: everything that touches the outside world.

/// BLE transport seam: trait, btleplug backend, in-memory mock.
pub mod ble;

/// Keepalive collaborator seam (the background-visibility facility).
pub mod keepalive;

/// Configuration persistence.
pub mod storage;

/// Presentation-facing DTO snapshots and command envelope.
pub mod ui_bridge;

//! Deterministic channel selection over a discovered GATT tree.
//!
//! Given the full snapshot, pick exactly one characteristic to subscribe
//! to.  The policy is ordered, first-match-wins (not a scored "best
//! match"), so re-running it over the same tree always returns the same
//! characteristic:
//!
//! 1. The well-known data characteristic (`0xABF2`) inside any well-known
//!    data service (`0xABF0`).  The application's own channel always beats
//!    a generic one.
//! 2. Otherwise, the first notify- or indicate-capable characteristic in
//!    enumeration order, across all services.
//! 3. Otherwise there is nothing to subscribe to: `NoDataChannel`.

use tracing::debug;

use crate::domain::session::SessionError;
use crate::gatt::uuids::{matches_alias, DATA_CHANNEL_ALIAS, DATA_SERVICE_ALIAS};
use crate::gatt::{GattCharacteristic, GattService};

/// Selects the one characteristic to subscribe to, or fails with
/// [`SessionError::NoDataChannel`].
pub fn select_data_channel(
    services: &[GattService],
) -> Result<&GattCharacteristic, SessionError> {
    // Priority 1: the application's well-known service/characteristic pair.
    for service in services {
        if !matches_alias(&service.uuid, DATA_SERVICE_ALIAS) {
            continue;
        }
        if let Some(characteristic) = service
            .characteristics
            .iter()
            .find(|c| matches_alias(&c.uuid, DATA_CHANNEL_ALIAS))
        {
            debug!(uuid = %characteristic.uuid, "selected well-known data channel");
            return Ok(characteristic);
        }
    }

    // Priority 2: first push-capable characteristic in enumeration order.
    for service in services {
        if let Some(characteristic) = service.characteristics.iter().find(|c| c.properties.can_push())
        {
            debug!(
                service = %service.uuid,
                uuid = %characteristic.uuid,
                "selected first notify/indicate characteristic"
            );
            return Ok(characteristic);
        }
    }

    Err(SessionError::NoDataChannel)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

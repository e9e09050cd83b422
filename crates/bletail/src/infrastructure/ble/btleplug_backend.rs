//! btleplug-backed implementation of the transport seam, plus the discovery
//! collaborator that picks the peripheral a session will own.
//!
//! The backend wraps one `btleplug::platform::Peripheral` together with the
//! `Adapter` it was found on.  The adapter is kept because unsolicited
//! disconnects are reported on the adapter's `CentralEvent` stream, not on
//! the peripheral itself; [`BlePeripheral::events`] filters that stream down
//! to this one peripheral.

use std::time::Duration;

use async_trait::async_trait;
use btleplug::api::{
    Central, CentralEvent, CharPropFlags, Manager as _, Peripheral as _, ScanFilter,
};
use btleplug::platform::{Adapter, Manager, Peripheral};
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, info};
use uuid::Uuid;

use bletail_core::{CharacteristicProps, GattCharacteristic, GattService};

use super::{BleError, BlePeripheral, EventStream, PayloadStream, PeripheralEvent};

impl From<btleplug::Error> for BleError {
    fn from(e: btleplug::Error) -> Self {
        BleError::Backend(e.to_string())
    }
}

/// Settings for the discovery scan.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Local-name prefix to match; empty matches any advertising peripheral.
    pub name_prefix: String,
    /// How long to listen for advertisements before giving up.
    pub scan_window: Duration,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            name_prefix: String::new(),
            scan_window: Duration::from_secs(5),
        }
    }
}

/// A real peripheral, as produced by [`find_peripheral`].
pub struct BtleplugPeripheral {
    adapter: Adapter,
    peripheral: Peripheral,
    local_name: Option<String>,
}

impl BtleplugPeripheral {
    pub fn new(adapter: Adapter, peripheral: Peripheral, local_name: Option<String>) -> Self {
        Self {
            adapter,
            peripheral,
            local_name,
        }
    }

    fn characteristic_by_uuid(
        &self,
        uuid: Uuid,
    ) -> Result<btleplug::api::Characteristic, BleError> {
        self.peripheral
            .characteristics()
            .into_iter()
            .find(|c| c.uuid == uuid)
            .ok_or(BleError::UnknownCharacteristic(uuid))
    }
}

#[async_trait]
impl BlePeripheral for BtleplugPeripheral {
    fn name(&self) -> String {
        self.local_name
            .clone()
            .unwrap_or_else(|| self.peripheral.id().to_string())
    }

    async fn connect(&self) -> Result<(), BleError> {
        self.peripheral.connect().await?;
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), BleError> {
        if self.peripheral.is_connected().await? {
            self.peripheral.disconnect().await?;
        }
        Ok(())
    }

    async fn events(&self) -> Result<EventStream, BleError> {
        let events = self.adapter.events().await?;
        let id = self.peripheral.id();
        Ok(events
            .filter_map(move |event| {
                let id = id.clone();
                async move {
                    match event {
                        CentralEvent::DeviceDisconnected(dropped) if dropped == id => {
                            Some(PeripheralEvent::Disconnected)
                        }
                        _ => None,
                    }
                }
            })
            .boxed())
    }

    async fn discover_services(&self) -> Result<Vec<GattService>, BleError> {
        self.peripheral.discover_services().await?;
        Ok(self
            .peripheral
            .services()
            .into_iter()
            .map(service_snapshot)
            .collect())
    }

    async fn subscribe(&self, characteristic: Uuid) -> Result<(), BleError> {
        let c = self.characteristic_by_uuid(characteristic)?;
        self.peripheral.subscribe(&c).await?;
        Ok(())
    }

    async fn unsubscribe(&self, characteristic: Uuid) -> Result<(), BleError> {
        let c = self.characteristic_by_uuid(characteristic)?;
        self.peripheral.unsubscribe(&c).await?;
        Ok(())
    }

    async fn notifications(&self, characteristic: Uuid) -> Result<PayloadStream, BleError> {
        // btleplug delivers one stream for all subscribed characteristics;
        // filter it down to the one this session owns.
        let notifications = self.peripheral.notifications().await?;
        Ok(notifications
            .filter_map(move |n| async move {
                if n.uuid == characteristic {
                    Some(n.value)
                } else {
                    None
                }
            })
            .boxed())
    }
}

fn service_snapshot(service: btleplug::api::Service) -> GattService {
    GattService {
        uuid: service.uuid,
        characteristics: service
            .characteristics
            .into_iter()
            .map(|c| GattCharacteristic {
                uuid: c.uuid,
                properties: props_from_flags(c.properties),
            })
            .collect(),
    }
}

fn props_from_flags(flags: CharPropFlags) -> CharacteristicProps {
    CharacteristicProps {
        read: flags.contains(CharPropFlags::READ),
        write: flags.contains(CharPropFlags::WRITE),
        write_without_response: flags.contains(CharPropFlags::WRITE_WITHOUT_RESPONSE),
        notify: flags.contains(CharPropFlags::NOTIFY),
        indicate: flags.contains(CharPropFlags::INDICATE),
    }
}

// ── Discovery collaborator ────────────────────────────────────────────────────

/// Scans for `config.scan_window` and returns the first peripheral whose
/// advertised local name matches the configured prefix.
///
/// This is the whole of the discovery feature as far as this crate is
/// concerned; the session manager only ever sees the returned handle.
pub async fn find_peripheral(config: &DiscoveryConfig) -> Result<BtleplugPeripheral, BleError> {
    let manager = Manager::new().await?;
    let adapters = manager.adapters().await?;
    let adapter = adapters.into_iter().next().ok_or(BleError::NoAdapter)?;

    info!(
        prefix = %config.name_prefix,
        window = ?config.scan_window,
        "scanning for peripheral"
    );
    adapter.start_scan(ScanFilter::default()).await?;
    sleep(config.scan_window).await;

    let peripherals = adapter.peripherals().await?;
    for peripheral in peripherals {
        let Some(properties) = peripheral.properties().await? else {
            continue;
        };
        let local_name = properties.local_name;
        if !matches_name_prefix(local_name.as_deref(), &config.name_prefix) {
            continue;
        }

        if let Err(e) = adapter.stop_scan().await {
            debug!(error = %e, "failed to stop scan cleanly");
        }
        info!(name = ?local_name, "found matching peripheral");
        return Ok(BtleplugPeripheral::new(adapter, peripheral, local_name));
    }

    let _ = adapter.stop_scan().await;
    Err(BleError::NoMatchingPeripheral(config.name_prefix.clone()))
}

fn matches_name_prefix(local_name: Option<&str>, prefix: &str) -> bool {
    if prefix.is_empty() {
        return true;
    }
    local_name.is_some_and(|name| name.starts_with(prefix))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_prefix_matches_anything() {
        assert!(matches_name_prefix(Some("JDY-31"), ""));
        assert!(matches_name_prefix(None, ""));
    }

    #[test]
    fn test_prefix_match_requires_an_advertised_name() {
        assert!(matches_name_prefix(Some("JDY-31-SPP"), "JDY"));
        assert!(!matches_name_prefix(Some("HM-10"), "JDY"));
        assert!(!matches_name_prefix(None, "JDY"));
    }

    #[test]
    fn test_props_from_flags_maps_every_capability() {
        let flags = CharPropFlags::READ | CharPropFlags::NOTIFY;
        let props = props_from_flags(flags);
        assert!(props.read);
        assert!(props.notify);
        assert!(!props.write);
        assert!(!props.write_without_response);
        assert!(!props.indicate);

        let flags = CharPropFlags::WRITE | CharPropFlags::WRITE_WITHOUT_RESPONSE
            | CharPropFlags::INDICATE;
        let props = props_from_flags(flags);
        assert!(props.write);
        assert!(props.write_without_response);
        assert!(props.indicate);
        assert!(props.can_push());
    }

    #[test]
    fn test_default_discovery_config_matches_any_name() {
        let config = DiscoveryConfig::default();
        assert!(config.name_prefix.is_empty());
        assert_eq!(config.scan_window, Duration::from_secs(5));
    }
}

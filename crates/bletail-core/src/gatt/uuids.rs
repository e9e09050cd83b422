//! Bluetooth base-UUID expansion and well-known channel identifiers.
//!
//! BLE identifiers come in a 16-bit short form and a 128-bit long form; the
//! short form is an alias for `0000XXXX-0000-1000-8000-00805F9B34FB`.
//! Matching here is exact structured equality on the expanded 128-bit value.
//! `Uuid` comparison is binary, so textual case differences disappear at
//! parse time and no substring matching is involved anywhere.

use uuid::Uuid;

/// The Bluetooth SIG base UUID, `00000000-0000-1000-8000-00805F9B34FB`.
/// 16-bit aliases are spliced into bits 96..112.
pub const BLUETOOTH_BASE_UUID: u128 = 0x00000000_0000_1000_8000_00805F9B34FB;

/// 16-bit alias of the well-known data service.
pub const DATA_SERVICE_ALIAS: u16 = 0xABF0;

/// 16-bit alias of the well-known data characteristic inside the data
/// service.
pub const DATA_CHANNEL_ALIAS: u16 = 0xABF2;

/// Expands a 16-bit alias onto the Bluetooth base UUID.
pub fn uuid_from_u16(alias: u16) -> Uuid {
    Uuid::from_u128(BLUETOOTH_BASE_UUID | ((alias as u128) << 96))
}

/// `true` if `uuid` is exactly the expanded form of `alias`.
pub fn matches_alias(uuid: &Uuid, alias: u16) -> bool {
    *uuid == uuid_from_u16(alias)
}

/// The well-known data service UUID, expanded.
pub fn data_service_uuid() -> Uuid {
    uuid_from_u16(DATA_SERVICE_ALIAS)
}

/// The well-known data characteristic UUID, expanded.
pub fn data_channel_uuid() -> Uuid {
    uuid_from_u16(DATA_CHANNEL_ALIAS)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uuid_from_u16_expands_onto_the_base_uuid() {
        assert_eq!(
            uuid_from_u16(0xABF0).to_string(),
            "0000abf0-0000-1000-8000-00805f9b34fb"
        );
        assert_eq!(
            uuid_from_u16(0x0000).to_string(),
            "00000000-0000-1000-8000-00805f9b34fb"
        );
    }

    #[test]
    fn test_matches_alias_is_exact_on_the_expanded_form() {
        let service = Uuid::parse_str("0000abf0-0000-1000-8000-00805f9b34fb").unwrap();
        assert!(matches_alias(&service, 0xABF0));
        assert!(!matches_alias(&service, 0xABF2));
    }

    #[test]
    fn test_matching_is_case_insensitive_via_parsing() {
        // Textual case differences vanish at parse time; the comparison is
        // on the binary value.
        let upper = Uuid::parse_str("0000ABF2-0000-1000-8000-00805F9B34FB").unwrap();
        assert!(matches_alias(&upper, DATA_CHANNEL_ALIAS));
    }

    #[test]
    fn test_custom_base_uuids_do_not_alias_match() {
        // Same 16-bit segment but a vendor base UUID must NOT match; this is
        // the tightening over loose substring comparison.
        let vendor = Uuid::parse_str("0000abf2-1212-efde-1523-785feabcd123").unwrap();
        assert!(!matches_alias(&vendor, DATA_CHANNEL_ALIAS));
    }
}

//! Subscription pipeline: turns a selected characteristic into a stream of
//! decoded message texts.
//!
//! Two halves:
//! - [`open_subscription`] acquires the filtered payload stream and enables
//!   notifications.  Either step failing is a [`SessionError::SubscribeFailed`]
//!   and aborts the pipeline; the session manager decides what that means
//!   for the session.
//! - [`decode_payload`] turns one raw payload into text: best-effort UTF-8
//!   (malformed bytes become replacement characters, never an error),
//!   surrounding whitespace trimmed, empty results dropped silently.

use uuid::Uuid;

use bletail_core::SessionError;

use crate::infrastructure::ble::{BlePeripheral, PayloadStream};

/// Acquires the payload stream for `characteristic` and enables
/// notifications on it.
///
/// The stream is taken before the notify-enable call so payloads delivered
/// immediately after subscription cannot slip past the subscriber.
pub async fn open_subscription(
    peripheral: &dyn BlePeripheral,
    characteristic: Uuid,
) -> Result<PayloadStream, SessionError> {
    let payloads = peripheral
        .notifications(characteristic)
        .await
        .map_err(|e| SessionError::SubscribeFailed(e.to_string()))?;
    peripheral
        .subscribe(characteristic)
        .await
        .map_err(|e| SessionError::SubscribeFailed(e.to_string()))?;
    Ok(payloads)
}

/// Decodes one raw payload into displayable text.
///
/// Returns `None` for payloads that are empty after trimming; those are
/// dropped without touching the log.
pub fn decode_payload(bytes: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(bytes);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use futures::StreamExt;

    use bletail_core::gatt::uuids::data_channel_uuid;

    use super::*;
    use crate::infrastructure::ble::mock::{MockCall, MockPeripheral};

    // ── Decoding ──────────────────────────────────────────────────────────────

    #[test]
    fn test_decode_trims_surrounding_whitespace() {
        assert_eq!(decode_payload(b"Hello\n"), Some("Hello".to_string()));
        assert_eq!(decode_payload(b"  spaced  "), Some("spaced".to_string()));
    }

    #[test]
    fn test_decode_drops_empty_and_whitespace_only_payloads() {
        assert_eq!(decode_payload(b""), None);
        assert_eq!(decode_payload(b"   \r\n\t"), None);
    }

    #[test]
    fn test_decode_never_fails_on_malformed_utf8() {
        // Arrange – 0xFF/0xFE are invalid UTF-8 lead bytes.
        let bytes = b"\xff\xfeHi";

        // Act
        let text = decode_payload(bytes).expect("lossy decode yields text");

        // Assert – replacement characters, not an error.
        assert!(text.ends_with("Hi"));
        assert!(text.contains('\u{FFFD}'));
    }

    #[test]
    fn test_decode_of_purely_invalid_bytes_is_still_text() {
        // Replacement characters are not whitespace, so the entry survives.
        let text = decode_payload(b"\xff\xff").expect("lossy decode yields text");
        assert_eq!(text, "\u{FFFD}\u{FFFD}");
    }

    // ── Subscription establishment ────────────────────────────────────────────

    #[test]
    fn test_open_subscription_takes_stream_before_enabling_notify() {
        tokio_test::block_on(async {
            // Arrange
            let mock = MockPeripheral::new("dev", Vec::new());
            let channel = data_channel_uuid();

            // Act
            let mut payloads = open_subscription(&mock, channel).await.unwrap();
            mock.push_payload(b"first");

            // Assert – stream acquisition precedes the subscribe call.
            assert_eq!(
                mock.calls(),
                vec![MockCall::Notifications(channel), MockCall::Subscribe(channel)]
            );
            assert_eq!(payloads.next().await, Some(b"first".to_vec()));
        });
    }

    #[test]
    fn test_open_subscription_maps_notify_enable_failure() {
        tokio_test::block_on(async {
            // Arrange
            let mock = MockPeripheral::new("dev", Vec::new()).with_failing_subscribe();

            // Act
            let err = match open_subscription(&mock, data_channel_uuid()).await {
                Ok(_) => panic!("expected subscription to fail"),
                Err(e) => e,
            };

            // Assert
            assert_eq!(
                err,
                SessionError::SubscribeFailed("CCCD write refused".to_string())
            );
        });
    }
}

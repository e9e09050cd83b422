//! Presentation-facing bridge.
//!
//! A UI (or any other presentation layer) consumes the session through
//! plain serializable snapshots and a unified command envelope; it never
//! touches domain types or the transport.  The DTO structs are safe to
//! send across an IPC boundary, and `CommandResult<T>` gives the caller a
//! single error-handling pattern for every command:
//!
//! ```json
//! { "success": true,  "data": {...}, "error": null  }
//! { "success": false, "data": null,  "error": "..."  }
//! ```

use std::sync::Arc;
use std::time::UNIX_EPOCH;

use serde::{Deserialize, Serialize};

use bletail_core::MessageEntry;

use crate::application::session::SessionHandle;
use crate::infrastructure::ble::BlePeripheral;

// ── DTOs ──────────────────────────────────────────────────────────────────────

/// Full session snapshot returned to the presentation layer.
///
/// The `session_state` field carries the enum variant as a string (e.g.,
/// `"Connected"`); the consumer treats it as a discriminated union literal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStatusDto {
    pub session_state: String,
    pub status_line: String,
    pub message_count: usize,
}

/// One log entry, timestamped in Unix milliseconds for display formatting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageEntryDto {
    pub text: String,
    pub received_at_ms: u64,
}

impl From<&MessageEntry> for MessageEntryDto {
    fn from(entry: &MessageEntry) -> Self {
        let received_at_ms = entry
            .received_at
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self {
            text: entry.text.clone(),
            received_at_ms,
        }
    }
}

/// Unified response wrapper for presentation commands.
#[derive(Debug, Serialize, Deserialize)]
pub struct CommandResult<T: Serialize> {
    /// `true` if the command completed successfully; `false` on error.
    pub success: bool,
    /// The command's return value, present only when `success` is `true`.
    pub data: Option<T>,
    /// A human-readable error message, present only when `success` is `false`.
    pub error: Option<String>,
}

impl<T: Serialize> CommandResult<T> {
    /// Constructs a successful result containing `data`.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Constructs an error result containing the given message.
    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

// ── Snapshot queries ──────────────────────────────────────────────────────────

/// Returns the current session snapshot.
///
/// Reads only the watch channels, so it never waits on session I/O.
pub fn get_session_status(handle: &SessionHandle) -> CommandResult<SessionStatusDto> {
    CommandResult::ok(SessionStatusDto {
        session_state: format!("{:?}", handle.state()),
        status_line: handle.status(),
        message_count: handle.messages().len(),
    })
}

/// Returns the message log, newest first.
pub fn get_messages(handle: &SessionHandle) -> CommandResult<Vec<MessageEntryDto>> {
    CommandResult::ok(handle.messages().iter().map(MessageEntryDto::from).collect())
}

// ── Commands ──────────────────────────────────────────────────────────────────

/// Forwards a connect request for an already-discovered peripheral.
pub async fn request_connect(
    handle: &SessionHandle,
    peripheral: Arc<dyn BlePeripheral>,
) -> CommandResult<()> {
    handle.connect(peripheral).await;
    CommandResult::ok(())
}

/// Forwards a disconnect request.
pub async fn request_disconnect(handle: &SessionHandle) -> CommandResult<()> {
    handle.disconnect().await;
    CommandResult::ok(())
}

/// Forwards a clear-messages request.
pub async fn request_clear_messages(handle: &SessionHandle) -> CommandResult<()> {
    handle.clear_messages().await;
    CommandResult::ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::session::{SessionConfig, SessionManager};
    use crate::infrastructure::keepalive::LogKeepalive;
    use std::time::SystemTime;

    #[test]
    fn test_command_result_ok_sets_success_true() {
        let r: CommandResult<u32> = CommandResult::ok(99);
        assert!(r.success);
        assert_eq!(r.data.unwrap(), 99);
        assert!(r.error.is_none());
    }

    #[test]
    fn test_command_result_err_sets_success_false() {
        let r: CommandResult<u32> = CommandResult::err("oops");
        assert!(!r.success);
        assert!(r.data.is_none());
        assert_eq!(r.error.unwrap(), "oops");
    }

    #[test]
    fn test_message_entry_dto_converts_timestamp_to_unix_millis() {
        // Arrange
        let entry = MessageEntry {
            text: "hello".to_string(),
            received_at: UNIX_EPOCH + std::time::Duration::from_millis(1_234),
        };

        // Act
        let dto = MessageEntryDto::from(&entry);

        // Assert
        assert_eq!(dto.text, "hello");
        assert_eq!(dto.received_at_ms, 1_234);
    }

    #[test]
    fn test_message_entry_dto_clamps_pre_epoch_timestamps() {
        let entry = MessageEntry {
            text: "odd clock".to_string(),
            received_at: SystemTime::UNIX_EPOCH - std::time::Duration::from_secs(1),
        };
        let dto = MessageEntryDto::from(&entry);
        assert_eq!(dto.received_at_ms, 0);
    }

    #[tokio::test]
    async fn test_fresh_session_snapshot_reads_disconnected() {
        // Arrange
        let handle = SessionManager::spawn(SessionConfig::default(), Arc::new(LogKeepalive));

        // Act
        let status = get_session_status(&handle);
        let messages = get_messages(&handle);

        // Assert
        let dto = status.data.unwrap();
        assert_eq!(dto.session_state, "Disconnected");
        assert_eq!(dto.status_line, "Disconnected");
        assert_eq!(dto.message_count, 0);
        assert!(messages.data.unwrap().is_empty());
    }
}

//! Keepalive collaborator seam.
//!
//! The platform facility that keeps the process alive and visible while the
//! application is backgrounded lives outside this repository; the core only
//! emits three intents at it and never polls its status.  The trait is that
//! interface boundary.

use std::sync::Mutex;

use tracing::info;

/// The three intents the background-keepalive collaborator understands.
#[cfg_attr(test, mockall::automock)]
pub trait Keepalive: Send + Sync {
    /// Ask the collaborator to start and switch to foreground-signaling
    /// mode.  Idempotence is the caller's concern, not the collaborator's.
    fn start_foreground(&self);

    /// Replace the user-visible status line.
    fn update_visible_text(&self, text: &str);

    /// Ask the collaborator to stop.
    fn stop(&self);
}

/// Keepalive used by the binary: emits the intents as log lines.
///
/// The real platform facility would be wired in here; logging keeps the
/// visibility bridge observable in development builds.
#[derive(Debug, Default)]
pub struct LogKeepalive;

impl Keepalive for LogKeepalive {
    fn start_foreground(&self) {
        info!("keepalive: start foreground");
    }

    fn update_visible_text(&self, text: &str) {
        info!(text, "keepalive: visible text");
    }

    fn stop(&self) {
        info!("keepalive: stop");
    }
}

/// One recorded keepalive intent, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeepaliveCall {
    StartForeground,
    UpdateVisibleText(String),
    Stop,
}

/// Recording double used by the integration tests.
#[derive(Debug, Default)]
pub struct RecordingKeepalive {
    calls: Mutex<Vec<KeepaliveCall>>,
}

impl RecordingKeepalive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded intents, in arrival order.
    pub fn calls(&self) -> Vec<KeepaliveCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl Keepalive for RecordingKeepalive {
    fn start_foreground(&self) {
        self.calls.lock().unwrap().push(KeepaliveCall::StartForeground);
    }

    fn update_visible_text(&self, text: &str) {
        self.calls
            .lock()
            .unwrap()
            .push(KeepaliveCall::UpdateVisibleText(text.to_string()));
    }

    fn stop(&self) {
        self.calls.lock().unwrap().push(KeepaliveCall::Stop);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_keepalive_preserves_intent_order() {
        // Arrange
        let keepalive = RecordingKeepalive::new();

        // Act
        keepalive.start_foreground();
        keepalive.update_visible_text("Connected");
        keepalive.update_visible_text("Hello");
        keepalive.stop();

        // Assert
        assert_eq!(
            keepalive.calls(),
            vec![
                KeepaliveCall::StartForeground,
                KeepaliveCall::UpdateVisibleText("Connected".to_string()),
                KeepaliveCall::UpdateVisibleText("Hello".to_string()),
                KeepaliveCall::Stop,
            ]
        );
    }
}

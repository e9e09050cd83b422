//! Visibility bridge: translates session events into keepalive intents.
//!
//! A pure translator.  Its only state is whether the collaborator has been
//! asked to run, which makes the start intent fire exactly once per session
//! and the stop intent only after a start.  It never touches the peripheral
//! or the message log; it reacts to `SessionState` transitions and decoded
//! message texts, nothing else.

use std::sync::Arc;

use bletail_core::SessionState;

use crate::infrastructure::keepalive::Keepalive;

/// Translates session-state and message events into the three intents the
/// background-keepalive collaborator understands.
pub struct VisibilityBridge {
    keepalive: Arc<dyn Keepalive>,
    running: bool,
}

impl VisibilityBridge {
    pub fn new(keepalive: Arc<dyn Keepalive>) -> Self {
        Self {
            keepalive,
            running: false,
        }
    }

    /// Reacts to a session-state transition.
    ///
    /// Entering `Connected` starts the collaborator (once) and shows the
    /// initial "Connected" text; reaching `Disconnected` from any path stops
    /// it; `Connecting` is of no interest to the collaborator.
    pub fn on_state(&mut self, state: SessionState) {
        match state {
            SessionState::Connected => {
                if !self.running {
                    self.keepalive.start_foreground();
                    self.running = true;
                }
                self.keepalive.update_visible_text("Connected");
            }
            SessionState::Disconnected => {
                if self.running {
                    self.keepalive.stop();
                    self.running = false;
                }
            }
            SessionState::Connecting => {}
        }
    }

    /// Forwards a decoded message text as the latest visible status line.
    pub fn on_message(&mut self, text: &str) {
        if self.running {
            self.keepalive.update_visible_text(text);
        }
    }

    /// `true` while the collaborator has been asked to run.
    pub fn is_running(&self) -> bool {
        self.running
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

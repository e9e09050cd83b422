//! The bounded, newest-first message log.
//!
//! `MessageLog` holds the most recent decoded notifications, newest first,
//! capped at [`MESSAGE_LOG_CAPACITY`] entries.  Exactly one writer mutates
//! it (the subscription pipeline appends, the clear command empties it);
//! readers only ever see cloned snapshots, so a reader observes either the
//! pre- or post-mutation log, never a partial update.

use std::collections::VecDeque;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// Maximum number of entries the log retains.  Appending beyond this bound
/// discards the oldest entries.
pub const MESSAGE_LOG_CAPACITY: usize = 100;

/// One decoded inbound notification.  Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEntry {
    /// Decoded, trimmed payload text.
    pub text: String,
    /// Wall-clock time the payload was received.
    pub received_at: SystemTime,
}

impl MessageEntry {
    /// Creates an entry stamped with the current time.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            received_at: SystemTime::now(),
        }
    }
}

/// Ordered sequence of [`MessageEntry`] values, newest first.
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    entries: VecDeque<MessageEntry>,
}

impl MessageLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `entry` at the front (newest-first) and drops everything
    /// beyond [`MESSAGE_LOG_CAPACITY`].
    pub fn append(&mut self, entry: MessageEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(MESSAGE_LOG_CAPACITY);
    }

    /// Empties the log unconditionally.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of retained entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if the log holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries newest-first.
    pub fn iter(&self) -> impl Iterator<Item = &MessageEntry> {
        self.entries.iter()
    }

    /// Newest entry, if any.
    pub fn latest(&self) -> Option<&MessageEntry> {
        self.entries.front()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

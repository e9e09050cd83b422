//! Session lifecycle states and failure kinds.
//!
//! A session moves `Disconnected` → `Connecting` → `Connected` and back to
//! `Disconnected`; there are no other states, and exactly one session exists
//! at a time.  Only the session manager task mutates the state; everything
//! else observes it.
//!
//! `SessionError` enumerates every way a session can fail.  The `Display`
//! strings are written to double as the human-readable status line shown to
//! the user, so they are short, lower-case sentences rather than debug dumps.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Connection state of the single BleTail session.
///
/// The UI displays these states as status indicators (e.g., a coloured dot).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// No peripheral is held.  Initial state, and the terminal state of
    /// every session cycle.
    #[default]
    Disconnected,
    /// A connect attempt is in flight (transport connect, discovery, or
    /// subscription has not completed yet).
    Connecting,
    /// The transport link is up; notifications may be streaming.
    Connected,
}

/// Error type for session operations.
///
/// Every variant is recoverable by retrying `connect`; none of them are
/// fatal to the process.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The transport connect call did not complete within the configured
    /// timeout.
    #[error("connect timed out after {0}s")]
    ConnectTimeout(u64),

    /// The transport rejected the connect call outright.
    #[error("connection rejected: {0}")]
    ConnectRejected(String),

    /// The connect call succeeded but service discovery failed.
    #[error("service discovery failed: {0}")]
    DiscoveryFailed(String),

    /// Discovery succeeded but the tree contains no characteristic worth
    /// subscribing to (neither the well-known pair nor anything
    /// notify/indicate-capable).
    #[error("no data channel found")]
    NoDataChannel,

    /// Enabling notifications on the selected characteristic failed.
    #[error("subscribe failed: {0}")]
    SubscribeFailed(String),

    /// The notification stream faulted after a successful subscription.
    /// Surfaced as a status condition only; it does not itself force a
    /// disconnect.
    #[error("data stream error: {0}")]
    StreamError(String),
}

// ── Tests ─────────────────────────────────────────────────────────────────────

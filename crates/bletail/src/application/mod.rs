//! Application layer: use cases built on the domain and the seams.

/// Payload decoding and notification-stream establishment.
pub mod pipeline;

/// The session state machine task and its handle.
pub mod session;

/// SessionState/message events translated to keepalive intents.
pub mod visibility;

//! Domain entities for BleTail.
//!
//! This module contains pure business logic with no infrastructure
//! dependencies: the session lifecycle model and the bounded message log.
//! Code in outer layers (transport, application, UI) depends on these
//! types; these types never depend on them.

/// The bounded, newest-first message log and its entries.
pub mod message;

/// Session lifecycle states and failure kinds.
pub mod session;

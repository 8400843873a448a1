//! Typed event schemas carried by the wire frames.
//!
//! The two features use distinct terminal-event vocabularies: extraction
//! events discriminate on `status`, chat events on `event`. Each schema
//! exposes an explicit terminal predicate so dispatch code never compares
//! raw strings.

pub mod chat;
pub mod extraction;

pub use chat::{ChatEvent, ChatEventKind, MessageDelta, ProposedAction, ToolStarted};
pub use extraction::{ExtractionEvent, ExtractionStatus};

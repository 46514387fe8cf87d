//! Protocol modules (envelope + typed events).
//!
//! One event travels per WebSocket text frame as a JSON envelope
//! `{"type": <tag>, "payload": <json>}`:
//! - `envelope`: the raw frame shape with a lazily-parsed `RawValue` payload.
//! - `event`: the closed tag set and the typed inbound/outbound events.
//!
//! All parsers are panic-free: malformed input is reported as `CupRoomError`.

pub mod envelope;
pub mod event;

pub use envelope::Envelope;
pub use event::{EventType, InboundEvent, OutboundEvent};

//! Transport layer (WebSocket).
//!
//! Exposes the upgrade handler with its origin gate, the frame codec, and the
//! per-connection actor that runs the read and write pumps.

pub mod client;
pub mod codec;
pub mod origin;
pub mod ws;

pub use client::Client;
pub use origin::OriginPolicy;

//! Realtime core components for the gateway runtime.
//!
//! Room presence, the client registry, and the hub control loop that
//! serializes every access to both.

mod ctx;
mod hub;
mod presence;
mod session_registry;

pub use ctx::ClientCtx;
pub use hub::Hub;
pub use presence::{Presence, Room};
pub use session_registry::{ClientEntry, SessionRegistry};

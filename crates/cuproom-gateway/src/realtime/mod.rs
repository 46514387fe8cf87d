//! Realtime runtime for the cuproom gateway.
//!
//! The hub control loop owns room presence and the client registry; services
//! reach it through a cloneable [`Hub`] handle carried in each [`ClientCtx`].

pub mod core;
pub mod types;

pub use self::core::{ClientCtx, Hub, Presence, SessionRegistry};
pub use types::{ClientState, ConnId, PreparedMsg};

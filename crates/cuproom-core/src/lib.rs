//! cuproom core: transport-agnostic event contracts and error types.
//!
//! This crate defines the wire-level envelope, the closed set of event tags,
//! and the typed payloads shared by the hub, its services, and test tooling.
//! It carries no transport or runtime dependencies.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Malformed frames surface as `CupRoomError` so a hostile peer can only ever
//! lose its own connection.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{CupRoomError, Result};

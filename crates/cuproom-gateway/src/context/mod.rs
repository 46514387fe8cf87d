//! Connection identity shared across layers.
//!
//! Socket authentication is delegated: the transport hands the upgrade token
//! to an [`IdentityResolver`] and only ever sees the resulting [`Identity`].

pub mod identity;

pub use identity::{Identity, IdentityResolver, StaticIdentityResolver};

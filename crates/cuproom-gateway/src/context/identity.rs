use std::collections::HashMap;

use uuid::Uuid;

use cuproom_core::error::{CupRoomError, Result};

use crate::config::AuthSection;

/// Resolved user behind a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub user_name: String,
}

impl Identity {
    pub fn new(user_id: impl Into<String>, user_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            user_name: user_name.into(),
        }
    }

    /// Fresh anonymous identity (`guest-<uuid>`).
    pub fn guest() -> Self {
        let id = format!("guest-{}", Uuid::new_v4());
        Self::new(id.clone(), id)
    }
}

/// Token validation collaborator (e.g. a JWT verifier in the API service).
pub trait IdentityResolver: Send + Sync {
    fn resolve(&self, token: &str) -> Result<Identity>;
}

/// Config-driven resolver: fixed token table plus optional guests.
#[derive(Debug, Default)]
pub struct StaticIdentityResolver {
    tokens: HashMap<String, Identity>,
    allow_guests: bool,
}

impl StaticIdentityResolver {
    pub fn new(allow_guests: bool) -> Self {
        Self {
            tokens: HashMap::new(),
            allow_guests,
        }
    }

    pub fn from_config(auth: &AuthSection) -> Self {
        let mut resolver = Self::new(auth.allow_guests);
        for t in &auth.tokens {
            resolver = resolver.with_token(&t.token, Identity::new(&t.user_id, &t.user_name));
        }
        resolver
    }

    pub fn with_token(mut self, token: &str, identity: Identity) -> Self {
        self.tokens.insert(token.to_string(), identity);
        self
    }
}

impl IdentityResolver for StaticIdentityResolver {
    fn resolve(&self, token: &str) -> Result<Identity> {
        if let Some(identity) = self.tokens.get(token) {
            return Ok(identity.clone());
        }
        if self.allow_guests {
            return Ok(Identity::guest());
        }
        Err(CupRoomError::AuthFailed)
    }
}

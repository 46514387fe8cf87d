use std::fmt;
use std::sync::Arc;

use axum::extract::ws::Message;
use uuid::Uuid;

use cuproom_core::error::Result;
use cuproom_core::protocol::OutboundEvent;

/// Per-connection identity, distinct from the user id (one user may hold
/// several connections).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnId(Uuid);

impl ConnId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Room/leader view of one connection, owned by the hub.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientState {
    pub room: Option<String>,
    pub is_leader: bool,
    pub leader_id: Option<String>,
}

/// Message serialized once for broadcasting (send N times).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedMsg(Arc<str>);

impl PreparedMsg {
    pub fn prepare(out: &OutboundEvent) -> Result<Self> {
        Ok(Self(Arc::from(out.to_text()?)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert to axum::ws::Message for transport.
    /// NOTE: axum::Message::Text owns a String, so each recipient clones once here.
    pub fn to_ws_message(&self) -> Message {
        Message::Text(self.0.to_string())
    }
}

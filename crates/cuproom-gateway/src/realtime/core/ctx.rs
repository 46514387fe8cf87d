use std::sync::Arc;

use cuproom_core::error::Result;
use cuproom_core::protocol::OutboundEvent;

use crate::context::Identity;
use crate::realtime::core::Hub;
use crate::realtime::types::{ClientState, ConnId};

/// Per-message context passed to services: who sent it, and the hub to act on.
#[derive(Clone, Debug)]
pub struct ClientCtx {
    conn: ConnId,
    identity: Arc<Identity>,
    hub: Hub,
}

impl ClientCtx {
    pub fn new(conn: ConnId, identity: Arc<Identity>, hub: Hub) -> Self {
        Self { conn, identity, hub }
    }

    pub fn conn_id(&self) -> ConnId { self.conn }
    pub fn user_id(&self) -> &str { &self.identity.user_id }
    pub fn user_name(&self) -> &str { &self.identity.user_name }
    pub fn hub(&self) -> &Hub { &self.hub }

    /// Open `room` with this client as leader.
    pub async fn create_room(&self, room: &str) -> Result<()> {
        self.hub.create_room(self.conn, room).await
    }

    /// Join `room`, returning the leader id adopted from it.
    pub async fn join_room(&self, room: &str) -> Result<String> {
        self.hub.join_room(self.conn, room).await
    }

    pub async fn leave_room(&self) -> Result<Option<String>> {
        self.hub.leave_room(self.conn).await
    }

    pub async fn state(&self) -> Result<ClientState> {
        Ok(self.hub.client_state(self.conn).await?.unwrap_or_default())
    }

    pub async fn current_room(&self) -> Result<Option<String>> {
        Ok(self.state().await?.room)
    }

    pub async fn broadcast(&self, room: &str, out: &OutboundEvent) -> Result<usize> {
        self.hub.broadcast(room, out).await
    }
}

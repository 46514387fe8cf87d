//! Hub: single control loop owning rooms and clients.
//!
//! Every operation, broadcasts and lookups included, is a [`Command`] sent to
//! one task. State is plain maps mutated only on that task, so no lock guards
//! room membership. Handle calls race their channel send (and reply wait)
//! against the shutdown token and fail with `HubClosed` instead of blocking.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;

use cuproom_core::error::{CupRoomError, Result};
use cuproom_core::protocol::OutboundEvent;

use crate::context::Identity;
use crate::realtime::core::{ClientEntry, Presence, SessionRegistry};
use crate::realtime::types::{ClientState, ConnId, PreparedMsg};

const COMMAND_QUEUE: usize = 1024;

type Reply<T> = oneshot::Sender<T>;

#[derive(Debug)]
enum Command {
    Register {
        conn: ConnId,
        identity: Arc<Identity>,
        mailbox: mpsc::Sender<PreparedMsg>,
    },
    Unregister {
        conn: ConnId,
        reply: Reply<bool>,
    },
    CreateRoom {
        conn: ConnId,
        room: String,
        reply: Reply<Result<()>>,
    },
    JoinRoom {
        conn: ConnId,
        room: String,
        reply: Reply<Result<String>>,
    },
    LeaveRoom {
        conn: ConnId,
        reply: Reply<Option<String>>,
    },
    Broadcast {
        room: String,
        msg: PreparedMsg,
        reply: Reply<usize>,
    },
    LeaderOf {
        room: String,
        reply: Reply<Option<String>>,
    },
    ClientState {
        conn: ConnId,
        reply: Reply<Option<ClientState>>,
    },
    Members {
        room: String,
        reply: Reply<Vec<ConnId>>,
    },
    Counts {
        reply: Reply<(usize, usize)>,
    },
}

/// Cloneable handle to the hub control loop.
#[derive(Clone, Debug)]
pub struct Hub {
    tx: mpsc::Sender<Command>,
    shutdown: CancellationToken,
}

impl Hub {
    /// Spawn the control loop on the current tokio runtime.
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::channel(COMMAND_QUEUE);
        let shutdown = CancellationToken::new();
        tokio::spawn(run(rx, shutdown.clone()));
        Self { tx, shutdown }
    }

    /// Stop the control loop; every client mailbox is closed. Idempotent.
    pub fn close(&self) {
        if !self.shutdown.is_cancelled() {
            tracing::info!("hub closing");
        }
        self.shutdown.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    pub async fn register(
        &self,
        conn: ConnId,
        identity: Arc<Identity>,
        mailbox: mpsc::Sender<PreparedMsg>,
    ) -> Result<()> {
        self.send(Command::Register {
            conn,
            identity,
            mailbox,
        })
        .await
    }

    /// Remove a connection everywhere and close its mailbox.
    /// Returns false when it was already gone.
    pub async fn unregister(&self, conn: ConnId) -> Result<bool> {
        self.request(|reply| Command::Unregister { conn, reply }).await
    }

    pub async fn create_room(&self, conn: ConnId, room: &str) -> Result<()> {
        let room = room.to_string();
        self.request(|reply| Command::CreateRoom { conn, room, reply })
            .await?
    }

    /// Join an existing room; returns its leader id.
    pub async fn join_room(&self, conn: ConnId, room: &str) -> Result<String> {
        let room = room.to_string();
        self.request(|reply| Command::JoinRoom { conn, room, reply })
            .await?
    }

    /// Leave the current room; returns the room left, if any.
    pub async fn leave_room(&self, conn: ConnId) -> Result<Option<String>> {
        self.request(|reply| Command::LeaveRoom { conn, reply }).await
    }

    /// Serialize once and push to every member of `room`.
    /// Returns the number of mailboxes that accepted the message.
    pub async fn broadcast(&self, room: &str, out: &OutboundEvent) -> Result<usize> {
        let msg = PreparedMsg::prepare(out)?;
        let room = room.to_string();
        self.request(|reply| Command::Broadcast { room, msg, reply })
            .await
    }

    pub async fn leader_of(&self, room: &str) -> Result<Option<String>> {
        let room = room.to_string();
        self.request(|reply| Command::LeaderOf { room, reply }).await
    }

    pub async fn client_state(&self, conn: ConnId) -> Result<Option<ClientState>> {
        self.request(|reply| Command::ClientState { conn, reply })
            .await
    }

    pub async fn members(&self, room: &str) -> Result<Vec<ConnId>> {
        let room = room.to_string();
        self.request(|reply| Command::Members { room, reply }).await
    }

    /// (connected clients, open rooms)
    pub async fn counts(&self) -> Result<(usize, usize)> {
        self.request(|reply| Command::Counts { reply }).await
    }

    async fn send(&self, cmd: Command) -> Result<()> {
        tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => Err(CupRoomError::HubClosed),
            res = self.tx.send(cmd) => res.map_err(|_| CupRoomError::HubClosed),
        }
    }

    async fn request<T>(&self, make: impl FnOnce(Reply<T>) -> Command) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.send(make(reply)).await?;
        tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => Err(CupRoomError::HubClosed),
            res = rx => res.map_err(|_| CupRoomError::HubClosed),
        }
    }
}

async fn run(mut rx: mpsc::Receiver<Command>, shutdown: CancellationToken) {
    let mut state = HubState::default();
    tracing::debug!("hub control loop started");

    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            cmd = rx.recv() => match cmd {
                Some(cmd) => state.apply(cmd),
                // every handle dropped
                None => break,
            },
        }
    }

    let closed = state.close_all();
    tracing::info!(closed, "hub control loop stopped");
}

#[derive(Debug, Default)]
struct HubState {
    sessions: SessionRegistry,
    presence: Presence,
}

impl HubState {
    fn apply(&mut self, cmd: Command) {
        // A dropped reply receiver means the caller gave up; nothing to do.
        match cmd {
            Command::Register {
                conn,
                identity,
                mailbox,
            } => self.register(conn, identity, mailbox),
            Command::Unregister { conn, reply } => {
                let _ = reply.send(self.unregister(conn));
            }
            Command::CreateRoom { conn, room, reply } => {
                let _ = reply.send(self.create_room(conn, room));
            }
            Command::JoinRoom { conn, room, reply } => {
                let _ = reply.send(self.join_room(conn, room));
            }
            Command::LeaveRoom { conn, reply } => {
                let _ = reply.send(self.leave_room(conn));
            }
            Command::Broadcast { room, msg, reply } => {
                let _ = reply.send(self.broadcast(&room, &msg));
            }
            Command::LeaderOf { room, reply } => {
                let _ = reply.send(self.presence.leader_of(&room).map(str::to_string));
            }
            Command::ClientState { conn, reply } => {
                let _ = reply.send(self.sessions.get(&conn).map(|e| e.state.clone()));
            }
            Command::Members { room, reply } => {
                let _ = reply.send(self.presence.members_of(&room));
            }
            Command::Counts { reply } => {
                let _ = reply.send((self.sessions.len(), self.presence.room_count()));
            }
        }
    }

    fn register(&mut self, conn: ConnId, identity: Arc<Identity>, mailbox: mpsc::Sender<PreparedMsg>) {
        tracing::debug!(%conn, user_id = %identity.user_id, "client registered");
        let entry = ClientEntry {
            identity,
            mailbox,
            state: ClientState::default(),
        };
        if let Some(stale) = self.sessions.insert(conn, entry) {
            if let Some(room) = stale.state.room {
                self.presence.leave(&room, conn);
            }
        }
    }

    fn unregister(&mut self, conn: ConnId) -> bool {
        let Some(entry) = self.sessions.remove(&conn) else {
            return false;
        };
        if let Some(room) = &entry.state.room {
            self.presence.leave(room, conn);
        }
        tracing::debug!(%conn, user_id = %entry.identity.user_id, "client unregistered");
        // entry (and its mailbox sender) dropped here
        true
    }

    fn create_room(&mut self, conn: ConnId, room: String) -> Result<()> {
        let user_id = self.user_id(conn)?;
        if self.presence.leader_of(&room) == Some(user_id.as_str()) && self.in_room(conn, &room) {
            return Ok(());
        }
        if self.presence.get(&room).is_some_and(|r| !r.is_empty()) {
            return Err(CupRoomError::RoomExists(room));
        }

        self.detach(conn);
        self.presence.create(&room, conn, &user_id)?;
        if let Some(entry) = self.sessions.get_mut(&conn) {
            entry.state = ClientState {
                room: Some(room.clone()),
                is_leader: true,
                leader_id: Some(user_id),
            };
        }
        tracing::debug!(%conn, %room, "room created");
        Ok(())
    }

    fn join_room(&mut self, conn: ConnId, room: String) -> Result<String> {
        let user_id = self.user_id(conn)?;
        let leader = self
            .presence
            .leader_of(&room)
            .map(str::to_string)
            .ok_or_else(|| CupRoomError::RoomNotFound(room.clone()))?;

        if !self.in_room(conn, &room) {
            self.detach(conn);
            self.presence.join(&room, conn)?;
        }
        if let Some(entry) = self.sessions.get_mut(&conn) {
            entry.state = ClientState {
                room: Some(room.clone()),
                is_leader: leader == user_id,
                leader_id: Some(leader.clone()),
            };
        }
        tracing::debug!(%conn, %room, %leader, "room joined");
        Ok(leader)
    }

    fn leave_room(&mut self, conn: ConnId) -> Option<String> {
        let room = self.detach(conn)?;
        tracing::debug!(%conn, %room, "room left");
        Some(room)
    }

    fn broadcast(&self, room: &str, msg: &PreparedMsg) -> usize {
        let Some(members) = self.presence.get(room) else {
            return 0;
        };

        let mut delivered = 0;
        for conn in members.members() {
            let Some(entry) = self.sessions.get(conn) else { continue };
            // membership re-check: only deliver to clients still in this room
            if entry.state.room.as_deref() != Some(room) {
                continue;
            }
            match entry.mailbox.try_send(msg.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(%conn, %room, "mailbox full, message dropped");
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::debug!(%conn, %room, "mailbox closed, message dropped");
                }
            }
        }
        delivered
    }

    fn close_all(&mut self) -> usize {
        self.presence.clear();
        self.sessions.close_all()
    }

    /// Take `conn` out of its current room and reset its room state.
    fn detach(&mut self, conn: ConnId) -> Option<String> {
        let entry = self.sessions.get_mut(&conn)?;
        let room = std::mem::take(&mut entry.state).room?;
        self.presence.leave(&room, conn);
        Some(room)
    }

    fn in_room(&self, conn: ConnId, room: &str) -> bool {
        self.sessions
            .get(&conn)
            .is_some_and(|e| e.state.room.as_deref() == Some(room))
    }

    fn user_id(&self, conn: ConnId) -> Result<String> {
        self.sessions
            .get(&conn)
            .map(|e| e.identity.user_id.clone())
            .ok_or_else(|| CupRoomError::Internal(format!("connection {conn} not registered")))
    }
}

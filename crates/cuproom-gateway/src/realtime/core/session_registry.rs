use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::context::Identity;
use crate::realtime::types::{ClientState, ConnId, PreparedMsg};

/// Hub-side record of one connection. Holds the only mailbox sender, so
/// dropping the entry closes the connection's mailbox.
#[derive(Debug)]
pub struct ClientEntry {
    pub identity: Arc<Identity>,
    pub mailbox: mpsc::Sender<PreparedMsg>,
    pub state: ClientState,
}

/// Client registry: `conn_id -> ClientEntry`.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    clients: HashMap<ConnId, ClientEntry>,
}

impl SessionRegistry {
    /// Insert a connection; a stale entry under the same id is returned.
    pub fn insert(&mut self, conn: ConnId, entry: ClientEntry) -> Option<ClientEntry> {
        self.clients.insert(conn, entry)
    }

    pub fn remove(&mut self, conn: &ConnId) -> Option<ClientEntry> {
        self.clients.remove(conn)
    }

    pub fn get(&self, conn: &ConnId) -> Option<&ClientEntry> {
        self.clients.get(conn)
    }

    pub fn get_mut(&mut self, conn: &ConnId) -> Option<&mut ClientEntry> {
        self.clients.get_mut(conn)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Drop every entry, closing all mailboxes. Returns how many were closed.
    pub fn close_all(&mut self) -> usize {
        let n = self.clients.len();
        self.clients.clear();
        n
    }
}

//! Connection registry: every live client and its session fields.

use std::collections::HashMap;

use neonchat_core::ConnectionId;

/// One live client.
#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    pub id: ConnectionId,
    /// Set iff the connection is currently paired.
    pub partner_id: Option<ConnectionId>,
    /// Normalized tags for the current matching attempt.
    pub interests: Vec<String>,
    /// Last typing flag relayed; advisory only.
    pub is_typing: bool,
}

impl Connection {
    pub fn new(id: ConnectionId) -> Self {
        Self {
            id,
            partner_id: None,
            interests: Vec::new(),
            is_typing: false,
        }
    }

    pub fn is_paired(&self) -> bool {
        self.partner_id.is_some()
    }
}

/// Mapping from connection id to its [`Connection`].
///
/// Pure bookkeeping: broadcasting presence on membership changes is the
/// caller's job.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: HashMap<ConnectionId, Connection>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fresh connection. Returns `false` and leaves the existing
    /// entry untouched if the id is already live.
    pub fn add(&mut self, id: ConnectionId) -> bool {
        if self.connections.contains_key(&id) {
            return false;
        }
        self.connections.insert(id.clone(), Connection::new(id));
        true
    }

    /// Remove a connection. Absent ids are fine.
    pub fn remove(&mut self, id: &ConnectionId) -> Option<Connection> {
        self.connections.remove(id)
    }

    pub fn get(&self, id: &ConnectionId) -> Option<&Connection> {
        self.connections.get(id)
    }

    pub fn get_mut(&mut self, id: &ConnectionId) -> Option<&mut Connection> {
        self.connections.get_mut(id)
    }

    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.connections.contains_key(id)
    }

    pub fn size(&self) -> usize {
        self.connections.len()
    }

    pub fn ids(&self) -> impl Iterator<Item = &ConnectionId> {
        self.connections.keys()
    }
}

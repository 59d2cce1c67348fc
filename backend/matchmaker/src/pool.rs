//! Waiting pool: insertion-ordered ids seeking a partner.

use std::collections::HashSet;

use neonchat_core::ConnectionId;

#[derive(Debug, Default)]
pub struct WaitingPool {
    queue: Vec<ConnectionId>,
}

impl WaitingPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `id` unless it is already waiting.
    pub fn enqueue(&mut self, id: ConnectionId) -> bool {
        if self.contains(&id) {
            return false;
        }
        self.queue.push(id);
        true
    }

    pub fn remove(&mut self, id: &ConnectionId) -> bool {
        match self.queue.iter().position(|queued| queued == id) {
            Some(index) => {
                self.queue.remove(index);
                true
            }
            None => false,
        }
    }

    /// Drop every id in `ids`, keeping the relative order of the rest.
    pub fn remove_all(&mut self, ids: &HashSet<ConnectionId>) {
        if !ids.is_empty() {
            self.queue.retain(|id| !ids.contains(id));
        }
    }

    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.queue.contains(id)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn as_slice(&self) -> &[ConnectionId] {
        &self.queue
    }
}

//! Client sender registry.
//!
//! Maps each live socket's connection id to the channel feeding its writer
//! task. This is the matchmaker's [`Outbound`].

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

use neonchat_core::{ConnectionId, Outbound, ServerEvent};

/// Frames a client may have queued before further sends to it are dropped.
pub const CLIENT_QUEUE_CAPACITY: usize = 256;

pub type ClientSender = mpsc::Sender<ServerEvent>;

#[derive(Clone, Default)]
pub struct ClientRegistry {
    clients: Arc<RwLock<HashMap<ConnectionId, ClientSender>>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, id: ConnectionId, sender: ClientSender) {
        self.clients.write().insert(id, sender);
    }

    pub fn unregister(&self, id: &ConnectionId) {
        self.clients.write().remove(id);
    }
}

impl Outbound for ClientRegistry {
    fn send(&self, to: &ConnectionId, event: ServerEvent) -> bool {
        let clients = self.clients.read();
        let Some(sender) = clients.get(to) else {
            debug!(connection = %to, event = event.name(), "Send to unknown connection dropped");
            return false;
        };
        match sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                warn!(connection = %to, event = event.name(), "Client queue full, frame dropped");
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }
}

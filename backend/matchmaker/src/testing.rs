//! Test doubles shared by the unit tests.

use std::sync::Mutex;

use neonchat_core::{ConnectionId, Outbound, ServerEvent, SignalKind, SignalPayload};
use serde_json::value::RawValue;

/// Records every send; always reports delivery.
#[derive(Default)]
pub struct RecordingOutbound {
    sent: Mutex<Vec<(ConnectionId, ServerEvent)>>,
}

impl RecordingOutbound {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<(ConnectionId, ServerEvent)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn events_for(&self, id: &str) -> Vec<ServerEvent> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(to, _)| to.as_str() == id)
            .map(|(_, event)| event.clone())
            .collect()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

impl Outbound for RecordingOutbound {
    fn send(&self, to: &ConnectionId, event: ServerEvent) -> bool {
        self.sent.lock().unwrap().push((to.clone(), event));
        true
    }
}

pub fn signal(kind: SignalKind, raw: &str) -> SignalPayload {
    SignalPayload::new(kind, RawValue::from_string(raw.to_string()).unwrap())
}

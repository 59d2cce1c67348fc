//! Session Event Logger
//!
//! Lifecycle events of the matchmaker, emitted as structured `tracing`
//! records under the `session_events` target. Chat text and signaling
//! payloads never pass through here.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    Connected {
        connection_id: String,
        online: usize,
    },
    Matched {
        first: String,
        second: String,
        common_interests: Vec<String>,
    },
    PartnerLeft {
        initiator: String,
        partner: String,
        reason: String,
    },
    Disconnected {
        connection_id: String,
        online: usize,
    },
    Rejected {
        connection_id: String,
        event: String,
        reason: String,
    },
}

#[derive(Debug, Serialize)]
pub struct SessionLogEntry {
    pub timestamp: DateTime<Utc>,
    pub event: SessionEvent,
}

impl SessionLogEntry {
    pub fn new(event: SessionEvent) -> Self {
        Self {
            timestamp: Utc::now(),
            event,
        }
    }

    /// NDJSON line for this entry.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

pub struct SessionEventLogger;

impl SessionEventLogger {
    /// Emit a session event to the tracing system.
    pub fn log_event(event: SessionEvent) {
        let entry = SessionLogEntry::new(event);
        match &entry.event {
            SessionEvent::Matched {
                first,
                second,
                common_interests,
            } => {
                info!(
                    target: "session_events",
                    first = %first,
                    second = %second,
                    tags = %common_interests.join(", "),
                    entry = %entry.to_json(),
                    "Matched {} with {}",
                    first,
                    second
                );
            }
            SessionEvent::Rejected { .. } => {
                warn!(target: "session_events", entry = %entry.to_json(), "Rejected client input");
            }
            _ => {
                info!(target: "session_events", entry = %entry.to_json(), "Session event");
            }
        }
    }
}

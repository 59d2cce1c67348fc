use serde::{Deserialize, Serialize};

use crate::types::{ConnectionId, SignalPayload};

/// Inbound events a client may send. This is the closed set the
/// matchmaker dispatches on.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// Enter the waiting pool with an interest set.
    JoinQueue { interests: Vec<String> },
    /// Go idle, ending any current session.
    LeaveQueue,
    /// Chat text for the current partner.
    SendMessage { text: String },
    /// Typing indicator for the current partner.
    Typing(bool),
    /// End the current session and wait for another partner.
    NextPartner { interests: Vec<String> },
    /// WebRTC negotiation message for an explicit target.
    Signal {
        target: ConnectionId,
        signal: SignalPayload,
    },
}

impl ClientEvent {
    /// Wire name of this event.
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::JoinQueue { .. } => "join_queue",
            ClientEvent::LeaveQueue => "leave_queue",
            ClientEvent::SendMessage { .. } => "send_message",
            ClientEvent::Typing(_) => "typing",
            ClientEvent::NextPartner { .. } => "next_partner",
            ClientEvent::Signal { .. } => "signal",
        }
    }
}

/// `data` of `join_queue` and `next_partner`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InterestsData {
    #[serde(default)]
    pub interests: Vec<String>,
}

/// `data` of `send_message`.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageData {
    pub text: String,
}

/// `data` of an inbound `signal`.
#[derive(Debug, Clone, Deserialize)]
pub struct SignalData {
    pub target: ConnectionId,
    pub signal: SignalPayload,
}

/// Outbound events pushed to a client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    Matched {
        #[serde(rename = "partnerId")]
        partner_id: ConnectionId,
        #[serde(rename = "commonInterests")]
        common_interests: Vec<String>,
    },
    Message {
        text: String,
    },
    PartnerTyping(bool),
    PartnerDisconnected {},
    OnlineCount(usize),
    Signal(SignalPayload),
}

impl ServerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::Matched { .. } => "matched",
            ServerEvent::Message { .. } => "message",
            ServerEvent::PartnerTyping(_) => "partner_typing",
            ServerEvent::PartnerDisconnected {} => "partner_disconnected",
            ServerEvent::OnlineCount(_) => "online_count",
            ServerEvent::Signal(_) => "signal",
        }
    }
}

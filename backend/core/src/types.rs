use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

/// Opaque handle of one live client connection.
///
/// Minted by the transport at connect time; the matchmaker only stores and
/// compares it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ConnectionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for ConnectionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The three WebRTC negotiation message kinds the relay carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignalKind {
    Offer,
    Answer,
    IceCandidate,
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SignalKind::Offer => "offer",
            SignalKind::Answer => "answer",
            SignalKind::IceCandidate => "ice-candidate",
        };
        f.write_str(s)
    }
}

/// A signaling message relayed between two peers.
///
/// `payload` is held as raw JSON text and is never parsed, so the receiver
/// gets exactly the bytes the sender produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalPayload {
    #[serde(rename = "type")]
    pub kind: SignalKind,
    pub payload: Box<RawValue>,
}

impl SignalPayload {
    pub fn new(kind: SignalKind, payload: Box<RawValue>) -> Self {
        Self { kind, payload }
    }

    /// Raw JSON text of the payload as received.
    pub fn raw_payload(&self) -> &str {
        self.payload.get()
    }
}

impl PartialEq for SignalPayload {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.payload.get() == other.payload.get()
    }
}

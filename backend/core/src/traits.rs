use crate::event::ServerEvent;
use crate::types::ConnectionId;

/// Per-connection outbound channel provided by the transport.
///
/// Delivery is fire-and-forget and must not suspend: the matchmaker calls
/// this while it holds its state lock, right after mutating that state.
/// Sending to a connection the transport no longer knows (or cannot take
/// more frames from) is a no-op that returns `false`.
pub trait Outbound: Send + Sync + 'static {
    /// Push an event to one connection.
    fn send(&self, to: &ConnectionId, event: ServerEvent) -> bool;
}

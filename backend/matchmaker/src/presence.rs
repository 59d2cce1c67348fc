//! Presence broadcaster: pushes the online count to every registered
//! connection.

use neonchat_core::{Outbound, ServerEvent};

use crate::registry::ConnectionRegistry;

/// Send the current registry size to every connection in it.
///
/// Count and recipients are read from the same registry without yielding,
/// so the value always matches the membership it is delivered to.
pub fn broadcast_online_count<O: Outbound + ?Sized>(
    registry: &ConnectionRegistry,
    outbound: &O,
) -> usize {
    let count = registry.size();
    for id in registry.ids() {
        outbound.send(id, ServerEvent::OnlineCount(count));
    }
    count
}

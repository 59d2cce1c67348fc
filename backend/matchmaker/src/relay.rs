//! Session relay: chat, typing, and signaling between partners.
//!
//! Nothing here is an error. A sender without a partner, or a target that
//! has already gone, makes the forward a no-op.

use neonchat_core::{ConnectionId, Outbound, ServerEvent, SignalPayload};
use tracing::debug;

use crate::state::SessionState;

/// Live partner of `from`, if it has one.
fn live_partner(state: &SessionState, from: &ConnectionId) -> Option<ConnectionId> {
    let partner = state.registry.get(from)?.partner_id.clone()?;
    state.registry.contains(&partner).then_some(partner)
}

/// Forward chat text verbatim to the sender's partner.
pub fn relay_message<O: Outbound + ?Sized>(
    state: &SessionState,
    outbound: &O,
    from: &ConnectionId,
    text: String,
) -> bool {
    let Some(partner) = live_partner(state, from) else {
        debug!(from = %from, "Dropping message from unpaired connection");
        return false;
    };
    outbound.send(&partner, ServerEvent::Message { text })
}

/// Record the sender's typing flag and forward it to the partner.
pub fn relay_typing<O: Outbound + ?Sized>(
    state: &mut SessionState,
    outbound: &O,
    from: &ConnectionId,
    is_typing: bool,
) -> bool {
    let Some(partner) = live_partner(state, from) else {
        return false;
    };
    if let Some(conn) = state.registry.get_mut(from) {
        conn.is_typing = is_typing;
    }
    outbound.send(&partner, ServerEvent::PartnerTyping(is_typing))
}

/// Forward a signaling payload to the caller-named target.
///
/// With `strict` unset any live target is accepted; with it set the target
/// must be the sender's current partner. The payload is never inspected.
pub fn relay_signal<O: Outbound + ?Sized>(
    state: &SessionState,
    outbound: &O,
    from: &ConnectionId,
    target: &ConnectionId,
    signal: SignalPayload,
    strict: bool,
) -> bool {
    if !state.registry.contains(target) {
        debug!(from = %from, target = %target, "Dropping signal for unknown target");
        return false;
    }
    if strict {
        let partner = state.registry.get(from).and_then(|c| c.partner_id.as_ref());
        if partner != Some(target) {
            debug!(from = %from, target = %target, kind = %signal.kind, "Dropping signal for non-partner");
            return false;
        }
    }
    debug!(from = %from, target = %target, kind = %signal.kind, "Relaying signal");
    outbound.send(target, ServerEvent::Signal(signal))
}

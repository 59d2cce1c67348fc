//! The single owned state store: registry plus waiting pool.

use neonchat_core::ConnectionId;
use tracing::error;

use crate::pool::WaitingPool;
use crate::registry::ConnectionRegistry;

/// Where a live connection sits in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Waiting,
    Paired,
}

#[derive(Debug, Default)]
pub struct SessionState {
    pub registry: ConnectionRegistry,
    pub pool: WaitingPool,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lifecycle state of `id`, or `None` once it is gone.
    pub fn connection_state(&self, id: &ConnectionId) -> Option<ConnectionState> {
        let conn = self.registry.get(id)?;
        Some(if conn.is_paired() {
            ConnectionState::Paired
        } else if self.pool.contains(id) {
            ConnectionState::Waiting
        } else {
            ConnectionState::Idle
        })
    }

    /// Break the pairing `id` is part of, if any.
    ///
    /// Clears `id`'s own reference and, when the partner still points back,
    /// the partner's. Returns the ex-partner if it is still live and should
    /// be told its partner left.
    pub fn unpair(&mut self, id: &ConnectionId) -> Option<ConnectionId> {
        let conn = self.registry.get_mut(id)?;
        let partner_id = conn.partner_id.take()?;
        conn.is_typing = false;

        let partner = self.registry.get_mut(&partner_id)?;
        if partner.partner_id.as_ref() == Some(id) {
            partner.partner_id = None;
            partner.is_typing = false;
        } else {
            error!(
                connection = %id,
                partner = %partner_id,
                partner_of_partner = ?partner.partner_id,
                "Asymmetric pairing detected while unpairing"
            );
        }
        Some(partner_id)
    }

    /// Pair two connections reciprocally.
    ///
    /// Refuses (and logs) self-pairing, unknown ids, or either side already
    /// being paired; returns whether the pairing was applied.
    pub fn pair(&mut self, first: &ConnectionId, second: &ConnectionId) -> bool {
        if first == second {
            error!(connection = %first, "Refusing to pair a connection with itself");
            return false;
        }
        let (Some(a), Some(b)) = (self.registry.get(first), self.registry.get(second)) else {
            return false;
        };
        if a.is_paired() || b.is_paired() {
            error!(
                first = %first,
                second = %second,
                "Refusing to pair an already-paired connection"
            );
            return false;
        }

        if let Some(a) = self.registry.get_mut(first) {
            a.partner_id = Some(second.clone());
        }
        if let Some(b) = self.registry.get_mut(second) {
            b.partner_id = Some(first.clone());
        }
        true
    }
}

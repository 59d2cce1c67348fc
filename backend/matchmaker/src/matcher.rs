//! Matching engine: greedy, insertion-ordered pairing over the waiting pool.
//!
//! For each unmatched candidate (outer index ascending) the first compatible
//! later entry (inner index ascending from outer + 1) is taken. Tagged
//! clients only match tagged clients sharing at least one tag; untagged
//! clients only match untagged clients.

use std::collections::HashSet;

use neonchat_core::{ConnectionId, Outbound, ServerEvent};
use neonchat_logging::{SessionEvent, SessionEventLogger};

use crate::registry::{Connection, ConnectionRegistry};
use crate::state::SessionState;

/// A pairing produced by one pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    pub first: ConnectionId,
    pub second: ConnectionId,
    pub common_interests: Vec<String>,
}

/// Tags of `a` also present in `b`, in `a`'s order.
pub fn common_interests(a: &[String], b: &[String]) -> Vec<String> {
    a.iter().filter(|tag| b.contains(*tag)).cloned().collect()
}

/// `Some(common tags)` if `a` and `b` may be paired.
pub fn compatibility(a: &Connection, b: &Connection) -> Option<Vec<String>> {
    match (a.interests.is_empty(), b.interests.is_empty()) {
        (true, true) => Some(Vec::new()),
        (false, false) => {
            let common = common_interests(&a.interests, &b.interests);
            (!common.is_empty()).then_some(common)
        }
        _ => None,
    }
}

/// Compute disjoint pairs for the current pool without mutating anything.
///
/// Ids missing from the registry, or already paired, are skipped.
pub fn find_matches(pool: &[ConnectionId], registry: &ConnectionRegistry) -> Vec<Match> {
    let mut matched: HashSet<&ConnectionId> = HashSet::new();
    let mut matches = Vec::new();

    for (i, first_id) in pool.iter().enumerate() {
        if matched.contains(first_id) {
            continue;
        }
        let Some(first) = registry.get(first_id).filter(|c| !c.is_paired()) else {
            continue;
        };

        for second_id in &pool[i + 1..] {
            if matched.contains(second_id) || second_id == first_id {
                continue;
            }
            let Some(second) = registry.get(second_id).filter(|c| !c.is_paired()) else {
                continue;
            };

            if let Some(common) = compatibility(first, second) {
                matched.insert(first_id);
                matched.insert(second_id);
                matches.push(Match {
                    first: first_id.clone(),
                    second: second_id.clone(),
                    common_interests: common,
                });
                break;
            }
        }
    }

    matches
}

/// Run one matching pass and apply it: pair both sides, drop them from the
/// pool, and notify each with its partner and the common tags.
pub fn run_pass<O: Outbound + ?Sized>(state: &mut SessionState, outbound: &O) -> Vec<Match> {
    if state.pool.len() < 2 {
        return Vec::new();
    }

    let candidates = find_matches(state.pool.as_slice(), &state.registry);
    let mut applied = Vec::with_capacity(candidates.len());
    for m in candidates {
        if state.pair(&m.first, &m.second) {
            applied.push(m);
        }
    }

    let paired: HashSet<ConnectionId> = applied
        .iter()
        .flat_map(|m| [m.first.clone(), m.second.clone()])
        .collect();
    state.pool.remove_all(&paired);

    for m in &applied {
        outbound.send(
            &m.first,
            ServerEvent::Matched {
                partner_id: m.second.clone(),
                common_interests: m.common_interests.clone(),
            },
        );
        outbound.send(
            &m.second,
            ServerEvent::Matched {
                partner_id: m.first.clone(),
                common_interests: m.common_interests.clone(),
            },
        );

        SessionEventLogger::log_event(SessionEvent::Matched {
            first: m.first.to_string(),
            second: m.second.to_string(),
            common_interests: m.common_interests.clone(),
        });
    }

    applied
}

//! Connection lifecycle handler.
//!
//! Per connection: `idle -> waiting -> paired -> (waiting | idle)`, and from
//! any state to gone on disconnect. Every method takes the state lock for
//! its whole duration, so each inbound event is one atomic step.

use std::sync::Arc;

use neonchat_core::{ClientEvent, ConnectionId, NeonChatError, Outbound, ServerEvent, SignalPayload};
use neonchat_logging::{SessionEvent, SessionEventLogger};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::limits::MatchingLimits;
use crate::matcher;
use crate::presence;
use crate::registry::Connection;
use crate::relay;
use crate::state::{ConnectionState, SessionState};

pub struct Matchmaker<O: Outbound> {
    state: Mutex<SessionState>,
    outbound: Arc<O>,
    limits: MatchingLimits,
}

impl<O: Outbound> Matchmaker<O> {
    pub fn new(outbound: Arc<O>, limits: MatchingLimits) -> Self {
        info!(
            max_interests = limits.max_interests,
            strict_signaling = limits.strict_signaling,
            "Matchmaker initialized"
        );
        Self {
            state: Mutex::new(SessionState::new()),
            outbound,
            limits,
        }
    }

    pub fn limits(&self) -> &MatchingLimits {
        &self.limits
    }

    /// Register a new connection and announce the new online count.
    pub async fn connect(&self, id: ConnectionId) {
        let mut state = self.state.lock().await;
        if !state.registry.add(id.clone()) {
            debug!(connection = %id, "Duplicate connect ignored");
            return;
        }
        let online = presence::broadcast_online_count(&state.registry, self.outbound.as_ref());
        SessionEventLogger::log_event(SessionEvent::Connected {
            connection_id: id.to_string(),
            online,
        });
    }

    /// Tear a connection down: end its session, drop it from the pool and
    /// the registry, and announce the new online count. Unknown ids are a
    /// no-op.
    pub async fn disconnect(&self, id: &ConnectionId) {
        let mut state = self.state.lock().await;
        if !state.registry.contains(id) {
            return;
        }
        state.pool.remove(id);
        self.end_session(&mut state, id, "disconnect");
        state.registry.remove(id);

        let online = presence::broadcast_online_count(&state.registry, self.outbound.as_ref());
        SessionEventLogger::log_event(SessionEvent::Disconnected {
            connection_id: id.to_string(),
            online,
        });
    }

    /// `idle -> waiting`. Records the interests; a paired connection keeps
    /// its partner and is not queued. Every accepted join runs a matching
    /// pass, including a rejoin from a connection already waiting.
    pub async fn join_queue(&self, id: &ConnectionId, interests: Vec<String>) -> Result<(), NeonChatError> {
        let interests = self.limits.normalize_interests(interests)?;
        let mut state = self.state.lock().await;
        self.enqueue(&mut state, id, interests);
        Ok(())
    }

    /// `paired | waiting -> idle`. Repeating it while idle changes nothing.
    pub async fn leave_queue(&self, id: &ConnectionId) {
        let mut state = self.state.lock().await;
        if !state.registry.contains(id) {
            return;
        }
        self.end_session(&mut state, id, "leave");
        state.pool.remove(id);
    }

    /// `paired -> waiting`: drop the current partner and queue again.
    pub async fn next_partner(&self, id: &ConnectionId, interests: Vec<String>) -> Result<(), NeonChatError> {
        let interests = self.limits.normalize_interests(interests)?;
        let mut state = self.state.lock().await;
        if !state.registry.contains(id) {
            return Ok(());
        }
        self.end_session(&mut state, id, "next");
        state.pool.remove(id);
        self.enqueue(&mut state, id, interests);
        Ok(())
    }

    pub async fn send_message(&self, id: &ConnectionId, text: String) -> Result<(), NeonChatError> {
        self.limits.check_message(&text)?;
        let state = self.state.lock().await;
        relay::relay_message(&state, self.outbound.as_ref(), id, text);
        Ok(())
    }

    pub async fn typing(&self, id: &ConnectionId, is_typing: bool) {
        let mut state = self.state.lock().await;
        relay::relay_typing(&mut state, self.outbound.as_ref(), id, is_typing);
    }

    pub async fn signal(&self, id: &ConnectionId, target: &ConnectionId, signal: SignalPayload) {
        let state = self.state.lock().await;
        relay::relay_signal(
            &state,
            self.outbound.as_ref(),
            id,
            target,
            signal,
            self.limits.strict_signaling,
        );
    }

    /// Dispatch one inbound event. Rejected input is logged and returned;
    /// state is untouched in that case.
    pub async fn handle(&self, id: &ConnectionId, event: ClientEvent) -> Result<(), NeonChatError> {
        let name = event.name();
        let result = match event {
            ClientEvent::JoinQueue { interests } => self.join_queue(id, interests).await,
            ClientEvent::LeaveQueue => {
                self.leave_queue(id).await;
                Ok(())
            }
            ClientEvent::SendMessage { text } => self.send_message(id, text).await,
            ClientEvent::Typing(is_typing) => {
                self.typing(id, is_typing).await;
                Ok(())
            }
            ClientEvent::NextPartner { interests } => self.next_partner(id, interests).await,
            ClientEvent::Signal { target, signal } => {
                self.signal(id, &target, signal).await;
                Ok(())
            }
        };

        if let Err(e) = &result {
            SessionEventLogger::log_event(SessionEvent::Rejected {
                connection_id: id.to_string(),
                event: name.to_string(),
                reason: e.to_string(),
            });
        }
        result
    }

    pub async fn online_count(&self) -> usize {
        self.state.lock().await.registry.size()
    }

    pub async fn waiting_count(&self) -> usize {
        self.state.lock().await.pool.len()
    }

    pub async fn connection_state(&self, id: &ConnectionId) -> Option<ConnectionState> {
        self.state.lock().await.connection_state(id)
    }

    /// Copy of a connection's current fields.
    pub async fn connection(&self, id: &ConnectionId) -> Option<Connection> {
        self.state.lock().await.registry.get(id).cloned()
    }

    fn enqueue(&self, state: &mut SessionState, id: &ConnectionId, interests: Vec<String>) {
        let Some(conn) = state.registry.get_mut(id) else {
            return;
        };
        conn.interests = interests;
        if conn.is_paired() {
            return;
        }
        // Rejoining while already waiting only swaps the interests, which
        // can still make the entry compatible with someone in the pool.
        state.pool.enqueue(id.clone());
        matcher::run_pass(state, self.outbound.as_ref());
    }

    /// Unpair `id` if paired and tell the ex-partner.
    fn end_session(&self, state: &mut SessionState, id: &ConnectionId, reason: &str) {
        let Some(partner) = state.unpair(id) else {
            return;
        };
        self.outbound.send(&partner, ServerEvent::PartnerDisconnected {});
        SessionEventLogger::log_event(SessionEvent::PartnerLeft {
            initiator: id.to_string(),
            partner: partner.to_string(),
            reason: reason.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{signal, RecordingOutbound};
    use neonchat_core::SignalKind;
    use std::collections::HashSet;

    fn setup() -> (Matchmaker<RecordingOutbound>, Arc<RecordingOutbound>) {
        setup_with(MatchingLimits::default())
    }

    fn setup_with(limits: MatchingLimits) -> (Matchmaker<RecordingOutbound>, Arc<RecordingOutbound>) {
        let out = Arc::new(RecordingOutbound::new());
        (Matchmaker::new(Arc::clone(&out), limits), out)
    }

    fn id(s: &str) -> ConnectionId {
        ConnectionId::from(s)
    }

    fn tags(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|t| t.to_string()).collect()
    }

    async fn connect_all(mm: &Matchmaker<RecordingOutbound>, ids: &[&str]) {
        for s in ids {
            mm.connect(id(s)).await;
        }
    }

    async fn assert_invariants(mm: &Matchmaker<RecordingOutbound>) {
        let state = mm.state.lock().await;
        let queued: HashSet<_> = state.pool.as_slice().iter().collect();
        assert_eq!(queued.len(), state.pool.len(), "duplicate id in pool");
        for conn_id in state.registry.ids() {
            let conn = state.registry.get(conn_id).unwrap();
            if let Some(partner) = &conn.partner_id {
                assert_ne!(partner, conn_id, "self-paired");
                assert!(!queued.contains(conn_id), "{conn_id} paired and waiting");
                let back = state.registry.get(partner).and_then(|p| p.partner_id.as_ref());
                assert_eq!(back, Some(conn_id), "asymmetric pairing");
            }
        }
        for queued_id in &queued {
            assert!(state.registry.contains(queued_id), "stale id {queued_id} in pool");
        }
    }

    fn matched(partner: &str, common: &[&str]) -> ServerEvent {
        ServerEvent::Matched {
            partner_id: id(partner),
            common_interests: tags(common),
        }
    }

    #[tokio::test]
    async fn test_untagged_clients_are_paired() {
        let (mm, out) = setup();
        connect_all(&mm, &["x", "y"]).await;
        out.clear();

        mm.join_queue(&id("x"), vec![]).await.unwrap();
        assert_eq!(mm.connection_state(&id("x")).await, Some(ConnectionState::Waiting));
        mm.join_queue(&id("y"), vec![]).await.unwrap();

        assert_eq!(mm.connection_state(&id("x")).await, Some(ConnectionState::Paired));
        assert_eq!(mm.connection_state(&id("y")).await, Some(ConnectionState::Paired));
        assert_eq!(out.events_for("x"), vec![matched("y", &[])]);
        assert_eq!(out.events_for("y"), vec![matched("x", &[])]);
        assert_eq!(mm.waiting_count().await, 0);
        assert_invariants(&mm).await;
    }

    #[tokio::test]
    async fn test_shared_interest_is_reported() {
        let (mm, out) = setup();
        connect_all(&mm, &["x", "y"]).await;
        out.clear();

        mm.join_queue(&id("x"), tags(&["music", "art"])).await.unwrap();
        mm.join_queue(&id("y"), tags(&["Art", "travel"])).await.unwrap();

        assert_eq!(out.events_for("x"), vec![matched("y", &["art"])]);
        assert_eq!(out.events_for("y"), vec![matched("x", &["art"])]);
        assert_invariants(&mm).await;
    }

    #[tokio::test]
    async fn test_tagged_and_untagged_keep_waiting() {
        let (mm, out) = setup();
        connect_all(&mm, &["x", "y", "z"]).await;
        out.clear();

        mm.join_queue(&id("x"), tags(&["jazz"])).await.unwrap();
        mm.join_queue(&id("y"), vec![]).await.unwrap();
        assert_eq!(mm.connection_state(&id("x")).await, Some(ConnectionState::Waiting));
        assert_eq!(mm.connection_state(&id("y")).await, Some(ConnectionState::Waiting));
        assert!(out.all().is_empty());

        mm.join_queue(&id("z"), vec![]).await.unwrap();
        assert_eq!(out.events_for("y"), vec![matched("z", &[])]);
        assert_eq!(mm.connection_state(&id("x")).await, Some(ConnectionState::Waiting));
        assert_invariants(&mm).await;
    }

    #[tokio::test]
    async fn test_rejoin_while_waiting_runs_a_pass() {
        let (mm, out) = setup();
        connect_all(&mm, &["x", "y"]).await;
        mm.join_queue(&id("x"), tags(&["jazz"])).await.unwrap();
        mm.join_queue(&id("y"), vec![]).await.unwrap();
        out.clear();

        mm.join_queue(&id("y"), tags(&["jazz"])).await.unwrap();

        assert_eq!(out.events_for("x"), vec![matched("y", &["jazz"])]);
        assert_eq!(out.events_for("y"), vec![matched("x", &["jazz"])]);
        assert_eq!(mm.waiting_count().await, 0);
        assert_invariants(&mm).await;
    }

    #[tokio::test]
    async fn test_cancelled_join_leaves_no_partial_pairing() {
        let out = Arc::new(RecordingOutbound::new());
        let mm = Arc::new(Matchmaker::new(Arc::clone(&out), MatchingLimits::default()));
        connect_all(&mm, &["a", "b"]).await;
        mm.join_queue(&id("a"), vec![]).await.unwrap();
        out.clear();

        // Park b's join behind the lock, then cancel it like a torn-down reader.
        let guard = mm.state.lock().await;
        let pending = {
            let mm = Arc::clone(&mm);
            tokio::spawn(async move { mm.join_queue(&id("b"), vec![]).await })
        };
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        pending.abort();
        assert!(pending.await.unwrap_err().is_cancelled());
        drop(guard);

        assert_eq!(mm.connection_state(&id("a")).await, Some(ConnectionState::Waiting));
        assert_eq!(mm.connection_state(&id("b")).await, Some(ConnectionState::Idle));
        assert!(out.all().is_empty());

        // Once a join gets the lock, pairing and both notifications land together.
        mm.join_queue(&id("b"), vec![]).await.unwrap();
        let matched_sent = out.all().iter().filter(|(_, e)| e.name() == "matched").count();
        assert_eq!(matched_sent, 2);
        assert_eq!(mm.connection_state(&id("a")).await, Some(ConnectionState::Paired));

        mm.disconnect(&id("b")).await;
        assert_eq!(
            out.events_for("a"),
            vec![
                matched("b", &[]),
                ServerEvent::PartnerDisconnected {},
                ServerEvent::OnlineCount(1),
            ]
        );
        assert_invariants(&mm).await;
    }

    #[tokio::test]
    async fn test_next_partner_requeues_initiator() {
        let (mm, out) = setup();
        connect_all(&mm, &["x", "y"]).await;
        mm.join_queue(&id("x"), vec![]).await.unwrap();
        mm.join_queue(&id("y"), vec![]).await.unwrap();
        out.clear();

        mm.next_partner(&id("x"), vec![]).await.unwrap();
        assert_eq!(out.events_for("y"), vec![ServerEvent::PartnerDisconnected {}]);
        assert!(out.events_for("x").is_empty());
        assert_eq!(mm.connection_state(&id("x")).await, Some(ConnectionState::Waiting));
        assert_eq!(mm.connection_state(&id("y")).await, Some(ConnectionState::Idle));

        out.clear();
        mm.connect(id("z")).await;
        mm.join_queue(&id("z"), vec![]).await.unwrap();
        assert_eq!(out.events_for("x").last(), Some(&matched("z", &[])));
        assert!(!out.events_for("y").iter().any(|e| e.name() == "matched"));
        assert_invariants(&mm).await;
    }

    #[tokio::test]
    async fn test_next_partner_uses_new_interests() {
        let (mm, out) = setup();
        connect_all(&mm, &["x", "y", "z"]).await;
        mm.join_queue(&id("z"), tags(&["chess"])).await.unwrap();
        mm.join_queue(&id("x"), vec![]).await.unwrap();
        mm.join_queue(&id("y"), vec![]).await.unwrap();
        out.clear();

        mm.next_partner(&id("x"), tags(&["chess"])).await.unwrap();
        assert_eq!(out.events_for("x"), vec![matched("z", &["chess"])]);
        assert_eq!(mm.connection(&id("x")).await.unwrap().interests, vec!["chess"]);
    }

    #[tokio::test]
    async fn test_disconnect_broadcasts_remaining_count() {
        let (mm, out) = setup();
        connect_all(&mm, &["a", "b", "c"]).await;
        out.clear();

        mm.disconnect(&id("c")).await;

        assert_eq!(out.events_for("a"), vec![ServerEvent::OnlineCount(2)]);
        assert_eq!(out.events_for("b"), vec![ServerEvent::OnlineCount(2)]);
        assert!(out.events_for("c").is_empty());
        assert_eq!(mm.online_count().await, 2);
    }

    #[tokio::test]
    async fn test_connect_announces_count_to_everyone() {
        let (mm, out) = setup();
        connect_all(&mm, &["a", "b"]).await;
        assert_eq!(
            out.events_for("a"),
            vec![ServerEvent::OnlineCount(1), ServerEvent::OnlineCount(2)]
        );
        assert_eq!(out.events_for("b"), vec![ServerEvent::OnlineCount(2)]);
    }

    #[tokio::test]
    async fn test_disconnect_notifies_partner_and_cleans_up() {
        let (mm, out) = setup();
        connect_all(&mm, &["a", "b", "w"]).await;
        mm.join_queue(&id("a"), vec![]).await.unwrap();
        mm.join_queue(&id("b"), vec![]).await.unwrap();
        mm.join_queue(&id("w"), tags(&["solo"])).await.unwrap();
        out.clear();

        mm.disconnect(&id("a")).await;
        mm.disconnect(&id("w")).await;

        assert_eq!(
            out.events_for("b"),
            vec![
                ServerEvent::PartnerDisconnected {},
                ServerEvent::OnlineCount(2),
                ServerEvent::OnlineCount(1),
            ]
        );
        assert!(!mm.connection(&id("b")).await.unwrap().is_paired());
        assert_eq!(mm.waiting_count().await, 0);
        assert_eq!(mm.connection_state(&id("a")).await, None);
        assert_invariants(&mm).await;
    }

    #[tokio::test]
    async fn test_duplicate_disconnect_is_noop() {
        let (mm, out) = setup();
        connect_all(&mm, &["a", "b"]).await;
        mm.disconnect(&id("a")).await;
        out.clear();
        mm.disconnect(&id("a")).await;
        assert!(out.all().is_empty());
        assert_eq!(mm.online_count().await, 1);
    }

    #[tokio::test]
    async fn test_leave_twice_is_idempotent() {
        let (mm, out) = setup();
        connect_all(&mm, &["a", "b"]).await;
        mm.join_queue(&id("a"), vec![]).await.unwrap();
        mm.join_queue(&id("b"), vec![]).await.unwrap();
        out.clear();

        mm.leave_queue(&id("a")).await;
        assert_eq!(out.events_for("b"), vec![ServerEvent::PartnerDisconnected {}]);
        assert_eq!(mm.connection_state(&id("a")).await, Some(ConnectionState::Idle));

        out.clear();
        mm.leave_queue(&id("a")).await;
        assert!(out.all().is_empty());
        assert_eq!(mm.connection_state(&id("a")).await, Some(ConnectionState::Idle));
        assert_eq!(mm.online_count().await, 2);
    }

    #[tokio::test]
    async fn test_leave_while_waiting_removes_from_pool() {
        let (mm, _out) = setup();
        connect_all(&mm, &["a"]).await;
        mm.join_queue(&id("a"), tags(&["rare"])).await.unwrap();
        assert_eq!(mm.waiting_count().await, 1);
        mm.leave_queue(&id("a")).await;
        assert_eq!(mm.waiting_count().await, 0);
        assert_eq!(mm.connection_state(&id("a")).await, Some(ConnectionState::Idle));
    }

    #[tokio::test]
    async fn test_join_while_paired_only_updates_interests() {
        let (mm, out) = setup();
        connect_all(&mm, &["a", "b"]).await;
        mm.join_queue(&id("a"), vec![]).await.unwrap();
        mm.join_queue(&id("b"), vec![]).await.unwrap();
        out.clear();

        mm.join_queue(&id("a"), tags(&["film"])).await.unwrap();
        assert_eq!(mm.connection_state(&id("a")).await, Some(ConnectionState::Paired));
        assert_eq!(mm.connection(&id("a")).await.unwrap().interests, vec!["film"]);
        assert_eq!(mm.waiting_count().await, 0);
        assert!(out.all().is_empty());
    }

    #[tokio::test]
    async fn test_repeated_join_does_not_duplicate() {
        let (mm, _out) = setup();
        connect_all(&mm, &["a"]).await;
        mm.join_queue(&id("a"), vec![]).await.unwrap();
        mm.join_queue(&id("a"), vec![]).await.unwrap();
        assert_eq!(mm.waiting_count().await, 1);
        assert_invariants(&mm).await;
    }

    #[tokio::test]
    async fn test_invalid_interests_leave_state_untouched() {
        let (mm, out) = setup_with(MatchingLimits {
            max_interests: 2,
            ..Default::default()
        });
        connect_all(&mm, &["a", "b"]).await;
        mm.join_queue(&id("a"), tags(&["go"])).await.unwrap();
        mm.join_queue(&id("b"), tags(&["go"])).await.unwrap();
        out.clear();

        let err = mm
            .next_partner(&id("a"), tags(&["x", "y", "z"]))
            .await
            .unwrap_err();
        assert!(matches!(err, NeonChatError::InvalidInput(_)));
        assert_eq!(mm.connection_state(&id("a")).await, Some(ConnectionState::Paired));
        assert_eq!(mm.connection(&id("a")).await.unwrap().interests, vec!["go"]);
        assert!(out.all().is_empty());
    }

    #[tokio::test]
    async fn test_handle_dispatches_and_rejects() {
        let (mm, out) = setup();
        connect_all(&mm, &["a", "b"]).await;
        mm.handle(&id("a"), ClientEvent::JoinQueue { interests: vec![] })
            .await
            .unwrap();
        mm.handle(&id("b"), ClientEvent::JoinQueue { interests: vec![] })
            .await
            .unwrap();
        out.clear();

        mm.handle(&id("a"), ClientEvent::SendMessage { text: "hello".into() })
            .await
            .unwrap();
        mm.handle(&id("a"), ClientEvent::Typing(true)).await.unwrap();
        mm.handle(
            &id("a"),
            ClientEvent::Signal {
                target: id("b"),
                signal: signal(SignalKind::Offer, r#"{"sdp":"v=0"}"#),
            },
        )
        .await
        .unwrap();
        assert_eq!(
            out.events_for("b"),
            vec![
                ServerEvent::Message { text: "hello".into() },
                ServerEvent::PartnerTyping(true),
                ServerEvent::Signal(signal(SignalKind::Offer, r#"{"sdp":"v=0"}"#)),
            ]
        );

        let long = "x".repeat(mm.limits().max_message_length + 1);
        assert!(mm
            .handle(&id("a"), ClientEvent::SendMessage { text: long })
            .await
            .is_err());
        assert_eq!(out.events_for("b").len(), 3);

        mm.handle(&id("a"), ClientEvent::LeaveQueue).await.unwrap();
        assert_eq!(out.events_for("b").last(), Some(&ServerEvent::PartnerDisconnected {}));
    }

    #[tokio::test]
    async fn test_message_after_session_end_is_dropped() {
        let (mm, out) = setup();
        connect_all(&mm, &["a", "b"]).await;
        mm.join_queue(&id("a"), vec![]).await.unwrap();
        mm.join_queue(&id("b"), vec![]).await.unwrap();
        mm.leave_queue(&id("b")).await;
        out.clear();

        mm.send_message(&id("a"), "still there?".into()).await.unwrap();
        mm.typing(&id("a"), true).await;
        assert!(out.all().is_empty());
    }

    #[tokio::test]
    async fn test_strict_signaling_blocks_non_partner() {
        let (mm, out) = setup_with(MatchingLimits {
            strict_signaling: true,
            ..Default::default()
        });
        connect_all(&mm, &["a", "b", "c"]).await;
        mm.join_queue(&id("a"), vec![]).await.unwrap();
        mm.join_queue(&id("b"), vec![]).await.unwrap();
        out.clear();

        mm.signal(&id("a"), &id("c"), signal(SignalKind::Offer, "{}")).await;
        mm.signal(&id("a"), &id("b"), signal(SignalKind::Offer, "{}")).await;
        assert!(out.events_for("c").is_empty());
        assert_eq!(out.events_for("b").len(), 1);
    }

    #[tokio::test]
    async fn test_many_clients_keep_invariants() {
        let (mm, _out) = setup();
        let pattern: [&[&str]; 4] = [&[], &["a"], &["b"], &["a", "b"]];
        let names: Vec<String> = (0..24).map(|i| format!("c{i}")).collect();
        for name in &names {
            mm.connect(id(name)).await;
        }
        for (i, name) in names.iter().enumerate() {
            mm.join_queue(&id(name), tags(pattern[i % pattern.len()])).await.unwrap();
            assert_invariants(&mm).await;
        }
        for (i, name) in names.iter().enumerate() {
            match i % 3 {
                0 => mm.next_partner(&id(name), vec![]).await.unwrap(),
                1 => mm.leave_queue(&id(name)).await,
                _ => mm.disconnect(&id(name)).await,
            }
            assert_invariants(&mm).await;
        }
        assert_eq!(mm.online_count().await, 16);
    }
}

//! Matchmaking engine and signaling relay.
//!
//! All mutable server state lives in [`Matchmaker`], which is held behind
//! a single lock (see [`super::state::AppState`]). Every operation that
//! reads then writes shared state runs as one critical section, so two
//! concurrent searches can never select the same waiting entry and a
//! connection is never in the pool and a room at the same time.

use std::collections::HashSet;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::common::time::unix_timestamp_millis;

use super::pool::{WaitingEntry, WaitingPool};
use super::protocol::ServerEvent;
use super::registry::{ConnectionId, ConnectionRegistry};
use super::rooms::RoomManager;

/// Parsed interest tokens: trimmed, non-empty, compared case-sensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterestSet(HashSet<String>);

impl InterestSet {
    /// Split a free-text field on commas, trimming whitespace and dropping
    /// empty tokens.
    pub fn parse(raw: &str) -> Self {
        Self(
            raw.split(',')
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .map(String::from)
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// A side with no stated interests accepts anyone; otherwise the two
    /// sets must share at least one token.
    pub fn matches(&self, other: &InterestSet) -> bool {
        self.0.is_empty() || other.0.is_empty() || !self.0.is_disjoint(&other.0)
    }
}

/// Current matchmaking counts, exposed on the stats endpoint.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Stats {
    pub connected: usize,
    pub waiting: usize,
    pub rooms: usize,
}

/// The matchmaking core: connection registry, waiting pool, and room maps.
///
/// Methods are synchronous and in-memory; they either succeed immediately
/// or resolve to a defined no-op. Notifications go out through the
/// registry's unbounded channels and never block.
#[derive(Debug, Default)]
pub struct Matchmaker {
    registry: ConnectionRegistry,
    pool: WaitingPool,
    rooms: RoomManager,
}

impl Matchmaker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection and tell the client its id.
    pub fn connect(&mut self, id: ConnectionId, sender: mpsc::UnboundedSender<ServerEvent>) {
        self.registry.register(id, sender, unix_timestamp_millis());
        self.registry
            .send(id, ServerEvent::Connected { connection_id: id });
        tracing::info!(connection_id = %id, "client connected");
    }

    /// Find a partner for `id`, or enqueue it.
    ///
    /// On a match the waiting entry is removed, a room is created, and both
    /// sides are notified with the room id, the other side's original
    /// interest string, and an initiator flag. The requester is the
    /// initiator, so exactly one side generates the initial offer.
    pub fn find_partner(&mut self, id: ConnectionId, interests_raw: &str) {
        if self.rooms.room_of(id).is_some() {
            tracing::warn!(connection_id = %id, "ignoring search from a paired connection");
            return;
        }

        // A re-search replaces any previous waiting entry, so a requester
        // can never match while its own stale entry sits in the pool.
        self.pool.remove(id);

        tracing::info!(connection_id = %id, interests = interests_raw, "searching for a partner");
        let interests = InterestSet::parse(interests_raw);

        let partner_id = self
            .pool
            .find_match(id, &interests)
            .map(|entry| entry.connection_id);
        let Some(partner_id) = partner_id else {
            match self
                .pool
                .enqueue(WaitingEntry::new(id, interests_raw))
            {
                Ok(()) => {
                    tracing::info!(connection_id = %id, "no partner available, added to waiting pool");
                }
                Err(e) => tracing::warn!(connection_id = %id, "enqueue refused: {e}"),
            }
            return;
        };

        let Some(partner) = self.pool.take(partner_id) else {
            // Unreachable: the entry was found under the same lock.
            tracing::warn!(connection_id = %partner_id, "matched entry vanished from pool");
            return;
        };

        let room_id = match self.rooms.create_room(id, partner.connection_id) {
            Ok(room_id) => room_id,
            Err(e) => {
                tracing::warn!(connection_id = %id, "room creation refused: {e}");
                return;
            }
        };

        tracing::info!(
            requester = %id,
            partner = %partner.connection_id,
            room_id = %room_id,
            "partners matched"
        );

        self.registry.send(
            id,
            ServerEvent::PartnerFound {
                room_id: room_id.clone(),
                interests: partner.interests_raw.clone(),
                is_initiator: true,
            },
        );
        self.registry.send(
            partner.connection_id,
            ServerEvent::PartnerFound {
                room_id,
                interests: interests_raw.to_string(),
                is_initiator: false,
            },
        );
    }

    /// Withdraw `id` from the waiting pool. No-op if it is not waiting,
    /// e.g. when a match for it was concluded just before the cancel.
    pub fn cancel_search(&mut self, id: ConnectionId) {
        if self.pool.remove(id) {
            tracing::info!(connection_id = %id, "search cancelled");
        }
    }

    /// Relay an opaque signaling payload to the sender's room partner.
    /// Silently dropped when the sender has no room.
    pub fn relay_signal(&self, from: ConnectionId, payload: Value) {
        if let Some(to) = self.counterpart(from) {
            self.registry.send(to, ServerEvent::Signal { payload });
        } else {
            tracing::debug!(connection_id = %from, "dropping signal from a roomless connection");
        }
    }

    /// Relay a chat message to the sender's room partner only; never
    /// echoed back to the sender.
    pub fn relay_message(&self, from: ConnectionId, message: String) {
        if let Some(to) = self.counterpart(from) {
            self.registry.send(to, ServerEvent::Message { message });
        } else {
            tracing::debug!(connection_id = %from, "dropping message from a roomless connection");
        }
    }

    /// Leave whichever of room or waiting pool `id` is in.
    ///
    /// In a room: the partner is notified and the room is destroyed. In the
    /// pool: the entry is removed. Idempotent, because a transport close
    /// and a manual-disconnect may both arrive for the same connection.
    pub fn leave_room(&mut self, id: ConnectionId) {
        if let Some(room_id) = self.rooms.room_of(id).cloned() {
            if let Some(partner) = self.rooms.other_member(&room_id, id) {
                self.registry.send(partner, ServerEvent::PartnerDisconnected);
            }
            self.rooms.destroy_room(&room_id);
            tracing::info!(connection_id = %id, room_id = %room_id, "room torn down");
        } else if self.pool.remove(id) {
            tracing::debug!(connection_id = %id, "removed from waiting pool on leave");
        }
    }

    /// Transport-level close: leave the room or pool, then drop the
    /// connection itself.
    pub fn disconnect(&mut self, id: ConnectionId) {
        self.leave_room(id);
        let session_millis = self
            .registry
            .connected_at(id)
            .map(|connected_at| unix_timestamp_millis() - connected_at);
        self.registry.unregister(id);
        tracing::info!(connection_id = %id, session_millis, "client disconnected");
    }

    pub fn stats(&self) -> Stats {
        Stats {
            connected: self.registry.len(),
            waiting: self.pool.len(),
            rooms: self.rooms.len(),
        }
    }

    fn counterpart(&self, id: ConnectionId) -> Option<ConnectionId> {
        let room_id = self.rooms.room_of(id)?;
        self.rooms.other_member(room_id, id)
    }
}

//! Connection registry: live client connections addressed by id.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::protocol::ServerEvent;

/// Opaque connection identifier, assigned at connect time and stable for
/// the connection's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One live connection: its outbound channel and connect time.
#[derive(Debug)]
struct Connection {
    sender: mpsc::UnboundedSender<ServerEvent>,
    /// Unix timestamp (milliseconds) when the connection was registered.
    connected_at: i64,
}

/// Tracks the outbound channel of every live connection.
///
/// The registry only delivers messages; pool and room membership for an id
/// must be cleaned up by the caller before `unregister`.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: HashMap<ConnectionId, Connection>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        id: ConnectionId,
        sender: mpsc::UnboundedSender<ServerEvent>,
        connected_at: i64,
    ) {
        self.connections.insert(
            id,
            Connection {
                sender,
                connected_at,
            },
        );
    }

    pub fn unregister(&mut self, id: ConnectionId) {
        self.connections.remove(&id);
    }

    /// When the connection registered, if it is still live.
    pub fn connected_at(&self, id: ConnectionId) -> Option<i64> {
        self.connections.get(&id).map(|conn| conn.connected_at)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Deliver an event to a connection. A send to a vanished or closed
    /// connection is logged and dropped, never an error for the caller.
    pub fn send(&self, id: ConnectionId, event: ServerEvent) {
        match self.connections.get(&id) {
            Some(conn) => {
                if conn.sender.send(event).is_err() {
                    tracing::warn!(connection_id = %id, "dropping event for closed connection");
                }
            }
            None => {
                tracing::debug!(connection_id = %id, "dropping event for unknown connection");
            }
        }
    }
}

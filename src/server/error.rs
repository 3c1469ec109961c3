//! Error types for the matchmaking core.
//!
//! These signal caller ordering bugs (double enqueue, pairing an already
//! paired connection). Handlers log them and recover as no-ops; they are
//! never surfaced to a client.

use thiserror::Error;

use super::registry::ConnectionId;
use super::rooms::RoomId;

/// Waiting pool invariant violations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PoolError {
    /// The connection already has a waiting entry.
    #[error("connection '{0}' is already in the waiting pool")]
    AlreadyWaiting(ConnectionId),
}

/// Room manager invariant violations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoomError {
    /// One of the requested members is already paired.
    #[error("connection '{0}' is already a member of room '{1}'")]
    AlreadyPaired(ConnectionId, RoomId),
    /// A room needs two distinct members.
    #[error("cannot pair connection '{0}' with itself")]
    SelfPair(ConnectionId),
}

//! Waiting pool: participants seeking a partner, kept in FIFO order.

use std::collections::VecDeque;

use super::error::PoolError;
use super::matchmaker::InterestSet;
use super::registry::ConnectionId;

/// A participant waiting to be paired.
#[derive(Debug, Clone)]
pub struct WaitingEntry {
    pub connection_id: ConnectionId,
    /// Raw interest string as submitted, forwarded verbatim to a future
    /// partner.
    pub interests_raw: String,
    /// Parsed token set used by the match predicate.
    pub interests: InterestSet,
}

impl WaitingEntry {
    pub fn new(connection_id: ConnectionId, interests_raw: &str) -> Self {
        Self {
            connection_id,
            interests_raw: interests_raw.to_string(),
            interests: InterestSet::parse(interests_raw),
        }
    }
}

/// Insertion-ordered pool of waiting participants.
///
/// At most one entry per connection id. There is no expiry: a participant
/// waits until matched, cancelled, or disconnected.
#[derive(Debug, Default)]
pub struct WaitingPool {
    entries: VecDeque<WaitingEntry>,
}

impl WaitingPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert at the end of the pool.
    pub fn enqueue(&mut self, entry: WaitingEntry) -> Result<(), PoolError> {
        if self.contains(entry.connection_id) {
            return Err(PoolError::AlreadyWaiting(entry.connection_id));
        }
        self.entries.push_back(entry);
        Ok(())
    }

    /// Remove the entry for `id` if present. Idempotent: a participant may
    /// cancel after already having been matched.
    pub fn remove(&mut self, id: ConnectionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.connection_id != id);
        self.entries.len() != before
    }

    /// Remove and return the entry for `id`.
    pub fn take(&mut self, id: ConnectionId) -> Option<WaitingEntry> {
        let position = self
            .entries
            .iter()
            .position(|entry| entry.connection_id == id)?;
        self.entries.remove(position)
    }

    /// Scan in insertion order (oldest first) and return the first entry
    /// acceptable to the requester, never the requester itself.
    pub fn find_match(
        &self,
        requester: ConnectionId,
        requester_interests: &InterestSet,
    ) -> Option<&WaitingEntry> {
        self.entries.iter().find(|entry| {
            entry.connection_id != requester && requester_interests.matches(&entry.interests)
        })
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.entries.iter().any(|entry| entry.connection_id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enqueue_and_remove() {
        let mut pool = WaitingPool::new();
        let id = ConnectionId::new();

        pool.enqueue(WaitingEntry::new(id, "music")).unwrap();
        assert!(pool.contains(id));

        assert!(pool.remove(id));
        assert!(pool.is_empty());
    }

    #[test]
    fn test_double_enqueue_is_refused() {
        let mut pool = WaitingPool::new();
        let id = ConnectionId::new();
        pool.enqueue(WaitingEntry::new(id, "music")).unwrap();

        let result = pool.enqueue(WaitingEntry::new(id, "film"));

        assert_eq!(result, Err(PoolError::AlreadyWaiting(id)));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_remove_absent_id_is_noop() {
        let mut pool = WaitingPool::new();

        assert!(!pool.remove(ConnectionId::new()));
    }

    #[test]
    fn test_find_match_prefers_shared_token_over_insertion_order() {
        // Pool: A (sports), B (music,film); requester wants music -> B.
        let mut pool = WaitingPool::new();
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        pool.enqueue(WaitingEntry::new(a, "sports")).unwrap();
        pool.enqueue(WaitingEntry::new(b, "music,film")).unwrap();

        let found = pool
            .find_match(ConnectionId::new(), &InterestSet::parse("music"))
            .unwrap();

        assert_eq!(found.connection_id, b);
    }

    #[test]
    fn test_find_match_is_fifo_among_equal_candidates() {
        let mut pool = WaitingPool::new();
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        pool.enqueue(WaitingEntry::new(a, "x")).unwrap();
        pool.enqueue(WaitingEntry::new(b, "x")).unwrap();

        let found = pool
            .find_match(ConnectionId::new(), &InterestSet::parse("x"))
            .unwrap();

        assert_eq!(found.connection_id, a);
    }

    #[test]
    fn test_find_match_never_returns_the_requester() {
        let mut pool = WaitingPool::new();
        let a = ConnectionId::new();
        pool.enqueue(WaitingEntry::new(a, "music")).unwrap();

        assert!(pool.find_match(a, &InterestSet::parse("music")).is_none());
    }

    #[test]
    fn test_empty_requester_interests_match_oldest_entry() {
        let mut pool = WaitingPool::new();
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        pool.enqueue(WaitingEntry::new(a, "chess")).unwrap();
        pool.enqueue(WaitingEntry::new(b, "hiking")).unwrap();

        let found = pool
            .find_match(ConnectionId::new(), &InterestSet::parse(""))
            .unwrap();

        assert_eq!(found.connection_id, a);
    }

    #[test]
    fn test_find_match_returns_none_when_nothing_qualifies() {
        let mut pool = WaitingPool::new();
        let a = ConnectionId::new();
        pool.enqueue(WaitingEntry::new(a, "cats")).unwrap();

        assert!(
            pool.find_match(ConnectionId::new(), &InterestSet::parse("dogs"))
                .is_none()
        );
    }

    #[test]
    fn test_take_returns_the_entry() {
        let mut pool = WaitingPool::new();
        let a = ConnectionId::new();
        pool.enqueue(WaitingEntry::new(a, "music")).unwrap();

        let entry = pool.take(a).unwrap();

        assert_eq!(entry.connection_id, a);
        assert_eq!(entry.interests_raw, "music");
        assert!(pool.is_empty());
        assert!(pool.take(a).is_none());
    }
}

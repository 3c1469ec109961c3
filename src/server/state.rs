//! Shared application state.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::common::time::unix_timestamp_millis;

use super::matchmaker::Matchmaker;

/// Shared application state.
///
/// The whole matchmaking core sits behind one lock so that every pool scan
/// plus the resulting removal and room creation executes as a single
/// critical section across all connection tasks.
pub struct AppState {
    pub matchmaker: Mutex<Matchmaker>,
    /// Unix timestamp (milliseconds) of server start.
    pub started_at: i64,
}

impl AppState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            matchmaker: Mutex::new(Matchmaker::new()),
            started_at: unix_timestamp_millis(),
        })
    }
}

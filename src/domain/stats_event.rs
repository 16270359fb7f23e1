//! Access event model for asynchronous statistics updates.

use chrono::{DateTime, Utc};

/// An in-memory record of one successful redirect.
///
/// Passed from the redirect path to the background stats worker over a
/// channel, so the response never waits on a store write.
///
/// # Usage Flow
///
/// 1. Created by [`crate::domain::stats_worker::StatsQueue::schedule`]
/// 2. Sent to the channel (non-blocking)
/// 3. Applied by the worker via [`crate::domain::repositories::LinkRepository::increment_access`]
#[derive(Debug, Clone)]
pub struct StatsEvent {
    pub code: String,
    pub accessed_at: DateTime<Utc>,
}

impl StatsEvent {
    /// Creates an event stamped with the current time.
    pub fn new(code: impl Into<String>) -> Self {
        Self::at(code, Utc::now())
    }

    /// Creates an event with an explicit access time.
    pub fn at(code: impl Into<String>, accessed_at: DateTime<Utc>) -> Self {
        Self {
            code: code.into(),
            accessed_at,
        }
    }
}

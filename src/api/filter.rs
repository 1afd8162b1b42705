//! Query filters applied while scanning timers.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::types::Timer;

/// Filter built from URL query parameters.
///
/// All criteria are optional and combined with AND. An empty query matches
/// every timer.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TimerQuery {
    /// Case-insensitive substring of the title.
    pub title: Option<String>,
    /// Inclusive lower bound for `start`.
    pub since: Option<DateTime<Utc>>,
    /// Exclusive upper bound for `start`.
    pub until: Option<DateTime<Utc>>,
}

impl TimerQuery {
    pub fn matches(&self, timer: &Timer) -> bool {
        if let Some(title) = &self.title {
            if !timer.title.to_lowercase().contains(&title.to_lowercase()) {
                return false;
            }
        }
        if self.since.is_some_and(|since| timer.start < since) {
            return false;
        }
        if self.until.is_some_and(|until| timer.start >= until) {
            return false;
        }
        true
    }

    /// This query as a predicate for `Timers::filter` and friends.
    pub fn predicate(&self) -> impl Fn(&Timer) -> bool + Send + Sync + '_ {
        move |timer| self.matches(timer)
    }
}

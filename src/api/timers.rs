//! Timer operations.

use chrono::Utc;
use serde_json::{Map, Value};

use crate::observability::metrics;
use crate::store::Sublevel;

use super::error::{ApiError, Result};
use super::groups::ensure_group;
use super::types::{Consolidation, Timer};
use super::check_name;

#[derive(Clone, Debug)]
pub struct Timers {
    db: Sublevel,
    groups: Sublevel,
}

impl Timers {
    pub(crate) fn new(db: Sublevel, groups: Sublevel) -> Self {
        Self { db, groups }
    }

    /// Start a new timer in `group`, creating the group if it is unseen.
    pub async fn start(&self, group: &str, fields: Map<String, Value>) -> Result<Timer> {
        check_name(group, ApiError::MissingGroup)?;
        let timer = Timer::new(group, fields, Utc::now())?;

        ensure_group(&self.groups, group).await?;
        self.save(&timer).await?;

        tracing::debug!(group = %group, id = %timer.id, "Timer started");
        metrics::record_timer_event("started");
        Ok(timer)
    }

    pub async fn get(&self, group: &str, id: &str) -> Result<Timer> {
        check_name(group, ApiError::MissingGroup)?;
        check_name(id, ApiError::MissingId)?;

        match self.db.sublevel(group).get(id).await? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Err(ApiError::TimerNotFound {
                group: group.to_string(),
                id: id.to_string(),
            }),
        }
    }

    /// Set `end` to now. A timer that is already stopped is returned unchanged.
    pub async fn stop(&self, group: &str, id: &str) -> Result<Timer> {
        let mut timer = self.get(group, id).await?;
        if !timer.is_running() {
            return Ok(timer);
        }

        timer.end = Some(Utc::now().max(timer.start));
        self.save(&timer).await?;

        tracing::debug!(group = %group, id = %id, duration_ms = ?timer.duration_ms(), "Timer stopped");
        metrics::record_timer_event("stopped");
        Ok(timer)
    }

    /// Merge `fields` into a stored timer. `id`, `group`, `start` and `end` are read-only.
    pub async fn update(&self, group: &str, id: &str, fields: Map<String, Value>) -> Result<Timer> {
        let mut timer = self.get(group, id).await?;
        timer.apply(fields)?;
        self.save(&timer).await?;

        tracing::debug!(group = %group, id = %id, "Timer updated");
        metrics::record_timer_event("updated");
        Ok(timer)
    }

    pub async fn remove(&self, group: &str, id: &str) -> Result<()> {
        // Existence check turns a stale id into NotFound instead of a silent no-op.
        self.get(group, id).await?;
        self.db.sublevel(group).del(id).await?;

        tracing::debug!(group = %group, id = %id, "Timer removed");
        metrics::record_timer_event("removed");
        Ok(())
    }

    /// Remove every timer of `group`. Returns how many were removed.
    pub async fn remove_group(&self, group: &str) -> Result<usize> {
        check_name(group, ApiError::MissingGroup)?;
        let removed = self.db.sublevel(group).clear().await?;
        tracing::debug!(group = %group, removed, "Group timers removed");
        Ok(removed)
    }

    /// Remove every timer of every group.
    pub async fn remove_all(&self) -> Result<usize> {
        let removed = self.db.clear().await?;
        tracing::debug!(removed, "All timers removed");
        Ok(removed)
    }

    /// Timers of `group` (or of all groups) that satisfy `predicate`, in key order.
    pub async fn filter<F>(&self, group: Option<&str>, predicate: F) -> Result<Vec<Timer>>
    where
        F: Fn(&Timer) -> bool + Send + Sync,
    {
        let timers = self.scan(group).await?;
        Ok(timers.into_iter().filter(|t| predicate(t)).collect())
    }

    pub async fn all(&self, group: Option<&str>) -> Result<Vec<Timer>> {
        self.scan(group).await
    }

    /// Timers without an end date.
    pub async fn running(&self, group: Option<&str>) -> Result<Vec<Timer>> {
        self.filter(group, Timer::is_running).await
    }

    /// Aggregate duration and price of stopped timers satisfying `predicate`.
    pub async fn consolidate<F>(&self, group: Option<&str>, predicate: F) -> Result<Consolidation>
    where
        F: Fn(&Timer) -> bool + Send + Sync,
    {
        let timers = self.scan(group).await?;
        Ok(timers.iter().filter(|&t| predicate(t)).collect())
    }

    fn scope(&self, group: Option<&str>) -> Result<Sublevel> {
        match group {
            Some(group) => {
                check_name(group, ApiError::MissingGroup)?;
                Ok(self.db.sublevel(group))
            }
            None => Ok(self.db.clone()),
        }
    }

    async fn scan(&self, group: Option<&str>) -> Result<Vec<Timer>> {
        let values = self.scope(group)?.values().await?;
        let mut timers = Vec::with_capacity(values.len());
        for value in values {
            match serde_json::from_value::<Timer>(value) {
                Ok(timer) => timers.push(timer),
                Err(e) => tracing::warn!(error = %e, "Skipping malformed timer record"),
            }
        }
        Ok(timers)
    }

    async fn save(&self, timer: &Timer) -> Result<()> {
        let value = serde_json::to_value(timer)?;
        self.db.sublevel(&timer.group).put(&timer.id, value).await?;
        Ok(())
    }
}

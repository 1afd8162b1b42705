//! Group operations.

use serde_json::{Map, Value};

use crate::store::Sublevel;

use super::check_name;
use super::error::{ApiError, Result};
use super::timers::Timers;
use super::types::{Consolidation, Group, Timer};

#[derive(Clone, Debug)]
pub struct Groups {
    db: Sublevel,
    timers: Timers,
}

impl Groups {
    pub(crate) fn new(db: Sublevel, timers: Timers) -> Self {
        Self { db, timers }
    }

    /// Store a group record. An existing record with the same name is replaced.
    pub async fn create(&self, name: &str, fields: Map<String, Value>) -> Result<Group> {
        check_name(name, ApiError::MissingGroup)?;
        let group = Group::new(name, fields);
        self.db.put(name, serde_json::to_value(&group)?).await?;
        tracing::debug!(group = %name, "Group created");
        Ok(group)
    }

    pub async fn get(&self, name: &str) -> Result<Group> {
        check_name(name, ApiError::MissingGroup)?;
        match self.db.get(name).await? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Err(ApiError::GroupNotFound(name.to_string())),
        }
    }

    /// Merge `fields` into the group. The name cannot change.
    pub async fn update(&self, name: &str, fields: Map<String, Value>) -> Result<Group> {
        let mut group = self.get(name).await?;
        group.apply(fields);
        self.db.put(name, serde_json::to_value(&group)?).await?;
        tracing::debug!(group = %name, "Group updated");
        Ok(group)
    }

    /// Delete the group and all of its timers. Returns the number of timers removed.
    pub async fn remove(&self, name: &str) -> Result<usize> {
        check_name(name, ApiError::MissingGroup)?;
        let existed = self.db.get(name).await?.is_some();
        let removed = self.timers.remove_group(name).await?;
        if !existed && removed == 0 {
            return Err(ApiError::GroupNotFound(name.to_string()));
        }
        self.db.del(name).await?;
        tracing::debug!(group = %name, timers_removed = removed, "Group removed");
        Ok(removed)
    }

    pub async fn all(&self) -> Result<Vec<Group>> {
        let mut groups = Vec::new();
        for value in self.db.values().await? {
            match serde_json::from_value::<Group>(value) {
                Ok(group) => groups.push(group),
                Err(e) => tracing::warn!(error = %e, "Skipping malformed group record"),
            }
        }
        Ok(groups)
    }

    pub async fn names(&self) -> Result<Vec<String>> {
        Ok(self.db.entries().await?.into_iter().map(|(name, _)| name).collect())
    }

    pub async fn timers(&self, name: &str) -> Result<Vec<Timer>> {
        self.timers.all(Some(name)).await
    }

    pub async fn running_timers(&self, name: &str) -> Result<Vec<Timer>> {
        self.timers.running(Some(name)).await
    }

    pub async fn consolidate<F>(&self, name: &str, predicate: F) -> Result<Consolidation>
    where
        F: Fn(&Timer) -> bool + Send + Sync,
    {
        self.timers.consolidate(Some(name), predicate).await
    }
}

/// Create an empty record for `name` unless one exists.
pub(crate) async fn ensure_group(db: &Sublevel, name: &str) -> Result<()> {
    if db.get(name).await?.is_none() {
        let group = Group::new(name, Map::new());
        db.put(name, serde_json::to_value(&group)?).await?;
        tracing::debug!(group = %name, "Group created implicitly");
    }
    Ok(())
}

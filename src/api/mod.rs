//! Domain API over the key-value store.
//!
//! # Data Flow
//! ```text
//! HTTP handler
//!     → Api::timers() / Api::groups()
//!     → validate names, sanitize client fields (types.rs)
//!     → Sublevel "timers" / "groups" (one nested sublevel per group for timers)
//!     → KvStore
//!
//! Reads (all, running, filter, consolidate):
//!     prefix scan → decode → predicate (filter.rs) → collect / fold
//! ```
//!
//! # Key Layout
//! - `!groups!<name>` → Group
//! - `!timers!!<group>!<id>` → Timer

pub mod error;
pub mod filter;
pub mod groups;
pub mod timers;
pub mod types;

use std::sync::Arc;

use crate::store::sublevel::SEPARATOR;
use crate::store::{KvStore, Sublevel};

pub use error::{ApiError, Result};
pub use filter::TimerQuery;
pub use groups::Groups;
pub use timers::Timers;
pub use types::{Consolidation, Group, Timer};

/// Entry point to timers and groups.
#[derive(Clone, Debug)]
pub struct Api {
    timers: Timers,
    groups: Groups,
}

impl Api {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        let root = Sublevel::root(store);
        let timers = Timers::new(root.sublevel("timers"), root.sublevel("groups"));
        let groups = Groups::new(root.sublevel("groups"), timers.clone());
        Self { timers, groups }
    }

    pub fn timers(&self) -> &Timers {
        &self.timers
    }

    pub fn groups(&self) -> &Groups {
        &self.groups
    }
}

/// Reject empty names and names that would escape their namespace.
pub(crate) fn check_name(name: &str, missing: ApiError) -> Result<()> {
    if name.is_empty() {
        return Err(missing);
    }
    if name.contains(SEPARATOR) {
        return Err(ApiError::InvalidName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_validation() {
        assert!(check_name("foo", ApiError::MissingGroup).is_ok());
        assert!(matches!(check_name("", ApiError::MissingGroup), Err(ApiError::MissingGroup)));
        assert!(matches!(check_name("", ApiError::MissingId), Err(ApiError::MissingId)));
        assert!(matches!(
            check_name("a!b", ApiError::MissingGroup),
            Err(ApiError::InvalidName(_))
        ));
    }
}

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;

use super::day_key::DayKey;

/// One tracked vitamin. `id` is stable and unique within the collection, `completed_days` holds
/// every calendar day the item was marked done. Set semantics make repeated completion of the
/// same day impossible by construction.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
pub struct TrackedItem {
    pub id: Arc<str>,
    pub name: Arc<str>,
    pub completed_days: BTreeSet<DayKey>,
}

impl TrackedItem {
    pub fn new(id: impl Into<Arc<str>>, name: impl Into<Arc<str>>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            completed_days: BTreeSet::new(),
        }
    }

    pub fn done_on(&self, day: DayKey) -> bool {
        self.completed_days.contains(&day)
    }
}

/// The collection users start with. Also the fallback when stored data is missing or unreadable.
pub fn default_items() -> Vec<TrackedItem> {
    vec![
        TrackedItem::new("vitamin-d", "Vitamin D"),
        TrackedItem::new("vitamin-c", "Vitamin C"),
        TrackedItem::new("omega-3", "Omega-3"),
    ]
}

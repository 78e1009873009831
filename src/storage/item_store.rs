use anyhow::Result;
use tracing::warn;

use crate::tracker::items::{default_items, TrackedItem};

use super::kv::KeyValueStore;

/// Key holding the serialized item collection.
pub const ITEMS_KEY: &str = "items";

/// Durable home of the tracked item collection. Sits on top of the key value store and owns the
/// serialization format: a json array of records with `id`, `name` and `completed_days`.
///
/// Reads never fail outwards. Missing or unreadable data falls back to the default collection,
/// which covers both the first launch and a corrupted state file.
pub struct ItemStore<S> {
    kv: S,
}

impl<S: KeyValueStore> ItemStore<S> {
    pub fn new(kv: S) -> Self {
        Self { kv }
    }

    pub async fn load_or_default(&self) -> Vec<TrackedItem> {
        let raw = match self.kv.get(ITEMS_KEY).await {
            Ok(Some(v)) => v,
            Ok(None) => return default_items(),
            Err(e) => {
                warn!("Failed to read stored items, starting from defaults {e:?}");
                return default_items();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(items) => items,
            Err(e) => {
                // Might happen after shutdowns cutting off a write.
                warn!("Stored items are not valid json, starting from defaults: {e}");
                default_items()
            }
        }
    }

    pub fn encode(items: &[TrackedItem]) -> Result<String> {
        Ok(serde_json::to_string(items)?)
    }

    pub async fn save_encoded(&self, raw: String) -> Result<()> {
        self.kv.set(ITEMS_KEY, raw).await
    }

    pub async fn save(&self, items: &[TrackedItem]) -> Result<()> {
        self.save_encoded(Self::encode(items)?).await
    }
}

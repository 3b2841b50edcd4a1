use dashmap::DashMap;
use parking_lot::RwLock;

use st_types::{HyperparameterSet, StoreResult};

use crate::{ParameterStore, StoreStats};

/// In-memory parameter store, used in tests and for ephemeral runs where
/// tuned parameters should not outlive the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: DashMap<String, serde_json::Value>,
    stats: RwLock<StoreStats>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a raw record, bypassing the typed save path. Lets tests seed
    /// prior tuning results or simulate a corrupted record.
    pub fn insert_raw(&self, model_id: impl Into<String>, value: serde_json::Value) {
        self.records.insert(model_id.into(), value);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn stats(&self) -> StoreStats {
        self.stats.read().clone()
    }
}

impl ParameterStore for MemoryStore {
    fn load(&self, model_id: &str) -> StoreResult<Option<serde_json::Value>> {
        let mut stats = self.stats.write();
        stats.loads += 1;

        match self.records.get(model_id) {
            Some(entry) => {
                stats.hits += 1;
                Ok(Some(entry.value().clone()))
            }
            None => {
                stats.misses += 1;
                Ok(None)
            }
        }
    }

    fn save(&self, model_id: &str, params: &HyperparameterSet) -> StoreResult<()> {
        self.records
            .insert(model_id.to_string(), params.to_value());
        self.stats.write().saves += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use st_types::ParamValue;

    #[test]
    fn round_trips_typed_sets() {
        let store = MemoryStore::new();
        let params = HyperparameterSet::new().with("max_depth", ParamValue::Int(8));
        store.save("rf", &params).unwrap();

        let raw = store.load("rf").unwrap().unwrap();
        assert_eq!(HyperparameterSet::from_value("rf", raw).unwrap(), params);
    }

    #[test]
    fn raw_inserts_come_back_unvalidated() {
        let store = MemoryStore::new();
        store.insert_raw("xgb", serde_json::json!("garbage"));
        assert_eq!(
            store.load("xgb").unwrap(),
            Some(serde_json::json!("garbage"))
        );
    }

    #[test]
    fn unknown_model_is_a_miss() {
        let store = MemoryStore::new();
        assert!(store.load("stacking").unwrap().is_none());
        assert_eq!(store.stats().misses, 1);
    }
}

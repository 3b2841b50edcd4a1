use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use st_types::{HyperparameterSet, StoreError, StoreResult};

use crate::{ParameterStore, StoreStats};

/// On-disk record wrapper. Only the `params` payload is handed back to
/// callers; the rest is bookkeeping.
#[derive(Debug, Serialize, Deserialize)]
struct StoredRecord {
    model_id: String,
    saved_at: DateTime<Utc>,
    params: serde_json::Value,
}

/// JSON-file parameter store: one `<model_id>.json` per tuned model under a
/// root directory.
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
    stats: RwLock<StoreStats>,
}

impl FileStore {
    pub fn new<P: AsRef<Path>>(root: P) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            stats: RwLock::new(StoreStats::default()),
        })
    }

    fn record_path(&self, model_id: &str) -> PathBuf {
        self.root.join(format!("{model_id}.json"))
    }

    pub fn stats(&self) -> StoreStats {
        self.stats.read().clone()
    }
}

impl ParameterStore for FileStore {
    fn load(&self, model_id: &str) -> StoreResult<Option<serde_json::Value>> {
        let path = self.record_path(model_id);

        {
            let mut stats = self.stats.write();
            stats.loads += 1;
        }

        if !path.exists() {
            self.stats.write().misses += 1;
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)?;
        let record: StoredRecord =
            serde_json::from_str(&contents).map_err(|err| StoreError::MalformedRecord {
                model_id: model_id.to_string(),
                message: err.to_string(),
            })?;

        self.stats.write().hits += 1;
        debug!(model = model_id, path = %path.display(), "loaded stored hyperparameters");
        Ok(Some(record.params))
    }

    fn save(&self, model_id: &str, params: &HyperparameterSet) -> StoreResult<()> {
        let record = StoredRecord {
            model_id: model_id.to_string(),
            saved_at: Utc::now(),
            params: params.to_value(),
        };

        let path = self.record_path(model_id);
        let contents = serde_json::to_string_pretty(&record)?;
        std::fs::write(&path, contents)?;

        self.stats.write().saves += 1;
        debug!(model = model_id, path = %path.display(), "saved hyperparameters");
        Ok(())
    }
}

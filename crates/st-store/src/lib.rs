pub mod file;
pub mod memory;

pub use file::*;
pub use memory::*;

use st_types::{HyperparameterSet, StoreResult};

/// Keyed persistence of tuned hyperparameter sets.
///
/// `load` returns the raw stored value rather than a typed set so that a
/// corrupted record surfaces to the orchestrator's merge step, where a
/// non-mapping shape is treated as a fatal contract violation. Within one
/// orchestration call each model id is touched by exactly one task; no
/// locking discipline is provided beyond that 1:1 mapping, and concurrent
/// orchestrations over the same store are unsupported.
pub trait ParameterStore: Send + Sync {
    /// Load the raw record for `model_id`, or `None` if it was never tuned.
    fn load(&self, model_id: &str) -> StoreResult<Option<serde_json::Value>>;

    /// Persist a tuned set under `model_id`, replacing any prior record.
    fn save(&self, model_id: &str, params: &HyperparameterSet) -> StoreResult<()>;
}

/// Load/save counters, mostly useful for diagnostics and tests.
#[derive(Debug, Clone, Default)]
pub struct StoreStats {
    pub loads: u64,
    pub hits: u64,
    pub misses: u64,
    pub saves: u64,
}

impl StoreStats {
    pub fn hit_rate(&self) -> f64 {
        if self.loads == 0 {
            0.0
        } else {
            self.hits as f64 / self.loads as f64
        }
    }
}

use serde::{Deserialize, Serialize};

/// Store key used for the primary sequential model, which is tuned outside
/// the pooled orchestration.
pub const BASE_MODEL_KEY: &str = "base";

/// The fixed set of model families tuned by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelFamily {
    Xgb,
    Rf,
    Stacking,
    RegStacking,
}

impl ModelFamily {
    /// All families in submission order. Merging iterates this array, so the
    /// mapping from result to model is stable across runs.
    pub const ALL: [ModelFamily; 4] = [
        ModelFamily::Xgb,
        ModelFamily::Rf,
        ModelFamily::Stacking,
        ModelFamily::RegStacking,
    ];

    /// Store key / log label for this family.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelFamily::Xgb => "xgb",
            ModelFamily::Rf => "rf",
            ModelFamily::Stacking => "stacking",
            ModelFamily::RegStacking => "reg_stacking",
        }
    }
}

impl std::fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

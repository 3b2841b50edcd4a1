use crate::params::HyperparameterSet;

/// Terminal state of one optimization study.
///
/// Every study moves NotStarted → Running → one of these. Completed and
/// Interrupted carry usable best-so-far parameters; TimedOut and Failed carry
/// nothing and the caller must fall back to cached or default values.
#[derive(Debug, Clone, PartialEq)]
pub enum StudyOutcome {
    Completed(HyperparameterSet),
    Interrupted(HyperparameterSet),
    TimedOut,
    Failed(String),
}

impl StudyOutcome {
    pub fn best_params(&self) -> Option<&HyperparameterSet> {
        match self {
            Self::Completed(params) | Self::Interrupted(params) => Some(params),
            Self::TimedOut | Self::Failed(_) => None,
        }
    }

    pub fn is_usable(&self) -> bool {
        self.best_params().is_some()
    }
}

/// Explicit tuning configuration, passed into the orchestrator and study
/// adapter instead of living in module-level state.
///
/// Parallelism is two-level: `pool_size` workers run whole studies
/// concurrently, and each study evaluates `trial_parallelism` trials per
/// batch on the shared rayon pool. Both knobs are explicit so the two levels
/// cannot silently oversubscribe the machine.
#[derive(Debug, Clone)]
pub struct TunerConfig {
    /// Trial budget per study.
    pub max_trials: usize,
    /// Outer worker pool size; one model family per worker by default.
    pub pool_size: usize,
    /// Trials evaluated concurrently within one study.
    pub trial_parallelism: usize,
    /// Objective errors whose message contains one of these substrings
    /// (case-insensitive) discard the trial instead of failing the study.
    /// Mirrors suppressing known-benign convergence warnings from model fits.
    pub suppress_warnings: Vec<String>,
}

impl Default for TunerConfig {
    fn default() -> Self {
        Self {
            max_trials: 50,
            pool_size: 4,
            trial_parallelism: rayon::current_num_threads(),
            suppress_warnings: vec!["convergence".to_string()],
        }
    }
}

impl TunerConfig {
    pub fn with_max_trials(mut self, n: usize) -> Self {
        self.max_trials = n;
        self
    }

    pub fn with_pool_size(mut self, n: usize) -> Self {
        self.pool_size = n;
        self
    }

    pub fn with_trial_parallelism(mut self, n: usize) -> Self {
        self.trial_parallelism = n;
        self
    }

    pub fn with_suppressed_warning(mut self, pattern: impl Into<String>) -> Self {
        self.suppress_warnings.push(pattern.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_chain() {
        let config = TunerConfig::default()
            .with_max_trials(10)
            .with_pool_size(2)
            .with_trial_parallelism(1)
            .with_suppressed_warning("singular matrix");

        assert_eq!(config.max_trials, 10);
        assert_eq!(config.pool_size, 2);
        assert_eq!(config.trial_parallelism, 1);
        assert_eq!(config.suppress_warnings.len(), 2);
    }

    #[test]
    fn defaults_suppress_convergence_noise() {
        let config = TunerConfig::default();
        assert!(config
            .suppress_warnings
            .iter()
            .any(|p| p.contains("convergence")));
    }
}

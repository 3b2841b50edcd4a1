//! Single-study optimizer for the primary sequential model.
//!
//! Unlike the pooled orchestrator this runs exactly one study on the calling
//! thread, never consults the parameter store, and supports a user-initiated
//! interrupt that stops the search cleanly with best-so-far parameters.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::info;

use st_types::{HyperparameterSet, StudyOutcome, TuneError, TuneResult, BASE_MODEL_KEY};

use crate::config::TunerConfig;
use crate::orchestrator::ObjectiveSpec;
use crate::search::TpeLiteSampler;
use crate::study::Study;

/// Cooperative early-stop flag for a running base-model search. Clone it and
/// trigger from another thread (e.g. a Ctrl-C handler).
#[derive(Debug, Clone, Default)]
pub struct InterruptHandle(Arc<AtomicBool>);

impl InterruptHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub(crate) fn flag(&self) -> &AtomicBool {
        &self.0
    }
}

pub struct BaseOptimizer {
    config: TunerConfig,
}

impl BaseOptimizer {
    pub fn new(config: TunerConfig) -> Self {
        Self { config }
    }

    /// Run the base-model study to completion, deadline, or interrupt, and
    /// return the best parameter mapping found.
    ///
    /// An interrupt is a clean early stop, not an error. An objective
    /// failure propagates: the base model has no cached fallback.
    pub fn optimize(
        &self,
        spec: ObjectiveSpec,
        timeout: Duration,
        interrupt: &InterruptHandle,
    ) -> TuneResult<HyperparameterSet> {
        info!("starting base model hyperparameter optimization");

        let sampler = Box::new(TpeLiteSampler::new(
            spec.space,
            TpeLiteSampler::DEFAULT_EXPLORATION,
        ));
        let mut study = Study::new(BASE_MODEL_KEY, sampler, &self.config);

        let deadline = Instant::now() + timeout;
        let outcome = study.run(&spec.objective, Some(deadline), interrupt.flag());

        let params = match outcome {
            StudyOutcome::Completed(params) => params,
            StudyOutcome::Interrupted(params) => {
                info!("optimization interrupted by user");
                params
            }
            StudyOutcome::TimedOut => {
                return Err(TuneError::Timeout {
                    timeout_seconds: timeout.as_secs(),
                })
            }
            StudyOutcome::Failed(reason) => return Err(TuneError::Search(reason)),
        };

        if let Some(best) = study.best_trial() {
            info!(trial = best.number, "best trial");
            info!(score = best.score, "best value");
            info!(params = ?best.params, "best hyperparameters");
        }

        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::SearchSpace;
    use crate::study::Objective;
    use std::sync::atomic::AtomicUsize;

    fn config() -> TunerConfig {
        TunerConfig::default()
            .with_max_trials(30)
            .with_trial_parallelism(1)
    }

    fn spec(objective: Objective) -> ObjectiveSpec {
        ObjectiveSpec::new(SearchSpace::new().add_float("lr", 1e-4, 1e-1), objective)
    }

    #[test]
    fn completes_and_returns_best_params() {
        let optimizer = BaseOptimizer::new(config());
        let objective: Objective = Arc::new(|params: &HyperparameterSet| {
            Ok(params.get("lr").unwrap().as_f64().unwrap())
        });

        let params = optimizer
            .optimize(spec(objective), Duration::from_secs(10), &InterruptHandle::new())
            .unwrap();
        assert!(params.get("lr").is_some());
    }

    #[test]
    fn interrupt_mid_search_returns_best_so_far() {
        let optimizer = BaseOptimizer::new(config());
        let interrupt = InterruptHandle::new();

        let handle = interrupt.clone();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let objective: Objective = Arc::new(move |_| {
            if seen.fetch_add(1, Ordering::SeqCst) == 2 {
                handle.trigger();
            }
            Ok(0.5)
        });

        let params = optimizer
            .optimize(spec(objective), Duration::from_secs(10), &interrupt)
            .unwrap();

        assert!(!params.is_empty(), "best-so-far parameters expected");
        assert!(calls.load(Ordering::SeqCst) < 30, "search must stop early");
    }

    #[test]
    fn objective_failure_propagates() {
        let optimizer = BaseOptimizer::new(config());
        let objective: Objective = Arc::new(|_| anyhow::bail!("exploding gradients"));

        let err = optimizer
            .optimize(spec(objective), Duration::from_secs(10), &InterruptHandle::new())
            .unwrap_err();
        match err {
            TuneError::Search(reason) => assert!(reason.contains("exploding gradients")),
            other => panic!("expected search error, got {other:?}"),
        }
    }
}

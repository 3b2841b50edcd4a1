//! Per-model study execution with cache-skip and outcome normalization.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{error, info};

use st_store::ParameterStore;
use st_types::{ModelFamily, StoreResult, StudyOutcome, TuneError};

use crate::config::TunerConfig;
use crate::search::{SearchSpace, TpeLiteSampler};
use crate::study::{Objective, Study};
use crate::timeout::run_with_timeout;

/// One unit of optimization work: a model family, its search space, and an
/// objective closed over the shared training data.
pub struct OptimizationTask {
    pub model: ModelFamily,
    pub space: SearchSpace,
    pub objective: Objective,
}

/// Normalized task result, uniform across the cache and search paths so the
/// orchestrator never branches on *why* a result exists.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome {
    /// Prior record found; search was skipped. Carries the raw stored value,
    /// shape-checked at merge time.
    Cached(serde_json::Value),
    /// A fresh search ran (or was attempted).
    Searched(StudyOutcome),
}

/// Wraps a single optimization run for one named model: decides between a
/// fresh search and stored results, executes under the timeout guard, and
/// normalizes the outcome.
pub struct StudyAdapter {
    store: Arc<dyn ParameterStore>,
    config: TunerConfig,
}

impl StudyAdapter {
    pub fn new(store: Arc<dyn ParameterStore>, config: TunerConfig) -> Self {
        Self { store, config }
    }

    /// Cache-skip decision: a prior store record means no new study.
    pub fn create_study(
        &self,
        model: ModelFamily,
        space: &SearchSpace,
    ) -> StoreResult<Option<Study>> {
        if self.store.load(model.as_str())?.is_some() {
            return Ok(None);
        }
        let sampler = Box::new(TpeLiteSampler::new(
            space.clone(),
            TpeLiteSampler::DEFAULT_EXPLORATION,
        ));
        Ok(Some(Study::new(model.as_str(), sampler, &self.config)))
    }

    /// Run one task to a normalized outcome. Never panics the batch: every
    /// per-task failure is contained here and logged.
    pub fn optimize_model(&self, task: &OptimizationTask, timeout: Duration) -> TaskOutcome {
        let model = task.model;

        let study = match self.create_study(model, &task.space) {
            Ok(Some(study)) => study,
            Ok(None) => {
                return match self.store.load(model.as_str()) {
                    Ok(Some(raw)) => {
                        info!(model = %model, "reusing stored hyperparameters, skipping search");
                        TaskOutcome::Cached(raw)
                    }
                    Ok(None) => TaskOutcome::Searched(StudyOutcome::Failed(
                        "stored parameters disappeared mid-run".to_string(),
                    )),
                    Err(err) => {
                        error!(model = %model, error = %err, "parameter store read failed");
                        TaskOutcome::Searched(StudyOutcome::Failed(err.to_string()))
                    }
                };
            }
            Err(err) => {
                error!(model = %model, error = %err, "parameter store read failed");
                return TaskOutcome::Searched(StudyOutcome::Failed(err.to_string()));
            }
        };

        let objective = Arc::clone(&task.objective);
        let deadline = Instant::now() + timeout;

        let guarded = run_with_timeout(
            model.as_str(),
            move || {
                let mut study = study;
                // Tasks are never interrupted; only the base optimizer
                // exposes a user-facing interrupt.
                let interrupt = AtomicBool::new(false);
                study.run(&objective, Some(deadline), &interrupt)
            },
            timeout,
        );

        match guarded {
            Ok(outcome) => {
                if let StudyOutcome::Failed(reason) = &outcome {
                    error!(model = %model, reason = %reason, "search generated an exception");
                }
                TaskOutcome::Searched(outcome)
            }
            Err(TuneError::Timeout { .. }) => {
                error!(model = %model, "optimization timed out");
                TaskOutcome::Searched(StudyOutcome::TimedOut)
            }
            Err(err) => {
                error!(model = %model, error = %err, "search generated an exception");
                TaskOutcome::Searched(StudyOutcome::Failed(err.to_string()))
            }
        }
    }
}

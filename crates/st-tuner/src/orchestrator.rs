//! Fan-out of per-family optimization tasks with fallback-to-cache merging.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use st_store::ParameterStore;
use st_types::{HyperparameterSet, ModelFamily, TuneResult, TunedParameters};

use crate::adapter::{OptimizationTask, StudyAdapter, TaskOutcome};
use crate::config::TunerConfig;
use crate::search::SearchSpace;
use crate::study::Objective;

/// Search space plus objective for one model family.
pub struct ObjectiveSpec {
    pub space: SearchSpace,
    pub objective: Objective,
}

impl ObjectiveSpec {
    pub fn new(space: SearchSpace, objective: Objective) -> Self {
        Self { space, objective }
    }
}

/// One objective per tuned model family, each bound by the caller over its
/// training data partitions.
pub struct ModelObjectives {
    pub xgb: ObjectiveSpec,
    pub rf: ObjectiveSpec,
    pub stacking: ObjectiveSpec,
    pub reg_stacking: ObjectiveSpec,
}

impl ModelObjectives {
    /// Tasks in the fixed submission order of [`ModelFamily::ALL`].
    fn into_tasks(self) -> Vec<OptimizationTask> {
        let Self {
            xgb,
            rf,
            stacking,
            reg_stacking,
        } = self;
        [
            (ModelFamily::Xgb, xgb),
            (ModelFamily::Rf, rf),
            (ModelFamily::Stacking, stacking),
            (ModelFamily::RegStacking, reg_stacking),
        ]
        .into_iter()
        .map(|(model, spec)| OptimizationTask {
            model,
            space: spec.space,
            objective: spec.objective,
        })
        .collect()
    }
}

/// Tunes the fixed set of model families concurrently and merges the
/// outcomes into one complete [`TunedParameters`].
///
/// A single study failing (timeout or exception) degrades that family to
/// cached or empty parameters; only a structural shape violation aborts the
/// whole call.
pub struct Orchestrator {
    store: Arc<dyn ParameterStore>,
    config: TunerConfig,
}

impl Orchestrator {
    pub fn new(store: Arc<dyn ParameterStore>, config: TunerConfig) -> Self {
        Self { store, config }
    }

    /// Optimize every model family under a shared per-study timeout.
    pub fn optimize(
        &self,
        objectives: ModelObjectives,
        timeout: Duration,
    ) -> TuneResult<TunedParameters> {
        let adapter = StudyAdapter::new(Arc::clone(&self.store), self.config.clone());
        let results = self.run_pool(&adapter, objectives.into_tasks(), timeout);

        // First pass: accept and persist every usable result, cached records
        // included; fall back to the store for anything the search could not
        // produce. A usable outcome carries best-so-far parameters whether
        // the study ran to completion or was stopped early.
        let mut merged: HashMap<ModelFamily, Option<HyperparameterSet>> = HashMap::new();
        for (model, outcome) in results {
            let value = match outcome {
                TaskOutcome::Searched(outcome) if outcome.is_usable() => {
                    let params = outcome.best_params().cloned().unwrap_or_default();
                    self.persist(model, &params);
                    Some(params)
                }
                TaskOutcome::Cached(raw) => {
                    let params = HyperparameterSet::from_value(model.as_str(), raw)?;
                    self.persist(model, &params);
                    Some(params)
                }
                TaskOutcome::Searched(_) => self.load_checked(model)?,
            };
            merged.insert(model, value);
        }

        // Second pass: guarantee a non-null entry per family, retrying the
        // store once and degrading to an empty set rather than failing.
        let mut complete: HashMap<ModelFamily, HyperparameterSet> = HashMap::new();
        for model in ModelFamily::ALL {
            let params = match merged.remove(&model).flatten() {
                Some(params) => params,
                None => match self.load_checked(model)? {
                    Some(params) => params,
                    None => {
                        warn!(model = %model, "no parameters found, using default parameters");
                        HyperparameterSet::default()
                    }
                },
            };
            complete.insert(model, params);
        }

        Ok(TunedParameters {
            xgb: complete.remove(&ModelFamily::Xgb).unwrap_or_default(),
            rf: complete.remove(&ModelFamily::Rf).unwrap_or_default(),
            stacking: complete.remove(&ModelFamily::Stacking).unwrap_or_default(),
            reg_stacking: complete
                .remove(&ModelFamily::RegStacking)
                .unwrap_or_default(),
        })
    }

    /// Run all tasks on a bounded worker pool and hand back their outcomes
    /// in submission order, regardless of completion order.
    fn run_pool(
        &self,
        adapter: &StudyAdapter,
        tasks: Vec<OptimizationTask>,
        timeout: Duration,
    ) -> Vec<(ModelFamily, TaskOutcome)> {
        let workers = self.config.pool_size.max(1).min(tasks.len().max(1));

        let (job_tx, job_rx) = crossbeam_channel::unbounded();
        for job in tasks.into_iter().enumerate() {
            let _ = job_tx.send(job);
        }
        drop(job_tx);

        let (result_tx, result_rx) = crossbeam_channel::unbounded();

        std::thread::scope(|scope| {
            for _ in 0..workers {
                let job_rx = job_rx.clone();
                let result_tx = result_tx.clone();
                scope.spawn(move || {
                    while let Ok((index, task)) = job_rx.recv() {
                        let outcome = adapter.optimize_model(&task, timeout);
                        let _ = result_tx.send((index, (task.model, outcome)));
                    }
                });
            }
        });
        drop(result_tx);

        let mut results: Vec<(usize, (ModelFamily, TaskOutcome))> = result_rx.iter().collect();
        results.sort_by_key(|(index, _)| *index);
        results.into_iter().map(|(_, result)| result).collect()
    }

    fn persist(&self, model: ModelFamily, params: &HyperparameterSet) {
        if let Err(err) = self.store.save(model.as_str(), params) {
            warn!(model = %model, error = %err, "failed to persist tuned parameters");
        }
    }

    /// Store fallback with shape validation: a present-but-non-mapping
    /// record is a fatal contract violation; a read failure merely degrades.
    fn load_checked(&self, model: ModelFamily) -> TuneResult<Option<HyperparameterSet>> {
        match self.store.load(model.as_str()) {
            Ok(Some(raw)) => Ok(Some(HyperparameterSet::from_value(model.as_str(), raw)?)),
            Ok(None) => Ok(None),
            Err(err) => {
                warn!(model = %model, error = %err, "parameter store read failed during merge");
                Ok(None)
            }
        }
    }
}

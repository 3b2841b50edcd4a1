//! Single-study execution: batched trial evaluation with best-trial tracking.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info, warn};
use uuid::Uuid;

use st_types::{HyperparameterSet, StudyOutcome};

use crate::config::TunerConfig;
use crate::search::Sampler;

/// Objective callable: scores one candidate parameter set against the
/// training data it closes over. Lower is better. Opaque to the tuner.
pub type Objective = Arc<dyn Fn(&HyperparameterSet) -> anyhow::Result<f64> + Send + Sync>;

/// The best trial seen so far in a study.
#[derive(Debug, Clone, PartialEq)]
pub struct BestTrial {
    pub number: usize,
    pub score: f64,
    pub params: HyperparameterSet,
}

/// One optimization run over a search space.
///
/// Trials are drawn from the sampler in batches of `trial_parallelism` and
/// evaluated concurrently on the rayon pool; scores feed back into the
/// sampler before the next batch is drawn.
pub struct Study {
    id: Uuid,
    label: String,
    sampler: Box<dyn Sampler>,
    max_trials: usize,
    batch_size: usize,
    suppress: Vec<String>,
    best: Option<BestTrial>,
    trials_run: usize,
}

impl Study {
    pub fn new(label: impl Into<String>, sampler: Box<dyn Sampler>, config: &TunerConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            label: label.into(),
            sampler,
            max_trials: config.max_trials,
            batch_size: config.trial_parallelism.max(1),
            suppress: config.suppress_warnings.clone(),
            best: None,
            trials_run: 0,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn trials_run(&self) -> usize {
        self.trials_run
    }

    pub fn best_trial(&self) -> Option<&BestTrial> {
        self.best.as_ref()
    }

    /// Run the study until the trial budget is spent, the deadline passes,
    /// or the interrupt flag is raised.
    ///
    /// The deadline and interrupt are cooperative, checked between batches;
    /// both stop the search cleanly with best-so-far parameters. The hard
    /// TimedOut signal comes only from the timeout guard wrapping this call
    /// when an objective refuses to yield.
    pub fn run(
        &mut self,
        objective: &Objective,
        deadline: Option<Instant>,
        interrupt: &AtomicBool,
    ) -> StudyOutcome {
        let started = Instant::now();
        debug!(study = %self.label, id = %self.id, budget = self.max_trials, "starting search");

        while self.trials_run < self.max_trials {
            if interrupt.load(Ordering::Relaxed) {
                info!(study = %self.label, trials = self.trials_run, "search interrupted, keeping best so far");
                return StudyOutcome::Interrupted(self.best_params_or_empty());
            }
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    debug!(study = %self.label, trials = self.trials_run, "deadline reached, stopping search");
                    break;
                }
            }

            let remaining = self.max_trials - self.trials_run;
            let batch = self.sampler.suggest(remaining.min(self.batch_size));
            if batch.is_empty() {
                break; // sampler exhausted
            }

            let eval = objective.as_ref();
            let scores: Vec<anyhow::Result<f64>> = batch.par_iter().map(eval).collect();

            for (params, result) in batch.iter().zip(scores) {
                let number = self.trials_run;
                self.trials_run += 1;

                match result {
                    Ok(score) => {
                        self.sampler.report(params, score);
                        let improved = self.best.as_ref().map_or(true, |b| score < b.score);
                        if improved {
                            debug!(study = %self.label, trial = number, score, "new best trial");
                            self.best = Some(BestTrial {
                                number,
                                score,
                                params: params.clone(),
                            });
                        }
                    }
                    Err(err) if self.is_suppressed(&err) => {
                        debug!(study = %self.label, trial = number, error = %err, "suppressed benign trial failure");
                    }
                    Err(err) => {
                        warn!(study = %self.label, trial = number, error = %err, "trial failed");
                        return StudyOutcome::Failed(err.to_string());
                    }
                }
            }
        }

        match self.best.clone() {
            Some(best) => {
                debug!(
                    study = %self.label,
                    trials = self.trials_run,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    best_score = best.score,
                    "search finished"
                );
                StudyOutcome::Completed(best.params)
            }
            None => StudyOutcome::Failed("no completed trials".to_string()),
        }
    }

    fn best_params_or_empty(&self) -> HyperparameterSet {
        self.best
            .as_ref()
            .map(|b| b.params.clone())
            .unwrap_or_default()
    }

    fn is_suppressed(&self, err: &anyhow::Error) -> bool {
        let message = err.to_string().to_lowercase();
        self.suppress
            .iter()
            .any(|pattern| message.contains(&pattern.to_lowercase()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{SearchSpace, TpeLiteSampler};
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn test_config() -> TunerConfig {
        TunerConfig::default()
            .with_max_trials(20)
            .with_trial_parallelism(1)
    }

    fn test_study(config: &TunerConfig) -> Study {
        let space = SearchSpace::new().add_float("x", -1.0, 1.0);
        Study::new("test", Box::new(TpeLiteSampler::new(space, 0.3)), config)
    }

    fn counting_objective(counter: Arc<AtomicUsize>) -> Objective {
        Arc::new(move |params: &HyperparameterSet| {
            counter.fetch_add(1, Ordering::SeqCst);
            let x = params.get("x").unwrap().as_f64().unwrap();
            Ok(x * x)
        })
    }

    #[test]
    fn spends_exactly_the_trial_budget() {
        let config = test_config();
        let mut study = test_study(&config);
        let counter = Arc::new(AtomicUsize::new(0));
        let interrupt = AtomicBool::new(false);

        let outcome = study.run(&counting_objective(Arc::clone(&counter)), None, &interrupt);

        assert!(matches!(outcome, StudyOutcome::Completed(_)));
        assert_eq!(counter.load(Ordering::SeqCst), 20);
        assert_eq!(study.trials_run(), 20);
    }

    #[test]
    fn best_trial_tracks_the_minimum() {
        let config = test_config();
        let mut study = test_study(&config);
        let interrupt = AtomicBool::new(false);

        // Score sequence decreases, so the last trial must win.
        let next = Arc::new(AtomicUsize::new(0));
        let objective: Objective = Arc::new(move |_| {
            let n = next.fetch_add(1, Ordering::SeqCst);
            Ok(100.0 - n as f64)
        });

        let outcome = study.run(&objective, None, &interrupt);
        assert!(matches!(outcome, StudyOutcome::Completed(_)));

        let best = study.best_trial().unwrap();
        assert_eq!(best.number, 19);
        assert_eq!(best.score, 81.0);
    }

    #[test]
    fn objective_error_fails_the_study() {
        let config = test_config();
        let mut study = test_study(&config);
        let interrupt = AtomicBool::new(false);

        let objective: Objective = Arc::new(|_| anyhow::bail!("singular matrix in fold 3"));
        match study.run(&objective, None, &interrupt) {
            StudyOutcome::Failed(reason) => assert!(reason.contains("singular matrix")),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn suppressed_errors_discard_the_trial_and_continue() {
        let config = test_config();
        let mut study = test_study(&config);
        let interrupt = AtomicBool::new(false);

        // Every other trial emits a benign convergence failure.
        let next = Arc::new(AtomicUsize::new(0));
        let objective: Objective = Arc::new(move |params: &HyperparameterSet| {
            let n = next.fetch_add(1, Ordering::SeqCst);
            if n % 2 == 0 {
                anyhow::bail!("ConvergenceWarning: lbfgs failed to converge");
            }
            let x = params.get("x").unwrap().as_f64().unwrap();
            Ok(x.abs())
        });

        let outcome = study.run(&objective, None, &interrupt);
        assert!(matches!(outcome, StudyOutcome::Completed(_)));
        assert_eq!(study.trials_run(), 20);
    }

    #[test]
    fn all_trials_suppressed_means_failed() {
        let config = test_config();
        let mut study = test_study(&config);
        let interrupt = AtomicBool::new(false);

        let objective: Objective = Arc::new(|_| anyhow::bail!("convergence trouble"));
        match study.run(&objective, None, &interrupt) {
            StudyOutcome::Failed(reason) => assert!(reason.contains("no completed trials")),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn interrupt_returns_best_so_far() {
        let config = test_config();
        let mut study = test_study(&config);
        let interrupt = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&interrupt);
        let next = Arc::new(AtomicUsize::new(0));
        let objective: Objective = Arc::new(move |_| {
            if next.fetch_add(1, Ordering::SeqCst) == 4 {
                flag.store(true, Ordering::SeqCst);
            }
            Ok(1.0)
        });

        match study.run(&objective, None, &interrupt) {
            StudyOutcome::Interrupted(params) => assert!(!params.is_empty()),
            other => panic!("expected interrupt, got {other:?}"),
        }
        assert!(study.trials_run() < 20);
    }

    #[test]
    fn past_deadline_stops_before_any_trial() {
        let config = test_config();
        let mut study = test_study(&config);
        let interrupt = AtomicBool::new(false);
        let counter = Arc::new(AtomicUsize::new(0));

        let deadline = Some(Instant::now() - Duration::from_millis(1));
        let outcome = study.run(&counting_objective(Arc::clone(&counter)), deadline, &interrupt);

        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert!(matches!(outcome, StudyOutcome::Failed(_)));
    }
}

//! End-to-end demo: tunes the four model families against synthetic
//! objectives backed by a file store, then tunes the base model.
//!
//! Run twice to see the cache-skip path: the second run loads every family
//! from the store without invoking a single objective.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use st_store::{FileStore, ParameterStore};
use st_tuner::{
    BaseOptimizer, InterruptHandle, ModelObjectives, ObjectiveSpec, Orchestrator, SearchSpace,
    TunerConfig,
};
use st_types::{HyperparameterSet, ModelFamily};

/// Synthetic objective: distance of the sampled point from a per-family
/// optimum. Stands in for a real cross-validated model fit.
fn synthetic_objective(optimum_x: f64, optimum_depth: i64) -> ObjectiveSpec {
    let space = SearchSpace::new()
        .add_log_uniform("learning_rate", 1e-4, 1e-1)
        .add_int("max_depth", 2, 12);

    let objective = Arc::new(move |params: &HyperparameterSet| {
        let lr = params
            .get("learning_rate")
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0);
        let depth = params
            .get("max_depth")
            .and_then(|v| v.as_i64())
            .unwrap_or(0);
        let score = (lr.ln() - optimum_x.ln()).powi(2) + ((depth - optimum_depth) as f64).powi(2);
        Ok(score)
    });

    ObjectiveSpec::new(space, objective)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let root = std::env::var("ST_PARAMS_DIR").unwrap_or_else(|_| "tuned-params".to_string());
    let store = Arc::new(FileStore::new(&root)?);
    info!(root = %root, "using file-backed parameter store");

    let config = TunerConfig::default().with_max_trials(64);
    let orchestrator = Orchestrator::new(Arc::clone(&store) as Arc<dyn ParameterStore>, config.clone());

    let objectives = ModelObjectives {
        xgb: synthetic_objective(0.03, 6),
        rf: synthetic_objective(0.01, 10),
        stacking: synthetic_objective(0.05, 4),
        reg_stacking: synthetic_objective(0.02, 3),
    };

    let tuned = orchestrator.optimize(objectives, Duration::from_secs(60))?;
    for model in ModelFamily::ALL {
        info!(model = %model, params = ?tuned.get(model), "tuned");
    }

    let base = BaseOptimizer::new(config);
    let base_params = base.optimize(
        synthetic_objective(0.005, 8),
        Duration::from_secs(60),
        &InterruptHandle::new(),
    )?;
    info!(params = ?base_params, "base model tuned");

    Ok(())
}

//! # st-tuner
//!
//! Concurrent multi-study hyperparameter optimization for SignalTune.
//!
//! Provides search space definitions and samplers, single-study execution
//! with a trial budget and best-trial tracking, a wall-clock timeout guard,
//! cache-skip study adaptation against a [`st_store::ParameterStore`], and a
//! pooled orchestrator that tunes the fixed set of model families and always
//! returns one parameter set per family.

mod adapter;
mod base;
mod config;
mod orchestrator;
mod search;
mod study;
mod timeout;

pub use adapter::{OptimizationTask, StudyAdapter, TaskOutcome};
pub use base::{BaseOptimizer, InterruptHandle};
pub use config::TunerConfig;
pub use orchestrator::{ModelObjectives, ObjectiveSpec, Orchestrator};
pub use search::{
    DimensionDef, DimensionKind, RandomSampler, Sampler, SearchSpace, TpeLiteSampler,
};
pub use study::{BestTrial, Objective, Study};
pub use timeout::run_with_timeout;

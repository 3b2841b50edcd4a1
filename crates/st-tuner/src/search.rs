//! Search space definitions and trial samplers.

use rand::Rng;
use serde::{Deserialize, Serialize};

use st_types::{HyperparameterSet, ParamValue};

/// A single dimension of the search space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionDef {
    pub name: String,
    pub kind: DimensionKind,
}

/// How a dimension is sampled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DimensionKind {
    /// Continuous uniform range [low, high].
    FloatRange { low: f64, high: f64 },
    /// Integer range [low, high] inclusive.
    IntRange { low: i64, high: i64 },
    /// Log-uniform range (sampled in log-space then exponentiated).
    LogUniform { low: f64, high: f64 },
    /// Categorical choices.
    Choice { values: Vec<serde_json::Value> },
}

/// The full search space: an ordered list of dimensions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SearchSpace {
    pub dimensions: Vec<DimensionDef>,
}

impl SearchSpace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_float(mut self, name: impl Into<String>, low: f64, high: f64) -> Self {
        self.dimensions.push(DimensionDef {
            name: name.into(),
            kind: DimensionKind::FloatRange { low, high },
        });
        self
    }

    pub fn add_int(mut self, name: impl Into<String>, low: i64, high: i64) -> Self {
        self.dimensions.push(DimensionDef {
            name: name.into(),
            kind: DimensionKind::IntRange { low, high },
        });
        self
    }

    pub fn add_log_uniform(mut self, name: impl Into<String>, low: f64, high: f64) -> Self {
        self.dimensions.push(DimensionDef {
            name: name.into(),
            kind: DimensionKind::LogUniform { low, high },
        });
        self
    }

    pub fn add_choice(mut self, name: impl Into<String>, values: Vec<serde_json::Value>) -> Self {
        self.dimensions.push(DimensionDef {
            name: name.into(),
            kind: DimensionKind::Choice { values },
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty()
    }
}

/// Common trait for trial samplers. Scores are minimized.
pub trait Sampler: Send {
    /// Generate the next batch of candidate parameter sets.
    fn suggest(&mut self, count: usize) -> Vec<HyperparameterSet>;

    /// Report a completed trial so adaptive samplers can learn.
    fn report(&mut self, _params: &HyperparameterSet, _score: f64) {}

    /// Human-readable sampler name.
    fn name(&self) -> &str;
}

fn sample_dimension<R: Rng>(rng: &mut R, dim: &DimensionDef) -> ParamValue {
    match &dim.kind {
        DimensionKind::FloatRange { low, high } => ParamValue::Float(rng.gen_range(*low..=*high)),
        DimensionKind::IntRange { low, high } => ParamValue::Int(rng.gen_range(*low..=*high)),
        DimensionKind::LogUniform { low, high } => {
            let log_val: f64 = rng.gen_range(low.ln()..=high.ln());
            ParamValue::Float(log_val.exp())
        }
        DimensionKind::Choice { values } => {
            let idx = rng.gen_range(0..values.len());
            ParamValue::Json(values[idx].clone())
        }
    }
}

// ---- Random sampling ----

/// Independent uniform sampling across the search space.
#[derive(Debug, Clone)]
pub struct RandomSampler {
    space: SearchSpace,
}

impl RandomSampler {
    pub fn new(space: SearchSpace) -> Self {
        Self { space }
    }

    fn sample_one(&self) -> HyperparameterSet {
        let mut rng = rand::thread_rng();
        let mut params = HyperparameterSet::new();
        for dim in &self.space.dimensions {
            params.insert(dim.name.clone(), sample_dimension(&mut rng, dim));
        }
        params
    }
}

impl Sampler for RandomSampler {
    fn suggest(&mut self, count: usize) -> Vec<HyperparameterSet> {
        (0..count).map(|_| self.sample_one()).collect()
    }

    fn name(&self) -> &str {
        "random"
    }
}

// ---- TPE-lite sampling ----

/// Lightweight tree-structured-estimator stand-in: tracks observed
/// (params, score) pairs and biases sampling toward the best-scoring region
/// by perturbing the incumbent, with an exploration fraction kept random.
#[derive(Debug, Clone)]
pub struct TpeLiteSampler {
    space: SearchSpace,
    observations: Vec<(HyperparameterSet, f64)>,
    exploration_weight: f64,
}

impl TpeLiteSampler {
    pub const DEFAULT_EXPLORATION: f64 = 0.3;

    pub fn new(space: SearchSpace, exploration_weight: f64) -> Self {
        Self {
            space,
            observations: Vec::new(),
            exploration_weight,
        }
    }

    fn explore(&self) -> HyperparameterSet {
        RandomSampler::new(self.space.clone()).sample_one()
    }

    /// Perturb the lowest-scoring observation.
    fn exploit(&self) -> HyperparameterSet {
        let incumbent = self
            .observations
            .iter()
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

        let base = match incumbent {
            Some((params, _)) => params,
            None => return self.explore(),
        };

        let mut rng = rand::thread_rng();
        let mut perturbed = HyperparameterSet::new();

        for dim in &self.space.dimensions {
            let value = match (&dim.kind, base.get(&dim.name)) {
                (DimensionKind::FloatRange { low, high }, Some(ParamValue::Float(v))) => {
                    let noise = rng.gen_range(-0.1..0.1) * (high - low);
                    ParamValue::Float((v + noise).clamp(*low, *high))
                }
                (DimensionKind::IntRange { low, high }, Some(ParamValue::Int(v))) => {
                    let delta: i64 = rng.gen_range(-2..=2);
                    ParamValue::Int((v + delta).clamp(*low, *high))
                }
                (DimensionKind::LogUniform { low, high }, Some(ParamValue::Float(v))) => {
                    let noise = rng.gen_range(-0.1..0.1) * (high.ln() - low.ln());
                    ParamValue::Float((v.ln() + noise).exp().clamp(*low, *high))
                }
                // Categoricals and missing base values fall back to random.
                _ => sample_dimension(&mut rng, dim),
            };
            perturbed.insert(dim.name.clone(), value);
        }

        perturbed
    }
}

impl Sampler for TpeLiteSampler {
    fn suggest(&mut self, count: usize) -> Vec<HyperparameterSet> {
        let mut rng = rand::thread_rng();
        (0..count)
            .map(|_| {
                if self.observations.is_empty() || rng.gen::<f64>() < self.exploration_weight {
                    self.explore()
                } else {
                    self.exploit()
                }
            })
            .collect()
    }

    fn report(&mut self, params: &HyperparameterSet, score: f64) {
        self.observations.push((params.clone(), score));
    }

    fn name(&self) -> &str {
        "tpe-lite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_space() -> SearchSpace {
        SearchSpace::new()
            .add_int("n_estimators", 50, 500)
            .add_float("subsample", 0.5, 1.0)
            .add_log_uniform("learning_rate", 1e-4, 1e-1)
    }

    #[test]
    fn builder_chain() {
        let space = SearchSpace::new()
            .add_int("a", 1, 10)
            .add_float("b", 0.0, 1.0)
            .add_log_uniform("c", 0.001, 100.0)
            .add_choice(
                "d",
                vec![serde_json::json!(true), serde_json::json!(false)],
            );
        assert_eq!(space.dimensions.len(), 4);
    }

    #[test]
    fn random_sampler_respects_bounds() {
        let mut sampler = RandomSampler::new(sample_space());
        for params in sampler.suggest(50) {
            let n = params.get("n_estimators").unwrap().as_i64().unwrap();
            assert!((50..=500).contains(&n));

            let subsample = params.get("subsample").unwrap().as_f64().unwrap();
            assert!((0.5..=1.0).contains(&subsample));

            let lr = params.get("learning_rate").unwrap().as_f64().unwrap();
            assert!((1e-4..=1e-1).contains(&lr), "lr out of bounds: {lr}");
        }
    }

    #[test]
    fn choice_sampling_stays_in_the_set() {
        let space = SearchSpace::new().add_choice(
            "booster",
            vec![serde_json::json!("gbtree"), serde_json::json!("dart")],
        );
        let mut sampler = RandomSampler::new(space);
        for params in sampler.suggest(30) {
            let choice = params.get("booster").unwrap().as_str().unwrap();
            assert!(["gbtree", "dart"].contains(&choice));
        }
    }

    #[test]
    fn tpe_lite_starts_with_exploration() {
        let mut sampler = TpeLiteSampler::new(sample_space(), 0.3);
        assert_eq!(sampler.suggest(10).len(), 10);
    }

    #[test]
    fn tpe_lite_exploits_the_incumbent() {
        let space = SearchSpace::new().add_float("lr", 0.0, 1.0);
        // exploration_weight = 0 → always exploit once an observation exists
        let mut sampler = TpeLiteSampler::new(space, 0.0);

        let incumbent = HyperparameterSet::new().with("lr", ParamValue::Float(0.5));
        sampler.report(&incumbent, 0.01);

        for params in sampler.suggest(50) {
            let lr = params.get("lr").unwrap().as_f64().unwrap();
            // Perturbations are at most ±10% of the range from the incumbent.
            assert!((0.4..=0.6).contains(&lr), "lr strayed too far: {lr}");
        }
    }
}

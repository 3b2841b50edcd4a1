//! Hyperparameter values, sets, and the aggregated per-family result.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::TuneError;
use crate::model::ModelFamily;

/// A concrete hyperparameter value: numeric or categorical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    /// Categorical or otherwise non-numeric value.
    Json(serde_json::Value),
}

impl ParamValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            Self::Json(v) => v.as_f64(),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Float(_) => None,
            Self::Json(v) => v.as_i64(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Json(v) => v.as_str(),
            _ => None,
        }
    }

    /// Lift a raw JSON value into the closest typed variant.
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Int(i)
                } else {
                    Self::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            other => Self::Json(other),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Int(v) => serde_json::Value::from(*v),
            Self::Float(v) => serde_json::Value::from(*v),
            Self::Json(v) => v.clone(),
        }
    }
}

impl std::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Json(v) => write!(f, "{v}"),
        }
    }
}

/// One tuned parameter set: a name → value mapping produced by a successful
/// search or loaded from the parameter store. Immutable once produced; an
/// empty set is the degraded fallback when nothing better exists.
///
/// Keys are ordered so that serialization and logging are deterministic.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HyperparameterSet(BTreeMap<String, ParamValue>);

impl HyperparameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: ParamValue) {
        self.0.insert(name.into(), value);
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: ParamValue) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.0.iter()
    }

    /// Validate a raw store/adapter record into a typed set.
    ///
    /// Anything other than a JSON object is a contract violation, not a
    /// transient search failure, and surfaces as [`TuneError::InvalidParameterShape`].
    pub fn from_value(model_id: &str, value: serde_json::Value) -> Result<Self, TuneError> {
        match value {
            serde_json::Value::Object(map) => {
                let mut set = Self::new();
                for (name, raw) in map {
                    set.0.insert(name, ParamValue::from_json(raw));
                }
                Ok(set)
            }
            other => Err(TuneError::InvalidParameterShape {
                model: model_id.to_string(),
                found: json_kind(&other).to_string(),
            }),
        }
    }

    pub fn to_value(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .0
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect();
        serde_json::Value::Object(map)
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Aggregated orchestration result: exactly one parameter set per model
/// family, possibly empty, never missing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TunedParameters {
    pub xgb: HyperparameterSet,
    pub rf: HyperparameterSet,
    pub stacking: HyperparameterSet,
    pub reg_stacking: HyperparameterSet,
}

impl TunedParameters {
    pub fn get(&self, family: ModelFamily) -> &HyperparameterSet {
        match family {
            ModelFamily::Xgb => &self.xgb,
            ModelFamily::Rf => &self.rf,
            ModelFamily::Stacking => &self.stacking,
            ModelFamily::RegStacking => &self.reg_stacking,
        }
    }
}

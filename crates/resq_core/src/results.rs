use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{ClusterId, ScenarioId};

/// A raw scalar as handed over by the simulation. Only numbers and booleans are
/// measurements; everything else is carried through so it can be skipped.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Missing,
}

impl ScalarValue {
    /// Coerces a measurement to `f64`. Text, missing and NaN values yield `None`.
    pub fn as_measurement(&self) -> Option<f64> {
        match self {
            ScalarValue::Bool(value) => Some(if *value { 1.0 } else { 0.0 }),
            ScalarValue::Int(value) => Some(*value as f64),
            ScalarValue::Float(value) if value.is_nan() => None,
            ScalarValue::Float(value) => Some(*value),
            ScalarValue::Text(_) | ScalarValue::Missing => None,
        }
    }
}

impl From<f64> for ScalarValue {
    fn from(value: f64) -> Self {
        ScalarValue::Float(value)
    }
}

impl From<i64> for ScalarValue {
    fn from(value: i64) -> Self {
        ScalarValue::Int(value)
    }
}

impl From<bool> for ScalarValue {
    fn from(value: bool) -> Self {
        ScalarValue::Bool(value)
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        ScalarValue::Text(value.to_string())
    }
}

/// Source and optional destination node of one simulation result.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodePair {
    pub source: String,
    pub destination: Option<String>,
}

impl NodePair {
    pub fn new(source: impl Into<String>, destination: Option<&str>) -> Self {
        Self {
            source: source.into(),
            destination: destination.map(str::to_string),
        }
    }

    pub fn edge(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination: Some(destination.into()),
        }
    }

    pub fn node(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination: None,
        }
    }

    pub fn source_label(&self) -> &str {
        self.source.trim()
    }

    pub fn destination_label(&self) -> Option<&str> {
        self.destination
            .as_deref()
            .map(str::trim)
            .filter(|label| !label.is_empty())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultBundle {
    pub is_exogenous: bool,
    #[serde(default)]
    pub scalars: BTreeMap<String, ScalarValue>,
    #[serde(default)]
    pub sequences: BTreeMap<String, Vec<Option<f64>>>,
}

impl ResultBundle {
    pub fn exogenous() -> Self {
        Self {
            is_exogenous: true,
            ..Self::default()
        }
    }

    pub fn endogenous() -> Self {
        Self::default()
    }

    pub fn with_scalar(mut self, attribute: impl Into<String>, value: impl Into<ScalarValue>) -> Self {
        self.scalars.insert(attribute.into(), value.into());
        self
    }

    pub fn with_sequence(mut self, attribute: impl Into<String>, series: Vec<Option<f64>>) -> Self {
        self.sequences.insert(attribute.into(), series);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResultEntry {
    pub nodes: NodePair,
    pub bundle: ResultBundle,
}

impl ResultEntry {
    pub fn new(nodes: NodePair, bundle: ResultBundle) -> Self {
        Self { nodes, bundle }
    }
}

/// Tags a simulation's input set as exogenous and its output set as endogenous,
/// inputs first.
pub fn tag_simulation_results(
    inputs: Vec<(NodePair, ResultBundle)>,
    outputs: Vec<(NodePair, ResultBundle)>,
) -> Vec<ResultEntry> {
    let inputs = inputs.into_iter().map(|(nodes, mut bundle)| {
        bundle.is_exogenous = true;
        ResultEntry::new(nodes, bundle)
    });
    let outputs = outputs.into_iter().map(|(nodes, mut bundle)| {
        bundle.is_exogenous = false;
        ResultEntry::new(nodes, bundle)
    });
    inputs.chain(outputs).collect()
}

/// Series with missing and NaN entries removed, plus the sum of what is left.
#[derive(Clone, Debug, PartialEq)]
pub struct CleanSeries {
    pub values: Vec<f64>,
    pub total: f64,
}

pub fn clean_series(series: &[Option<f64>]) -> CleanSeries {
    let values: Vec<f64> = series
        .iter()
        .filter_map(|value| *value)
        .filter(|value| !value.is_nan())
        .collect();
    let total = values.iter().sum();
    CleanSeries { values, total }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScalarRecord {
    pub id: i64,
    pub scenario_id: ScenarioId,
    pub is_exogenous: bool,
    pub from_node: String,
    pub to_node: Option<String>,
    pub attribute: String,
    pub value: f64,
    pub cluster_id: Option<ClusterId>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SequenceRecord {
    pub id: i64,
    pub scenario_id: ScenarioId,
    pub is_exogenous: bool,
    pub from_node: String,
    pub to_node: Option<String>,
    pub attribute: String,
    pub series: Vec<f64>,
    pub total: f64,
    pub cluster_id: Option<ClusterId>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreReport {
    pub scalars: usize,
    pub sequences: usize,
    pub skipped_scalars: usize,
}

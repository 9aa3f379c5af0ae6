use serde::{Deserialize, Serialize};

use crate::{ScenarioId, SensitivityId};

/// Natural key of a scenario, by reference names.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScenarioKey {
    pub period: String,
    pub climate: String,
    pub weather: String,
    pub sensitivity: Option<SensitivityId>,
}

impl ScenarioKey {
    pub fn new(period: impl Into<String>, climate: impl Into<String>, weather: impl Into<String>) -> Self {
        Self {
            period: period.into(),
            climate: climate.into(),
            weather: weather.into(),
            sensitivity: None,
        }
    }

    pub fn with_sensitivity(mut self, sensitivity: SensitivityId) -> Self {
        self.sensitivity = Some(sensitivity);
        self
    }
}

/// Result of a get-or-create call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScenarioOutcome {
    Created(ScenarioId),
    AlreadyExisted(ScenarioId),
}

impl ScenarioOutcome {
    pub fn id(self) -> ScenarioId {
        match self {
            ScenarioOutcome::Created(id) | ScenarioOutcome::AlreadyExisted(id) => id,
        }
    }

    pub fn created(self) -> bool {
        matches!(self, ScenarioOutcome::Created(_))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScenarioRecord {
    pub id: ScenarioId,
    pub period: String,
    pub climate: String,
    pub weather: String,
    pub sensitivity_id: Option<SensitivityId>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SensitivityInput {
    pub node: String,
    pub attribute: String,
    pub value: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SensitivityRecord {
    pub id: SensitivityId,
    pub node: String,
    pub attribute: String,
    pub value: f64,
}

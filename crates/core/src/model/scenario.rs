use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Catalog entry a run refers to by `scenario_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub id: String,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureType {
    Latency,
    Error,
    Shutdown,
    Resource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioStatus {
    Active,
    Archived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleType {
    Manual,
    Cron,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepType {
    InjectFault,
    Wait,
    IncreaseIntensity,
    Recover,
    Validate,
}

/// Scalar value in a step's display configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StepConfigValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl From<bool> for StepConfigValue {
    fn from(value: bool) -> Self {
        StepConfigValue::Bool(value)
    }
}

impl From<i64> for StepConfigValue {
    fn from(value: i64) -> Self {
        StepConfigValue::Integer(value)
    }
}

impl From<&str> for StepConfigValue {
    fn from(value: &str) -> Self {
        StepConfigValue::Text(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioStep {
    pub id: String,
    #[serde(rename = "type")]
    pub step_type: StepType,
    pub label: String,
    #[serde(default)]
    pub config: BTreeMap<String, StepConfigValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyConfig {
    /// Percentage, 0-100.
    pub max_error_rate: f64,
    pub auto_stop_enabled: bool,
}

/// A configurable chaos experiment definition.
///
/// `cron_expression` is present only when `schedule_type` is
/// [`ScheduleType::Cron`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioDetail {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub failure_type: FailureType,
    pub target_service: String,
    pub version: String,
    #[serde(with = "time::serde::rfc3339")]
    pub last_updated: OffsetDateTime,
    pub owner: String,
    pub status: ScenarioStatus,
    pub environment: String,
    /// 0-100.
    pub intensity: u8,
    /// Seconds.
    pub duration: u32,
    pub schedule_type: ScheduleType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cron_expression: Option<String>,
    pub safety_config: SafetyConfig,
    pub steps: Vec<ScenarioStep>,
}

impl ScenarioDetail {
    pub fn is_archived(&self) -> bool {
        self.status == ScenarioStatus::Archived
    }

    /// The catalog-level view of this scenario.
    pub fn summary(&self) -> Scenario {
        Scenario {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioVersion {
    pub id: String,
    pub version: String,
    #[serde(with = "time::serde::rfc3339")]
    pub published_at: OffsetDateTime,
    pub published_by: String,
    pub changelog: String,
    pub is_current: bool,
}

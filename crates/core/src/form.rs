//! Scenario create/edit form payload and its validation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{FailureType, ScenarioDetail, ScenarioStep, ScheduleType};

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_DESCRIPTION_LEN: usize = 500;

/// Fields submitted from the scenario sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioFormData {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub target_service: String,
    pub environment: String,
    #[serde(rename = "type")]
    pub failure_type: FailureType,
    pub intensity: u8,
    pub duration: u32,
    pub schedule_type: ScheduleType,
    #[serde(default)]
    pub cron_expression: String,
    pub max_error_rate: f64,
    pub auto_stop_enabled: bool,
    pub steps: Vec<ScenarioStep>,
}

impl ScenarioFormData {
    /// Prefill the edit form from an existing scenario.
    pub fn from_scenario(scenario: &ScenarioDetail) -> Self {
        Self {
            name: scenario.name.clone(),
            description: scenario.description.clone(),
            target_service: scenario.target_service.clone(),
            environment: scenario.environment.clone(),
            failure_type: scenario.failure_type,
            intensity: scenario.intensity,
            duration: scenario.duration,
            schedule_type: scenario.schedule_type,
            cron_expression: scenario.cron_expression.clone().unwrap_or_default(),
            max_error_rate: scenario.safety_config.max_error_rate,
            auto_stop_enabled: scenario.safety_config.auto_stop_enabled,
            steps: scenario.steps.clone(),
        }
    }

    /// The cron expression to store: trimmed, and only for cron schedules.
    pub fn effective_cron(&self) -> Option<String> {
        let cron = self.cron_expression.trim();
        (self.schedule_type == ScheduleType::Cron && !cron.is_empty()).then(|| cron.to_string())
    }

    /// Check every field, collecting all problems rather than stopping at
    /// the first.
    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = Vec::new();
        let mut fail = |field: &'static str, message: &str| {
            errors.push(FieldError {
                field,
                message: message.to_string(),
            })
        };

        if self.name.trim().is_empty() {
            fail("name", "Scenario name is required");
        } else if self.name.chars().count() > MAX_NAME_LEN {
            fail("name", "Name must be 100 characters or less");
        }
        if self.description.chars().count() > MAX_DESCRIPTION_LEN {
            fail("description", "Description must be 500 characters or less");
        }
        if self.target_service.trim().is_empty() {
            fail("targetService", "Target service is required");
        }
        if self.environment.trim().is_empty() {
            fail("environment", "Environment is required");
        }
        if self.intensity > 100 {
            fail("intensity", "Intensity must be between 0 and 100");
        }
        if self.duration == 0 {
            fail("duration", "Duration must be a positive number of seconds");
        }
        if self.schedule_type == ScheduleType::Cron && self.cron_expression.trim().is_empty() {
            fail(
                "cronExpression",
                "Cron expression is required for scheduled scenarios",
            );
        }
        if !(0.0..=100.0).contains(&self.max_error_rate) {
            fail("maxErrorRate", "Max error rate must be between 0 and 100");
        }
        if self.steps.is_empty() {
            fail("steps", "At least one step is required");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(FormErrors { errors })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Every validation failure found in one submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormErrors {
    pub errors: Vec<FieldError>,
}

impl FormErrors {
    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid scenario form: ")?;
        for (i, e) in self.errors.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", e.field, e.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for FormErrors {}

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::Incident;

/// Outcome of a single scenario execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    Failed,
    Degraded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunMetrics {
    pub latency_p50: f64,
    pub latency_p99: f64,
    /// Percentage, 0-100.
    pub error_rate: f64,
    pub request_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunError {
    pub code: String,
    pub message: String,
    pub count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineEntryType {
    Info,
    Warning,
    Error,
    Success,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub event: String,
    #[serde(rename = "type")]
    pub entry_type: TimelineEntryType,
}

/// One execution of a scenario. Runs never change after generation.
///
/// `errors` is non-empty only when `status` is not [`RunStatus::Success`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Run {
    pub id: String,
    /// Scenario display name, denormalized from the catalog.
    pub scenario: String,
    pub scenario_id: String,
    pub status: RunStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    /// Milliseconds.
    pub duration: u64,
    pub metrics: RunMetrics,
    pub errors: Vec<RunError>,
    pub timeline: Vec<TimelineEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineEventType {
    FaultInjected,
    RetryTriggered,
    CircuitBreakerOpen,
    FallbackServed,
    Recovery,
    Info,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedTimelineEvent {
    pub id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    #[serde(rename = "type")]
    pub event_type: TimelineEventType,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, serde_json::Value>>,
}

/// Run metrics plus the resource figures only shown on the detail view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendedRunMetrics {
    #[serde(flatten)]
    pub base: RunMetrics,
    pub latency_p95: f64,
    pub throughput: u64,
    pub cpu_usage: f64,
    pub memory_usage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunDetail {
    pub id: String,
    pub scenario: String,
    pub scenario_id: String,
    pub status: RunStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    pub duration: u64,
    pub errors: Vec<RunError>,
    pub timeline: Vec<TimelineEntry>,
    pub environment: String,
    pub metrics: ExtendedRunMetrics,
    pub detailed_timeline: Vec<DetailedTimelineEvent>,
    pub incidents: Vec<Incident>,
}

impl RunDetail {
    /// The base run this detail was derived from.
    pub fn to_run(&self) -> Run {
        Run {
            id: self.id.clone(),
            scenario: self.scenario.clone(),
            scenario_id: self.scenario_id.clone(),
            status: self.status,
            started_at: self.started_at,
            duration: self.duration,
            metrics: self.metrics.base.clone(),
            errors: self.errors.clone(),
            timeline: self.timeline.clone(),
        }
    }
}

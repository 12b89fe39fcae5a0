use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Incident priority tier. `Critical` is the greatest; `ALL` lists the
/// tiers most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentSeverity {
    Low,
    Medium,
    High,
    Critical,
}

/// Triage state. Moves only forward: open, acknowledged, resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentStatus {
    Open,
    Acknowledged,
    Resolved,
}

/// Lightweight incident attached to a single run's detail view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    pub id: String,
    pub title: String,
    pub severity: IncidentSeverity,
    pub description: String,
    pub recommended_action: String,
    #[serde(with = "time::serde::rfc3339")]
    pub detected_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalType {
    MetricAnomaly,
    ThresholdBreach,
    Correlation,
    AlertFired,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentSignal {
    pub id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    #[serde(rename = "type")]
    pub signal_type: SignalType,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentMetrics {
    pub latency_p95: f64,
    pub error_rate: f64,
}

/// Platform-wide incident with a triage workflow.
///
/// `owner` is `None` exactly while the incident has never left
/// [`IncidentStatus::Open`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentDetail {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub severity: IncidentSeverity,
    pub status: IncidentStatus,
    pub service: String,
    #[serde(with = "time::serde::rfc3339")]
    pub detected_at: OffsetDateTime,
    pub run_id: String,
    pub owner: Option<String>,
    pub suspected_root_cause: String,
    pub impacted_endpoints: Vec<String>,
    pub recommended_actions: Vec<String>,
    pub signals: Vec<IncidentSignal>,
    pub metrics: IncidentMetrics,
}

impl IncidentDetail {
    pub fn is_resolved(&self) -> bool {
        self.status == IncidentStatus::Resolved
    }
}

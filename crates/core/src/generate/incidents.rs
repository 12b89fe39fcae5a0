use rand::Rng;
use time::{Duration, OffsetDateTime};

use super::catalog::{
    self, IMPACTED_ENDPOINTS, INCIDENT_SUMMARIES, INCIDENT_TITLES, OWNERS, RECOMMENDED_ACTIONS,
    ROOT_CAUSES, TARGET_SERVICES,
};
use super::runs::round2;
use super::{run_id, Generator, Stream};
use crate::model::{
    IncidentDetail, IncidentMetrics, IncidentSeverity, IncidentSignal, IncidentStatus, SignalType,
};

/// Leading indices forced into a status before the cycle takes over.
const FORCED_OPEN: usize = 3;
const FORCED_ACKNOWLEDGED: usize = 8;

pub(crate) fn severity_for_index(index: usize) -> IncidentSeverity {
    IncidentSeverity::ALL[index % 4]
}

pub(crate) fn status_for_index(index: usize) -> IncidentStatus {
    if index < FORCED_OPEN {
        IncidentStatus::Open
    } else if index < FORCED_ACKNOWLEDGED {
        IncidentStatus::Acknowledged
    } else {
        IncidentStatus::ALL[index % 3]
    }
}

impl Generator {
    /// Generate the platform incident at `index`, tied to one of `run_count`
    /// generated runs by `index % run_count`.
    pub fn generate_incident_detail(&self, index: usize, run_count: usize) -> IncidentDetail {
        let mut rng = self.rng(Stream::Incident, index as u64);
        let severity = severity_for_index(index);
        let status = status_for_index(index);
        let detected_at = self.now - Duration::hours(2 * index as i64);

        let error_rate = match severity {
            IncidentSeverity::Critical => rng.gen_range(8.0..15.0),
            IncidentSeverity::High => rng.gen_range(4.0..8.0),
            IncidentSeverity::Medium | IncidentSeverity::Low => rng.gen_range(1.0..4.0),
        };

        IncidentDetail {
            id: format!("inc-{:04}", index + 1),
            title: catalog::pick(INCIDENT_TITLES, index).to_string(),
            summary: catalog::pick(INCIDENT_SUMMARIES, index).to_string(),
            severity,
            status,
            service: catalog::pick(TARGET_SERVICES, index).to_string(),
            detected_at,
            run_id: run_id(index.checked_rem(run_count).unwrap_or(index)),
            owner: (status != IncidentStatus::Open)
                .then(|| catalog::pick(OWNERS, index).to_string()),
            suspected_root_cause: catalog::pick(ROOT_CAUSES, index).to_string(),
            impacted_endpoints: take_strings(IMPACTED_ENDPOINTS, 2 + index % 4),
            recommended_actions: take_strings(RECOMMENDED_ACTIONS, 3 + index % 3),
            signals: signals(detected_at, severity),
            metrics: IncidentMetrics {
                latency_p95: (200 + (index * 50) % 600) as f64,
                error_rate: round2(error_rate),
            },
        }
    }
}

fn take_strings(table: &[&str], n: usize) -> Vec<String> {
    table.iter().take(n).map(|s| s.to_string()).collect()
}

/// Detection narrative: anomaly, breach, correlation, alert, in that order
/// leading up to `detected_at`, plus an SLO burn signal afterwards for
/// critical and high incidents.
fn signals(detected_at: OffsetDateTime, severity: IncidentSeverity) -> Vec<IncidentSignal> {
    let page = if severity == IncidentSeverity::Critical {
        "P1 - Immediate response"
    } else {
        "P2 - Urgent"
    };

    let mut plan = vec![
        (
            -180,
            SignalType::MetricAnomaly,
            "Latency anomaly detected",
            "p95 increased 150% from baseline",
        ),
        (
            -120,
            SignalType::ThresholdBreach,
            "Error rate threshold breached",
            "4.2% > 2% threshold",
        ),
        (
            -60,
            SignalType::Correlation,
            "Correlated with upstream deployment",
            "api-gateway v2.3.1 deployed 10min ago",
        ),
        (0, SignalType::AlertFired, "PagerDuty alert triggered", page),
    ];

    if matches!(severity, IncidentSeverity::Critical | IncidentSeverity::High) {
        plan.push((
            30,
            SignalType::ThresholdBreach,
            "SLO budget consumption accelerated",
            "Burning 15x normal rate",
        ));
    }

    plan.into_iter()
        .enumerate()
        .map(|(i, (offset, signal_type, title, value))| IncidentSignal {
            id: format!("sig-{}", i + 1),
            timestamp: detected_at + Duration::seconds(offset),
            signal_type,
            title: title.to_string(),
            value: Some(value.to_string()),
        })
        .collect()
}

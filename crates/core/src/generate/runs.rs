use std::collections::BTreeMap;

use rand::Rng;
use serde_json::json;
use time::{Duration, OffsetDateTime};

use super::catalog::{self, ENVIRONMENTS, RUN_ERRORS};
use super::{key_of, run_id, Generator, Stream};
use crate::model::{
    DetailedTimelineEvent, ExtendedRunMetrics, Incident, IncidentSeverity, Run, RunDetail,
    RunError, RunMetrics, RunStatus, TimelineEntry, TimelineEntryType, TimelineEventType,
};

/// Every third run fails; of the rest, every fifth degrades.
pub(crate) fn status_for_index(index: usize) -> RunStatus {
    if index % 3 == 0 {
        RunStatus::Failed
    } else if index % 5 == 0 {
        RunStatus::Degraded
    } else {
        RunStatus::Success
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl Generator {
    /// Generate the run at `index`, back-dated `index` hours from now.
    pub fn generate_run(&self, index: usize) -> Run {
        let mut rng = self.rng(Stream::Run, index as u64);
        let status = status_for_index(index);
        let (scenario_id, scenario_name, _) = catalog::pick(catalog::CATALOG, index);

        let jitter = Duration::milliseconds(rng.gen_range(0..1_800_000));
        let started_at = self.now - Duration::hours(index as i64) - jitter;
        let duration = rng.gen_range(20_000..60_000);

        let error_rate = match status {
            RunStatus::Failed => rng.gen_range(5.0..15.0),
            RunStatus::Degraded => rng.gen_range(1.0..4.0),
            RunStatus::Success => rng.gen_range(0.0..0.5),
        };
        let metrics = RunMetrics {
            latency_p50: round2(rng.gen_range(45.0..145.0)),
            latency_p99: round2(rng.gen_range(200.0..500.0)),
            error_rate: round2(error_rate),
            request_count: rng.gen_range(5_000..20_000),
        };

        let error_count = match status {
            RunStatus::Success => 0,
            RunStatus::Degraded => 2,
            RunStatus::Failed => 4,
        };
        let errors = RUN_ERRORS
            .iter()
            .take(error_count)
            .map(|(code, message, base)| RunError {
                code: code.to_string(),
                message: message.to_string(),
                count: (f64::from(*base) * rng.gen_range(0.5..1.5)).floor() as u32,
            })
            .collect();

        Run {
            id: run_id(index),
            scenario: scenario_name.to_string(),
            scenario_id: scenario_id.to_string(),
            status,
            started_at,
            duration,
            metrics,
            errors,
            timeline: run_timeline(started_at, status),
        }
    }

    /// Derive the detail view of `run`. Deterministic per (seed, run id).
    pub fn run_detail(&self, run: &Run) -> RunDetail {
        let mut rng = self.rng(Stream::RunDetail, key_of(&run.id));
        let failed = run.status == RunStatus::Failed;

        let env_byte = run.id.as_bytes().get(4).copied().unwrap_or(0);
        let environment = catalog::pick(ENVIRONMENTS, usize::from(env_byte)).to_string();

        let base = run.metrics.clone();
        let latency_p95 = round2(base.latency_p50 + (base.latency_p99 - base.latency_p50) * 0.7);
        let throughput = rng.gen_range(1_000..5_000);
        let cpu_usage = if failed {
            rng.gen_range(75.0..95.0)
        } else {
            rng.gen_range(30.0..70.0)
        };
        let memory_usage = if failed {
            rng.gen_range(70.0..95.0)
        } else {
            rng.gen_range(40.0..70.0)
        };

        RunDetail {
            id: run.id.clone(),
            scenario: run.scenario.clone(),
            scenario_id: run.scenario_id.clone(),
            status: run.status,
            started_at: run.started_at,
            duration: run.duration,
            errors: run.errors.clone(),
            timeline: run.timeline.clone(),
            environment,
            metrics: ExtendedRunMetrics {
                base,
                latency_p95,
                throughput,
                cpu_usage: round2(cpu_usage),
                memory_usage: round2(memory_usage),
            },
            detailed_timeline: detailed_timeline(run.started_at, run.status),
            incidents: run_incidents(&run.id, run.started_at, run.status),
        }
    }

    /// Look up `run_id` in `runs` and derive its detail. `None` when absent.
    pub fn run_detail_for(&self, runs: &[Run], run_id: &str) -> Option<RunDetail> {
        find_run(runs, run_id).map(|run| self.run_detail(run))
    }
}

pub fn find_run<'a>(runs: &'a [Run], run_id: &str) -> Option<&'a Run> {
    runs.iter().find(|r| r.id == run_id)
}

fn at(start: OffsetDateTime, offset_ms: i64) -> OffsetDateTime {
    start + Duration::milliseconds(offset_ms)
}

fn run_timeline(started_at: OffsetDateTime, status: RunStatus) -> Vec<TimelineEntry> {
    use TimelineEntryType::*;

    let tail: [(i64, &str, TimelineEntryType); 3] = match status {
        RunStatus::Failed => [
            (15_000, "Error threshold exceeded", Warning),
            (25_000, "System recovery failed", Error),
            (30_000, "Run terminated with failures", Error),
        ],
        RunStatus::Degraded => [
            (12_000, "Latency increase detected", Warning),
            (22_000, "Partial recovery observed", Warning),
            (35_000, "Run completed with degradation", Warning),
        ],
        RunStatus::Success => [
            (10_000, "System responded within SLA", Success),
            (20_000, "Recovery verified", Success),
            (25_000, "Run completed successfully", Success),
        ],
    };

    [
        (0, "Run initialized", Info),
        (1_000, "Chaos injection started", Info),
        (5_000, "Baseline metrics captured", Info),
    ]
    .into_iter()
    .chain(tail)
    .map(|(offset, event, entry_type)| TimelineEntry {
        timestamp: at(started_at, offset),
        event: event.to_string(),
        entry_type,
    })
    .collect()
}

type Metadata = Option<BTreeMap<String, serde_json::Value>>;

fn metadata(pairs: &[(&str, serde_json::Value)]) -> Metadata {
    Some(
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect(),
    )
}

fn detailed_timeline(started_at: OffsetDateTime, status: RunStatus) -> Vec<DetailedTimelineEvent> {
    use TimelineEventType::*;

    let mut events: Vec<(i64, TimelineEventType, &str, &str, Metadata)> = vec![
        (
            0,
            Info,
            "Run initialized",
            "Chaos engineering run started, baseline metrics being captured",
            metadata(&[
                ("targetService", json!("api-gateway")),
                ("region", json!("us-east-1")),
            ]),
        ),
        (
            2_000,
            FaultInjected,
            "Fault injected",
            "Latency injection enabled for 30% of requests",
            metadata(&[("latencyMs", json!(500)), ("percentage", json!(30))]),
        ),
        (
            8_000,
            RetryTriggered,
            "Retry triggered",
            "Automatic retry mechanism activated after timeout threshold exceeded",
            metadata(&[("retryAttempt", json!(1)), ("maxRetries", json!(3))]),
        ),
    ];

    match status {
        RunStatus::Failed => events.extend([
            (
                15_000,
                CircuitBreakerOpen,
                "Circuit breaker opened",
                "Error rate exceeded 50%, circuit breaker tripped to prevent cascade failures",
                metadata(&[("errorRate", json!(52.3)), ("threshold", json!(50))]),
            ),
            (
                18_000,
                FallbackServed,
                "Fallback served",
                "Degraded response served from cache while primary service unavailable",
                metadata(&[("cacheHitRate", json!(78))]),
            ),
            (
                30_000,
                Info,
                "Run terminated",
                "Run completed with failures, system did not recover within SLA",
                None,
            ),
        ]),
        RunStatus::Degraded => events.extend([
            (
                12_000,
                CircuitBreakerOpen,
                "Circuit breaker opened",
                "Error rate elevated, circuit breaker engaged briefly",
                metadata(&[("errorRate", json!(35.2)), ("threshold", json!(50))]),
            ),
            (
                20_000,
                Recovery,
                "Partial recovery",
                "System partially recovered, operating with reduced throughput",
                metadata(&[("throughputPercent", json!(75))]),
            ),
            (
                35_000,
                Info,
                "Run completed",
                "Run completed with degradation, manual review recommended",
                None,
            ),
        ]),
        RunStatus::Success => events.extend([
            (
                12_000,
                RetryTriggered,
                "Retry successful",
                "Automatic retry succeeded, request completed within SLA",
                metadata(&[("retryAttempt", json!(2)), ("latencyMs", json!(180))]),
            ),
            (
                20_000,
                Recovery,
                "Full recovery",
                "System fully recovered, all metrics within normal parameters",
                metadata(&[("recoveryTimeMs", json!(8000))]),
            ),
            (
                25_000,
                Info,
                "Run completed",
                "Chaos experiment completed successfully, system demonstrated resilience",
                None,
            ),
        ]),
    }

    events
        .into_iter()
        .enumerate()
        .map(
            |(i, (offset, event_type, title, description, metadata))| DetailedTimelineEvent {
                id: format!("evt-{:03}", i + 1),
                timestamp: at(started_at, offset),
                event_type,
                title: title.to_string(),
                description: description.to_string(),
                metadata,
            },
        )
        .collect()
}

fn run_incidents(run_id: &str, started_at: OffsetDateTime, status: RunStatus) -> Vec<Incident> {
    use IncidentSeverity::*;

    let canned: &[(&str, IncidentSeverity, &str, &str, i64)] = match status {
        RunStatus::Success => &[],
        RunStatus::Failed => &[
            (
                "Cascade failure detected",
                Critical,
                "Multiple downstream services experienced timeouts leading to cascading failures across the payment processing pipeline.",
                "Implement bulkhead pattern to isolate service failures and prevent cascade",
                15_000,
            ),
            (
                "Memory leak identified",
                High,
                "Memory usage increased by 45% during fault injection without recovery after load normalization.",
                "Review connection pooling configuration and implement proper resource cleanup",
                20_000,
            ),
            (
                "Retry storm observed",
                Medium,
                "Exponential backoff not properly configured, leading to retry storms under load.",
                "Configure jitter and increase backoff multiplier in retry policy",
                12_000,
            ),
        ],
        RunStatus::Degraded => &[
            (
                "Elevated latency during recovery",
                Medium,
                "P99 latency remained elevated for 30 seconds after fault injection ended.",
                "Consider implementing connection warming to reduce cold start latency",
                18_000,
            ),
            (
                "Partial cache invalidation",
                Low,
                "Some cached entries were not properly invalidated during failover.",
                "Review cache invalidation strategy and implement TTL-based fallback",
                22_000,
            ),
        ],
    };

    canned
        .iter()
        .enumerate()
        .map(
            |(i, (title, severity, description, action, offset))| Incident {
                id: format!("{}-inc-{}", run_id, i + 1),
                title: title.to_string(),
                severity: *severity,
                description: description.to_string(),
                recommended_action: action.to_string(),
                detected_at: at(started_at, *offset),
            },
        )
        .collect()
}

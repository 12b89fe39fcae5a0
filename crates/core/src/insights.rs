//! Summary figures derived from the corpus: dashboard KPIs, incident
//! counters, root-cause confidence and run correlation.

use std::collections::BTreeSet;

use rand::Rng;
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::generate::{key_of, round2, stream_rng, Stream};
use crate::model::{
    IncidentDetail, IncidentSeverity, IncidentStatus, Run, RunStatus, ScenarioDetail, SignalType,
};

/// Related runs shown next to an incident.
pub const RELATED_RUNS_LIMIT: usize = 5;

/// Recent runs shown on a scenario's detail view.
pub const SCENARIO_RUNS_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentStats {
    pub total: usize,
    pub open: usize,
    /// Critical incidents that are not yet resolved.
    pub critical_active: usize,
}

pub fn incident_stats(incidents: &[IncidentDetail]) -> IncidentStats {
    incidents
        .iter()
        .fold(IncidentStats::default(), |mut stats, incident| {
            stats.total += 1;
            if incident.status == IncidentStatus::Open {
                stats.open += 1;
            }
            if incident.severity == IncidentSeverity::Critical && !incident.is_resolved() {
                stats.critical_active += 1;
            }
            stats
        })
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiSummary {
    /// Runs started in the 24 hours up to `now`.
    pub runs_today: usize,
    pub failed_runs: usize,
    /// Mean P50 latency over all runs, milliseconds.
    pub avg_latency: f64,
    /// Share of non-successful runs, percent.
    pub error_budget_burn: f64,
}

pub fn kpi_summary(runs: &[Run], now: OffsetDateTime) -> KpiSummary {
    if runs.is_empty() {
        return KpiSummary::default();
    }
    let window_start = now - Duration::hours(24);
    let today: Vec<&Run> = runs
        .iter()
        .filter(|r| r.started_at > window_start && r.started_at <= now)
        .collect();
    let total = runs.len() as f64;
    let latency_sum: f64 = runs.iter().map(|r| r.metrics.latency_p50).sum();
    let unsuccessful = runs
        .iter()
        .filter(|r| r.status != RunStatus::Success)
        .count();

    KpiSummary {
        runs_today: today.len(),
        failed_runs: today
            .iter()
            .filter(|r| r.status == RunStatus::Failed)
            .count(),
        avg_latency: round2(latency_sum / total),
        error_budget_burn: round2(unsuccessful as f64 * 100.0 / total),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    pub fn from_score(confidence: u8) -> Self {
        match confidence {
            85.. => ConfidenceLevel::High,
            70..=84 => ConfidenceLevel::Medium,
            _ => ConfidenceLevel::Low,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributingFactor {
    pub factor: String,
    /// Percent.
    pub correlation: u8,
    pub verified: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootCauseAssessment {
    pub incident_id: String,
    pub suspected_root_cause: String,
    pub confidence: u8,
    pub level: ConfidenceLevel,
    pub contributing_factors: Vec<ContributingFactor>,
}

fn base_confidence(severity: IncidentSeverity) -> i32 {
    match severity {
        IncidentSeverity::Critical => 92,
        IncidentSeverity::High => 85,
        IncidentSeverity::Medium => 72,
        IncidentSeverity::Low => 65,
    }
}

fn factor_for(signal: SignalType) -> Option<(&'static str, u8, bool)> {
    match signal {
        SignalType::Correlation => Some(("Recent deployment", 78, true)),
        SignalType::MetricAnomaly => Some(("Traffic spike", 65, true)),
        SignalType::ThresholdBreach => Some(("Downstream load", 52, false)),
        SignalType::AlertFired => None,
    }
}

/// Score the suspected root cause of `incident`.
///
/// Confidence is the severity's base score plus a jitter in `-4..=3` drawn
/// from a stream keyed on `seed` and the incident id, so repeated calls
/// agree. Factors come from the incident's signals, strongest first, each
/// listed once.
pub fn root_cause_assessment(incident: &IncidentDetail, seed: u64) -> RootCauseAssessment {
    let mut rng = stream_rng(seed, Stream::Confidence, key_of(&incident.id));
    let jitter: i32 = rng.gen_range(-4..=3);
    let confidence = (base_confidence(incident.severity) + jitter).clamp(0, 100) as u8;

    let mut seen = BTreeSet::new();
    let mut contributing_factors: Vec<ContributingFactor> = incident
        .signals
        .iter()
        .filter_map(|s| factor_for(s.signal_type))
        .filter(|(name, _, _)| seen.insert(*name))
        .map(|(factor, correlation, verified)| ContributingFactor {
            factor: factor.to_string(),
            correlation,
            verified,
        })
        .collect();
    contributing_factors.sort_by(|a, b| b.correlation.cmp(&a.correlation));

    RootCauseAssessment {
        incident_id: incident.id.clone(),
        suspected_root_cause: incident.suspected_root_cause.clone(),
        confidence,
        level: ConfidenceLevel::from_score(confidence),
        contributing_factors,
    }
}

/// The incident's own run, then other runs of the same scenario in corpus
/// order, up to [`RELATED_RUNS_LIMIT`]. Empty when the run is unknown.
pub fn related_runs(incident: &IncidentDetail, runs: &[Run]) -> Vec<Run> {
    let Some(own) = runs.iter().find(|r| r.id == incident.run_id) else {
        return Vec::new();
    };
    std::iter::once(own)
        .chain(
            runs.iter()
                .filter(|r| r.id != own.id && r.scenario_id == own.scenario_id),
        )
        .take(RELATED_RUNS_LIMIT)
        .cloned()
        .collect()
}

/// Runs whose scenario name matches `scenario`, up to
/// [`SCENARIO_RUNS_LIMIT`].
pub fn scenario_runs(scenario: &ScenarioDetail, runs: &[Run]) -> Vec<Run> {
    runs.iter()
        .filter(|r| r.scenario == scenario.name)
        .take(SCENARIO_RUNS_LIMIT)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions;
    use crate::generate::{Corpus, CorpusSize, Generator};
    use time::macros::datetime;

    const NOW: OffsetDateTime = datetime!(2026-01-20 14:00 UTC);

    fn corpus() -> Corpus {
        Corpus::generate(&Generator::new(42, NOW), &CorpusSize::default())
    }

    #[test]
    fn stats_follow_resolution() {
        let c = corpus();
        let stats = incident_stats(&c.incidents);
        assert_eq!(stats.total, 30);
        let open = c
            .incidents
            .iter()
            .filter(|i| i.status == IncidentStatus::Open)
            .count();
        assert_eq!(stats.open, open);

        let mut incidents = c.incidents.clone();
        incidents[0] = actions::resolve(&incidents[0], "me@example.com").unwrap();
        let after = incident_stats(&incidents);
        assert_eq!(after.open, stats.open - 1);
        assert_eq!(after.critical_active, stats.critical_active - 1);
    }

    #[test]
    fn kpis_over_default_corpus() {
        let kpis = kpi_summary(&corpus().runs, NOW);
        assert_eq!(kpis.runs_today, 24);
        assert_eq!(kpis.failed_runs, 8);
        assert!((45.0..=145.0).contains(&kpis.avg_latency));
        // 17 failed + 6 degraded out of 50
        assert_eq!(kpis.error_budget_burn, 46.0);
    }

    #[test]
    fn kpis_for_empty_input_are_zero() {
        assert_eq!(kpi_summary(&[], NOW), KpiSummary::default());
    }

    #[test]
    fn confidence_is_seeded_and_banded() {
        let c = corpus();
        for incident in &c.incidents {
            let a = root_cause_assessment(incident, 42);
            assert_eq!(a, root_cause_assessment(incident, 42));
            let base = base_confidence(incident.severity);
            let score = i32::from(a.confidence);
            assert!((base - 4..=base + 3).contains(&score), "{}", incident.id);
            assert_eq!(a.level, ConfidenceLevel::from_score(a.confidence));
        }
    }

    #[test]
    fn levels_split_at_85_and_70() {
        assert_eq!(ConfidenceLevel::from_score(85), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_score(84), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_score(70), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_score(69), ConfidenceLevel::Low);
    }

    #[test]
    fn factors_come_from_signals() {
        let critical = &corpus().incidents[0];
        let a = root_cause_assessment(critical, 42);
        let names: Vec<_> = a
            .contributing_factors
            .iter()
            .map(|f| f.factor.as_str())
            .collect();
        assert_eq!(names, vec!["Recent deployment", "Traffic spike", "Downstream load"]);
        assert!(!a.contributing_factors[2].verified);
    }

    #[test]
    fn related_runs_lead_with_own_run() {
        let c = corpus();
        let incident = &c.incidents[2];
        let related = related_runs(incident, &c.runs);
        assert_eq!(related[0].id, incident.run_id);
        assert!(related.len() <= RELATED_RUNS_LIMIT);
        assert!(related
            .iter()
            .all(|r| r.scenario_id == related[0].scenario_id));

        let mut orphan = incident.clone();
        orphan.run_id = "run-9999".to_string();
        assert!(related_runs(&orphan, &c.runs).is_empty());
    }

    #[test]
    fn scenario_runs_match_by_name() {
        let c = corpus();
        let scenario = &c.scenarios[1];
        let runs = scenario_runs(scenario, &c.runs);
        assert!(!runs.is_empty());
        assert!(runs.len() <= SCENARIO_RUNS_LIMIT);
        assert!(runs.iter().all(|r| r.scenario == scenario.name));
    }
}

use std::future::Future;

use chaosboard_core::Corpus;

use super::{check, fresh, TestResult};
use crate::DashboardStorage;

pub(super) async fn run_lookup_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: DashboardStorage,
    F: Fn(Corpus) -> Fut,
    Fut: Future<Output = S>,
{
    vec![
        TestResult::from_result(
            "lookup",
            "lists_preserve_load_order",
            lists_preserve_load_order(factory).await,
        ),
        TestResult::from_result(
            "lookup",
            "get_run_returns_stored_run",
            get_run_returns_stored_run(factory).await,
        ),
        TestResult::from_result(
            "lookup",
            "unknown_ids_are_none",
            unknown_ids_are_none(factory).await,
        ),
        TestResult::from_result(
            "lookup",
            "loaded_records_start_at_revision_0",
            loaded_records_start_at_revision_0(factory).await,
        ),
    ]
}

// ── Ordering ─────────────────────────────────────────────────────────────────

async fn lists_preserve_load_order<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: DashboardStorage,
    F: Fn(Corpus) -> Fut,
    Fut: Future<Output = S>,
{
    let (s, corpus) = fresh(factory).await;

    let catalog = s.list_catalog().await.map_err(|e| format!("catalog: {e}"))?;
    check(catalog == corpus.catalog, || "catalog differs from fixture".into())?;

    let runs = s.list_runs().await.map_err(|e| format!("runs: {e}"))?;
    let ids: Vec<_> = runs.iter().map(|r| r.id.as_str()).collect();
    let expected: Vec<_> = corpus.runs.iter().map(|r| r.id.as_str()).collect();
    check(ids == expected, || format!("run order {ids:?}, expected {expected:?}"))?;

    let scenarios = s
        .list_scenarios()
        .await
        .map_err(|e| format!("scenarios: {e}"))?;
    check(scenarios == corpus.scenarios, || {
        "scenarios differ from fixture".into()
    })?;

    let incidents = s
        .list_incidents()
        .await
        .map_err(|e| format!("incidents: {e}"))?;
    check(incidents == corpus.incidents, || {
        "incidents differ from fixture".into()
    })
}

// ── Single-record reads ──────────────────────────────────────────────────────

async fn get_run_returns_stored_run<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: DashboardStorage,
    F: Fn(Corpus) -> Fut,
    Fut: Future<Output = S>,
{
    let (s, corpus) = fresh(factory).await;
    let wanted = &corpus.runs[3];
    let got = s
        .get_run(&wanted.id)
        .await
        .map_err(|e| format!("get_run: {e}"))?;
    check(got.as_ref() == Some(wanted), || {
        format!("get_run({}) returned {got:?}", wanted.id)
    })
}

async fn unknown_ids_are_none<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: DashboardStorage,
    F: Fn(Corpus) -> Fut,
    Fut: Future<Output = S>,
{
    let (s, _) = fresh(factory).await;
    let run = s.get_run("run-9999").await.map_err(|e| format!("{e}"))?;
    check(run.is_none(), || format!("expected no run, got {run:?}"))?;
    let scenario = s
        .get_scenario("scenario-999")
        .await
        .map_err(|e| format!("{e}"))?;
    check(scenario.is_none(), || "expected no scenario".into())?;
    let incident = s
        .get_incident("inc-9999")
        .await
        .map_err(|e| format!("{e}"))?;
    check(incident.is_none(), || "expected no incident".into())
}

async fn loaded_records_start_at_revision_0<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: DashboardStorage,
    F: Fn(Corpus) -> Fut,
    Fut: Future<Output = S>,
{
    let (s, corpus) = fresh(factory).await;
    let scenario = s
        .get_scenario(&corpus.scenarios[2].id)
        .await
        .map_err(|e| format!("{e}"))?
        .ok_or("fixture scenario missing")?;
    check(scenario.revision == 0, || {
        format!("scenario revision {}, expected 0", scenario.revision)
    })?;
    check(scenario.record == corpus.scenarios[2], || {
        "scenario record differs from fixture".into()
    })?;

    let incident = s
        .get_incident(&corpus.incidents[4].id)
        .await
        .map_err(|e| format!("{e}"))?
        .ok_or("fixture incident missing")?;
    check(incident.revision == 0, || {
        format!("incident revision {}, expected 0", incident.revision)
    })
}

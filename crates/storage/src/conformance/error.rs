use std::future::Future;

use chaosboard_core::Corpus;

use super::{check, fresh, TestResult};
use crate::{DashboardStorage, StorageError};

pub(super) async fn run_error_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: DashboardStorage,
    F: Fn(Corpus) -> Fut,
    Fut: Future<Output = S>,
{
    vec![
        TestResult::from_result(
            "error",
            "replace_unknown_scenario_not_found",
            replace_unknown_scenario_not_found(factory).await,
        ),
        TestResult::from_result(
            "error",
            "replace_unknown_incident_not_found",
            replace_unknown_incident_not_found(factory).await,
        ),
        TestResult::from_result(
            "error",
            "not_found_does_not_insert",
            not_found_does_not_insert(factory).await,
        ),
    ]
}

fn expect_not_found(
    result: Result<u64, StorageError>,
    want_kind: &str,
    want_id: &str,
) -> Result<(), String> {
    match result {
        Err(StorageError::NotFound { kind, id }) => {
            check(kind == want_kind, || format!("kind {kind}, expected {want_kind}"))?;
            check(id == want_id, || format!("id {id}, expected {want_id}"))
        }
        other => Err(format!("expected NotFound, got {other:?}")),
    }
}

async fn replace_unknown_scenario_not_found<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: DashboardStorage,
    F: Fn(Corpus) -> Fut,
    Fut: Future<Output = S>,
{
    let (s, corpus) = fresh(factory).await;
    let mut ghost = corpus.scenarios[0].clone();
    ghost.id = "scenario-999".to_string();
    expect_not_found(s.replace_scenario(ghost, 0).await, "scenario", "scenario-999")
}

async fn replace_unknown_incident_not_found<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: DashboardStorage,
    F: Fn(Corpus) -> Fut,
    Fut: Future<Output = S>,
{
    let (s, corpus) = fresh(factory).await;
    let mut ghost = corpus.incidents[0].clone();
    ghost.id = "inc-9999".to_string();
    expect_not_found(s.replace_incident(ghost, 0).await, "incident", "inc-9999")
}

async fn not_found_does_not_insert<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: DashboardStorage,
    F: Fn(Corpus) -> Fut,
    Fut: Future<Output = S>,
{
    let (s, corpus) = fresh(factory).await;
    let mut ghost = corpus.incidents[1].clone();
    ghost.id = "inc-4242".to_string();
    let _ = s.replace_incident(ghost, 0).await;

    let count = s
        .list_incidents()
        .await
        .map_err(|e| format!("list: {e}"))?
        .len();
    check(count == corpus.incidents.len(), || {
        format!("{count} incidents after failed replace")
    })
}

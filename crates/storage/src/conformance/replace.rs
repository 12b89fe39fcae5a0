use std::future::Future;

use chaosboard_core::{Corpus, IncidentStatus, ScenarioStatus};

use super::{check, fresh, TestResult};
use crate::{DashboardStorage, StorageError};

pub(super) async fn run_replace_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: DashboardStorage,
    F: Fn(Corpus) -> Fut,
    Fut: Future<Output = S>,
{
    vec![
        TestResult::from_result(
            "replace",
            "replace_scenario_bumps_revision",
            replace_scenario_bumps_revision(factory).await,
        ),
        TestResult::from_result(
            "replace",
            "replace_incident_is_visible",
            replace_incident_is_visible(factory).await,
        ),
        TestResult::from_result(
            "replace",
            "sequential_replaces_increment",
            sequential_replaces_increment(factory).await,
        ),
        TestResult::from_result(
            "replace",
            "stale_revision_rejected",
            stale_revision_rejected(factory).await,
        ),
        TestResult::from_result(
            "replace",
            "rejected_write_changes_nothing",
            rejected_write_changes_nothing(factory).await,
        ),
        TestResult::from_result(
            "replace",
            "replace_keeps_position",
            replace_keeps_position(factory).await,
        ),
    ]
}

async fn replace_scenario_bumps_revision<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: DashboardStorage,
    F: Fn(Corpus) -> Fut,
    Fut: Future<Output = S>,
{
    let (s, corpus) = fresh(factory).await;
    let mut updated = corpus.scenarios[1].clone();
    updated.status = ScenarioStatus::Archived;

    let revision = s
        .replace_scenario(updated.clone(), 0)
        .await
        .map_err(|e| format!("replace: {e}"))?;
    check(revision == 1, || format!("expected revision 1, got {revision}"))?;

    let stored = s
        .get_scenario(&updated.id)
        .await
        .map_err(|e| format!("get: {e}"))?
        .ok_or("scenario vanished after replace")?;
    check(stored.revision == 1, || {
        format!("stored revision {}", stored.revision)
    })?;
    check(stored.record == updated, || "stored record not replaced".into())
}

async fn replace_incident_is_visible<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: DashboardStorage,
    F: Fn(Corpus) -> Fut,
    Fut: Future<Output = S>,
{
    let (s, corpus) = fresh(factory).await;
    let mut updated = corpus.incidents[0].clone();
    updated.status = IncidentStatus::Acknowledged;
    updated.owner = Some("oncall@example.com".to_string());

    s.replace_incident(updated.clone(), 0)
        .await
        .map_err(|e| format!("replace: {e}"))?;

    let listed = s
        .list_incidents()
        .await
        .map_err(|e| format!("list: {e}"))?;
    check(listed.first() == Some(&updated), || {
        "list does not reflect replaced incident".into()
    })
}

async fn sequential_replaces_increment<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: DashboardStorage,
    F: Fn(Corpus) -> Fut,
    Fut: Future<Output = S>,
{
    let (s, corpus) = fresh(factory).await;
    let mut record = corpus.scenarios[3].clone();
    for expected in 0..5u64 {
        record.name = format!("rename {expected}");
        let got = s
            .replace_scenario(record.clone(), expected)
            .await
            .map_err(|e| format!("replace at {expected}: {e}"))?;
        check(got == expected + 1, || {
            format!("replace at {expected} returned {got}")
        })?;
    }
    Ok(())
}

async fn stale_revision_rejected<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: DashboardStorage,
    F: Fn(Corpus) -> Fut,
    Fut: Future<Output = S>,
{
    let (s, corpus) = fresh(factory).await;
    let record = corpus.incidents[2].clone();
    s.replace_incident(record.clone(), 0)
        .await
        .map_err(|e| format!("first replace: {e}"))?;

    match s.replace_incident(record.clone(), 0).await {
        Err(StorageError::StaleWrite {
            kind,
            id,
            expected,
            actual,
        }) => {
            check(kind == "incident", || format!("kind {kind}"))?;
            check(id == record.id, || format!("id {id}"))?;
            check(expected == 0 && actual == 1, || {
                format!("expected/actual {expected}/{actual}, wanted 0/1")
            })
        }
        other => Err(format!("expected StaleWrite, got {other:?}")),
    }
}

async fn rejected_write_changes_nothing<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: DashboardStorage,
    F: Fn(Corpus) -> Fut,
    Fut: Future<Output = S>,
{
    let (s, corpus) = fresh(factory).await;
    let original = corpus.scenarios[4].clone();
    let mut stale = original.clone();
    stale.name = "should not land".to_string();

    if s.replace_scenario(stale, 3).await.is_ok() {
        return Err("replace with wrong revision succeeded".into());
    }
    let stored = s
        .get_scenario(&original.id)
        .await
        .map_err(|e| format!("get: {e}"))?
        .ok_or("scenario missing")?;
    check(stored.revision == 0 && stored.record == original, || {
        "rejected write modified the stored scenario".into()
    })
}

async fn replace_keeps_position<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: DashboardStorage,
    F: Fn(Corpus) -> Fut,
    Fut: Future<Output = S>,
{
    let (s, corpus) = fresh(factory).await;
    let mut record = corpus.scenarios[5].clone();
    record.description = "edited".to_string();
    s.replace_scenario(record.clone(), 0)
        .await
        .map_err(|e| format!("replace: {e}"))?;

    let listed = s
        .list_scenarios()
        .await
        .map_err(|e| format!("list: {e}"))?;
    check(listed.get(5) == Some(&record), || {
        "replaced scenario moved within the list".into()
    })?;
    check(listed.len() == corpus.scenarios.len(), || {
        "replace changed the list length".into()
    })
}

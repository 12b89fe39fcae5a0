use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;

use chaosboard_core::{Corpus, IncidentStatus};

use super::{check, fresh, TestResult};
use crate::{DashboardStorage, StorageError};

/// Number of concurrent tasks to spawn in each test.
const N: usize = 10;

pub(super) async fn run_concurrent_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: DashboardStorage,
    F: Fn(Corpus) -> Fut,
    Fut: Future<Output = S>,
{
    vec![
        TestResult::from_result(
            "concurrent",
            "concurrent_replaces_exactly_one_wins",
            concurrent_replaces_exactly_one_wins(factory).await,
        ),
        TestResult::from_result(
            "concurrent",
            "concurrent_replaces_different_records_all_succeed",
            concurrent_replaces_different_records_all_succeed(factory).await,
        ),
        TestResult::from_result(
            "concurrent",
            "concurrent_allocations_are_distinct",
            concurrent_allocations_are_distinct(factory).await,
        ),
    ]
}

// ── Same record: exactly one wins ────────────────────────────────────────────

/// N tasks each replace the same incident from revision 0. Exactly one
/// write lands; the rest must get StaleWrite.
async fn concurrent_replaces_exactly_one_wins<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: DashboardStorage,
    F: Fn(Corpus) -> Fut,
    Fut: Future<Output = S>,
{
    let (storage, corpus) = fresh(factory).await;
    let storage = Arc::new(storage);
    let base = corpus.incidents[0].clone();

    let mut handles = Vec::new();
    for i in 0..N {
        let s = storage.clone();
        let mut record = base.clone();
        record.status = IncidentStatus::Acknowledged;
        record.owner = Some(format!("user-{i}@example.com"));
        handles.push(tokio::spawn(async move {
            match s.replace_incident(record, 0).await {
                Ok(_) => Ok(true),
                Err(StorageError::StaleWrite { .. }) => Ok(false),
                Err(e) => Err(e),
            }
        }));
    }

    let mut winners = 0usize;
    for handle in handles {
        let won = handle
            .await
            .map_err(|e| format!("task panic: {e}"))?
            .map_err(|e: StorageError| format!("storage error: {e}"))?;
        if won {
            winners += 1;
        }
    }
    check(winners == 1, || {
        format!("expected exactly 1 winner, got {winners}")
    })?;

    let stored = storage
        .get_incident(&base.id)
        .await
        .map_err(|e| format!("get: {e}"))?
        .ok_or("incident missing")?;
    check(stored.revision == 1, || {
        format!("expected revision 1, got {}", stored.revision)
    })
}

// ── Different records: no false conflicts ────────────────────────────────────

async fn concurrent_replaces_different_records_all_succeed<S, F, Fut>(
    factory: &F,
) -> Result<(), String>
where
    S: DashboardStorage,
    F: Fn(Corpus) -> Fut,
    Fut: Future<Output = S>,
{
    let (storage, corpus) = fresh(factory).await;
    let storage = Arc::new(storage);

    let mut handles = Vec::new();
    for incident in corpus.incidents.iter().cloned() {
        let s = storage.clone();
        handles.push(tokio::spawn(async move {
            let mut record = incident;
            record.title.push_str(" (triaged)");
            s.replace_incident(record, 0).await
        }));
    }

    for (i, handle) in handles.into_iter().enumerate() {
        let revision = handle
            .await
            .map_err(|e| format!("task {i} panic: {e}"))?
            .map_err(|e| format!("task {i} failed: {e}"))?;
        check(revision == 1, || format!("task {i} got revision {revision}"))?;
    }
    Ok(())
}

// ── Allocation under contention ──────────────────────────────────────────────

async fn concurrent_allocations_are_distinct<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: DashboardStorage,
    F: Fn(Corpus) -> Fut,
    Fut: Future<Output = S>,
{
    let (storage, _) = fresh(factory).await;
    let storage = Arc::new(storage);

    let mut handles = Vec::new();
    for _ in 0..N {
        let s = storage.clone();
        handles.push(tokio::spawn(async move { s.allocate_scenario_id().await }));
    }

    let mut ids = BTreeSet::new();
    for handle in handles {
        let id = handle
            .await
            .map_err(|e| format!("task panic: {e}"))?
            .map_err(|e| format!("allocate: {e}"))?;
        ids.insert(id);
    }
    check(ids.len() == N, || {
        format!("expected {N} distinct ids, got {}", ids.len())
    })
}

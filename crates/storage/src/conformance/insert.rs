use std::collections::BTreeSet;
use std::future::Future;

use chaosboard_core::Corpus;

use super::{check, fresh, TestResult};
use crate::{DashboardStorage, StorageError};

pub(super) async fn run_insert_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: DashboardStorage,
    F: Fn(Corpus) -> Fut,
    Fut: Future<Output = S>,
{
    vec![
        TestResult::from_result(
            "insert",
            "insert_goes_to_head",
            insert_goes_to_head(factory).await,
        ),
        TestResult::from_result(
            "insert",
            "insert_duplicate_id_rejected",
            insert_duplicate_id_rejected(factory).await,
        ),
        TestResult::from_result(
            "insert",
            "allocated_ids_are_unused_and_distinct",
            allocated_ids_are_unused_and_distinct(factory).await,
        ),
        TestResult::from_result(
            "insert",
            "allocated_id_skips_inserted_ids",
            allocated_id_skips_inserted_ids(factory).await,
        ),
    ]
}

async fn insert_goes_to_head<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: DashboardStorage,
    F: Fn(Corpus) -> Fut,
    Fut: Future<Output = S>,
{
    let (s, corpus) = fresh(factory).await;
    let mut record = corpus.scenarios[2].clone();
    record.id = s
        .allocate_scenario_id()
        .await
        .map_err(|e| format!("allocate: {e}"))?;
    record.name = format!("{} (Copy)", record.name);

    let revision = s
        .insert_scenario(record.clone())
        .await
        .map_err(|e| format!("insert: {e}"))?;
    check(revision == 0, || format!("inserted at revision {revision}"))?;

    let listed = s
        .list_scenarios()
        .await
        .map_err(|e| format!("list: {e}"))?;
    check(listed.first() == Some(&record), || {
        "inserted scenario is not at the head".into()
    })?;
    check(listed.len() == corpus.scenarios.len() + 1, || {
        format!("list has {} entries after insert", listed.len())
    })?;
    check(listed[1..] == corpus.scenarios[..], || {
        "existing scenarios shifted out of order".into()
    })
}

async fn insert_duplicate_id_rejected<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: DashboardStorage,
    F: Fn(Corpus) -> Fut,
    Fut: Future<Output = S>,
{
    let (s, corpus) = fresh(factory).await;
    let duplicate = corpus.scenarios[0].clone();
    match s.insert_scenario(duplicate.clone()).await {
        Err(StorageError::AlreadyExists { kind, id }) => {
            check(kind == "scenario", || format!("kind {kind}"))?;
            check(id == duplicate.id, || format!("id {id}"))
        }
        other => Err(format!("expected AlreadyExists, got {other:?}")),
    }
}

async fn allocated_ids_are_unused_and_distinct<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: DashboardStorage,
    F: Fn(Corpus) -> Fut,
    Fut: Future<Output = S>,
{
    let (s, corpus) = fresh(factory).await;
    let existing: BTreeSet<_> = corpus.scenarios.iter().map(|r| r.id.clone()).collect();
    let mut seen = BTreeSet::new();
    for _ in 0..5 {
        let id = s
            .allocate_scenario_id()
            .await
            .map_err(|e| format!("allocate: {e}"))?;
        check(!existing.contains(&id), || format!("{id} already stored"))?;
        check(seen.insert(id.clone()), || format!("{id} allocated twice"))?;
    }
    Ok(())
}

async fn allocated_id_skips_inserted_ids<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: DashboardStorage,
    F: Fn(Corpus) -> Fut,
    Fut: Future<Output = S>,
{
    let (s, corpus) = fresh(factory).await;
    let mut record = corpus.scenarios[1].clone();
    record.id = "scenario-050".to_string();
    s.insert_scenario(record)
        .await
        .map_err(|e| format!("insert: {e}"))?;

    let id = s
        .allocate_scenario_id()
        .await
        .map_err(|e| format!("allocate: {e}"))?;
    let stored = s
        .get_scenario(&id)
        .await
        .map_err(|e| format!("get: {e}"))?;
    check(stored.is_none(), || format!("allocated {id}, which is stored"))
}

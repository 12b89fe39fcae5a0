use async_trait::async_trait;
use chaosboard_core::{Corpus, IncidentDetail, Run, Scenario, ScenarioDetail};
use tokio::sync::RwLock;

use crate::error::StorageError;
use crate::record::Versioned;
use crate::traits::DashboardStorage;

const SCENARIO_ID_PREFIX: &str = "scenario-";

/// Records addressed by a string id.
trait Keyed {
    const KIND: &'static str;
    fn key(&self) -> &str;
}

impl Keyed for ScenarioDetail {
    const KIND: &'static str = "scenario";
    fn key(&self) -> &str {
        &self.id
    }
}

impl Keyed for IncidentDetail {
    const KIND: &'static str = "incident";
    fn key(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Default)]
struct Tables {
    catalog: Vec<Scenario>,
    runs: Vec<Run>,
    scenarios: Vec<Versioned<ScenarioDetail>>,
    incidents: Vec<Versioned<IncidentDetail>>,
    /// Highest numeric scenario suffix handed out or seen.
    last_scenario_number: u64,
}

/// Process-local storage over ordered vectors.
///
/// One writer at a time; readers see either the state before or after a
/// write, never a partial one.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    tables: RwLock<Tables>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every collection of `corpus` at revision 0.
    pub fn from_corpus(corpus: Corpus) -> Self {
        let last_scenario_number = corpus
            .scenarios
            .iter()
            .filter_map(|s| scenario_number(&s.id))
            .max()
            .unwrap_or(0);
        Self {
            tables: RwLock::new(Tables {
                catalog: corpus.catalog,
                runs: corpus.runs,
                scenarios: corpus.scenarios.into_iter().map(Versioned::new).collect(),
                incidents: corpus.incidents.into_iter().map(Versioned::new).collect(),
                last_scenario_number,
            }),
        }
    }
}

fn scenario_number(id: &str) -> Option<u64> {
    id.strip_prefix(SCENARIO_ID_PREFIX)?.parse().ok()
}

fn find<'a, T: Keyed>(entries: &'a [Versioned<T>], id: &str) -> Option<&'a Versioned<T>> {
    entries.iter().find(|e| e.record.key() == id)
}

fn replace<T: Keyed>(
    entries: &mut [Versioned<T>],
    record: T,
    expected_revision: u64,
) -> Result<u64, StorageError> {
    let entry = entries
        .iter_mut()
        .find(|e| e.record.key() == record.key())
        .ok_or_else(|| StorageError::NotFound {
            kind: T::KIND,
            id: record.key().to_string(),
        })?;
    if entry.revision != expected_revision {
        return Err(StorageError::StaleWrite {
            kind: T::KIND,
            id: record.key().to_string(),
            expected: expected_revision,
            actual: entry.revision,
        });
    }
    entry.revision += 1;
    entry.record = record;
    tracing::debug!(
        kind = T::KIND,
        id = entry.record.key(),
        revision = entry.revision,
        "record replaced"
    );
    Ok(entry.revision)
}

#[async_trait]
impl DashboardStorage for InMemoryStorage {
    async fn list_catalog(&self) -> Result<Vec<Scenario>, StorageError> {
        Ok(self.tables.read().await.catalog.clone())
    }

    async fn list_runs(&self) -> Result<Vec<Run>, StorageError> {
        Ok(self.tables.read().await.runs.clone())
    }

    async fn get_run(&self, id: &str) -> Result<Option<Run>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables.runs.iter().find(|r| r.id == id).cloned())
    }

    async fn list_scenarios(&self) -> Result<Vec<ScenarioDetail>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables.scenarios.iter().map(|e| e.record.clone()).collect())
    }

    async fn get_scenario(
        &self,
        id: &str,
    ) -> Result<Option<Versioned<ScenarioDetail>>, StorageError> {
        Ok(find(&self.tables.read().await.scenarios, id).cloned())
    }

    async fn list_incidents(&self) -> Result<Vec<IncidentDetail>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables.incidents.iter().map(|e| e.record.clone()).collect())
    }

    async fn get_incident(
        &self,
        id: &str,
    ) -> Result<Option<Versioned<IncidentDetail>>, StorageError> {
        Ok(find(&self.tables.read().await.incidents, id).cloned())
    }

    async fn replace_scenario(
        &self,
        record: ScenarioDetail,
        expected_revision: u64,
    ) -> Result<u64, StorageError> {
        let mut tables = self.tables.write().await;
        replace(&mut tables.scenarios, record, expected_revision)
    }

    async fn replace_incident(
        &self,
        record: IncidentDetail,
        expected_revision: u64,
    ) -> Result<u64, StorageError> {
        let mut tables = self.tables.write().await;
        replace(&mut tables.incidents, record, expected_revision)
    }

    async fn insert_scenario(&self, record: ScenarioDetail) -> Result<u64, StorageError> {
        let mut tables = self.tables.write().await;
        if find(&tables.scenarios, &record.id).is_some() {
            return Err(StorageError::AlreadyExists {
                kind: ScenarioDetail::KIND,
                id: record.id,
            });
        }
        if let Some(n) = scenario_number(&record.id) {
            tables.last_scenario_number = tables.last_scenario_number.max(n);
        }
        let entry = Versioned::new(record);
        let revision = entry.revision;
        tracing::debug!(id = %entry.record.id, "scenario inserted");
        tables.scenarios.insert(0, entry);
        Ok(revision)
    }

    async fn allocate_scenario_id(&self) -> Result<String, StorageError> {
        let mut tables = self.tables.write().await;
        loop {
            tables.last_scenario_number += 1;
            let id = format!("{SCENARIO_ID_PREFIX}{:03}", tables.last_scenario_number);
            if find(&tables.scenarios, &id).is_none() {
                return Ok(id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scenario_numbers() {
        assert_eq!(scenario_number("scenario-024"), Some(24));
        assert_eq!(scenario_number("scenario-1000"), Some(1000));
        assert_eq!(scenario_number("custom"), None);
        assert_eq!(scenario_number("scenario-x"), None);
    }

    #[tokio::test]
    async fn empty_storage_allocates_from_one() {
        let storage = InMemoryStorage::new();
        assert_eq!(storage.allocate_scenario_id().await.unwrap(), "scenario-001");
        assert_eq!(storage.allocate_scenario_id().await.unwrap(), "scenario-002");
        assert!(storage.list_runs().await.unwrap().is_empty());
    }
}

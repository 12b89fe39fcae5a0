use async_trait::async_trait;
use chaosboard_core::{IncidentDetail, Run, Scenario, ScenarioDetail};

use crate::error::StorageError;
use crate::record::Versioned;

/// The storage trait for dashboard backends.
///
/// A `DashboardStorage` holds the scenario catalog, the immutable run
/// history, and the mutable scenario and incident collections. Listing
/// methods return records in collection order; the head of the scenario
/// list is the most recently inserted scenario.
///
/// ## Replace semantics
///
/// Scenarios and incidents are never edited in place. A caller reads a
/// [`Versioned`] record, derives a replacement, and writes it back with
/// the revision it read. If the stored revision has moved on, the write
/// fails with [`StorageError::StaleWrite`] and nothing changes.
///
/// Single-record reads return `Ok(None)` for unknown ids. `NotFound` is
/// reserved for writes that target a missing record.
///
/// ## Thread Safety
///
/// Implementations must be `Send + Sync + 'static` to be used in axum
/// application state and across async task boundaries.
#[async_trait]
pub trait DashboardStorage: Send + Sync + 'static {
    // ── Reads ─────────────────────────────────────────────────────────────────

    async fn list_catalog(&self) -> Result<Vec<Scenario>, StorageError>;

    async fn list_runs(&self) -> Result<Vec<Run>, StorageError>;

    async fn get_run(&self, id: &str) -> Result<Option<Run>, StorageError>;

    async fn list_scenarios(&self) -> Result<Vec<ScenarioDetail>, StorageError>;

    async fn get_scenario(
        &self,
        id: &str,
    ) -> Result<Option<Versioned<ScenarioDetail>>, StorageError>;

    async fn list_incidents(&self) -> Result<Vec<IncidentDetail>, StorageError>;

    async fn get_incident(
        &self,
        id: &str,
    ) -> Result<Option<Versioned<IncidentDetail>>, StorageError>;

    // ── Writes ────────────────────────────────────────────────────────────────

    /// Replace the scenario with `record.id` if its revision is still
    /// `expected_revision`. Returns the new revision.
    async fn replace_scenario(
        &self,
        record: ScenarioDetail,
        expected_revision: u64,
    ) -> Result<u64, StorageError>;

    /// Replace the incident with `record.id` if its revision is still
    /// `expected_revision`. Returns the new revision.
    async fn replace_incident(
        &self,
        record: IncidentDetail,
        expected_revision: u64,
    ) -> Result<u64, StorageError>;

    /// Insert a scenario at the head of the list.
    ///
    /// Returns `Err(StorageError::AlreadyExists)` if the id is taken.
    async fn insert_scenario(&self, record: ScenarioDetail) -> Result<u64, StorageError>;

    /// Reserve a scenario id that no stored or previously allocated
    /// scenario uses.
    async fn allocate_scenario_id(&self) -> Result<String, StorageError>;
}

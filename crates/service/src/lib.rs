//! Dashboard operations: filtered listings, detail lookups, exports and
//! the status-changing actions, all over a [`DashboardStorage`] backend.
//!
//! Lookups of unknown ids return `Ok(None)`. Actions read the current
//! record with its revision, apply the matching transition from
//! [`chaosboard_core::actions`], and write the result back by id. A write
//! that loses a race surfaces as [`ServiceError::Storage`].

mod error;

use chaosboard_core::actions;
use chaosboard_core::export::{self, ExportDocument};
use chaosboard_core::insights::{self, IncidentStats, KpiSummary, RootCauseAssessment};
use chaosboard_core::query::{self, IncidentFilter, Page, RunFilter, ScenarioFilter};
use chaosboard_core::{
    Corpus, CorpusSize, Generator, IncidentDetail, Run, RunDetail, Scenario, ScenarioDetail,
    ScenarioFormData, ScenarioVersion, DEFAULT_PAGE_SIZE,
};
use chaosboard_storage::{DashboardStorage, InMemoryStorage};
use time::OffsetDateTime;

pub use error::ServiceError;

const SCENARIO: &str = "scenario";
const INCIDENT: &str = "incident";

/// The dashboard over one storage backend.
pub struct Dashboard<S> {
    storage: S,
    generator: Generator,
    page_size: usize,
    clock: fn() -> OffsetDateTime,
}

impl Dashboard<InMemoryStorage> {
    /// Generate a corpus and serve it from memory.
    pub fn in_memory(generator: Generator, size: &CorpusSize) -> Self {
        let corpus = Corpus::generate(&generator, size);
        tracing::info!(
            seed = generator.seed(),
            runs = corpus.runs.len(),
            scenarios = corpus.scenarios.len(),
            incidents = corpus.incidents.len(),
            "generated corpus"
        );
        Dashboard::new(InMemoryStorage::from_corpus(corpus), generator)
    }
}

impl<S: DashboardStorage> Dashboard<S> {
    pub fn new(storage: S, generator: Generator) -> Self {
        Self {
            storage,
            generator,
            page_size: DEFAULT_PAGE_SIZE,
            clock: OffsetDateTime::now_utc,
        }
    }

    /// Page size for listings. Zero is treated as 1.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Source of `lastUpdated` timestamps for scenario writes.
    pub fn with_clock(mut self, clock: fn() -> OffsetDateTime) -> Self {
        self.clock = clock;
        self
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn generator(&self) -> &Generator {
        &self.generator
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    // ──────────────────────────────────────────────
    // Listings
    // ──────────────────────────────────────────────

    pub async fn catalog(&self) -> Result<Vec<Scenario>, ServiceError> {
        Ok(self.storage.list_catalog().await?)
    }

    #[tracing::instrument(skip(self, filter))]
    pub async fn list_runs(
        &self,
        filter: &RunFilter,
        page: usize,
    ) -> Result<Page<Run>, ServiceError> {
        let runs = self.storage.list_runs().await?;
        Ok(query::query(&runs, filter, page, self.page_size))
    }

    #[tracing::instrument(skip(self, filter))]
    pub async fn list_scenarios(
        &self,
        filter: &ScenarioFilter,
        page: usize,
    ) -> Result<Page<ScenarioDetail>, ServiceError> {
        let scenarios = self.storage.list_scenarios().await?;
        Ok(query::query(&scenarios, filter, page, self.page_size))
    }

    #[tracing::instrument(skip(self, filter))]
    pub async fn list_incidents(
        &self,
        filter: &IncidentFilter,
        page: usize,
    ) -> Result<Page<IncidentDetail>, ServiceError> {
        let incidents = self.storage.list_incidents().await?;
        Ok(query::query(&incidents, filter, page, self.page_size))
    }

    // ──────────────────────────────────────────────
    // Lookups
    // ──────────────────────────────────────────────

    pub async fn get_run(&self, id: &str) -> Result<Option<Run>, ServiceError> {
        Ok(self.storage.get_run(id).await?)
    }

    pub async fn get_run_detail(&self, id: &str) -> Result<Option<RunDetail>, ServiceError> {
        let run = self.storage.get_run(id).await?;
        Ok(run.map(|run| self.generator.run_detail(&run)))
    }

    pub async fn get_scenario(&self, id: &str) -> Result<Option<ScenarioDetail>, ServiceError> {
        let found = self.storage.get_scenario(id).await?;
        Ok(found.map(|v| v.record))
    }

    pub async fn get_incident_detail(
        &self,
        id: &str,
    ) -> Result<Option<IncidentDetail>, ServiceError> {
        let found = self.storage.get_incident(id).await?;
        Ok(found.map(|v| v.record))
    }

    pub async fn scenario_versions(
        &self,
        id: &str,
    ) -> Result<Option<Vec<ScenarioVersion>>, ServiceError> {
        let scenario = self.get_scenario(id).await?;
        Ok(scenario.map(|s| self.generator.scenario_versions(&s)))
    }

    pub async fn scenario_runs(&self, id: &str) -> Result<Option<Vec<Run>>, ServiceError> {
        let Some(scenario) = self.get_scenario(id).await? else {
            return Ok(None);
        };
        let runs = self.storage.list_runs().await?;
        Ok(Some(insights::scenario_runs(&scenario, &runs)))
    }

    pub async fn related_runs(&self, incident_id: &str) -> Result<Option<Vec<Run>>, ServiceError> {
        let Some(incident) = self.get_incident_detail(incident_id).await? else {
            return Ok(None);
        };
        let runs = self.storage.list_runs().await?;
        Ok(Some(insights::related_runs(&incident, &runs)))
    }

    pub async fn root_cause(&self, id: &str) -> Result<Option<RootCauseAssessment>, ServiceError> {
        let incident = self.get_incident_detail(id).await?;
        Ok(incident.map(|i| insights::root_cause_assessment(&i, self.generator.seed())))
    }

    pub async fn kpis(&self, now: OffsetDateTime) -> Result<KpiSummary, ServiceError> {
        let runs = self.storage.list_runs().await?;
        Ok(insights::kpi_summary(&runs, now))
    }

    pub async fn incident_stats(&self) -> Result<IncidentStats, ServiceError> {
        let incidents = self.storage.list_incidents().await?;
        Ok(insights::incident_stats(&incidents))
    }

    // ──────────────────────────────────────────────
    // Exports
    // ──────────────────────────────────────────────

    pub async fn export_run(&self, id: &str) -> Result<Option<ExportDocument>, ServiceError> {
        match self.get_run_detail(id).await? {
            Some(detail) => Ok(Some(export::export_run(&detail)?)),
            None => Ok(None),
        }
    }

    pub async fn export_incident(&self, id: &str) -> Result<Option<ExportDocument>, ServiceError> {
        match self.get_incident_detail(id).await? {
            Some(incident) => Ok(Some(export::export_incident(&incident)?)),
            None => Ok(None),
        }
    }

    // ──────────────────────────────────────────────
    // Incident actions
    // ──────────────────────────────────────────────

    #[tracing::instrument(skip(self))]
    pub async fn acknowledge_incident(
        &self,
        id: &str,
        actor: &str,
    ) -> Result<IncidentDetail, ServiceError> {
        self.modify_incident(id, |incident| Ok(actions::acknowledge(incident, actor)?))
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn resolve_incident(
        &self,
        id: &str,
        actor: &str,
    ) -> Result<IncidentDetail, ServiceError> {
        self.modify_incident(id, |incident| Ok(actions::resolve(incident, actor)?))
            .await
    }

    async fn modify_incident(
        &self,
        id: &str,
        change: impl FnOnce(&IncidentDetail) -> Result<IncidentDetail, ServiceError>,
    ) -> Result<IncidentDetail, ServiceError> {
        let current = self
            .storage
            .get_incident(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(INCIDENT, id))?;
        let next = change(&current.record)?;
        let revision = self
            .storage
            .replace_incident(next.clone(), current.revision)
            .await?;
        tracing::info!(id, status = %next.status, revision, "incident updated");
        Ok(next)
    }

    // ──────────────────────────────────────────────
    // Scenario actions
    // ──────────────────────────────────────────────

    #[tracing::instrument(skip(self, form), fields(name = %form.name))]
    pub async fn create_scenario(
        &self,
        form: &ScenarioFormData,
        actor: &str,
    ) -> Result<ScenarioDetail, ServiceError> {
        form.validate()?;
        let id = self.storage.allocate_scenario_id().await?;
        let scenario = actions::create_scenario(form, id, actor, (self.clock)())?;
        self.storage.insert_scenario(scenario.clone()).await?;
        tracing::info!(id = %scenario.id, "scenario created");
        Ok(scenario)
    }

    #[tracing::instrument(skip(self, form))]
    pub async fn update_scenario(
        &self,
        id: &str,
        form: &ScenarioFormData,
    ) -> Result<ScenarioDetail, ServiceError> {
        let now = (self.clock)();
        self.modify_scenario(id, |s| Ok(actions::update_scenario(s, form, now)?))
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn archive_scenario(&self, id: &str) -> Result<ScenarioDetail, ServiceError> {
        self.modify_scenario(id, |s| Ok(actions::archive(s)?)).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn restore_scenario(&self, id: &str) -> Result<ScenarioDetail, ServiceError> {
        self.modify_scenario(id, |s| Ok(actions::restore(s)?)).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn toggle_scenario_archive(&self, id: &str) -> Result<ScenarioDetail, ServiceError> {
        self.modify_scenario(id, |s| Ok(actions::toggle_archived(s)))
            .await
    }

    /// Copy a scenario under a fresh id and insert it at the head of the
    /// list.
    #[tracing::instrument(skip(self))]
    pub async fn duplicate_scenario(&self, id: &str) -> Result<ScenarioDetail, ServiceError> {
        let source = self
            .get_scenario(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(SCENARIO, id))?;
        let new_id = self.storage.allocate_scenario_id().await?;
        let copy = actions::duplicate(&source, new_id, (self.clock)());
        self.storage.insert_scenario(copy.clone()).await?;
        tracing::info!(source = id, id = %copy.id, "scenario duplicated");
        Ok(copy)
    }

    async fn modify_scenario(
        &self,
        id: &str,
        change: impl FnOnce(&ScenarioDetail) -> Result<ScenarioDetail, ServiceError>,
    ) -> Result<ScenarioDetail, ServiceError> {
        let current = self
            .storage
            .get_scenario(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(SCENARIO, id))?;
        let next = change(&current.record)?;
        let revision = self
            .storage
            .replace_scenario(next.clone(), current.revision)
            .await?;
        tracing::info!(id, status = %next.status, revision, "scenario updated");
        Ok(next)
    }
}

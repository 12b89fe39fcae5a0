//! Chaosboard core -- the data model, synthetic corpus generator and
//! query layer behind the chaos-engineering dashboard.
//!
//! Everything in this crate is synchronous and side-effect free. Records
//! are produced by a seeded [`Generator`], narrowed by typed filters in
//! [`query`], and changed only through the pure transitions in
//! [`actions`], which return a replacement record rather than editing
//! shared state.

pub mod actions;
pub mod export;
pub mod form;
pub mod generate;
pub mod insights;
pub mod model;
pub mod query;

pub use actions::{FormActionError, TransitionError};
pub use export::ExportDocument;
pub use form::{FieldError, FormErrors, ScenarioFormData};
pub use generate::{Corpus, CorpusSize, Generator, DEFAULT_SEED};
pub use insights::{IncidentStats, KpiSummary, RootCauseAssessment};
pub use model::{
    DetailedTimelineEvent, ExtendedRunMetrics, FailureType, Incident, IncidentDetail,
    IncidentMetrics, IncidentSeverity, IncidentSignal, IncidentStatus, Run, RunDetail, RunError,
    RunMetrics, RunStatus, SafetyConfig, Scenario, ScenarioDetail, ScenarioStatus, ScenarioStep,
    ScenarioVersion, ScheduleType, SignalType, StepConfigValue, StepType, TimelineEntry,
    TimelineEntryType, TimelineEventType,
};
pub use query::{
    paginate, DateRange, Filter, IncidentFilter, ListState, Page, PageMarker, RunFilter,
    ScenarioFilter, DEFAULT_PAGE_SIZE,
};

/// Identity used as owner when a caller does not supply one.
pub const DEFAULT_ACTING_USER: &str = "you@example.com";

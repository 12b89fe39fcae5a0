//! Status transitions for incidents and scenarios.
//!
//! Each action takes the current record and returns its replacement. The
//! caller stores the result back by id; nothing here mutates shared state.

use time::OffsetDateTime;

use crate::form::{FormErrors, ScenarioFormData};
use crate::model::{
    IncidentDetail, IncidentStatus, SafetyConfig, ScenarioDetail, ScenarioStatus,
};

/// Version assigned to newly created scenarios.
pub const INITIAL_VERSION: &str = "v1.0.0";

/// Suffix appended to a duplicated scenario's name.
pub const COPY_SUFFIX: &str = " (Copy)";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    /// The incident is not in a state the requested transition starts from.
    #[error("incident {id} cannot move from {from} to {to}")]
    Incident {
        id: String,
        from: IncidentStatus,
        to: IncidentStatus,
    },

    /// The scenario is not in a state the requested transition starts from.
    #[error("scenario {id} cannot move from {from} to {to}")]
    Scenario {
        id: String,
        from: ScenarioStatus,
        to: ScenarioStatus,
    },

    /// Archived scenarios are read-only until restored.
    #[error("scenario {id} is archived; restore it first")]
    ScenarioArchived { id: String },
}

// ──────────────────────────────────────────────
// Incidents
// ──────────────────────────────────────────────

/// Open -> acknowledged. The acting user becomes owner unless one is set.
pub fn acknowledge(
    incident: &IncidentDetail,
    actor: &str,
) -> Result<IncidentDetail, TransitionError> {
    if incident.status != IncidentStatus::Open {
        return Err(TransitionError::Incident {
            id: incident.id.clone(),
            from: incident.status,
            to: IncidentStatus::Acknowledged,
        });
    }
    Ok(IncidentDetail {
        status: IncidentStatus::Acknowledged,
        owner: Some(owner_or(incident, actor)),
        ..incident.clone()
    })
}

/// Open or acknowledged -> resolved. An existing owner is never replaced.
pub fn resolve(incident: &IncidentDetail, actor: &str) -> Result<IncidentDetail, TransitionError> {
    if incident.status == IncidentStatus::Resolved {
        return Err(TransitionError::Incident {
            id: incident.id.clone(),
            from: incident.status,
            to: IncidentStatus::Resolved,
        });
    }
    Ok(IncidentDetail {
        status: IncidentStatus::Resolved,
        owner: Some(owner_or(incident, actor)),
        ..incident.clone()
    })
}

fn owner_or(incident: &IncidentDetail, actor: &str) -> String {
    incident
        .owner
        .clone()
        .unwrap_or_else(|| actor.to_string())
}

// ──────────────────────────────────────────────
// Scenarios
// ──────────────────────────────────────────────

pub fn archive(scenario: &ScenarioDetail) -> Result<ScenarioDetail, TransitionError> {
    set_status(scenario, ScenarioStatus::Active, ScenarioStatus::Archived)
}

pub fn restore(scenario: &ScenarioDetail) -> Result<ScenarioDetail, TransitionError> {
    set_status(scenario, ScenarioStatus::Archived, ScenarioStatus::Active)
}

/// Flip between active and archived. Always succeeds.
pub fn toggle_archived(scenario: &ScenarioDetail) -> ScenarioDetail {
    let status = match scenario.status {
        ScenarioStatus::Active => ScenarioStatus::Archived,
        ScenarioStatus::Archived => ScenarioStatus::Active,
    };
    ScenarioDetail {
        status,
        ..scenario.clone()
    }
}

fn set_status(
    scenario: &ScenarioDetail,
    from: ScenarioStatus,
    to: ScenarioStatus,
) -> Result<ScenarioDetail, TransitionError> {
    if scenario.status != from {
        return Err(TransitionError::Scenario {
            id: scenario.id.clone(),
            from: scenario.status,
            to,
        });
    }
    Ok(ScenarioDetail {
        status: to,
        ..scenario.clone()
    })
}

/// Gate for edit, publish and run-now: archived scenarios are read-only.
pub fn ensure_editable(scenario: &ScenarioDetail) -> Result<(), TransitionError> {
    if scenario.is_archived() {
        return Err(TransitionError::ScenarioArchived {
            id: scenario.id.clone(),
        });
    }
    Ok(())
}

/// Copy `scenario` under a new id. Only the id, name and timestamp differ.
pub fn duplicate(scenario: &ScenarioDetail, new_id: String, now: OffsetDateTime) -> ScenarioDetail {
    ScenarioDetail {
        id: new_id,
        name: format!("{}{}", scenario.name, COPY_SUFFIX),
        last_updated: now,
        ..scenario.clone()
    }
}

/// Errors from applying a form to a scenario.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FormActionError {
    #[error(transparent)]
    Invalid(#[from] FormErrors),
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

/// Build a new active scenario at [`INITIAL_VERSION`] from a validated form.
pub fn create_scenario(
    form: &ScenarioFormData,
    id: String,
    owner: &str,
    now: OffsetDateTime,
) -> Result<ScenarioDetail, FormErrors> {
    form.validate()?;
    Ok(ScenarioDetail {
        id,
        name: form.name.trim().to_string(),
        description: form.description.clone(),
        failure_type: form.failure_type,
        target_service: form.target_service.clone(),
        version: INITIAL_VERSION.to_string(),
        last_updated: now,
        owner: owner.to_string(),
        status: ScenarioStatus::Active,
        environment: form.environment.clone(),
        intensity: form.intensity,
        duration: form.duration,
        schedule_type: form.schedule_type,
        cron_expression: form.effective_cron(),
        safety_config: safety_config(form),
        steps: form.steps.clone(),
    })
}

/// Merge form fields into `existing`. Id, version, owner and status are
/// kept; safety config and `last_updated` are recomputed.
pub fn update_scenario(
    existing: &ScenarioDetail,
    form: &ScenarioFormData,
    now: OffsetDateTime,
) -> Result<ScenarioDetail, FormActionError> {
    ensure_editable(existing)?;
    form.validate()?;
    Ok(ScenarioDetail {
        name: form.name.trim().to_string(),
        description: form.description.clone(),
        failure_type: form.failure_type,
        target_service: form.target_service.clone(),
        environment: form.environment.clone(),
        intensity: form.intensity,
        duration: form.duration,
        schedule_type: form.schedule_type,
        cron_expression: form.effective_cron(),
        safety_config: safety_config(form),
        steps: form.steps.clone(),
        last_updated: now,
        ..existing.clone()
    })
}

fn safety_config(form: &ScenarioFormData) -> SafetyConfig {
    SafetyConfig {
        max_error_rate: form.max_error_rate,
        auto_stop_enabled: form.auto_stop_enabled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::tests::valid_form;
    use crate::generate::Generator;
    use crate::model::ScheduleType;
    use time::macros::datetime;
    use time::Duration;

    fn generator() -> Generator {
        Generator::new(42, datetime!(2026-01-20 14:00 UTC))
    }

    fn open_incident() -> IncidentDetail {
        let inc = generator().generate_incident_detail(0, 50);
        assert_eq!(inc.status, IncidentStatus::Open);
        inc
    }

    // -- incidents --

    #[test]
    fn acknowledge_open_sets_owner() {
        let acked = acknowledge(&open_incident(), "oncall@example.com").unwrap();
        assert_eq!(acked.status, IncidentStatus::Acknowledged);
        assert_eq!(acked.owner.as_deref(), Some("oncall@example.com"));
    }

    #[test]
    fn acknowledge_rejects_non_open() {
        let acked = acknowledge(&open_incident(), "a@example.com").unwrap();
        let err = acknowledge(&acked, "b@example.com").unwrap_err();
        assert_eq!(
            err,
            TransitionError::Incident {
                id: "inc-0001".to_string(),
                from: IncidentStatus::Acknowledged,
                to: IncidentStatus::Acknowledged,
            }
        );
    }

    #[test]
    fn resolve_after_acknowledge_keeps_owner() {
        let acked = acknowledge(&open_incident(), "first@example.com").unwrap();
        let resolved = resolve(&acked, "second@example.com").unwrap();
        assert_eq!(resolved.status, IncidentStatus::Resolved);
        assert_eq!(resolved.owner.as_deref(), Some("first@example.com"));
    }

    #[test]
    fn resolve_from_open_assigns_actor() {
        let resolved = resolve(&open_incident(), "direct@example.com").unwrap();
        assert_eq!(resolved.owner.as_deref(), Some("direct@example.com"));
    }

    #[test]
    fn resolve_twice_is_rejected() {
        let resolved = resolve(&open_incident(), "a@example.com").unwrap();
        assert!(resolve(&resolved, "a@example.com").is_err());
    }

    #[test]
    fn transitions_leave_input_untouched() {
        let original = open_incident();
        let _ = acknowledge(&original, "a@example.com").unwrap();
        assert_eq!(original.status, IncidentStatus::Open);
        assert!(original.owner.is_none());
    }

    // -- scenarios --

    #[test]
    fn archive_and_restore_are_strict() {
        let active = generator().generate_scenario(1);
        let archived = archive(&active).unwrap();
        assert!(archived.is_archived());
        assert!(archive(&archived).is_err());
        let restored = restore(&archived).unwrap();
        assert_eq!(restored, active);
        assert!(restore(&restored).is_err());
    }

    #[test]
    fn toggle_flips_status() {
        let s = generator().generate_scenario(0);
        assert!(s.is_archived());
        assert!(!toggle_archived(&s).is_archived());
        assert_eq!(toggle_archived(&toggle_archived(&s)), s);
    }

    #[test]
    fn duplicate_changes_only_id_name_and_timestamp() {
        let g = generator();
        let original = g.generate_scenario(2);
        let now = g.now() + Duration::hours(1);
        let copy = duplicate(&original, "scenario-025".to_string(), now);
        assert_ne!(copy.id, original.id);
        assert_eq!(copy.name, format!("{} (Copy)", original.name));
        assert_eq!(copy.last_updated, now);
        let normalized = ScenarioDetail {
            id: original.id.clone(),
            name: original.name.clone(),
            last_updated: original.last_updated,
            ..copy
        };
        assert_eq!(normalized, original);
    }

    #[test]
    fn create_uses_initial_version_and_actor() {
        let now = generator().now();
        let created =
            create_scenario(&valid_form(), "scenario-100".to_string(), "me@example.com", now)
                .unwrap();
        assert_eq!(created.version, INITIAL_VERSION);
        assert_eq!(created.owner, "me@example.com");
        assert_eq!(created.status, ScenarioStatus::Active);
        assert_eq!(created.safety_config.max_error_rate, 5.0);
        assert!(created.cron_expression.is_none());
    }

    #[test]
    fn create_rejects_invalid_form() {
        let form = ScenarioFormData {
            name: String::new(),
            ..valid_form()
        };
        let err = create_scenario(&form, "x".to_string(), "me", generator().now()).unwrap_err();
        assert!(err.has_field("name"));
    }

    #[test]
    fn update_merges_and_keeps_identity() {
        let g = generator();
        let existing = g.generate_scenario(1);
        let later = g.now() + Duration::minutes(5);
        let form = ScenarioFormData {
            name: "Renamed".to_string(),
            schedule_type: ScheduleType::Cron,
            cron_expression: "*/5 * * * *".to_string(),
            max_error_rate: 9.5,
            auto_stop_enabled: false,
            ..valid_form()
        };
        let updated = update_scenario(&existing, &form, later).unwrap();
        assert_eq!(updated.id, existing.id);
        assert_eq!(updated.version, existing.version);
        assert_eq!(updated.owner, existing.owner);
        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.cron_expression.as_deref(), Some("*/5 * * * *"));
        assert_eq!(
            updated.safety_config,
            SafetyConfig {
                max_error_rate: 9.5,
                auto_stop_enabled: false
            }
        );
        assert_eq!(updated.last_updated, later);
    }

    #[test]
    fn update_rejects_archived_scenario() {
        let g = generator();
        let archived = g.generate_scenario(0);
        let err = update_scenario(&archived, &valid_form(), g.now()).unwrap_err();
        assert!(matches!(
            err,
            FormActionError::Transition(TransitionError::ScenarioArchived { .. })
        ));
    }
}

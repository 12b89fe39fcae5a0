use std::collections::BTreeMap;

use time::Duration;

use super::catalog::{self, CHANGELOGS, DEFAULT_CRON, ENVIRONMENTS, OWNERS, TARGET_SERVICES};
use super::Generator;
use crate::model::{
    FailureType, SafetyConfig, ScenarioDetail, ScenarioStatus, ScenarioStep, ScenarioVersion,
    ScheduleType, StepConfigValue, StepType,
};

/// Most versions reconstructed for one scenario's history.
pub const MAX_VERSION_HISTORY: usize = 6;

/// Highest minor reconstructed for majors older than the current one.
const PRIOR_MAJOR_MAX_MINOR: u32 = 2;

impl Generator {
    pub fn generate_scenario(&self, index: usize) -> ScenarioDetail {
        let failure_type = catalog::pick(catalog::FAILURE_TYPES, index);
        let (_, name, description) = catalog::pick(catalog::CATALOG, index);
        let cron = index % 3 == 0;

        ScenarioDetail {
            id: format!("scenario-{:03}", index + 1),
            name: name.to_string(),
            description: description.to_string(),
            failure_type,
            target_service: catalog::pick(TARGET_SERVICES, index).to_string(),
            version: format!("v{}.{}.0", index / 3 + 1, index % 3),
            last_updated: self.now - Duration::days(2 * index as i64),
            owner: catalog::pick(OWNERS, index).to_string(),
            status: if index % 7 == 0 {
                ScenarioStatus::Archived
            } else {
                ScenarioStatus::Active
            },
            environment: catalog::pick(ENVIRONMENTS, index).to_string(),
            intensity: (20 + (index * 10) % 80) as u8,
            duration: (30 + (index * 15) % 270) as u32,
            schedule_type: if cron {
                ScheduleType::Cron
            } else {
                ScheduleType::Manual
            },
            cron_expression: cron.then(|| DEFAULT_CRON.to_string()),
            safety_config: SafetyConfig {
                max_error_rate: (5 + index % 10) as f64,
                auto_stop_enabled: index % 4 != 0,
            },
            steps: default_steps(failure_type),
        }
    }

    /// Reconstruct the published history of `scenario`, newest first.
    ///
    /// Walks back from the current major.minor: each older major contributes
    /// minors 2 down to 0, stopping at major 1 or after
    /// [`MAX_VERSION_HISTORY`] entries. Entries are a week apart and only the
    /// first is current; it carries the scenario's exact version string.
    pub fn scenario_versions(&self, scenario: &ScenarioDetail) -> Vec<ScenarioVersion> {
        let Some((major, minor)) = parse_major_minor(&scenario.version) else {
            return vec![self.version_entry(scenario, 0, scenario.version.clone(), "current")];
        };

        let mut versions = Vec::new();
        'walk: for maj in (1..=major).rev() {
            let max_minor = if maj == major {
                minor
            } else {
                PRIOR_MAJOR_MAX_MINOR
            };
            for min in (0..=max_minor).rev() {
                let idx = versions.len();
                let version = if idx == 0 {
                    scenario.version.clone()
                } else {
                    format!("v{maj}.{min}.0")
                };
                versions.push(self.version_entry(scenario, idx, version, &format!("{maj}-{min}")));
                if versions.len() >= MAX_VERSION_HISTORY {
                    break 'walk;
                }
            }
        }
        versions
    }

    fn version_entry(
        &self,
        scenario: &ScenarioDetail,
        idx: usize,
        version: String,
        suffix: &str,
    ) -> ScenarioVersion {
        ScenarioVersion {
            id: format!("ver-{}-{}", scenario.id, suffix),
            version,
            published_at: self.now - Duration::days(7 * idx as i64),
            published_by: catalog::pick(OWNERS, idx).to_string(),
            changelog: catalog::pick(CHANGELOGS, idx).to_string(),
            is_current: idx == 0,
        }
    }
}

/// Parse `vMAJOR.MINOR[.PATCH]`. Majors below 1 are rejected.
pub(crate) fn parse_major_minor(version: &str) -> Option<(u32, u32)> {
    let mut parts = version.strip_prefix('v').unwrap_or(version).split('.');
    let major = parts.next()?.parse::<u32>().ok()?;
    let minor = parts.next()?.parse::<u32>().ok()?;
    (major >= 1).then_some((major, minor))
}

fn step(n: usize, step_type: StepType, label: &str, config: &[(&str, StepConfigValue)]) -> ScenarioStep {
    ScenarioStep {
        id: format!("step-{n}"),
        step_type,
        label: label.to_string(),
        config: config
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect::<BTreeMap<_, _>>(),
    }
}

/// Step plan for a failure type: inject and wait, a ramp-up for latency and
/// resource faults, then recover and validate.
pub fn default_steps(failure_type: FailureType) -> Vec<ScenarioStep> {
    let mut steps = vec![
        step(
            1,
            StepType::InjectFault,
            &format!("Inject {failure_type} fault"),
            &[
                ("percentage", 30_i64.into()),
                ("target", "all-endpoints".into()),
            ],
        ),
        step(2, StepType::Wait, "Wait for metrics", &[("duration", 30_i64.into())]),
    ];

    if matches!(failure_type, FailureType::Latency | FailureType::Resource) {
        steps.push(step(
            3,
            StepType::IncreaseIntensity,
            "Increase fault intensity",
            &[("percentage", 60_i64.into())],
        ));
        steps.push(step(4, StepType::Wait, "Observe impact", &[("duration", 60_i64.into())]));
    }

    steps.push(step(
        steps.len() + 1,
        StepType::Recover,
        "Remove fault injection",
        &[("graceful", true.into())],
    ));
    steps.push(step(
        steps.len() + 1,
        StepType::Validate,
        "Validate recovery",
        &[("timeout", 120_i64.into()), ("checkMetrics", true.into())],
    ));
    steps
}

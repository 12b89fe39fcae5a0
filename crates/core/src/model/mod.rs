//! Record types shared by the generator, the query layer and storage.
//!
//! Field names serialize in camelCase and enum members in snake_case, which
//! is the shape a remote dashboard client consumes. Timestamps serialize as
//! RFC 3339 strings.

mod incident;
mod run;
mod scenario;

use std::fmt;
use std::str::FromStr;

pub use incident::{
    Incident, IncidentDetail, IncidentMetrics, IncidentSeverity, IncidentSignal, IncidentStatus,
    SignalType,
};
pub use run::{
    DetailedTimelineEvent, ExtendedRunMetrics, Run, RunDetail, RunError, RunMetrics, RunStatus,
    TimelineEntry, TimelineEntryType, TimelineEventType,
};
pub use scenario::{
    FailureType, SafetyConfig, Scenario, ScenarioDetail, ScenarioStatus, ScenarioStep,
    ScenarioVersion, ScheduleType, StepConfigValue, StepType,
};

/// Error returned when parsing an enum member from its wire name fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}' (expected one of: {expected})")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
    pub expected: String,
}

/// Declares a closed string enum with its wire names, `as_str`, `ALL`,
/// `Display` and `FromStr`. The serde attributes on the enum itself must
/// agree with the names given here.
macro_rules! wire_enum {
    ($ty:ident, $kind:literal, { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            pub const ALL: &'static [$ty] = &[$($ty::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($ty::$variant => $name),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let lowered = s.trim().to_ascii_lowercase();
                match lowered.as_str() {
                    $($name => Ok($ty::$variant),)+
                    _ => Err(ParseEnumError {
                        kind: $kind,
                        value: s.to_string(),
                        expected: [$($name),+].join(", "),
                    }),
                }
            }
        }
    };
}

wire_enum!(RunStatus, "run status", {
    Success => "success",
    Failed => "failed",
    Degraded => "degraded",
});

wire_enum!(FailureType, "failure type", {
    Latency => "latency",
    Error => "error",
    Shutdown => "shutdown",
    Resource => "resource",
});

wire_enum!(ScenarioStatus, "scenario status", {
    Active => "active",
    Archived => "archived",
});

wire_enum!(ScheduleType, "schedule type", {
    Manual => "manual",
    Cron => "cron",
});

wire_enum!(StepType, "step type", {
    InjectFault => "inject_fault",
    Wait => "wait",
    IncreaseIntensity => "increase_intensity",
    Recover => "recover",
    Validate => "validate",
});

wire_enum!(IncidentSeverity, "severity", {
    Critical => "critical",
    High => "high",
    Medium => "medium",
    Low => "low",
});

wire_enum!(IncidentStatus, "incident status", {
    Open => "open",
    Acknowledged => "acknowledged",
    Resolved => "resolved",
});

wire_enum!(SignalType, "signal type", {
    MetricAnomaly => "metric_anomaly",
    ThresholdBreach => "threshold_breach",
    Correlation => "correlation",
    AlertFired => "alert_fired",
});

wire_enum!(TimelineEntryType, "timeline entry type", {
    Info => "info",
    Warning => "warning",
    Error => "error",
    Success => "success",
});

wire_enum!(TimelineEventType, "timeline event type", {
    FaultInjected => "fault_injected",
    RetryTriggered => "retry_triggered",
    CircuitBreakerOpen => "circuit_breaker_open",
    FallbackServed => "fallback_served",
    Recovery => "recovery",
    Info => "info",
});

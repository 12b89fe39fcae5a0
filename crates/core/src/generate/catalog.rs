//! Canned text and lookup tables the generator draws from.

use crate::model::{FailureType, Scenario, StepType};

pub const CATALOG: &[(&str, &str, &str)] = &[
    (
        "sc-001",
        "API Latency Spike",
        "Simulate increased API response times",
    ),
    (
        "sc-002",
        "Database Failover",
        "Test database failover behavior",
    ),
    (
        "sc-003",
        "Memory Pressure",
        "Simulate high memory usage conditions",
    ),
    (
        "sc-004",
        "Network Partition",
        "Test behavior during network issues",
    ),
    ("sc-005", "CPU Saturation", "Simulate CPU-bound workloads"),
    ("sc-006", "Disk I/O Stress", "Test disk performance limits"),
];

/// The fixed scenario catalog runs refer to.
pub fn scenario_catalog() -> Vec<Scenario> {
    CATALOG
        .iter()
        .map(|(id, name, description)| Scenario {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
        })
        .collect()
}

/// (code, message, base count)
pub const RUN_ERRORS: &[(&str, &str, u32)] = &[
    ("ERR_TIMEOUT", "Request timeout exceeded 5000ms", 12),
    ("ERR_CONNECTION", "Connection refused by upstream", 8),
    ("ERR_MEMORY", "Out of memory exception", 3),
    ("ERR_RATE_LIMIT", "Rate limit exceeded", 24),
    ("ERR_CIRCUIT_OPEN", "Circuit breaker open", 5),
];

pub const ENVIRONMENTS: &[&str] = &["production", "staging", "development"];

pub const TARGET_SERVICES: &[&str] = &[
    "api-gateway",
    "user-service",
    "payment-service",
    "inventory-service",
    "notification-service",
    "auth-service",
];

pub const OWNERS: &[&str] = &[
    "alice@example.com",
    "bob@example.com",
    "charlie@example.com",
    "diana@example.com",
];

pub const FAILURE_TYPES: &[FailureType] = &[
    FailureType::Latency,
    FailureType::Error,
    FailureType::Shutdown,
    FailureType::Resource,
];

pub fn step_type_label(step_type: StepType) -> &'static str {
    match step_type {
        StepType::InjectFault => "Inject fault",
        StepType::Wait => "Wait",
        StepType::IncreaseIntensity => "Increase intensity",
        StepType::Recover => "Recover",
        StepType::Validate => "Validate",
    }
}

pub const DEFAULT_CRON: &str = "0 2 * * 1";

pub const CHANGELOGS: &[&str] = &[
    "Initial release with basic fault injection",
    "Added configurable intensity ramping",
    "Improved recovery validation logic",
    "Added circuit breaker monitoring",
    "Optimized for production workloads",
    "Fixed timing issues in wait steps",
    "Added support for multi-region testing",
    "Improved error rate threshold handling",
];

pub const INCIDENT_TITLES: &[&str] = &[
    "P95 latency exceeded threshold",
    "Error rate spike detected",
    "Circuit breaker tripped repeatedly",
    "Memory usage critical",
    "Connection pool exhausted",
    "Cascade failure in downstream services",
    "Database connection timeouts",
    "Rate limiting triggered",
    "CPU saturation detected",
    "Response time degradation",
];

pub const INCIDENT_SUMMARIES: &[&str] = &[
    "p95 latency exceeded 800ms; error rate 4.2%",
    "Error rate spiked to 12.3% over 5 minute window",
    "Circuit breaker opened 8 times in 2 minutes",
    "Memory usage at 94% with no recovery trend",
    "Connection pool 100% utilized; requests queueing",
    "3 downstream services reporting failures",
    "Database connections timing out after 30s",
    "Rate limiter rejecting 45% of requests",
    "CPU at 98% utilization across all instances",
    "Response times 3x baseline for /api/checkout",
];

pub const ROOT_CAUSES: &[&str] = &[
    "Increased traffic volume exceeded auto-scaling capacity. The scaling policy delay (3 min) caused request queuing.",
    "Database query N+1 problem in user lookup causing exponential load increase under concurrent requests.",
    "Memory leak in connection handling code causing gradual resource exhaustion over time.",
    "Misconfigured retry policy causing retry storms during partial outages.",
    "Third-party payment provider experiencing degraded performance affecting checkout flow.",
    "DNS resolution delays causing connection establishment timeouts to downstream services.",
];

pub const RECOMMENDED_ACTIONS: &[&str] = &[
    "Scale up instances immediately to handle traffic surge",
    "Enable circuit breaker on affected endpoints",
    "Implement request rate limiting at edge",
    "Review and optimize database queries",
    "Add connection pool monitoring alerts",
    "Configure exponential backoff with jitter",
    "Implement bulkhead pattern for isolation",
    "Add fallback responses for degraded mode",
];

pub const IMPACTED_ENDPOINTS: &[&str] = &[
    "/api/checkout",
    "/api/users/:id",
    "/api/inventory/search",
    "/api/payments/process",
    "/api/notifications/send",
    "/api/auth/token",
    "/api/orders/:id/status",
    "/api/products/catalog",
];

/// Cycle through a non-empty table by index.
pub fn pick<T: Copy>(table: &[T], index: usize) -> T {
    table[index % table.len()]
}

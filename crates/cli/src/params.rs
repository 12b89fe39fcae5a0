//! Parsing of filter values given as strings, shared by the CLI flags and
//! the HTTP query string.

use std::collections::BTreeSet;
use std::str::FromStr;

use chaosboard_core::{DateRange, IncidentFilter, RunFilter, ScenarioFilter};
use clap::Args;
use serde::Deserialize;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

// ──────────────────────────────────────────────
// Listing parameters
// ──────────────────────────────────────────────

/// `runs` flags and `GET /runs` query.
#[derive(Debug, Clone, Default, Args, Deserialize)]
pub(crate) struct RunQuery {
    /// success, failed, degraded or all
    #[arg(long)]
    pub(crate) status: Option<String>,
    /// Comma-separated catalog scenario ids
    #[arg(long)]
    pub(crate) scenario: Option<String>,
    /// Earliest start (RFC 3339 or YYYY-MM-DD)
    #[arg(long)]
    pub(crate) from: Option<String>,
    /// Latest start (RFC 3339 or YYYY-MM-DD)
    #[arg(long)]
    pub(crate) to: Option<String>,
    /// 1-based page
    #[arg(long)]
    pub(crate) page: Option<usize>,
}

impl RunQuery {
    pub(crate) fn filter(&self) -> Result<RunFilter, String> {
        Ok(RunFilter {
            status: parse_optional(self.status.as_deref())?,
            scenario_ids: parse_list(self.scenario.as_deref()),
            date_range: date_range(self.from.as_deref(), self.to.as_deref())?,
        })
    }
}

/// `scenarios` flags and `GET /scenarios` query.
#[derive(Debug, Clone, Default, Args, Deserialize)]
pub(crate) struct ScenarioQuery {
    /// Substring of name, description, service or owner
    #[arg(long)]
    pub(crate) search: Option<String>,
    /// Failure type: latency, error, shutdown, resource or all
    #[arg(long = "type")]
    #[serde(rename = "type")]
    pub(crate) failure_type: Option<String>,
    /// Target service
    #[arg(long)]
    pub(crate) service: Option<String>,
    /// active, archived or all
    #[arg(long)]
    pub(crate) status: Option<String>,
    /// 1-based page
    #[arg(long)]
    pub(crate) page: Option<usize>,
}

impl ScenarioQuery {
    pub(crate) fn filter(&self) -> Result<ScenarioFilter, String> {
        Ok(ScenarioFilter {
            search: self.search.clone().filter(|s| !s.is_empty()),
            failure_type: parse_optional(self.failure_type.as_deref())?,
            service: non_blank(self.service.as_deref()),
            status: parse_optional(self.status.as_deref())?,
        })
    }
}

/// `incidents` flags and `GET /incidents` query.
#[derive(Debug, Clone, Default, Args, Deserialize)]
pub(crate) struct IncidentQuery {
    /// critical, high, medium, low or all
    #[arg(long)]
    pub(crate) severity: Option<String>,
    /// open, acknowledged, resolved or all
    #[arg(long)]
    pub(crate) status: Option<String>,
    /// Affected service
    #[arg(long)]
    pub(crate) service: Option<String>,
    /// Earliest detection (RFC 3339 or YYYY-MM-DD)
    #[arg(long)]
    pub(crate) from: Option<String>,
    /// Latest detection (RFC 3339 or YYYY-MM-DD)
    #[arg(long)]
    pub(crate) to: Option<String>,
    /// Substring of id, title, summary, service or run id
    #[arg(long)]
    pub(crate) search: Option<String>,
    /// 1-based page
    #[arg(long)]
    pub(crate) page: Option<usize>,
}

impl IncidentQuery {
    pub(crate) fn filter(&self) -> Result<IncidentFilter, String> {
        Ok(IncidentFilter {
            severity: parse_optional(self.severity.as_deref())?,
            status: parse_optional(self.status.as_deref())?,
            service: non_blank(self.service.as_deref()),
            date_range: date_range(self.from.as_deref(), self.to.as_deref())?,
            search: self.search.clone().filter(|s| !s.is_empty()),
        })
    }
}

fn date_range(from: Option<&str>, to: Option<&str>) -> Result<Option<DateRange>, String> {
    let from = non_blank(from).map(|v| parse_timestamp(&v)).transpose()?;
    let to = non_blank(to).map(|v| parse_timestamp(&v)).transpose()?;
    Ok((from.is_some() || to.is_some()).then(|| DateRange::new(from, to)))
}

// ──────────────────────────────────────────────
// Values
// ──────────────────────────────────────────────

/// Parse an RFC 3339 timestamp, or a bare `YYYY-MM-DD` date taken as
/// midnight UTC.
pub(crate) fn parse_timestamp(value: &str) -> Result<OffsetDateTime, String> {
    if let Ok(at) = OffsetDateTime::parse(value, &Rfc3339) {
        return Ok(at);
    }
    Date::parse(value, format_description!("[year]-[month]-[day]"))
        .map(|date| date.midnight().assume_utc())
        .map_err(|_| format!("invalid timestamp '{value}': expected RFC 3339 or YYYY-MM-DD"))
}

/// `None` for an absent, empty or `all` value; otherwise the parsed value.
fn parse_optional<T>(value: Option<&str>) -> Result<Option<T>, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) if v.eq_ignore_ascii_case("all") => Ok(None),
        Some(v) => v.parse().map(Some).map_err(|e: T::Err| e.to_string()),
    }
}

/// Split a comma-separated list, dropping blanks.
fn parse_list(value: Option<&str>) -> BTreeSet<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// A trimmed, non-empty string.
fn trimmed(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Like [`trimmed`], with `all` also meaning unset.
fn non_blank(value: Option<&str>) -> Option<String> {
    trimmed(value).filter(|s| !s.eq_ignore_ascii_case("all"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chaosboard_core::IncidentSeverity;
    use time::macros::datetime;

    #[test]
    fn timestamps_accept_rfc3339_and_dates() {
        assert_eq!(
            parse_timestamp("2026-01-20T14:00:00Z").unwrap(),
            datetime!(2026-01-20 14:00 UTC)
        );
        assert_eq!(
            parse_timestamp("2026-01-20").unwrap(),
            datetime!(2026-01-20 00:00 UTC)
        );
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn optional_treats_all_as_unset() {
        assert_eq!(parse_optional::<IncidentSeverity>(None), Ok(None));
        assert_eq!(parse_optional::<IncidentSeverity>(Some("all")), Ok(None));
        assert_eq!(
            parse_optional::<IncidentSeverity>(Some("Critical")),
            Ok(Some(IncidentSeverity::Critical))
        );
        assert!(parse_optional::<IncidentSeverity>(Some("urgent")).is_err());
    }

    #[test]
    fn list_splits_on_commas() {
        let ids = parse_list(Some("sc-001, sc-003,,"));
        assert_eq!(ids.len(), 2);
        assert!(ids.contains("sc-003"));
        assert!(parse_list(None).is_empty());
    }

    #[test]
    fn run_query_builds_filter() {
        let query = RunQuery {
            status: Some("failed".to_string()),
            scenario: Some("sc-001,sc-002".to_string()),
            from: Some("2026-01-19".to_string()),
            ..RunQuery::default()
        };
        let filter = query.filter().unwrap();
        assert_eq!(filter.status, Some(chaosboard_core::RunStatus::Failed));
        assert_eq!(filter.scenario_ids.len(), 2);
        let range = filter.date_range.unwrap();
        assert_eq!(range.from, Some(datetime!(2026-01-19 00:00 UTC)));
        assert_eq!(range.to, None);
    }

    #[test]
    fn empty_query_is_inactive() {
        let filter = IncidentQuery::default().filter().unwrap();
        assert_eq!(filter, IncidentFilter::default());
        let filter = ScenarioQuery {
            failure_type: Some("all".to_string()),
            search: Some(String::new()),
            ..ScenarioQuery::default()
        }
        .filter()
        .unwrap();
        assert_eq!(filter, ScenarioFilter::default());
    }

    #[test]
    fn search_keeps_surrounding_whitespace() {
        let filter = IncidentQuery {
            search: Some("time ".to_string()),
            ..IncidentQuery::default()
        }
        .filter()
        .unwrap();
        assert_eq!(filter.search.as_deref(), Some("time "));
    }

    #[test]
    fn bad_values_are_reported() {
        let query = IncidentQuery {
            to: Some("last week".to_string()),
            ..IncidentQuery::default()
        };
        assert!(query.filter().unwrap_err().contains("last week"));
        let query = ScenarioQuery {
            status: Some("deleted".to_string()),
            ..ScenarioQuery::default()
        };
        assert!(query.filter().is_err());
    }
}

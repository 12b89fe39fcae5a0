//! Plain-text rendering for `--output text`.

use std::fmt::Write;

use chaosboard_core::insights::KpiSummary;
use chaosboard_core::query::{page_numbers, Page, PageMarker};
use chaosboard_core::{IncidentDetail, Run, RunDetail, ScenarioDetail, ScenarioVersion};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

fn timestamp(at: OffsetDateTime) -> String {
    at.format(&Rfc3339).unwrap_or_else(|_| at.to_string())
}

/// `"1m 12s"` style duration from milliseconds.
pub(crate) fn duration_ms(ms: u64) -> String {
    let secs = ms / 1000;
    if secs >= 60 {
        format!("{}m {:02}s", secs / 60, secs % 60)
    } else {
        format!("{}.{}s", secs, (ms % 1000) / 100)
    }
}

fn footer<T>(out: &mut String, page: &Page<T>, noun: &str) {
    let markers: Vec<String> = page_numbers(page.page, page.total_pages)
        .into_iter()
        .map(|m| match m {
            PageMarker::Page(n) if n == page.page => format!("[{n}]"),
            PageMarker::Page(n) => n.to_string(),
            PageMarker::Ellipsis => "...".to_string(),
        })
        .collect();
    let _ = writeln!(
        out,
        "page {} of {} ({} {noun})  {}",
        page.page,
        page.total_pages.max(1),
        page.total_count,
        markers.join(" ")
    );
}

pub(crate) fn runs(page: &Page<Run>) -> String {
    let mut out = String::new();
    if page.is_empty() {
        out.push_str("no runs match\n");
    }
    for run in &page.items {
        let _ = writeln!(
            out,
            "{:<10} {:<9} {:<28} {}  {}",
            run.id,
            run.status,
            run.scenario,
            timestamp(run.started_at),
            duration_ms(run.duration)
        );
    }
    footer(&mut out, page, "runs");
    out
}

pub(crate) fn run_detail(run: &RunDetail) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", run.id, run.status);
    let _ = writeln!(out, "  scenario:    {} [{}]", run.scenario, run.scenario_id);
    let _ = writeln!(out, "  environment: {}", run.environment);
    let _ = writeln!(out, "  started:     {}", timestamp(run.started_at));
    let _ = writeln!(out, "  duration:    {}", duration_ms(run.duration));
    let m = &run.metrics;
    let _ = writeln!(
        out,
        "  latency:     p50 {}ms  p95 {}ms  p99 {}ms",
        m.base.latency_p50, m.latency_p95, m.base.latency_p99
    );
    let _ = writeln!(
        out,
        "  errors:      {}% of {} requests",
        m.base.error_rate, m.base.request_count
    );
    for e in &run.errors {
        let _ = writeln!(out, "    {} x{}  {}", e.code, e.count, e.message);
    }
    out.push_str("  timeline:\n");
    for event in &run.detailed_timeline {
        let _ = writeln!(
            out,
            "    {}  {:<20} {}",
            timestamp(event.timestamp),
            event.event_type,
            event.title
        );
    }
    for incident in &run.incidents {
        let _ = writeln!(
            out,
            "  incident {} [{}] {}",
            incident.id, incident.severity, incident.title
        );
    }
    out
}

pub(crate) fn scenarios(page: &Page<ScenarioDetail>) -> String {
    let mut out = String::new();
    if page.is_empty() {
        out.push_str("no scenarios match\n");
    }
    for s in &page.items {
        let _ = writeln!(
            out,
            "{:<13} {:<8} {:<8} {:<18} {:<7} {}",
            s.id, s.status, s.failure_type, s.target_service, s.version, s.name
        );
    }
    footer(&mut out, page, "scenarios");
    out
}

pub(crate) fn versions(scenario_id: &str, versions: &[ScenarioVersion]) -> String {
    let mut out = format!("{scenario_id}\n");
    for v in versions {
        let marker = if v.is_current { "*" } else { " " };
        let _ = writeln!(
            out,
            "{marker} {:<8} {}  {:<22} {}",
            v.version,
            timestamp(v.published_at),
            v.published_by,
            v.changelog
        );
    }
    out
}

pub(crate) fn incidents(page: &Page<IncidentDetail>) -> String {
    let mut out = String::new();
    if page.is_empty() {
        out.push_str("no incidents match\n");
    }
    for i in &page.items {
        let _ = writeln!(
            out,
            "{:<9} {:<8} {:<12} {:<18} {}",
            i.id, i.severity, i.status, i.service, i.title
        );
    }
    footer(&mut out, page, "incidents");
    out
}

pub(crate) fn incident_detail(incident: &IncidentDetail) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} [{} / {}] {}",
        incident.id, incident.severity, incident.status, incident.title
    );
    let _ = writeln!(out, "  {}", incident.summary);
    let _ = writeln!(out, "  service:    {}", incident.service);
    let _ = writeln!(out, "  run:        {}", incident.run_id);
    let _ = writeln!(out, "  detected:   {}", timestamp(incident.detected_at));
    let _ = writeln!(
        out,
        "  owner:      {}",
        incident.owner.as_deref().unwrap_or("unassigned")
    );
    let _ = writeln!(out, "  root cause: {}", incident.suspected_root_cause);
    out.push_str("  signals:\n");
    for s in &incident.signals {
        let _ = writeln!(
            out,
            "    {}  {:<16} {}{}",
            timestamp(s.timestamp),
            s.signal_type,
            s.title,
            s.value
                .as_deref()
                .map(|v| format!(" ({v})"))
                .unwrap_or_default()
        );
    }
    out.push_str("  recommended:\n");
    for action in &incident.recommended_actions {
        let _ = writeln!(out, "    - {action}");
    }
    out
}

pub(crate) fn kpis(k: &KpiSummary) -> String {
    format!(
        "runs today:        {}\nfailed runs:       {}\navg latency:       {}ms\nerror budget burn: {}%\n",
        k.runs_today, k.failed_runs, k.avg_latency, k.error_budget_burn
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chaosboard_core::query::paginate;

    #[test]
    fn durations_read_naturally() {
        assert_eq!(duration_ms(72_000), "1m 12s");
        assert_eq!(duration_ms(34_250), "34.2s");
        assert_eq!(duration_ms(0), "0.0s");
    }

    #[test]
    fn empty_page_says_so() {
        let page: Page<Run> = paginate(Vec::new(), 1, 10);
        let text = runs(&page);
        assert!(text.starts_with("no runs match"));
        assert!(text.contains("page 1 of 1 (0 runs)"));
    }

    #[test]
    fn footer_marks_current_page() {
        let page = paginate((0..250).collect::<Vec<u32>>(), 12, 10);
        let mut out = String::new();
        footer(&mut out, &page, "items");
        assert!(out.contains("[12]"));
        assert!(out.contains("..."));
        assert!(out.contains("25"));
    }
}

//! Filtering and pagination over generated collections.
//!
//! Every criterion is optional: `None` (or an empty set) places no
//! restriction. Active criteria combine with AND. Filtering never reorders
//! records, and [`ListState`] resets to page 1 whenever its criteria change
//! so a narrower result never lands on an out-of-range page.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::model::{
    FailureType, IncidentDetail, IncidentSeverity, IncidentStatus, Run, RunStatus, ScenarioDetail,
    ScenarioStatus,
};

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// A predicate over one record kind.
pub trait Filter<T> {
    fn matches(&self, record: &T) -> bool;

    /// Whether any criterion is set. An inactive filter matches everything.
    fn is_active(&self) -> bool;
}

/// Keep the records matching `filter`, in input order.
pub fn apply_filter<T: Clone, F: Filter<T>>(records: &[T], filter: &F) -> Vec<T> {
    records
        .iter()
        .filter(|r| filter.matches(r))
        .cloned()
        .collect()
}

/// Inclusive timestamp range. Either bound may be absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub from: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub to: Option<OffsetDateTime>,
}

impl DateRange {
    pub fn new(from: Option<OffsetDateTime>, to: Option<OffsetDateTime>) -> Self {
        Self { from, to }
    }

    pub fn since(from: OffsetDateTime) -> Self {
        Self {
            from: Some(from),
            to: None,
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    pub fn contains(&self, at: OffsetDateTime) -> bool {
        self.from.is_none_or(|from| at >= from) && self.to.is_none_or(|to| at <= to)
    }
}

fn range_matches(range: &Option<DateRange>, at: OffsetDateTime) -> bool {
    range.as_ref().is_none_or(|r| r.contains(at))
}

fn range_active(range: &Option<DateRange>) -> bool {
    range.as_ref().is_some_and(|r| !r.is_unbounded())
}

/// Lowercased needle, or `None` when the query is empty. Whitespace is part
/// of the needle.
fn normalized_search(search: &Option<String>) -> Option<String> {
    search
        .as_deref()
        .filter(|q| !q.is_empty())
        .map(str::to_lowercase)
}

fn any_contains(needle: &str, haystacks: &[&str]) -> bool {
    haystacks.iter().any(|h| h.to_lowercase().contains(needle))
}

// ──────────────────────────────────────────────
// Criteria
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RunFilter {
    pub status: Option<RunStatus>,
    /// Catalog scenario ids. Empty means any scenario.
    pub scenario_ids: BTreeSet<String>,
    pub date_range: Option<DateRange>,
}

impl Filter<Run> for RunFilter {
    fn matches(&self, run: &Run) -> bool {
        self.status.is_none_or(|s| run.status == s)
            && range_matches(&self.date_range, run.started_at)
            && (self.scenario_ids.is_empty() || self.scenario_ids.contains(&run.scenario_id))
    }

    fn is_active(&self) -> bool {
        self.status.is_some() || !self.scenario_ids.is_empty() || range_active(&self.date_range)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScenarioFilter {
    /// Case-insensitive substring over name, description, target service
    /// and owner.
    pub search: Option<String>,
    pub failure_type: Option<FailureType>,
    pub service: Option<String>,
    pub status: Option<ScenarioStatus>,
}

impl Filter<ScenarioDetail> for ScenarioFilter {
    fn matches(&self, scenario: &ScenarioDetail) -> bool {
        let search_ok = normalized_search(&self.search).is_none_or(|q| {
            any_contains(
                &q,
                &[
                    scenario.name.as_str(),
                    scenario.description.as_str(),
                    scenario.target_service.as_str(),
                    scenario.owner.as_str(),
                ],
            )
        });
        search_ok
            && self.failure_type.is_none_or(|t| scenario.failure_type == t)
            && self
                .service
                .as_deref()
                .is_none_or(|s| scenario.target_service == s)
            && self.status.is_none_or(|s| scenario.status == s)
    }

    fn is_active(&self) -> bool {
        normalized_search(&self.search).is_some()
            || self.failure_type.is_some()
            || self.service.is_some()
            || self.status.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IncidentFilter {
    pub severity: Option<IncidentSeverity>,
    pub status: Option<IncidentStatus>,
    pub service: Option<String>,
    pub date_range: Option<DateRange>,
    /// Case-insensitive substring over title, summary, id, service and run id.
    pub search: Option<String>,
}

impl Filter<IncidentDetail> for IncidentFilter {
    fn matches(&self, incident: &IncidentDetail) -> bool {
        self.severity.is_none_or(|s| incident.severity == s)
            && self.status.is_none_or(|s| incident.status == s)
            && self
                .service
                .as_deref()
                .is_none_or(|s| incident.service == s)
            && range_matches(&self.date_range, incident.detected_at)
            && normalized_search(&self.search).is_none_or(|q| {
                any_contains(
                    &q,
                    &[
                        incident.title.as_str(),
                        incident.summary.as_str(),
                        incident.id.as_str(),
                        incident.service.as_str(),
                        incident.run_id.as_str(),
                    ],
                )
            })
    }

    fn is_active(&self) -> bool {
        self.severity.is_some()
            || self.status.is_some()
            || self.service.is_some()
            || range_active(&self.date_range)
            || normalized_search(&self.search).is_some()
    }
}

// ──────────────────────────────────────────────
// Pagination
// ──────────────────────────────────────────────

/// One page of a filtered list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based page actually served, after clamping.
    pub page: usize,
    pub page_size: usize,
    pub total_count: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            page_size: self.page_size,
            total_count: self.total_count,
            total_pages: self.total_pages,
        }
    }
}

pub fn total_pages(total_count: usize, page_size: usize) -> usize {
    total_count.div_ceil(page_size.max(1))
}

/// Clamp a requested 1-based page into `1..=total_pages` (1 when empty).
pub fn clamp_page(page: usize, total_pages: usize) -> usize {
    page.clamp(1, total_pages.max(1))
}

/// Slice `items` into the requested page. Out-of-range pages clamp rather
/// than fail; a zero page size is treated as 1.
pub fn paginate<T>(items: Vec<T>, page: usize, page_size: usize) -> Page<T> {
    let page_size = page_size.max(1);
    let total_count = items.len();
    let total_pages = total_pages(total_count, page_size);
    let page = clamp_page(page, total_pages);
    let items = items
        .into_iter()
        .skip((page - 1) * page_size)
        .take(page_size)
        .collect();
    Page {
        items,
        page,
        page_size,
        total_count,
        total_pages,
    }
}

/// Filter then paginate in one step.
pub fn query<T: Clone, F: Filter<T>>(
    records: &[T],
    filter: &F,
    page: usize,
    page_size: usize,
) -> Page<T> {
    paginate(apply_filter(records, filter), page, page_size)
}

/// Criteria plus the current page of one list view.
///
/// The page is not independent of the criteria: any change to the filter
/// puts the view back on page 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListState<F> {
    filter: F,
    page: usize,
    page_size: usize,
}

impl<F: Default> Default for ListState<F> {
    fn default() -> Self {
        Self::new(F::default(), DEFAULT_PAGE_SIZE)
    }
}

impl<F> ListState<F> {
    pub fn new(filter: F, page_size: usize) -> Self {
        Self {
            filter,
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn filter(&self) -> &F {
        &self.filter
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn set_filter(&mut self, filter: F) {
        self.filter = filter;
        self.page = 1;
    }

    /// Edit the criteria in place. Always resets to page 1.
    pub fn update_filter(&mut self, edit: impl FnOnce(&mut F)) {
        edit(&mut self.filter);
        self.page = 1;
    }

    pub fn clear_filter(&mut self)
    where
        F: Default,
    {
        self.set_filter(F::default());
    }

    /// Request a page. The value is clamped when the view is next queried.
    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    /// Run the view over `records`, clamping the stored page to what exists.
    pub fn view<T: Clone>(&mut self, records: &[T]) -> Page<T>
    where
        F: Filter<T>,
    {
        let page = query(records, &self.filter, self.page, self.page_size);
        self.page = page.page;
        page
    }
}

/// Entry in a pagination bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "page")]
pub enum PageMarker {
    Page(usize),
    Ellipsis,
}

/// Page numbers to show in a pagination bar.
///
/// Up to seven pages are listed in full. Beyond that: the first page, the
/// current page with its neighbours, the last page, and an ellipsis for
/// each elided run.
pub fn page_numbers(current: usize, total_pages: usize) -> Vec<PageMarker> {
    if total_pages <= 7 {
        return (1..=total_pages).map(PageMarker::Page).collect();
    }
    let current = clamp_page(current, total_pages);
    let mut markers = vec![PageMarker::Page(1)];
    if current > 3 {
        markers.push(PageMarker::Ellipsis);
    }
    let start = current.saturating_sub(1).max(2);
    let end = (current + 1).min(total_pages - 1);
    markers.extend((start..=end).map(PageMarker::Page));
    if current + 2 < total_pages {
        markers.push(PageMarker::Ellipsis);
    }
    markers.push(PageMarker::Page(total_pages));
    markers
}

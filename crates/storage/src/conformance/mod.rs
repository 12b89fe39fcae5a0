//! Conformance test suite for `DashboardStorage` implementations.
//!
//! This module provides a backend-agnostic test suite that any
//! `DashboardStorage` implementation can run to verify correctness. The
//! suite covers:
//!
//! - **Lookup**: listing and single-record reads, unknown ids as `None`
//! - **Ordering**: collections come back in load order
//! - **Replace / OCC**: revision bumps and stale-write detection
//! - **Insert and allocation**: head insertion, duplicate ids, fresh ids
//! - **Error handling**: correct error variants and fields
//! - **Concurrency**: racing writers against one revision
//!
//! # Usage
//!
//! Backend crates call [`run_conformance_suite`] with a factory that loads
//! the given fixture corpus into a fresh storage instance:
//!
//! ```ignore
//! use chaosboard_storage::conformance::run_conformance_suite;
//!
//! #[tokio::test]
//! async fn my_backend_conformance() {
//!     let report = run_conformance_suite(|corpus| async move {
//!         MyBackend::load(corpus).await
//!     }).await;
//!     assert!(report.failed == 0, "{report}");
//! }
//! ```

mod concurrent;
mod error;
mod insert;
mod lookup;
mod replace;

use std::fmt;
use std::future::Future;

use chaosboard_core::{Corpus, CorpusSize, Generator};
use time::macros::datetime;

use crate::DashboardStorage;

/// Result of a single conformance test.
#[derive(Debug, Clone)]
pub struct TestResult {
    /// Test category (e.g. "lookup", "replace", "insert").
    pub category: String,
    /// Test name (e.g. "stale_revision_rejected").
    pub name: String,
    /// Whether the test passed.
    pub passed: bool,
    /// Error message if the test failed.
    pub message: Option<String>,
}

impl TestResult {
    fn pass(category: &str, name: &str) -> Self {
        Self {
            category: category.to_string(),
            name: name.to_string(),
            passed: true,
            message: None,
        }
    }

    fn fail(category: &str, name: &str, msg: String) -> Self {
        Self {
            category: category.to_string(),
            name: name.to_string(),
            passed: false,
            message: Some(msg),
        }
    }

    fn from_result(category: &str, name: &str, result: Result<(), String>) -> Self {
        match result {
            Ok(()) => Self::pass(category, name),
            Err(msg) => Self::fail(category, name, msg),
        }
    }
}

/// Aggregated report from a full conformance suite run.
#[derive(Debug, Clone)]
pub struct ConformanceReport {
    pub results: Vec<TestResult>,
    pub passed: usize,
    pub failed: usize,
    pub total: usize,
}

impl fmt::Display for ConformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Conformance: {}/{} passed ({} failed)",
            self.passed, self.total, self.failed
        )?;
        for r in &self.results {
            if !r.passed {
                writeln!(
                    f,
                    "  FAIL [{}/{}]: {}",
                    r.category,
                    r.name,
                    r.message.as_deref().unwrap_or("(no message)")
                )?;
            }
        }
        Ok(())
    }
}

/// Run the full conformance suite against a storage backend.
///
/// The `factory` is called once per test with a copy of [`fixture_corpus`]
/// and must return a fresh storage holding exactly that corpus.
pub async fn run_conformance_suite<S, F, Fut>(factory: F) -> ConformanceReport
where
    S: DashboardStorage,
    F: Fn(Corpus) -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.extend(lookup::run_lookup_tests(&factory).await);
    results.extend(replace::run_replace_tests(&factory).await);
    results.extend(insert::run_insert_tests(&factory).await);
    results.extend(error::run_error_tests(&factory).await);
    results.extend(concurrent::run_concurrent_tests(&factory).await);

    let passed = results.iter().filter(|r| r.passed).count();
    let total = results.len();

    ConformanceReport {
        results,
        passed,
        failed: total - passed,
        total,
    }
}

/// Small deterministic corpus every conformance test starts from.
pub fn fixture_corpus() -> Corpus {
    let generator = Generator::new(7, datetime!(2026-01-20 14:00 UTC));
    Corpus::generate(
        &generator,
        &CorpusSize {
            runs: 12,
            scenarios: 8,
            incidents: 10,
        },
    )
}

// ── Helpers ──────────────────────────────────────────────────────────────────

async fn fresh<S, F, Fut>(factory: &F) -> (S, Corpus)
where
    F: Fn(Corpus) -> Fut,
    Fut: Future<Output = S>,
{
    let corpus = fixture_corpus();
    (factory(corpus.clone()).await, corpus)
}

fn check(condition: bool, msg: impl FnOnce() -> String) -> Result<(), String> {
    if condition {
        Ok(())
    } else {
        Err(msg())
    }
}

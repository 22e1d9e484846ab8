//! Conformance test suite for `ParticipantStore` implementations.
//!
//! This module provides a backend-agnostic test suite that any
//! `ParticipantStore` implementation can run to verify correctness. The
//! suite covers:
//!
//! - **Filtering**: every terminal kind, connectives, course scoping,
//!   username ordering
//! - **Tags**: get-or-create idempotence, per-course identity, attach/detach
//! - **Snapshots**: committed writes visible, aborted and dropped writes
//!   discarded
//! - **Error handling**: correct error variants for invalid operations
//!
//! # Usage
//!
//! Backend crates call [`run_conformance_suite`] with a factory function that
//! creates a fresh, empty storage instance for each test:
//!
//! ```ignore
//! use roster_storage::conformance::run_conformance_suite;
//!
//! #[test]
//! fn sqlite_conformance() {
//!     let report = run_conformance_suite(|| SqliteStore::open_in_memory().unwrap());
//!     assert!(report.failed == 0, "{report}");
//! }
//! ```

mod error;
mod filter;
mod snapshot;
mod tags;

use std::fmt;

use crate::record::{NewParticipant, ParticipationStatus};
use crate::{ParticipantStore, StorageError};

/// Result of a single conformance test.
#[derive(Debug, Clone)]
pub struct TestResult {
    /// Test category (e.g. "filter", "snapshot", "tags").
    pub category: String,
    /// Test name (e.g. "tagged_selects_tag_holders").
    pub name: String,
    /// Whether the test passed.
    pub passed: bool,
    /// Error message if the test failed.
    pub message: Option<String>,
}

impl TestResult {
    fn from_result(category: &str, name: &str, result: Result<(), String>) -> Self {
        let (passed, message) = match result {
            Ok(()) => (true, None),
            Err(msg) => (false, Some(msg)),
        };
        Self {
            category: category.to_string(),
            name: name.to_string(),
            passed,
            message,
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

/// Signature shared by every conformance check.
type Check<S> = fn(&S) -> Result<(), String>;

fn run_category<S, F>(category: &str, factory: &F, checks: &[(&str, Check<S>)]) -> Vec<TestResult>
where
    S: ParticipantStore,
    F: Fn() -> S,
{
    checks
        .iter()
        .map(|(name, check)| {
            let store = factory();
            TestResult::from_result(category, name, check(&store))
        })
        .collect()
}

/// Run the full conformance suite against a storage backend.
///
/// The `factory` function is called once per test to create a fresh, empty
/// storage instance, ensuring test isolation.
pub fn run_conformance_suite<S, F>(factory: F) -> ConformanceReport
where
    S: ParticipantStore,
    F: Fn() -> S,
{
    let mut results = Vec::new();

    results.extend(run_category("filter", &factory, &filter::checks::<S>()));
    results.extend(run_category("tags", &factory, &tags::checks::<S>()));
    results.extend(run_category("snapshot", &factory, &snapshot::checks::<S>()));
    results.extend(run_category("error", &factory, &error::checks::<S>()));

    let passed = results.iter().filter(|r| r.passed).count();
    let total = results.len();

    ConformanceReport {
        results,
        passed,
        failed: total - passed,
        total,
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn se(e: StorageError) -> String {
    e.to_string()
}

fn ensure(cond: bool, msg: impl FnOnce() -> String) -> Result<(), String> {
    if cond {
        Ok(())
    } else {
        Err(msg())
    }
}

/// The three-member roster used by most checks, in course `cs101`, plus one
/// member of `cs102` who must never leak into `cs101` results.
///
/// - `ann`: active student, no tags, started `quiz` (in progress)
/// - `ben`: requested student, tagged `foo`, submitted `quiz`
/// - `cat`: active observer, tagged `foo`
fn seed<S: ParticipantStore>(store: &S) -> Result<(), String> {
    let mut snap = store.begin_snapshot().map_err(se)?;
    let people = [
        NewParticipant::new("cs101", 1, "ann", "Ann@Example.com")
            .with_status(ParticipationStatus::Active)
            .with_role("student")
            .with_session("quiz", true),
        NewParticipant::new("cs101", 2, "ben", "ben@example.com")
            .with_status(ParticipationStatus::Requested)
            .with_role("student")
            .with_tag("foo")
            .with_session("quiz", false),
        NewParticipant::new("cs101", 3, "cat", "cat@example.org")
            .with_status(ParticipationStatus::Active)
            .with_role("observer")
            .with_tag("foo"),
        NewParticipant::new("cs102", 1, "ann", "Ann@Example.com")
            .with_status(ParticipationStatus::Active)
            .with_role("student")
            .with_tag("foo")
            .with_session("quiz", false),
    ];
    for p in people {
        store.insert_participant(&mut snap, p).map_err(se)?;
    }
    store.commit_snapshot(snap).map_err(se)
}

/// Usernames in `cs101` matching `query`, in store order.
fn usernames<S: ParticipantStore>(store: &S, query: &str) -> Result<Vec<String>, String> {
    let predicate = roster_core::parse_query(query).map_err(|e| e.to_string())?;
    let mut snap = store.begin_snapshot().map_err(se)?;
    let matched = store
        .filter_participants(&mut snap, "cs101", &predicate)
        .map_err(se)?;
    store.abort_snapshot(snap).map_err(se)?;
    Ok(matched.into_iter().map(|p| p.username).collect())
}

fn expect_names<S: ParticipantStore>(store: &S, query: &str, expected: &[&str]) -> Result<(), String> {
    let got = usernames(store, query)?;
    ensure(got == expected, || {
        format!("'{}': expected {:?}, got {:?}", query, expected, got)
    })
}

//! roster-eval: executes query submissions against a participant store.
//!
//! A submission is raw multi-line query text plus a course. Each non-blank
//! line is compiled with `roster-core`; the line predicates are unioned and
//! the course's participants filtered, optionally followed by one
//! [`BulkOperation`] over the matches. All store work for a submission runs
//! in one snapshot.

pub mod compile;
pub mod error;
pub mod executor;
pub mod operation;

pub use compile::{compile_block, compile_lines, CompiledLine};
pub use error::ExecError;
pub use executor::{execute, QueryOutcome};
pub use operation::BulkOperation;

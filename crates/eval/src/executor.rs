//! Execution of a query submission against a participant store.

use roster_core::Predicate;
use roster_storage::{ParticipantRecord, ParticipantStore, StorageError};
use serde::Serialize;

use crate::compile::compile_block;
use crate::error::ExecError;
use crate::operation::BulkOperation;

/// What a submission produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum QueryOutcome {
    /// List mode: the matched participants, ordered by username.
    Matched { participants: Vec<ParticipantRecord> },
    /// A bulk operation was applied to `affected` participants.
    Applied {
        operation: BulkOperation,
        affected: usize,
    },
}

impl QueryOutcome {
    /// Number of participants the submission matched or mutated.
    pub fn count(&self) -> usize {
        match self {
            QueryOutcome::Matched { participants } => participants.len(),
            QueryOutcome::Applied { affected, .. } => *affected,
        }
    }
}

/// Run one submission: compile `text`, filter `course`, and optionally
/// apply `operation` to every match.
///
/// Every line is compiled before the store is touched, so a compile
/// failure has no side effects. The store work runs in a single snapshot:
/// tags referenced by `tagged:` terminals are get-or-created (also in list
/// mode), the union is filtered, the operation applied, and the snapshot
/// committed. Any store failure aborts the snapshot.
pub fn execute<S: ParticipantStore>(
    store: &S,
    course: &str,
    text: &str,
    operation: Option<&BulkOperation>,
) -> Result<QueryOutcome, ExecError> {
    let predicate = compile_block(text)?.ok_or(ExecError::EmptyQuery)?;

    let mut snapshot = store.begin_snapshot()?;
    match run(store, &mut snapshot, course, &predicate, operation) {
        Ok(outcome) => {
            store.commit_snapshot(snapshot)?;
            tracing::info!(
                course,
                count = outcome.count(),
                operation = operation.map(BulkOperation::selector),
                "query submission committed"
            );
            Ok(outcome)
        }
        Err(err) => {
            tracing::warn!(course, error = %err, "query submission rolled back");
            if let Err(abort) = store.abort_snapshot(snapshot) {
                tracing::warn!(error = %abort, "abort failed");
            }
            Err(err.into())
        }
    }
}

fn run<'a, S: ParticipantStore>(
    store: &'a S,
    snapshot: &mut S::Snapshot<'a>,
    course: &str,
    predicate: &Predicate,
    operation: Option<&BulkOperation>,
) -> Result<QueryOutcome, StorageError> {
    for name in predicate.tag_names() {
        let (_, created) = store.get_or_create_tag(snapshot, course, name)?;
        if created {
            tracing::debug!(course, tag = name, "created tag referenced by query");
        }
    }

    let matched = store.filter_participants(snapshot, course, predicate)?;
    tracing::debug!(course, matched = matched.len(), predicate = %predicate, "filtered participants");

    match operation {
        None => Ok(QueryOutcome::Matched {
            participants: matched,
        }),
        Some(op) => {
            let affected = op.apply(store, snapshot, course, &matched)?;
            Ok(QueryOutcome::Applied {
                operation: op.clone(),
                affected,
            })
        }
    }
}

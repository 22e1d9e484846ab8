//! Bulk operations applied to the participants a query matched.

use std::fmt;

use roster_storage::{ParticipantRecord, ParticipantStore, ParticipationStatus, StorageError};
use serde::Serialize;

use crate::error::ExecError;

/// A mutation applied to every matched participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "operation", content = "tag", rename_all = "snake_case")]
pub enum BulkOperation {
    /// Get-or-create the tag and attach it.
    ApplyTag(String),
    /// Detach the tag; a tag that does not exist is a no-op.
    RemoveTag(String),
    /// Set the participation status to `dropped`.
    Drop,
}

impl BulkOperation {
    /// Build an operation from its selector name and optional tag name.
    ///
    /// Selectors are `apply_tag`, `remove_tag` and `drop`. The tag is
    /// required, and must be non-empty, for the first two; `drop` ignores it.
    pub fn from_selector(selector: &str, tag: Option<&str>) -> Result<Self, ExecError> {
        let tag_name = || {
            tag.map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_owned)
                .ok_or_else(|| ExecError::MissingTag {
                    operation: selector.to_owned(),
                })
        };
        match selector {
            "apply_tag" => Ok(BulkOperation::ApplyTag(tag_name()?)),
            "remove_tag" => Ok(BulkOperation::RemoveTag(tag_name()?)),
            "drop" => Ok(BulkOperation::Drop),
            other => Err(ExecError::UnknownOperation(other.to_owned())),
        }
    }

    pub fn selector(&self) -> &'static str {
        match self {
            BulkOperation::ApplyTag(_) => "apply_tag",
            BulkOperation::RemoveTag(_) => "remove_tag",
            BulkOperation::Drop => "drop",
        }
    }

    /// Apply the operation to `matched` inside `snapshot`.
    ///
    /// Returns the number of affected participants, which is the number
    /// matched.
    pub(crate) fn apply<'a, S: ParticipantStore>(
        &self,
        store: &'a S,
        snapshot: &mut S::Snapshot<'a>,
        course: &str,
        matched: &[ParticipantRecord],
    ) -> Result<usize, StorageError> {
        match self {
            BulkOperation::ApplyTag(name) => {
                let (tag, _) = store.get_or_create_tag(snapshot, course, name)?;
                for p in matched {
                    store.add_tag(snapshot, p.id, &tag)?;
                }
            }
            BulkOperation::RemoveTag(name) => {
                if let Some(tag) = store.find_tag(snapshot, course, name)? {
                    for p in matched {
                        store.remove_tag(snapshot, p.id, &tag)?;
                    }
                }
            }
            BulkOperation::Drop => {
                for p in matched {
                    store.set_status(snapshot, p.id, ParticipationStatus::Dropped)?;
                }
            }
        }
        Ok(matched.len())
    }
}

impl fmt::Display for BulkOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BulkOperation::ApplyTag(tag) | BulkOperation::RemoveTag(tag) => {
                write!(f, "{} '{}'", self.selector(), tag)
            }
            BulkOperation::Drop => f.write_str("drop"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selectors_map_to_operations() {
        assert_eq!(
            BulkOperation::from_selector("apply_tag", Some("late")).unwrap(),
            BulkOperation::ApplyTag("late".into())
        );
        assert_eq!(
            BulkOperation::from_selector("remove_tag", Some(" late ")).unwrap(),
            BulkOperation::RemoveTag("late".into())
        );
        assert_eq!(
            BulkOperation::from_selector("drop", None).unwrap(),
            BulkOperation::Drop
        );
    }

    #[test]
    fn tag_operations_require_a_name() {
        for tag in [None, Some(""), Some("   ")] {
            let err = BulkOperation::from_selector("apply_tag", tag).unwrap_err();
            assert!(matches!(err, ExecError::MissingTag { ref operation } if operation == "apply_tag"));
        }
    }

    #[test]
    fn unknown_selector_is_rejected() {
        let err = BulkOperation::from_selector("delete", None).unwrap_err();
        assert_eq!(err.to_string(), "unknown operation 'delete'");
    }

    #[test]
    fn serializes_with_selector_name() {
        let json = serde_json::to_value(BulkOperation::ApplyTag("x".into())).unwrap();
        assert_eq!(json, serde_json::json!({"operation": "apply_tag", "tag": "x"}));
        let json = serde_json::to_value(BulkOperation::Drop).unwrap();
        assert_eq!(json, serde_json::json!({"operation": "drop"}));
    }
}

use roster_core::QueryError;
use roster_storage::StorageError;

/// Errors that can occur while executing a query submission.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    /// A line of the block failed to compile. `line` is 1-based.
    #[error("error in line {line}: {error}")]
    Line { line: usize, error: QueryError },

    /// The block contained no non-blank lines.
    #[error("query contains no non-blank lines")]
    EmptyQuery,

    /// A tag operation was selected without a tag name.
    #[error("operation '{operation}' requires a tag name")]
    MissingTag { operation: String },

    /// The operation selector named no known bulk operation.
    #[error("unknown operation '{0}'")]
    UnknownOperation(String),

    /// The participant store failed; the submission was rolled back.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ExecError {
    /// 1-based line number of a compile failure, if this is one.
    pub fn line(&self) -> Option<usize> {
        match self {
            ExecError::Line { line, .. } => Some(*line),
            _ => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            ExecError::Line { error, .. } => error.kind_name(),
            ExecError::EmptyQuery => "EmptyQuery",
            ExecError::MissingTag { .. } | ExecError::UnknownOperation(_) => "OperationError",
            ExecError::Storage(_) => "StoreError",
        }
    }

    /// Serialize to a JSON object. Compile failures carry `line` and
    /// `position`; other failures set both to null.
    pub fn to_json_value(&self) -> serde_json::Value {
        let position = match self {
            ExecError::Line { error, .. } => Some(error.position()),
            _ => None,
        };
        serde_json::json!({
            "kind":     self.kind_name(),
            "message":  self.to_string(),
            "line":     self.line(),
            "position": position,
        })
    }
}

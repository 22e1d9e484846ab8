use std::path::PathBuf;

use roster_core::QueryError;
use roster_eval::ExecError;
use roster_storage::StorageError;

/// Errors surfaced by `roster` subcommands.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("could not read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse '{}': {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("{0}")]
    Usage(String),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl CliError {
    pub(crate) fn kind_name(&self) -> &'static str {
        match self {
            CliError::Read { .. } | CliError::Parse { .. } => "InputError",
            CliError::Config(_) => "ConfigError",
            CliError::Usage(_) => "UsageError",
            CliError::Query(e) => e.kind_name(),
            CliError::Exec(e) => e.kind_name(),
            CliError::Storage(_) => "StoreError",
        }
    }

    pub(crate) fn to_json_value(&self) -> serde_json::Value {
        match self {
            CliError::Exec(e) => e.to_json_value(),
            CliError::Query(e) => e.to_json_value(),
            other => serde_json::json!({
                "kind":    other.kind_name(),
                "message": other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exec_errors_keep_their_json_shape() {
        let err = CliError::from(ExecError::EmptyQuery);
        let json = err.to_json_value();
        assert_eq!(json["kind"], "EmptyQuery");
        assert!(json.get("line").is_some());
    }

    #[test]
    fn config_error_json() {
        let json = CliError::Config("bad".into()).to_json_value();
        assert_eq!(
            json,
            serde_json::json!({"kind": "ConfigError", "message": "invalid configuration: bad"})
        );
    }
}

pub(crate) mod check;
pub(crate) mod import;
pub(crate) mod init;
pub(crate) mod lex;
pub(crate) mod query;

use std::io::Read;
use std::path::{Path, PathBuf};

use roster_storage::SqliteStore;

use crate::error::CliError;

/// Query text from `--file` (`-` for stdin) or from positional arguments,
/// one argument per line.
pub(crate) fn query_text(file: Option<&Path>, queries: &[String]) -> Result<String, CliError> {
    match (file, queries.is_empty()) {
        (Some(_), false) => Err(CliError::Usage(
            "pass either --file or query arguments, not both".into(),
        )),
        (Some(path), true) if path == Path::new("-") => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .map_err(|source| CliError::Read {
                    path: PathBuf::from("<stdin>"),
                    source,
                })?;
            Ok(text)
        }
        (Some(path), true) => std::fs::read_to_string(path).map_err(|source| CliError::Read {
            path: path.to_path_buf(),
            source,
        }),
        (None, _) => Ok(queries.join("\n")),
    }
}

/// Open the roster database, refusing to create one implicitly.
pub(crate) fn open_existing(database: &Path) -> Result<SqliteStore, CliError> {
    if !database.is_file() {
        return Err(CliError::Usage(format!(
            "database '{}' does not exist; run `roster init` first",
            database.display()
        )));
    }
    Ok(SqliteStore::open(database)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positional_queries_become_lines() {
        let text = query_text(None, &["role:student".into(), "tagged:foo".into()]).unwrap();
        assert_eq!(text, "role:student\ntagged:foo");
    }

    #[test]
    fn file_and_positional_conflict() {
        let err = query_text(Some(Path::new("q.txt")), &["id:1".into()]).unwrap_err();
        assert!(matches!(err, CliError::Usage(_)));
    }

    #[test]
    fn missing_database_is_a_usage_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = open_existing(&dir.path().join("absent.db")).unwrap_err();
        assert!(err.to_string().contains("roster init"), "{err}");
    }
}

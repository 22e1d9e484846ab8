use std::path::Path;

use roster_storage::{NewParticipant, ParticipantStore};

use crate::commands::open_existing;
use crate::error::CliError;
use crate::OutputFormat;

/// Load a JSON array of participants into the roster in one snapshot.
///
/// Any failure, including a duplicate enrollment, imports nothing.
pub(crate) fn cmd_import(
    database: &Path,
    file: &Path,
    output: OutputFormat,
    quiet: bool,
) -> Result<(), CliError> {
    let content = std::fs::read_to_string(file).map_err(|source| CliError::Read {
        path: file.to_path_buf(),
        source,
    })?;
    let participants: Vec<NewParticipant> =
        serde_json::from_str(&content).map_err(|e| CliError::Parse {
            path: file.to_path_buf(),
            message: e.to_string(),
        })?;

    let store = open_existing(database)?;
    let mut snapshot = store.begin_snapshot()?;
    let mut imported = 0usize;
    for participant in participants {
        if let Err(e) = store.insert_participant(&mut snapshot, participant) {
            store.abort_snapshot(snapshot)?;
            return Err(e.into());
        }
        imported += 1;
    }
    store.commit_snapshot(snapshot)?;
    tracing::info!(imported, file = %file.display(), "imported participants");

    if !quiet {
        match output {
            OutputFormat::Json => println!("{}", serde_json::json!({ "imported": imported })),
            OutputFormat::Text => println!("imported {} participant(s)", imported),
        }
    }
    Ok(())
}

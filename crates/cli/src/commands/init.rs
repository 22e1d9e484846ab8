use std::path::Path;

use roster_storage::SqliteStore;

use crate::error::CliError;
use crate::OutputFormat;

pub(crate) fn cmd_init(database: &Path, output: OutputFormat, quiet: bool) -> Result<(), CliError> {
    let existed = database.is_file();
    SqliteStore::open(database)?;
    tracing::info!(database = %database.display(), existed, "schema ensured");

    if quiet {
        return Ok(());
    }
    match output {
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({
                "database": database.display().to_string(),
                "created": !existed,
            })
        ),
        OutputFormat::Text if existed => {
            println!("database '{}' already initialized", database.display())
        }
        OutputFormat::Text => println!("initialized database '{}'", database.display()),
    }
    Ok(())
}

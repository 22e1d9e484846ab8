use std::path::Path;

use roster_eval::{execute, BulkOperation, QueryOutcome};
use roster_storage::ParticipantRecord;

use crate::commands::{open_existing, query_text};
use crate::error::CliError;
use crate::OutputFormat;

/// Options for [`cmd_query`].
pub(crate) struct QueryOptions<'a> {
    pub database: &'a Path,
    pub course: &'a str,
    pub file: Option<&'a Path>,
    pub queries: &'a [String],
    pub operation: Option<BulkOperation>,
    pub output: OutputFormat,
    pub quiet: bool,
}

pub(crate) fn cmd_query(opts: QueryOptions<'_>) -> Result<(), CliError> {
    let text = query_text(opts.file, opts.queries)?;
    let store = open_existing(opts.database)?;
    let outcome = execute(&store, opts.course, &text, opts.operation.as_ref())?;

    match opts.output {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&outcome)
                .unwrap_or_else(|e| format!("{{\"error\": \"serialization: {}\"}}", e));
            println!("{}", json);
        }
        OutputFormat::Text => match &outcome {
            QueryOutcome::Matched { participants } => {
                print_table(participants);
                if !opts.quiet {
                    println!("{} participant(s) matched", participants.len());
                }
            }
            QueryOutcome::Applied {
                operation,
                affected,
            } => {
                if !opts.quiet {
                    println!("applied {} to {} participant(s)", operation, affected);
                }
            }
        },
    }
    Ok(())
}

fn print_table(participants: &[ParticipantRecord]) {
    if participants.is_empty() {
        return;
    }
    let name_width = participants
        .iter()
        .map(|p| p.username.len())
        .max()
        .unwrap_or(0)
        .max("USERNAME".len());
    println!(
        "{:>8}  {:<name_width$}  {:<9}  {:<24}  TAGS",
        "USER", "USERNAME", "STATUS", "EMAIL"
    );
    for p in participants {
        let tags: Vec<&str> = p.tags.iter().map(String::as_str).collect();
        println!(
            "{:>8}  {:<name_width$}  {:<9}  {:<24}  {}",
            p.user_id,
            p.username,
            p.status.as_str(),
            p.email,
            tags.join(",")
        );
    }
}

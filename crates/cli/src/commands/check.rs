use std::path::Path;

use roster_core::Predicate;
use roster_eval::{compile_lines, ExecError};

use crate::commands::query_text;
use crate::error::CliError;
use crate::OutputFormat;

/// Compile a block without touching any store and print each line's
/// canonical form followed by the union.
pub(crate) fn cmd_check(
    file: Option<&Path>,
    queries: &[String],
    output: OutputFormat,
    quiet: bool,
) -> Result<(), CliError> {
    let text = query_text(file, queries)?;
    let lines = compile_lines(&text)?;
    let union = Predicate::any(lines.iter().map(|l| l.predicate.clone()))
        .ok_or(ExecError::EmptyQuery)?;

    if quiet {
        return Ok(());
    }
    match output {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "lines": lines
                    .iter()
                    .map(|l| serde_json::json!({
                        "line": l.line,
                        "text": l.text,
                        "canonical": l.predicate.to_string(),
                        "predicate": l.predicate,
                    }))
                    .collect::<Vec<_>>(),
                "canonical": union.to_string(),
                "tags": union.tag_names(),
            });
            println!("{}", json);
        }
        OutputFormat::Text => {
            for l in &lines {
                println!("line {}: {}", l.line, l.predicate);
            }
            println!("union: {}", union);
        }
    }
    Ok(())
}

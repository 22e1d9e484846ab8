use roster_core::{lex_table, significant_tokens};

use crate::error::CliError;
use crate::OutputFormat;

pub(crate) fn cmd_lex(query: &str, output: OutputFormat) -> Result<(), CliError> {
    let tokens = significant_tokens(query)?;
    match output {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&tokens)
                .unwrap_or_else(|e| format!("{{\"error\": \"serialization: {}\"}}", e));
            println!("{}", json);
        }
        OutputFormat::Text => {
            for token in &tokens {
                println!("{:>4}  {:<18}  {}", token.position, token.kind.as_str(), token.lexeme);
            }
        }
    }
    Ok(())
}

pub(crate) fn cmd_table(output: OutputFormat) -> Result<(), CliError> {
    let rules = lex_table()?;
    match output {
        OutputFormat::Json => {
            let rows: Vec<_> = rules
                .iter()
                .map(|r| serde_json::json!({ "kind": r.kind, "pattern": r.pattern }))
                .collect();
            println!("{}", serde_json::Value::Array(rows));
        }
        OutputFormat::Text => {
            for (i, rule) in rules.iter().enumerate() {
                println!("{:>2}  {:<18}  {}", i + 1, rule.kind.as_str(), rule.pattern);
            }
        }
    }
    Ok(())
}

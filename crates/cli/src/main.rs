mod commands;
mod config;
mod error;
mod logging;

use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand, ValueEnum};
use roster_eval::BulkOperation;
use serde::Deserialize;

use crate::commands::query::QueryOptions;
use crate::config::{LogLevel, Overrides, RosterConfig};
use crate::error::CliError;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Filter course rosters with the participant query language.
#[derive(Parser)]
#[command(
    name = "roster",
    version,
    about = "Filter course rosters and apply bulk actions"
)]
struct Cli {
    /// Output format (text or json) [default: text]
    #[arg(long, global = true, value_enum)]
    output: Option<OutputFormat>,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Path to a TOML config file [default: ./roster.toml when present]
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level written to stderr [default: warn]
    #[arg(long, global = true, value_enum)]
    log_level: Option<LogLevel>,

    /// Path to the SQLite roster database [default: roster.db]
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Query text, from a file or from the command line.
#[derive(Args)]
struct QueryInput {
    /// Read the query block from a file (`-` for stdin)
    #[arg(long, short = 'f')]
    file: Option<PathBuf>,

    /// Query lines; each argument is one line of the block
    #[arg(value_name = "QUERY")]
    queries: Vec<String>,
}

#[derive(Args)]
#[group(multiple = false)]
struct OperationArgs {
    /// Attach this tag to every matched participant (creating it if needed)
    #[arg(long, value_name = "TAG")]
    apply_tag: Option<String>,

    /// Detach this tag from every matched participant
    #[arg(long, value_name = "TAG")]
    remove_tag: Option<String>,

    /// Set every matched participant's status to dropped
    #[arg(long)]
    drop: bool,
}

impl OperationArgs {
    fn to_operation(&self) -> Result<Option<BulkOperation>, CliError> {
        let op = if let Some(tag) = &self.apply_tag {
            Some(BulkOperation::from_selector("apply_tag", Some(tag))?)
        } else if let Some(tag) = &self.remove_tag {
            Some(BulkOperation::from_selector("remove_tag", Some(tag))?)
        } else if self.drop {
            Some(BulkOperation::Drop)
        } else {
            None
        };
        Ok(op)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create the roster database schema
    Init,

    /// Import participants from a JSON array of records
    Import {
        /// Path to the participants JSON file
        file: PathBuf,
    },

    /// List participants matching a query, or apply a bulk action to them
    Query {
        /// Course to query [default: from config]
        #[arg(long)]
        course: Option<String>,
        #[command(flatten)]
        input: QueryInput,
        #[command(flatten)]
        operation: OperationArgs,
    },

    /// Compile a query block and print its canonical form
    Check {
        #[command(flatten)]
        input: QueryInput,
    },

    /// Print the significant tokens of one query line
    Lex {
        /// The query line to tokenize
        #[arg(required_unless_present = "table")]
        query: Option<String>,
        /// Print the lexer rule table instead, in match-priority order
        #[arg(long, conflicts_with = "query")]
        table: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let overrides = Overrides {
        database: cli.database.clone(),
        log_level: cli.log_level,
        output: cli.output,
    };
    let config = match RosterConfig::load(cli.config.as_deref(), overrides) {
        Ok(c) => c,
        Err(e) => {
            report_error(&e, cli.output.unwrap_or(OutputFormat::Text), cli.quiet);
            process::exit(1);
        }
    };
    logging::init_logging(config.log_level);

    if let Err(e) = run(cli.command, &config, cli.quiet) {
        report_error(&e, config.output, cli.quiet);
        process::exit(1);
    }
}

fn run(command: Commands, config: &RosterConfig, quiet: bool) -> Result<(), CliError> {
    let output = config.output;
    match command {
        Commands::Init => commands::init::cmd_init(&config.database, output, quiet),
        Commands::Import { file } => {
            commands::import::cmd_import(&config.database, &file, output, quiet)
        }
        Commands::Query {
            course,
            input,
            operation,
        } => {
            let course = config.course(course.as_deref())?;
            commands::query::cmd_query(QueryOptions {
                database: &config.database,
                course: &course,
                file: input.file.as_deref(),
                queries: &input.queries,
                operation: operation.to_operation()?,
                output,
                quiet,
            })
        }
        Commands::Check { input } => {
            commands::check::cmd_check(input.file.as_deref(), &input.queries, output, quiet)
        }
        Commands::Lex { table: true, .. } => commands::lex::cmd_table(output),
        Commands::Lex { query, .. } => {
            commands::lex::cmd_lex(query.as_deref().unwrap_or_default(), output)
        }
    }
}

/// Print `err` to stderr in the configured output format.
///
/// JSON errors are always printed; `--quiet` only silences text errors.
fn report_error(err: &CliError, output: OutputFormat, quiet: bool) {
    match output {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&err.to_json_value())
                .unwrap_or_else(|_| format!("{{\"error\": \"{:?}\"}}", err));
            eprintln!("{}", json);
        }
        OutputFormat::Text => {
            if !quiet {
                eprintln!("{}", err);
            }
        }
    }
}

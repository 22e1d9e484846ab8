//! Configuration for the `roster` CLI.
//!
//! Settings are layered, lowest precedence first:
//!
//! 1. Built-in defaults
//! 2. A TOML file: `--config <path>`, else `roster.toml` in the working
//!    directory when present
//! 3. Environment variables `ROSTER_DATABASE`, `ROSTER_COURSE`,
//!    `ROSTER_LOG_LEVEL`
//! 4. Command-line flags
//!
//! # Example
//!
//! ```toml
//! database = "roster.db"
//! course = "cs101"
//! log_level = "info"
//! output = "json"
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

use crate::error::CliError;
use crate::OutputFormat;

/// File looked up in the working directory when `--config` is absent.
pub(crate) const DEFAULT_CONFIG_FILE: &str = "roster.toml";

const DEFAULT_DATABASE: &str = "roster.db";

/// Log level matching the `tracing` levels. Defaults to `Warn`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub(crate) enum LogLevel {
    Trace,
    Debug,
    Info,
    #[default]
    Warn,
    Error,
}

impl FromStr for LogLevel {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(CliError::Config(format!(
                "unknown log level '{s}', expected one of: trace, debug, info, warn, error"
            ))),
        }
    }
}

impl LogLevel {
    /// Convert to a tracing filter directive string.
    pub(crate) fn as_filter_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Keys accepted in the TOML file. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    database: Option<PathBuf>,
    course: Option<String>,
    log_level: Option<LogLevel>,
    output: Option<OutputFormat>,
}

/// Effective configuration after all layers are applied.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RosterConfig {
    pub database: PathBuf,
    pub course: Option<String>,
    pub log_level: LogLevel,
    pub output: OutputFormat,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from(DEFAULT_DATABASE),
            course: None,
            log_level: LogLevel::default(),
            output: OutputFormat::Text,
        }
    }
}

/// Flag values that take precedence over file and environment.
#[derive(Debug, Default)]
pub(crate) struct Overrides {
    pub database: Option<PathBuf>,
    pub log_level: Option<LogLevel>,
    pub output: Option<OutputFormat>,
}

impl RosterConfig {
    /// Build the effective configuration from every layer.
    pub(crate) fn load(config_path: Option<&Path>, overrides: Overrides) -> Result<Self, CliError> {
        let config = match config_path {
            Some(path) => Self::default().merge_file(path)?,
            None => {
                let implicit = Path::new(DEFAULT_CONFIG_FILE);
                if implicit.is_file() {
                    Self::default().merge_file(implicit)?
                } else {
                    Self::default()
                }
            }
        };
        Ok(config
            .merge_env(|key| std::env::var(key).ok())?
            .apply_overrides(overrides))
    }

    fn merge_file(self, path: &Path) -> Result<Self, CliError> {
        let content = std::fs::read_to_string(path).map_err(|source| CliError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        self.merge_toml(&content).map_err(|message| CliError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }

    fn merge_toml(mut self, content: &str) -> Result<Self, String> {
        let file: FileConfig = toml::from_str(content).map_err(|e| e.to_string())?;
        if let Some(database) = file.database {
            self.database = database;
        }
        if file.course.is_some() {
            self.course = file.course;
        }
        if let Some(level) = file.log_level {
            self.log_level = level;
        }
        if let Some(output) = file.output {
            self.output = output;
        }
        Ok(self)
    }

    /// Apply `ROSTER_*` variables, read through `lookup`.
    fn merge_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CliError> {
        if let Some(database) = lookup("ROSTER_DATABASE") {
            self.database = PathBuf::from(database);
        }
        if let Some(course) = lookup("ROSTER_COURSE") {
            self.course = Some(course);
        }
        if let Some(level) = lookup("ROSTER_LOG_LEVEL") {
            self.log_level = level.parse()?;
        }
        Ok(self)
    }

    fn apply_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(database) = overrides.database {
            self.database = database;
        }
        if let Some(level) = overrides.log_level {
            self.log_level = level;
        }
        if let Some(output) = overrides.output {
            self.output = output;
        }
        self
    }

    /// The course to query: the flag if given, else the configured one.
    pub(crate) fn course(&self, flag: Option<&str>) -> Result<String, CliError> {
        flag.map(str::to_owned)
            .or_else(|| self.course.clone())
            .ok_or_else(|| {
                CliError::Usage(
                    "no course given; pass --course, set ROSTER_COURSE, or add `course` to roster.toml"
                        .into(),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = RosterConfig::default();
        assert_eq!(config.database, PathBuf::from("roster.db"));
        assert_eq!(config.course, None);
        assert_eq!(config.log_level, LogLevel::Warn);
        assert_eq!(config.output, OutputFormat::Text);
    }

    #[test]
    fn toml_keys_are_applied() {
        let config = RosterConfig::default()
            .merge_toml(
                "database = \"data/r.db\"\ncourse = \"cs101\"\nlog_level = \"debug\"\noutput = \"json\"\n",
            )
            .unwrap();
        assert_eq!(config.database, PathBuf::from("data/r.db"));
        assert_eq!(config.course.as_deref(), Some("cs101"));
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.output, OutputFormat::Json);
    }

    #[test]
    fn unknown_toml_key_is_rejected() {
        let err = RosterConfig::default().merge_toml("colour = true").unwrap_err();
        assert!(err.contains("colour"), "{err}");
    }

    #[test]
    fn env_overrides_file() {
        let config = RosterConfig::default()
            .merge_toml("course = \"cs101\"\nlog_level = \"error\"")
            .unwrap()
            .merge_env(env(&[("ROSTER_COURSE", "cs202"), ("ROSTER_LOG_LEVEL", "INFO")]))
            .unwrap();
        assert_eq!(config.course.as_deref(), Some("cs202"));
        assert_eq!(config.log_level, LogLevel::Info);
    }

    #[test]
    fn invalid_env_log_level_is_an_error() {
        let err = RosterConfig::default()
            .merge_env(env(&[("ROSTER_LOG_LEVEL", "loud")]))
            .unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }

    #[test]
    fn flags_override_everything() {
        let config = RosterConfig::default()
            .merge_env(env(&[("ROSTER_DATABASE", "env.db")]))
            .unwrap()
            .apply_overrides(Overrides {
                database: Some(PathBuf::from("flag.db")),
                log_level: Some(LogLevel::Trace),
                output: None,
            });
        assert_eq!(config.database, PathBuf::from("flag.db"));
        assert_eq!(config.log_level, LogLevel::Trace);
        assert_eq!(config.output, OutputFormat::Text);
    }

    #[test]
    fn course_flag_wins_over_config() {
        let config = RosterConfig {
            course: Some("cs101".into()),
            ..RosterConfig::default()
        };
        assert_eq!(config.course(Some("cs999")).unwrap(), "cs999");
        assert_eq!(config.course(None).unwrap(), "cs101");
        assert!(RosterConfig::default().course(None).is_err());
    }
}

//! Generator configuration: output path, the three metadata queries and
//! what to do when one of them fails.

use crate::error::{Result, VersionError};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

pub const DEFAULT_OUTPUT: &str = "version.hpp";
pub const DEFAULT_PLACEHOLDER: &str = "unknown";

/// One external command line: program followed by its arguments.
/// Executed directly, never through a shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryCommand(pub Vec<String>);

impl QueryCommand {
    pub fn new<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        QueryCommand(argv.into_iter().map(Into::into).collect())
    }

    pub fn program(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    pub fn args(&self) -> &[String] {
        self.0.get(1..).unwrap_or_default()
    }
}

impl fmt::Display for QueryCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(" "))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueryCommands {
    /// short-format date of the latest commit
    pub date: QueryCommand,
    /// full hash of the latest commit
    pub hash: QueryCommand,
    /// author name of the latest commit
    pub name: QueryCommand,
}

impl Default for QueryCommands {
    fn default() -> Self {
        QueryCommands {
            date: QueryCommand::new(["git", "log", "-1", "--date=short", "--pretty=format:%cd"]),
            hash: QueryCommand::new(["git", "rev-parse", "HEAD"]),
            name: QueryCommand::new(["git", "log", "-1", "--pretty=format:%an"]),
        }
    }
}

/// What happens to a field whose query could not be run or exited non-zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum QueryFailurePolicy {
    /// abort the run, nothing is written
    #[default]
    Fail,
    /// embed the configured placeholder instead
    Placeholder,
    /// embed whatever the query printed, even if it failed
    Passthrough,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    pub output: PathBuf,
    pub workdir: Option<PathBuf>,
    pub queries: QueryCommands,
    pub on_query_failure: QueryFailurePolicy,
    pub placeholder: String,
    pub escape_quotes: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            output: PathBuf::from(DEFAULT_OUTPUT),
            workdir: None,
            queries: QueryCommands::default(),
            on_query_failure: QueryFailurePolicy::default(),
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            escape_quotes: true,
        }
    }
}

impl GeneratorConfig {
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| VersionError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: GeneratorConfig =
            serde_yaml::from_reader(BufReader::new(file)).map_err(|source| {
                VersionError::Config {
                    path: path.to_path_buf(),
                    source,
                }
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Every query needs at least a program to run.
    pub fn validate(&self) -> Result<()> {
        for (field, command) in [
            ("date", &self.queries.date),
            ("hash", &self.queries.hash),
            ("name", &self.queries.name),
        ] {
            match command.program() {
                Some(program) if !program.trim().is_empty() => {}
                _ => {
                    return Err(VersionError::InvalidQuery(format!(
                        "{} query has no program",
                        field
                    )))
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_queries() {
        let queries = QueryCommands::default();
        assert_eq!(queries.hash.to_string(), "git rev-parse HEAD");
        assert_eq!(queries.date.program(), Some("git"));
        assert_eq!(
            queries.name.args(),
            &["log".to_string(), "-1".to_string(), "--pretty=format:%an".to_string()]
        );
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = GeneratorConfig::default();
        assert_eq!(config.output, PathBuf::from("version.hpp"));
        assert_eq!(config.on_query_failure, QueryFailurePolicy::Fail);
        assert_eq!(config.placeholder, "unknown");
        assert!(config.escape_quotes);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
output: include/version.hpp
on_query_failure: placeholder
queries:
  hash: [hg, id, -i]
"#;
        let config: GeneratorConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.output, PathBuf::from("include/version.hpp"));
        assert_eq!(config.on_query_failure, QueryFailurePolicy::Placeholder);
        assert_eq!(config.queries.hash, QueryCommand::new(["hg", "id", "-i"]));
        assert_eq!(config.queries.date, QueryCommands::default().date);
        assert_eq!(config.placeholder, "unknown");
    }

    #[test]
    fn test_unknown_key_rejected() {
        let yaml = "outptu: version.hpp\n";
        assert!(serde_yaml::from_str::<GeneratorConfig>(yaml).is_err());
    }

    #[test]
    fn test_empty_query_rejected() {
        let mut config = GeneratorConfig::default();
        config.queries.name = QueryCommand(vec![]);
        let err = config.validate().unwrap_err();
        assert!(matches!(err, VersionError::InvalidQuery(_)));
        assert!(err.to_string().contains("name"));
    }

    #[test]
    fn test_from_yaml_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("version.yaml");
        let mut file = File::create(&path).unwrap();
        file.write_all(b"escape_quotes: false\nplaceholder: n/a\n").unwrap();

        let config = GeneratorConfig::from_yaml_file(&path).unwrap();
        assert!(!config.escape_quotes);
        assert_eq!(config.placeholder, "n/a");
    }

    #[test]
    fn test_from_yaml_file_rejects_empty_query() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("version.yaml");
        std::fs::write(&path, "queries:\n  date: []\n").unwrap();

        assert!(matches!(
            GeneratorConfig::from_yaml_file(&path),
            Err(VersionError::InvalidQuery(_))
        ));
    }

    #[test]
    fn test_missing_config_file() {
        let err = GeneratorConfig::from_yaml_file("/nonexistent/version.yaml").unwrap_err();
        assert!(matches!(err, VersionError::ConfigRead { .. }));
    }
}

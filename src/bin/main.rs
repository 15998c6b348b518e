use anyhow::{Context, Result};
use clap::Parser;
use log::debug;
use placer_version::config::{GeneratorConfig, QueryFailurePolicy};
use std::path::PathBuf;

/// Generate version.hpp from the latest git commit
#[derive(Parser)]
#[command(author, version = env!("PLACER_VERSION_GIT"), about, long_about = None)]
struct Cli {
    /// Header file to generate
    #[arg(short, long, env = "PLACER_VERSION_OUTPUT")]
    output: Option<PathBuf>,

    /// YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run the git queries inside this directory
    #[arg(short = 'C', long)]
    repo: Option<PathBuf>,

    /// What to do when a git query fails
    #[arg(long, value_enum)]
    on_query_failure: Option<QueryFailurePolicy>,

    /// Value embedded for a failed query with `--on-query-failure placeholder`
    #[arg(long)]
    placeholder: Option<String>,

    /// Do not escape quotes and backslashes in the embedded values
    #[arg(long)]
    no_escape: bool,

    /// Print the embedded metadata as JSON
    #[arg(long)]
    print: bool,
}

impl Cli {
    fn into_config(self) -> Result<(GeneratorConfig, bool)> {
        let mut config = match &self.config {
            Some(path) => GeneratorConfig::from_yaml_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => GeneratorConfig::default(),
        };

        if let Some(output) = self.output {
            config.output = output;
        }
        if let Some(repo) = self.repo {
            config.workdir = Some(repo);
        }
        if let Some(policy) = self.on_query_failure {
            config.on_query_failure = policy;
        }
        if let Some(placeholder) = self.placeholder {
            config.placeholder = placeholder;
        }
        if self.no_escape {
            config.escape_quotes = false;
        }
        Ok((config, self.print))
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let (config, print) = Cli::parse().into_config()?;
    debug!("{:?}", config);

    let info = placer_version::run_with_git(&config)
        .with_context(|| format!("generating {}", config.output.display()))?;

    if print {
        println!("{}", serde_json::to_string_pretty(&info)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use placer_version::generator::VersionInfo;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["placer-version"]);
        let (config, print) = cli.into_config().unwrap();
        assert_eq!(config, GeneratorConfig::default());
        assert!(!print);
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::parse_from([
            "placer-version",
            "-o",
            "gen/version.hpp",
            "-C",
            "../repo",
            "--on-query-failure",
            "placeholder",
            "--placeholder",
            "n/a",
            "--no-escape",
            "--print",
        ]);
        let (config, print) = cli.into_config().unwrap();
        assert_eq!(config.output, PathBuf::from("gen/version.hpp"));
        assert_eq!(config.workdir, Some(PathBuf::from("../repo")));
        assert_eq!(config.on_query_failure, QueryFailurePolicy::Placeholder);
        assert_eq!(config.placeholder, "n/a");
        assert!(!config.escape_quotes);
        assert!(print);
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("version.yaml");
        std::fs::write(
            &path,
            "placeholder: a\nescape_quotes: false\noutput: from_file.hpp\n",
        )
        .unwrap();

        let cli = Cli::parse_from([
            "placer-version",
            "-c",
            path.to_str().unwrap(),
            "--placeholder",
            "b",
        ]);
        let (config, _) = cli.into_config().unwrap();
        assert_eq!(config.placeholder, "b");
        assert!(!config.escape_quotes);
        assert_eq!(config.on_query_failure, QueryFailurePolicy::Fail);
        if std::env::var_os("PLACER_VERSION_OUTPUT").is_none() {
            assert_eq!(config.output, PathBuf::from("from_file.hpp"));
        }
    }

    #[test]
    fn test_bad_config_file() {
        let cli = Cli::parse_from(["placer-version", "-c", "/nonexistent/version.yaml"]);
        let err = cli.into_config().unwrap_err();
        assert!(err.to_string().contains("/nonexistent/version.yaml"));
    }

    #[test]
    fn test_print_json() {
        let info = VersionInfo {
            commit_hash: "abc123".to_string(),
            commit_date: "2020-05-18".to_string(),
            author_name: "Jane Doe".to_string(),
        };
        let printed = serde_json::to_string_pretty(&info).unwrap();
        let value: serde_json::Value = serde_json::from_str(&printed).unwrap();
        assert_eq!(value["commit_hash"], "abc123");
        assert_eq!(value["commit_date"], "2020-05-18");
        assert_eq!(value["author_name"], "Jane Doe");
    }

    #[test]
    fn test_policy_values() {
        for (arg, policy) in [
            ("fail", QueryFailurePolicy::Fail),
            ("placeholder", QueryFailurePolicy::Placeholder),
            ("passthrough", QueryFailurePolicy::Passthrough),
        ] {
            let cli = Cli::parse_from(["placer-version", "--on-query-failure", arg]);
            assert_eq!(cli.on_query_failure, Some(policy));
        }
        assert!(Cli::try_parse_from(["placer-version", "--on-query-failure", "ignore"]).is_err());
    }
}

use crate::config::{QueryCommand, QueryCommands, QueryFailurePolicy};
use crate::error::{Result, VersionError};
use lazy_static::lazy_static;
use log::{debug, warn};
use regex::Regex;
use std::path::PathBuf;
use std::process::Command;

lazy_static! {
    static ref COMMIT_HASH: Regex = Regex::new(r"^[0-9a-f]{7,64}\n?$").unwrap();
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    /// exit code, `None` when killed by a signal
    pub code: Option<i32>,
}

impl QueryOutput {
    pub fn ok(stdout: &str) -> Self {
        QueryOutput {
            stdout: stdout.to_string(),
            success: true,
            code: Some(0),
            ..Default::default()
        }
    }
}

/// Runs a single metadata query to completion.
pub trait QueryRunner {
    fn run(&self, command: &QueryCommand) -> Result<QueryOutput>;
}

/// Spawns the query as a subprocess, optionally inside `workdir`.
#[derive(Debug, Clone, Default)]
pub struct GitCli {
    pub workdir: Option<PathBuf>,
}

impl GitCli {
    pub fn new(workdir: Option<PathBuf>) -> Self {
        GitCli { workdir }
    }
}

impl QueryRunner for GitCli {
    fn run(&self, command: &QueryCommand) -> Result<QueryOutput> {
        let program = command
            .program()
            .ok_or_else(|| VersionError::InvalidQuery("empty command line".to_string()))?;

        let mut cmd = Command::new(program);
        cmd.args(command.args());
        if let Some(dir) = &self.workdir {
            cmd.current_dir(dir);
        }

        let output = cmd.output().map_err(|source| VersionError::Spawn {
            command: command.to_string(),
            source,
        })?;

        Ok(QueryOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            success: output.status.success(),
            code: output.status.code(),
        })
    }
}

/// Raw query results, before the generator trims anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawMetadata {
    pub date: String,
    pub hash: String,
    pub name: String,
}

fn query_field(
    runner: &dyn QueryRunner,
    field: &str,
    command: &QueryCommand,
    policy: QueryFailurePolicy,
    placeholder: &str,
) -> Result<String> {
    debug!("{} query: {}", field, command);

    let failure = match runner.run(command) {
        Ok(output) if output.success => {
            debug!("{} = {:?}", field, output.stdout);
            return Ok(output.stdout);
        }
        Ok(output) => {
            let stdout = output.stdout.clone();
            (
                VersionError::QueryFailed {
                    command: command.to_string(),
                    code: output.code,
                    stderr: output.stderr.trim().to_string(),
                },
                stdout,
            )
        }
        Err(e @ VersionError::Spawn { .. }) => (e, String::new()),
        Err(e) => return Err(e),
    };

    let (err, stdout) = failure;
    match policy {
        QueryFailurePolicy::Fail => Err(err),
        QueryFailurePolicy::Placeholder => {
            warn!("{}, using {:?} for {}", err, placeholder, field);
            Ok(placeholder.to_string())
        }
        QueryFailurePolicy::Passthrough => {
            warn!("{}, embedding its output for {} anyway", err, field);
            Ok(stdout)
        }
    }
}

/// Issues the date, hash and name queries in that order.
pub fn acquire(
    runner: &dyn QueryRunner,
    queries: &QueryCommands,
    policy: QueryFailurePolicy,
    placeholder: &str,
) -> Result<RawMetadata> {
    let date = query_field(runner, "date", &queries.date, policy, placeholder)?;
    let hash = query_field(runner, "hash", &queries.hash, policy, placeholder)?;
    let name = query_field(runner, "name", &queries.name, policy, placeholder)?;

    if !COMMIT_HASH.is_match(&hash) {
        warn!("{:?} does not look like a commit hash", hash);
    }

    Ok(RawMetadata { date, hash, name })
}

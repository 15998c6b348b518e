use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VersionError {
    #[error("can not start query `{command}`")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("query `{command}` exited with {}: {stderr}", exit_code(.code))]
    QueryFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
    #[error("invalid query command: {0}")]
    InvalidQuery(String),
    #[error("can not read config file {path:?}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config file {path:?}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("template error")]
    Template(#[from] minijinja::Error),
    #[error("can not write {path:?}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn exit_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "no status (killed by signal)".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, VersionError>;

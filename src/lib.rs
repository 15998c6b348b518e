//! Extracts the latest commit's hash, date and author from git and writes
//! them into a generated C++ header (`version.hpp`).

pub mod config;
pub mod error;
pub mod generator;
pub mod utils;

use config::GeneratorConfig;
use error::Result;
use generator::{VersionFileGenerator, VersionInfo};
use log::debug;
use utils::git::{self, GitCli, QueryRunner};

/// acquire → configure → generate, once.
pub fn run(config: &GeneratorConfig, runner: &dyn QueryRunner) -> Result<VersionInfo> {
    config.validate()?;

    let raw = git::acquire(
        runner,
        &config.queries,
        config.on_query_failure,
        &config.placeholder,
    )?;
    debug!("raw metadata: {:?}", raw);

    let mut generator = VersionFileGenerator::new(config.escape_quotes);
    generator.configure(&raw.date, &raw.name, &raw.hash);
    generator.generate(&config.output)?;

    Ok(generator.info().clone())
}

pub fn run_with_git(config: &GeneratorConfig) -> Result<VersionInfo> {
    run(config, &GitCli::new(config.workdir.clone()))
}

use crate::error::{Result, VersionError};
use log::{debug, info};
use minijinja::{context, Environment};
use serde::Serialize;
use std::borrow::Cow;
use std::fs::{self, File};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

static VERSION_TEMPLATE: &str = r#"#ifndef PLACER_VERSION_HPP
#define PLACER_VERSION_HPP
/*
 * Generated File! Do not modify!
*/

#include <string>

namespace Placer {

std::string const GIT_HASH="{{ hash }}";
std::string const GIT_DATE="{{ date }}";
std::string const GIT_NAME="{{ name }}";

}

#endif /*PLACER_VERSION_HPP*/

"#;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VersionInfo {
    pub commit_hash: String,
    pub commit_date: String,
    pub author_name: String,
}

/// Renders `version.hpp` from one commit's metadata.
#[derive(Debug, Clone)]
pub struct VersionFileGenerator {
    info: VersionInfo,
    escape_quotes: bool,
}

impl Default for VersionFileGenerator {
    fn default() -> Self {
        VersionFileGenerator {
            info: VersionInfo::default(),
            escape_quotes: true,
        }
    }
}

/// Escapes `"` and `\` so the value stays one C++ string literal.
pub fn escape_cpp_string(value: &str) -> Cow<'_, str> {
    if !value.contains(['"', '\\']) {
        return Cow::Borrowed(value);
    }
    let mut escaped = String::with_capacity(value.len() + 2);
    for c in value.chars() {
        if c == '"' || c == '\\' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    Cow::Owned(escaped)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// A symlinked output is written through, so the tmp file and the rename
/// land next to the file the link points to.
fn resolve_target(path: &Path) -> PathBuf {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_symlink() => fs::canonicalize(path).unwrap_or_else(|_| {
            // dangling link: create the file it names
            match fs::read_link(path) {
                Ok(target) if target.is_relative() => path
                    .parent()
                    .map(|dir| dir.join(&target))
                    .unwrap_or(target),
                Ok(target) => target,
                Err(_) => path.to_path_buf(),
            }
        }),
        _ => path.to_path_buf(),
    }
}

impl VersionFileGenerator {
    pub fn new(escape_quotes: bool) -> Self {
        VersionFileGenerator {
            escape_quotes,
            ..Default::default()
        }
    }

    /// Stores the three values as given, except that one trailing newline
    /// is dropped from the hash. Date and name keep trailing whitespace.
    pub fn configure(&mut self, commit_date: &str, author_name: &str, commit_hash: &str) {
        self.info = VersionInfo {
            commit_hash: commit_hash
                .strip_suffix('\n')
                .unwrap_or(commit_hash)
                .to_string(),
            commit_date: commit_date.to_string(),
            author_name: author_name.to_string(),
        };
    }

    pub fn info(&self) -> &VersionInfo {
        &self.info
    }

    pub fn render(&self) -> Result<String> {
        let quote = |value: &str| -> String {
            if self.escape_quotes {
                escape_cpp_string(value).into_owned()
            } else {
                value.to_string()
            }
        };

        let mut env = Environment::new();
        env.set_keep_trailing_newline(true);
        env.add_template("version", VERSION_TEMPLATE)?;
        let rendered = env.get_template("version")?.render(context!(
            hash => quote(&self.info.commit_hash),
            date => quote(&self.info.commit_date),
            name => quote(&self.info.author_name)
        ))?;
        Ok(rendered)
    }

    /// Writes the header to `<path>.tmp` and renames it over `path`, so the
    /// target is either the old file or the complete new one. A read-only
    /// existing header is refused rather than replaced.
    pub fn generate<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = self.render()?;
        let target = resolve_target(path);
        let tmp = temp_path(&target);
        let write_err = |source: io::Error| VersionError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Ok(meta) = fs::metadata(&target) {
            if meta.permissions().readonly() {
                return Err(write_err(io::Error::new(
                    ErrorKind::PermissionDenied,
                    "output file is read-only",
                )));
            }
        }

        let written = File::create(&tmp).and_then(|mut file| {
            file.write_all(content.as_bytes())?;
            file.sync_all()
        });
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp);
            return Err(write_err(e));
        }
        debug!("wrote {} bytes to {:?}", content.len(), tmp);

        if let Err(e) = fs::rename(&tmp, &target) {
            let _ = fs::remove_file(&tmp);
            return Err(write_err(e));
        }
        info!("generated {:?}", target);
        Ok(())
    }
}

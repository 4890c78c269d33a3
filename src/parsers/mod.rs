use crate::version::SemVer;
use anyhow::{Context, Result};
use log::{debug, info};
use std::io::Write;
use std::path::Path;
use thiserror::Error;

pub mod assignment_parser;
pub mod pyproject_parser;

#[derive(Debug, Error)]
pub enum ParsingError {
    #[error("No version found in: {0}")]
    NoVersionFound(String),
}

/// A file format that carries a project version.
pub trait Parser {
    /// Conventional file name of this format in a project root.
    const FILE_NAME: &'static str;

    /// Returns the raw version text stored in `contents`, if any.
    fn find_version(contents: &str) -> Result<Option<String>>;

    /// Returns `contents` with the stored version replaced by `version`, or
    /// `None` when `contents` has no place to put it.
    fn replace_version(contents: &str, version: &SemVer) -> Result<Option<String>>;

    fn get_current_version(path: impl AsRef<Path>) -> Result<SemVer> {
        let path = path.as_ref();
        let not_found = || ParsingError::NoVersionFound(path.display().to_string());
        if !path.is_file() {
            return Err(not_found().into());
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read '{}'", path.display()))?;
        let text = Self::find_version(&contents)
            .with_context(|| format!("Failed to parse '{}'", path.display()))?
            .ok_or_else(not_found)?;
        debug!("Found current version {} in '{}'", text, path.display());
        SemVer::parse(&text).with_context(|| format!("Unusable version in '{}'", path.display()))
    }

    /// Computes the new contents of `path` without touching the file.
    ///
    /// Yields `None` when there is nothing to write: the file has no version
    /// to replace, or it already holds `version` and `canonicalize` is off.
    fn plan_update(path: impl AsRef<Path>, version: &SemVer, canonicalize: bool) -> Result<Option<String>> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read '{}'", path.display()))?;
        let current = Self::find_version(&contents)
            .with_context(|| format!("Failed to parse '{}'", path.display()))?;

        match current {
            None => {
                debug!("No version field in '{}', skipping", path.display());
                Ok(None)
            }
            Some(current) if current == version.to_string() && !canonicalize => {
                debug!("'{}' is already at {}", path.display(), version);
                Ok(None)
            }
            Some(_) => Self::replace_version(&contents, version),
        }
    }

    /// Rewrites the version stored in `path`, returning whether the file was
    /// modified.
    fn update_version(path: impl AsRef<Path>, version: &SemVer, canonicalize: bool) -> Result<bool> {
        let path = path.as_ref();
        match Self::plan_update(path, version, canonicalize)? {
            Some(contents) => {
                write_atomic(path, &contents)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Replaces `path` with `contents` through a temporary file in the same
/// directory, so the target is either fully rewritten or left as it was.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = tempfile::NamedTempFile::new_in(directory)
        .with_context(|| format!("Failed to create temporary file in '{}'", directory.display()))?;
    file.write_all(contents.as_bytes())?;
    file.as_file().sync_all()?;
    if let Ok(metadata) = std::fs::metadata(path) {
        std::fs::set_permissions(file.path(), metadata.permissions())?;
    }
    file.persist(path)
        .with_context(|| format!("Failed to replace '{}'", path.display()))?;

    info!("Updated '{}'", path.display());
    Ok(())
}

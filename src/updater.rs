use crate::parsers::{
    Parser, ParsingError, assignment_parser::AssignmentParser, pyproject_parser::PyProjectParser,
    write_atomic,
};
use crate::version::{BumpRequest, SemVer, VersionError};
use anyhow::{Context, Result};
use log::{debug, info};
use std::path::{Path, PathBuf};

/// Fully resolved options handed to [`run`] by the driver.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BumpOptions {
    /// Authoritative version file, relative to the project root.
    pub input: Option<PathBuf>,
    pub major: bool,
    pub minor: bool,
    pub patch: bool,
    pub reset: bool,
    pub final_: bool,
    pub pre: Option<String>,
    pub local: Option<String>,
    /// Rewrite files even when they already hold the new version text.
    pub canonicalize: bool,
}

impl BumpOptions {
    /// Builds the bump request, rejecting identifiers that would not
    /// survive being written and read back.
    pub fn request(&self) -> Result<BumpRequest, VersionError> {
        let request = BumpRequest {
            major: self.major,
            minor: self.minor,
            patch: self.patch,
            reset: self.reset,
            final_: self.final_,
            pre: self.pre.clone(),
            local: self.local.clone(),
        };
        request.validate()?;
        Ok(request)
    }
}

/// Where the authoritative version was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSource {
    /// A `version = '...'` / `__version__ = "..."` file.
    Assignment(PathBuf),
    /// A manifest holding `[project].version`.
    Manifest(PathBuf),
}

impl VersionSource {
    pub fn path(&self) -> &Path {
        match self {
            VersionSource::Assignment(path) | VersionSource::Manifest(path) => path,
        }
    }

    fn current_version(&self) -> Result<SemVer> {
        match self {
            VersionSource::Assignment(path) => AssignmentParser::get_current_version(path),
            VersionSource::Manifest(path) => PyProjectParser::get_current_version(path),
        }
    }

    fn plan_update(&self, version: &SemVer, canonicalize: bool) -> Result<Option<String>> {
        match self {
            VersionSource::Assignment(path) => AssignmentParser::plan_update(path, version, canonicalize),
            VersionSource::Manifest(path) => PyProjectParser::plan_update(path, version, canonicalize),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpdate {
    pub path: PathBuf,
    pub modified: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateReport {
    pub previous: SemVer,
    pub version: SemVer,
    pub files: Vec<FileUpdate>,
}

/// Finds the authoritative version under `root`.
///
/// An explicit `input` always wins; `.toml` inputs are read as manifests.
/// Otherwise `setup.py` is preferred when it carries an assignment, then
/// `pyproject.toml`.
pub fn locate(root: impl AsRef<Path>, input: Option<&Path>) -> Result<(VersionSource, SemVer)> {
    let root = root.as_ref();

    if let Some(input) = input {
        let path = root.join(input);
        let source = if path.extension().is_some_and(|ext| ext == "toml") {
            VersionSource::Manifest(path)
        } else {
            VersionSource::Assignment(path)
        };
        let version = source.current_version()?;
        return Ok((source, version));
    }

    let conventional = root.join(AssignmentParser::FILE_NAME);
    if has_version::<AssignmentParser>(&conventional)? {
        let source = VersionSource::Assignment(conventional);
        let version = source.current_version()?;
        return Ok((source, version));
    }

    let manifest = root.join(PyProjectParser::FILE_NAME);
    if has_version::<PyProjectParser>(&manifest)? {
        let source = VersionSource::Manifest(manifest);
        let version = source.current_version()?;
        return Ok((source, version));
    }

    Err(ParsingError::NoVersionFound(root.display().to_string()).into())
}

fn has_version<P: Parser>(path: &Path) -> Result<bool> {
    if !path.is_file() {
        debug!("'{}' does not exist", path.display());
        return Ok(false);
    }
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read '{}'", path.display()))?;
    let found = P::find_version(&contents)
        .with_context(|| format!("Failed to parse '{}'", path.display()))?
        .is_some();
    debug!("'{}' carries a version: {}", path.display(), found);
    Ok(found)
}

/// Bumps the project version under `root` according to `options`.
///
/// The authoritative file is rewritten and, when it is an assignment file,
/// `pyproject.toml` in `root` is synchronized to the same version. A manifest
/// without a version field is skipped. Every new file body is computed before
/// the first write.
pub fn run(root: impl AsRef<Path>, options: &BumpOptions) -> Result<UpdateReport> {
    let root = root.as_ref();
    let request = options.request()?;
    let (source, previous) = locate(root, options.input.as_deref())?;
    let version = previous.bumped(&request);
    info!("Bumping version {} -> {} ({})", previous, version, source.path().display());

    let mut plans = vec![(source.path().to_path_buf(), source.plan_update(&version, options.canonicalize)?)];

    if matches!(source, VersionSource::Assignment(_)) {
        let manifest = root.join(PyProjectParser::FILE_NAME);
        if manifest.is_file() {
            debug!("Synchronizing '{}'", manifest.display());
            plans.push((manifest.clone(), PyProjectParser::plan_update(&manifest, &version, options.canonicalize)?));
        }
    }

    let mut files = Vec::with_capacity(plans.len());
    for (path, plan) in plans {
        let modified = match plan {
            Some(contents) => {
                write_atomic(&path, &contents)?;
                true
            }
            None => false,
        };
        files.push(FileUpdate { path, modified });
    }

    Ok(UpdateReport { previous, version, files })
}

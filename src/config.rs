use crate::arguments::Arguments;
use crate::updater::BumpOptions;
use anyhow::{Context, Result};
use log::{debug, warn};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for '{key}' in {path}: '{value}'")]
    InvalidValue { path: String, key: String, value: String },
    #[error("Malformed config file {path}: {message}")]
    Malformed { path: String, message: String },
}

/// Default options read from `.bump` (`[bump]`) or `pyproject.toml`
/// (`[tool.bump]`). Every field is optional; command line flags take
/// precedence in [`Config::resolve`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub major: Option<bool>,
    pub minor: Option<bool>,
    pub patch: Option<bool>,
    pub reset: Option<bool>,
    #[serde(rename = "final")]
    pub final_: Option<bool>,
    pub canonicalize: Option<bool>,
    pub pre: Option<String>,
    pub local: Option<String>,
    pub input: Option<String>,
    /// File the values were read from.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct PyProject {
    #[serde(default)]
    tool: Option<Tool>,
}

#[derive(Debug, Default, Deserialize)]
struct Tool {
    #[serde(default)]
    bump: Option<Config>,
}

impl Config {
    /// Candidate config files under `root`, in lookup order.
    pub fn candidates(root: &Path) -> [PathBuf; 2] {
        [root.join(".bump"), root.join("pyproject.toml")]
    }

    /// Loads the first candidate that exists and carries a bump section, or
    /// the empty config when none does.
    pub fn load(root: impl AsRef<Path>) -> Result<Config> {
        let [ini, pyproject] = Self::candidates(root.as_ref());

        if ini.is_file() {
            let contents = std::fs::read_to_string(&ini)
                .with_context(|| format!("Failed to read config from {}", ini.display()))?;
            match Self::from_ini(&contents, &ini)? {
                Some(config) => return Ok(config),
                None => warn!("{} has no [bump] section, ignoring it", ini.display()),
            }
        }

        if pyproject.is_file() {
            let contents = std::fs::read_to_string(&pyproject)
                .with_context(|| format!("Failed to read config from {}", pyproject.display()))?;
            if let Some(config) = Self::from_pyproject(&contents, &pyproject)? {
                return Ok(config);
            }
            debug!("{} has no [tool.bump] table", pyproject.display());
        }

        Ok(Config::default())
    }

    /// Reads the `[tool.bump]` table of a `pyproject.toml`.
    pub fn from_pyproject(contents: &str, path: &Path) -> Result<Option<Config>> {
        let pyproject: PyProject = toml_edit::de::from_str(contents).map_err(|e| ConfigError::Malformed {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        Ok(pyproject.tool.and_then(|tool| tool.bump).map(|mut config| {
            debug!("Loaded config from {}", path.display());
            config.source = Some(path.to_path_buf());
            config
        }))
    }

    /// Reads the `[bump]` section of an INI-style `.bump` file.
    pub fn from_ini(contents: &str, path: &Path) -> Result<Option<Config>> {
        let mut config = Config { source: Some(path.to_path_buf()), ..Default::default() };
        let mut in_section = false;
        let mut found = false;

        for (number, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if let Some(section) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                in_section = section.trim() == "bump";
                found |= in_section;
                continue;
            }
            if !in_section {
                continue;
            }

            let Some((key, value)) = line.split_once(['=', ':']) else {
                return Err(ConfigError::Malformed {
                    path: path.display().to_string(),
                    message: format!("line {} is not a key/value pair", number + 1),
                }
                .into());
            };
            config.set(key.trim(), value.trim(), path)?;
        }

        if found {
            debug!("Loaded config from {}", path.display());
            Ok(Some(config))
        } else {
            Ok(None)
        }
    }

    fn set(&mut self, key: &str, value: &str, path: &Path) -> Result<()> {
        let flag = || {
            coerce_bool(value).ok_or_else(|| ConfigError::InvalidValue {
                path: path.display().to_string(),
                key: key.to_string(),
                value: value.to_string(),
            })
        };

        match key {
            "major" => self.major = Some(flag()?),
            "minor" => self.minor = Some(flag()?),
            "patch" => self.patch = Some(flag()?),
            "reset" => self.reset = Some(flag()?),
            "final" => self.final_ = Some(flag()?),
            "canonicalize" => self.canonicalize = Some(flag()?),
            "pre" => self.pre = Some(value.to_string()),
            "local" => self.local = Some(value.to_string()),
            "input" => self.input = Some(value.to_string()),
            _ => debug!("Ignoring unknown config key '{}'", key),
        }
        Ok(())
    }

    /// Looks up a boolean option by name, falling back to `default` when it
    /// is unset or unknown.
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        let value = match key {
            "major" => self.major,
            "minor" => self.minor,
            "patch" => self.patch,
            "reset" => self.reset,
            "final" => self.final_,
            "canonicalize" => self.canonicalize,
            _ => None,
        };
        value.unwrap_or(default)
    }

    /// Looks up a string option by name.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        match key {
            "pre" => self.pre.as_deref(),
            "local" => self.local.as_deref(),
            "input" => self.input.as_deref(),
            _ => None,
        }
    }

    /// Merges command line flags over these defaults. Flags are presence
    /// switches, so a flag can only turn an option on.
    pub fn resolve(&self, args: &Arguments) -> BumpOptions {
        BumpOptions {
            input: args.input.as_deref().or(self.get_str("input")).map(PathBuf::from),
            major: args.major || self.get_bool("major", false),
            minor: args.minor || self.get_bool("minor", false),
            patch: args.patch || self.get_bool("patch", false),
            reset: args.reset || self.get_bool("reset", false),
            final_: args.final_ || self.get_bool("final", false),
            pre: args.pre.as_deref().or(self.get_str("pre")).map(str::to_string),
            local: args.local.as_deref().or(self.get_str("local")).map(str::to_string),
            canonicalize: args.canonicalize || self.get_bool("canonicalize", false),
        }
    }
}

fn coerce_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "yes" | "true" | "on" => Some(true),
        "0" | "no" | "false" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_coerce_bool() {
        for value in ["1", "yes", "YES", "true", "True", "on"] {
            assert_eq!(coerce_bool(value), Some(true), "{value}");
        }
        for value in ["0", "no", "false", "FALSE", "off"] {
            assert_eq!(coerce_bool(value), Some(false), "{value}");
        }
        assert_eq!(coerce_bool("maybe"), None);
    }

    #[test]
    fn test_from_ini() {
        let contents = "
    [bump]
    major = yes
    minor = true
    patch = 1
    reset = yes
    input = foobar.py
    canonicalize = yes
    final = yes
    ";
        let config = Config::from_ini(contents, Path::new(".bump")).unwrap().unwrap();
        assert!(config.get_bool("major", false));
        assert!(config.get_bool("minor", false));
        assert!(config.get_bool("patch", false));
        assert!(config.get_bool("reset", false));
        assert_eq!(config.get_str("input"), Some("foobar.py"));
        assert!(config.get_bool("canonicalize", false));
        assert!(config.get_bool("final", false));

        assert_eq!(config.get_str("nosuchkey"), None);
        assert!(config.get_bool("nosuchbool", true));
    }

    #[test]
    fn test_from_ini_ignores_other_sections() {
        let contents = "[other]\nmajor = yes\n\n[bump]\n; comment\npre = dev\n";
        let config = Config::from_ini(contents, Path::new(".bump")).unwrap().unwrap();
        assert_eq!(config.major, None);
        assert_eq!(config.pre.as_deref(), Some("dev"));
    }

    #[test]
    fn test_from_ini_without_section() {
        let config = Config::from_ini("[tool]\nx = 1\n", Path::new(".bump")).unwrap();
        assert!(config.is_none());
    }

    #[test]
    fn test_from_ini_rejects_bad_bool() {
        let err = Config::from_ini("[bump]\nmajor = sometimes\n", Path::new(".bump")).unwrap_err();
        assert!(matches!(err.downcast_ref::<ConfigError>(), Some(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_from_ini_rejects_garbage_line() {
        let err = Config::from_ini("[bump]\nmajor\n", Path::new(".bump")).unwrap_err();
        assert!(matches!(err.downcast_ref::<ConfigError>(), Some(ConfigError::Malformed { .. })));
    }

    #[test]
    fn test_from_pyproject() {
        let contents = r#"
    [tool.bump]
    major = true
    minor = true
    patch = true
    reset = true
    input = "foobar.py"
    canonicalize = true
    final = true
    "#;
        let config = Config::from_pyproject(contents, Path::new("pyproject.toml")).unwrap().unwrap();
        assert_eq!(config.major, Some(true));
        assert_eq!(config.minor, Some(true));
        assert_eq!(config.patch, Some(true));
        assert_eq!(config.reset, Some(true));
        assert_eq!(config.final_, Some(true));
        assert_eq!(config.canonicalize, Some(true));
        assert_eq!(config.get_str("input"), Some("foobar.py"));
        assert_eq!(config.source.as_deref(), Some(Path::new("pyproject.toml")));
    }

    #[test]
    fn test_from_pyproject_without_table() {
        let contents = "[project]\nname = \"demo\"\nversion = \"1.0.0\"\n";
        assert!(Config::from_pyproject(contents, Path::new("pyproject.toml")).unwrap().is_none());
    }

    #[test]
    fn test_from_pyproject_wrong_type() {
        let contents = "[tool.bump]\nmajor = \"yes\"\n";
        let err = Config::from_pyproject(contents, Path::new("pyproject.toml")).unwrap_err();
        assert!(matches!(err.downcast_ref::<ConfigError>(), Some(ConfigError::Malformed { .. })));
    }

    #[test]
    fn test_resolve_merges_flags_over_config() {
        let config = Config {
            reset: Some(true),
            pre: Some("dev".to_string()),
            input: Some("pkg/__init__.py".to_string()),
            ..Default::default()
        };
        let args = Arguments::parse_from(["bump", "--minor", "--pre", "rc1"]);
        let options = config.resolve(&args);

        assert!(options.minor && options.reset);
        assert!(!options.major && !options.patch && !options.final_);
        assert_eq!(options.pre.as_deref(), Some("rc1"));
        assert_eq!(options.input, Some(PathBuf::from("pkg/__init__.py")));
    }

    #[test]
    fn test_resolve_defaults() {
        let options = Config::default().resolve(&Arguments::parse_from(["bump"]));
        assert_eq!(options, BumpOptions::default());
    }
}

use crate::parsers::Parser;
use crate::version::SemVer;
use toml_edit::{DocumentMut, Value};

/// Reads and writes `[project].version` in a `pyproject.toml` manifest.
pub struct PyProjectParser;

impl Parser for PyProjectParser {
    const FILE_NAME: &'static str = "pyproject.toml";

    fn find_version(contents: &str) -> anyhow::Result<Option<String>> {
        let document = contents.parse::<DocumentMut>()?;
        Ok(document
            .get("project")
            .and_then(|project| project.get("version"))
            .and_then(|version| version.as_str())
            .map(str::to_string))
    }

    fn replace_version(contents: &str, version: &SemVer) -> anyhow::Result<Option<String>> {
        let mut document = contents.parse::<DocumentMut>()?;
        let Some(project) = document.get_mut("project").and_then(|p| p.as_table_like_mut()) else {
            return Ok(None);
        };
        let Some(value) = project.get_mut("version").and_then(|v| v.as_value_mut()) else {
            return Ok(None);
        };
        if !value.is_str() {
            return Ok(None);
        }

        let literal = match &*value {
            Value::String(formatted) => formatted
                .as_repr()
                .and_then(|repr| repr.as_raw().as_str())
                .is_some_and(|raw| raw.starts_with('\'')),
            _ => false,
        };
        let mut replacement = if literal {
            format!("'{version}'").parse::<Value>()?
        } else {
            Value::from(version.to_string())
        };
        *replacement.decor_mut() = value.decor().clone();
        *value = replacement;
        Ok(Some(document.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"# Project metadata
[build-system]
requires = ["setuptools>=61"]

[project]
name = "demo"
version = "1.2.3"  # keep in sync with setup.py
dependencies = [
    "requests>=2.0",
]

[tool.bump]
reset = true
"#;

    #[test]
    fn test_find_version() {
        assert_eq!(PyProjectParser::find_version(MANIFEST).unwrap().as_deref(), Some("1.2.3"));
    }

    #[test]
    fn test_find_version_missing_field() {
        let contents = "[project]\nname = \"demo\"\ndynamic = [\"version\"]\n";
        assert_eq!(PyProjectParser::find_version(contents).unwrap(), None);
    }

    #[test]
    fn test_find_version_missing_section() {
        let contents = "[tool.poetry]\nversion = \"1.0.0\"\n";
        assert_eq!(PyProjectParser::find_version(contents).unwrap(), None);
    }

    #[test]
    fn test_find_version_inline_project() {
        let contents = "project = { name = \"demo\", version = \"0.2.0\" }\n";
        assert_eq!(PyProjectParser::find_version(contents).unwrap().as_deref(), Some("0.2.0"));
    }

    #[test]
    fn test_find_version_rejects_malformed_toml() {
        assert!(PyProjectParser::find_version("[project\nversion = 1").is_err());
    }

    #[test]
    fn test_replace_only_touches_version() {
        let replaced = PyProjectParser::replace_version(MANIFEST, &SemVer::new(2, 0, 0))
            .unwrap()
            .unwrap();
        assert_eq!(replaced, MANIFEST.replace(r#"version = "1.2.3""#, r#"version = "2.0.0""#));
    }

    #[test]
    fn test_replace_with_identifiers() {
        let version = SemVer::new(1, 2, 4).with_pre("dev").with_local("abc");
        let replaced = PyProjectParser::replace_version(MANIFEST, &version).unwrap().unwrap();
        assert!(replaced.contains(r#"version = "1.2.4-dev+abc"  # keep in sync with setup.py"#));
    }

    #[test]
    fn test_replace_keeps_literal_string_quotes() {
        let contents = "[project]\nname = 'demo'\nversion = '1.2.3' # literal\n";
        let replaced = PyProjectParser::replace_version(contents, &SemVer::new(1, 2, 4).with_pre("dev"))
            .unwrap()
            .unwrap();
        assert_eq!(replaced, "[project]\nname = 'demo'\nversion = '1.2.4-dev' # literal\n");
    }

    #[test]
    fn test_replace_skips_missing_targets() {
        let no_section = "[tool.black]\nline-length = 88\n";
        assert!(PyProjectParser::replace_version(no_section, &SemVer::new(1, 0, 0)).unwrap().is_none());

        let no_field = "[project]\nname = \"demo\"\n";
        assert!(PyProjectParser::replace_version(no_field, &SemVer::new(1, 0, 0)).unwrap().is_none());

        let not_a_string = "[project]\nversion = 3\n";
        assert!(PyProjectParser::replace_version(not_a_string, &SemVer::new(1, 0, 0)).unwrap().is_none());
    }
}

use crate::parsers::Parser;
use crate::version::SemVer;
use std::ops::Range;

const NAME: &str = "version";

/// Finds `version = "..."` and `__version__ = '...'` assignments, as written
/// in `setup.py` or a package `__init__.py`.
pub struct AssignmentParser;

/// Location of a quoted version literal inside a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionSite {
    /// Byte span of the text between the quotes.
    pub span: Range<usize>,
    pub quote: char,
    pub text: String,
}

impl VersionSite {
    /// Locates the first assignment line in `contents`.
    pub fn locate(contents: &str) -> Option<VersionSite> {
        let mut offset = 0;
        for line in contents.split_inclusive('\n') {
            if let Some((span, quote)) = scan_line(line) {
                let span = offset + span.start..offset + span.end;
                let text = contents[span.clone()].to_string();
                return Some(VersionSite { span, quote, text });
            }
            offset += line.len();
        }
        None
    }

    /// Splices `replacement` into `contents` in place of this site.
    pub fn splice(&self, contents: &str, replacement: &str) -> String {
        let mut out = String::with_capacity(contents.len() + replacement.len());
        out.push_str(&contents[..self.span.start]);
        out.push_str(replacement);
        out.push_str(&contents[self.span.end..]);
        out
    }
}

fn scan_line(line: &str) -> Option<(Range<usize>, char)> {
    line.match_indices(NAME)
        .filter_map(|(index, _)| name_end(line, index))
        .find_map(|end| scan_value(line, end))
}

/// Returns where the assigned name ends when the match at `index` is a whole
/// `version` or `__version__` identifier.
fn name_end(line: &str, index: usize) -> Option<usize> {
    let mut start = index;
    let mut end = index + NAME.len();
    if line[..start].ends_with("__") && line[end..].starts_with("__") {
        start -= 2;
        end += 2;
    }

    let bytes = line.as_bytes();
    let clear_before = start == 0 || !is_identifier(bytes[start - 1]);
    let clear_after = end == bytes.len() || !is_identifier(bytes[end]);
    (clear_before && clear_after).then_some(end)
}

fn scan_value(line: &str, from: usize) -> Option<(Range<usize>, char)> {
    let value = line[from..].trim_start().strip_prefix('=')?.trim_start();
    let quote = value.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let body = &value[1..];
    let len = body.find(['"', '\''])?;
    if len == 0 || !body[len..].starts_with(quote) || body[..len].contains(char::is_whitespace) {
        return None;
    }

    let start = line.len() - body.len();
    Some((start..start + len, quote))
}

fn is_identifier(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}

impl Parser for AssignmentParser {
    const FILE_NAME: &'static str = "setup.py";

    fn find_version(contents: &str) -> anyhow::Result<Option<String>> {
        Ok(VersionSite::locate(contents).map(|site| site.text))
    }

    fn replace_version(contents: &str, version: &SemVer) -> anyhow::Result<Option<String>> {
        Ok(VersionSite::locate(contents).map(|site| site.splice(contents, &version.to_string())))
    }
}

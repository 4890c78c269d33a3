use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VersionError {
    #[error("Invalid version: '{0}'")]
    InvalidVersion(String),
}

/// A `MAJOR.MINOR.PATCH[-PRE][+LOCAL]` version.
///
/// `pre` and `local` are stored without their leading separator and are
/// otherwise opaque.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SemVer {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub pre: Option<String>,
    pub local: Option<String>,
}

/// The set of directives applied by [`SemVer::bumped`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BumpRequest {
    pub major: bool,
    pub minor: bool,
    pub patch: bool,
    pub reset: bool,
    pub final_: bool,
    pub pre: Option<String>,
    pub local: Option<String>,
}

impl BumpRequest {
    /// Checks that the identifiers this request would set render to a
    /// version that parses back unchanged.
    pub fn validate(&self) -> Result<(), VersionError> {
        if let Some(pre) = self.pre.as_deref().filter(|pre| !is_pre_identifier(pre)) {
            return Err(VersionError::InvalidVersion(format!("-{pre}")));
        }
        if let Some(local) = self.local.as_deref().filter(|local| !is_identifier(local)) {
            return Err(VersionError::InvalidVersion(format!("+{local}")));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Component {
    Major,
    Minor,
    Patch,
}

impl SemVer {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        SemVer { major, minor, patch, pre: None, local: None }
    }

    pub fn with_pre(mut self, pre: impl Into<String>) -> Self {
        self.pre = Some(pre.into());
        self
    }

    pub fn with_local(mut self, local: impl Into<String>) -> Self {
        self.local = Some(local.into());
        self
    }

    /// Parses `MAJOR[.MINOR[.PATCH]][-PRE][+LOCAL]`, defaulting missing
    /// numeric components to zero.
    pub fn parse(text: &str) -> Result<Self, VersionError> {
        let invalid = || VersionError::InvalidVersion(text.to_string());
        if text.is_empty() {
            return Err(invalid());
        }

        let (rest, local) = match text.split_once('+') {
            Some((rest, local)) => (rest, Some(local)),
            None => (text, None),
        };
        let (numbers, pre) = match rest.split_once('-') {
            Some((numbers, pre)) => (numbers, Some(pre)),
            None => (rest, None),
        };
        if !pre.is_none_or(is_pre_identifier) || !local.is_none_or(is_identifier) {
            return Err(invalid());
        }

        let mut components = [0u64; 3];
        let mut count = 0;
        for part in numbers.split('.') {
            if count == components.len() {
                return Err(invalid());
            }
            components[count] = parse_component(part).ok_or_else(invalid)?;
            count += 1;
        }

        let [major, minor, patch] = components;
        Ok(SemVer {
            major,
            minor,
            patch,
            pre: pre.map(str::to_string),
            local: local.map(str::to_string),
        })
    }

    /// Returns the version produced by applying `request`.
    ///
    /// `final_` clears `pre` and `local` and wins over any identifiers in
    /// the same request. Only the most significant requested component is
    /// incremented; with no numeric directive and no `final_` the patch
    /// component is incremented anyway.
    pub fn bumped(&self, request: &BumpRequest) -> SemVer {
        let mut next = self.clone();

        let component = if request.major {
            Some(Component::Major)
        } else if request.minor {
            Some(Component::Minor)
        } else if request.patch || !request.final_ {
            Some(Component::Patch)
        } else {
            None
        };

        match component {
            Some(Component::Major) => {
                next.major = next.major.saturating_add(1);
                if request.reset {
                    next.minor = 0;
                    next.patch = 0;
                }
            }
            Some(Component::Minor) => {
                next.minor = next.minor.saturating_add(1);
                if request.reset {
                    next.patch = 0;
                }
            }
            Some(Component::Patch) => next.patch = next.patch.saturating_add(1),
            None => {}
        }

        if request.final_ {
            next.pre = None;
            next.local = None;
        } else {
            if let Some(pre) = &request.pre {
                next.pre = Some(pre.clone());
            }
            if let Some(local) = &request.local {
                next.local = Some(local.clone());
            }
        }

        next
    }

    pub fn bump(&mut self, request: &BumpRequest) {
        *self = self.bumped(request);
    }
}

/// Parses a numeric component. `u64::MAX` is refused so that every parsed
/// version can be bumped.
fn parse_component(part: &str) -> Option<u64> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok().filter(|value| *value < u64::MAX)
}

/// Non-empty, and free of whitespace and quotes so the rendered version can
/// sit inside a quoted literal.
fn is_identifier(identifier: &str) -> bool {
    !identifier.is_empty()
        && !identifier
            .chars()
            .any(|c| c.is_whitespace() || c == '"' || c == '\'' || c == '\\')
}

/// A pre-release identifier additionally must not contain `+`, which would
/// start the local part when the version is read back.
fn is_pre_identifier(identifier: &str) -> bool {
    is_identifier(identifier) && !identifier.contains('+')
}

impl FromStr for SemVer {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SemVer::parse(s)
    }
}

impl fmt::Display for SemVer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.pre {
            write!(f, "-{pre}")?;
        }
        if let Some(local) = &self.local {
            write!(f, "+{local}")?;
        }
        Ok(())
    }
}

use crate::errors::{Error, Result};
use std::fmt::{Display, Formatter};

/// A fetch or push mapping `[+]<source>:<destination>`.
///
/// Either both patterns end in a single trailing `*` (namespace mapping,
/// `refs/heads/*` → `refs/remotes/origin/*`) or neither contains one and the
/// spec maps exactly one reference to one reference. A leading `+` permits
/// non-fast-forward destination updates.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RefSpec {
    force: bool,
    source: String,
    destination: String,
}

impl RefSpec {
    pub fn try_parse(spec: impl AsRef<str>) -> Result<Self> {
        let raw = spec.as_ref();
        let (force, body) = match raw.strip_prefix('+') {
            Some(rest) => (true, rest),
            None => (false, raw),
        };

        let Some((source, destination)) = body.split_once(':') else {
            return Err(Error::InvalidRefSpec {
                spec: raw.to_string(),
            });
        };

        if source.is_empty() || destination.is_empty() {
            return Err(Error::InvalidRefSpec {
                spec: raw.to_string(),
            });
        }

        let source_glob = Self::check_pattern(raw, source)?;
        let destination_glob = Self::check_pattern(raw, destination)?;
        if source_glob != destination_glob {
            return Err(Error::InvalidRefSpec {
                spec: raw.to_string(),
            });
        }

        Ok(RefSpec {
            force,
            source: source.to_string(),
            destination: destination.to_string(),
        })
    }

    /// Default fetch mapping installed when a remote is registered.
    pub fn default_fetch(remote: &str) -> Self {
        RefSpec {
            force: true,
            source: String::from("refs/heads/*"),
            destination: format!("refs/remotes/{remote}/*"),
        }
    }

    /// Conventional push mapping for branches.
    pub fn mirror_heads() -> Self {
        RefSpec {
            force: true,
            source: String::from("refs/heads/*"),
            destination: String::from("refs/heads/*"),
        }
    }

    /// Conventional push mapping for tags.
    pub fn mirror_tags() -> Self {
        RefSpec {
            force: true,
            source: String::from("refs/tags/*"),
            destination: String::from("refs/tags/*"),
        }
    }

    /// `Ok(true)` when the pattern carries the single allowed trailing `*`.
    fn check_pattern(raw: &str, pattern: &str) -> Result<bool> {
        match pattern.matches('*').count() {
            0 => Ok(false),
            1 if pattern.ends_with('*') => Ok(true),
            _ => Err(Error::InvalidRefSpec {
                spec: raw.to_string(),
            }),
        }
    }

    pub fn force(&self) -> bool {
        self.force
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn is_glob(&self) -> bool {
        self.source.ends_with('*')
    }

    /// Destination name a given source ref maps to under this spec, if the
    /// spec covers it.
    pub fn map_source(&self, name: &str) -> Option<String> {
        Self::map_pattern(&self.source, &self.destination, name)
    }

    /// Source name that would map to a given destination ref (the inverse
    /// direction of [`RefSpec::map_source`]).
    pub fn map_destination(&self, name: &str) -> Option<String> {
        Self::map_pattern(&self.destination, &self.source, name)
    }

    fn map_pattern(from: &str, to: &str, name: &str) -> Option<String> {
        match from.strip_suffix('*') {
            Some(prefix) => {
                let suffix = name.strip_prefix(prefix).filter(|s| !s.is_empty())?;
                Some(format!("{}{}", to.trim_end_matches('*'), suffix))
            }
            None => (name == from).then(|| to.to_string()),
        }
    }
}

impl TryFrom<String> for RefSpec {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        RefSpec::try_parse(value)
    }
}

impl From<RefSpec> for String {
    fn from(spec: RefSpec) -> Self {
        spec.to_string()
    }
}

impl Display for RefSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.force {
            write!(f, "+")?;
        }
        write!(f, "{}:{}", self.source, self.destination)
    }
}

use crate::artifacts::reference::{
    HEAD, HEADS_NAMESPACE, INVALID_REF_NAME_REGEX, REF_ALIASES, REMOTES_NAMESPACE, TAGS_NAMESPACE,
};
use crate::errors::{Error, Result};

/// A validated reference name: `HEAD` or a path-shaped name, usually under
/// one of the `refs/` namespaces.
///
/// Validation is by character class, not by namespace, so resolution targets
/// read back from symbolic-ref files round-trip through the same parser.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RefName(String);

impl RefName {
    pub fn try_parse(name: impl Into<String>) -> Result<Self> {
        let mut name = name.into();

        if let Some(target) = REF_ALIASES.get(name.as_str()) {
            name = (*target).to_string();
        }

        if name.is_empty() {
            return Err(Error::InvalidRefName { name });
        }

        let re = regex::Regex::new(INVALID_REF_NAME_REGEX)
            .map_err(|err| Error::malformed("ref name pattern", err.to_string()))?;

        if re.is_match(&name) {
            return Err(Error::InvalidRefName { name });
        }

        Ok(Self(name))
    }

    pub fn head() -> Self {
        Self(HEAD.to_string())
    }

    /// Qualify a short branch name under `refs/heads/`.
    pub fn branch(short: &str) -> Result<Self> {
        Self::try_parse(format!("{HEADS_NAMESPACE}{short}"))
    }

    /// Qualify a short tag name under `refs/tags/`.
    pub fn tag(short: &str) -> Result<Self> {
        Self::try_parse(format!("{TAGS_NAMESPACE}{short}"))
    }

    /// The remote-tracking ref recording `remote`'s copy of `branch`.
    pub fn tracking(remote: &str, branch: &str) -> Result<Self> {
        Self::try_parse(format!("{REMOTES_NAMESPACE}{remote}/{branch}"))
    }

    pub fn is_head(&self) -> bool {
        self.0 == HEAD
    }

    pub fn is_branch(&self) -> bool {
        self.0.starts_with(HEADS_NAMESPACE)
    }

    pub fn is_tag(&self) -> bool {
        self.0.starts_with(TAGS_NAMESPACE)
    }

    /// The name with its `refs/...` namespace prefix removed; `HEAD` and
    /// names outside the known namespaces come back unchanged.
    pub fn short_name(&self) -> &str {
        self.0
            .strip_prefix(HEADS_NAMESPACE)
            .or_else(|| self.0.strip_prefix(TAGS_NAMESPACE))
            .or_else(|| self.0.strip_prefix(REMOTES_NAMESPACE))
            .unwrap_or(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for RefName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RefName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

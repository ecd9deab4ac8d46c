use crate::artifacts::remote::refspec::RefSpec;
use serde::{Deserialize, Serialize};

/// A configured remote: where to fetch from, where to push to, and the
/// ref mappings for each direction. Persisted as `remotes/<name>.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteDescriptor {
    name: String,
    fetch_urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    push_urls: Vec<String>,
    fetch_specs: Vec<RefSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    push_specs: Vec<RefSpec>,
}

impl RemoteDescriptor {
    /// A freshly registered remote: one fetch URL and the default fetch
    /// mapping `+refs/heads/*:refs/remotes/<name>/*`.
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        let name = name.into();
        let fetch_spec = RefSpec::default_fetch(&name);

        RemoteDescriptor {
            name,
            fetch_urls: vec![url.into()],
            push_urls: Vec::new(),
            fetch_specs: vec![fetch_spec],
            push_specs: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fetch_urls(&self) -> &[String] {
        &self.fetch_urls
    }

    /// URLs push operations target: the push list, or the fetch list when no
    /// push URL was registered.
    pub fn push_urls(&self) -> &[String] {
        if self.push_urls.is_empty() {
            &self.fetch_urls
        } else {
            &self.push_urls
        }
    }

    pub fn fetch_specs(&self) -> &[RefSpec] {
        &self.fetch_specs
    }

    pub fn push_specs(&self) -> &[RefSpec] {
        &self.push_specs
    }

    /// Replace the fetch mappings wholesale, overriding the registration
    /// default.
    pub fn set_fetch_specs(&mut self, specs: Vec<RefSpec>) {
        self.fetch_specs = specs;
    }

    pub fn add_push_url(&mut self, url: impl Into<String>) {
        let url = url.into();
        if !self.push_urls.contains(&url) {
            self.push_urls.push(url);
        }
    }

    pub fn add_push_spec(&mut self, spec: RefSpec) {
        if !self.push_specs.contains(&spec) {
            self.push_specs.push(spec);
        }
    }
}

//! Configuration records under the state directory: the core record at
//! `config.json` and one remote descriptor per file under `remotes/`.

use crate::artifacts::remote::descriptor::RemoteDescriptor;
use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "config.json";
pub const REMOTES_DIR: &str = "remotes";
pub const FORMAT_VERSION: u32 = 1;

/// Which remote ref a local branch merges from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchTracking {
    pub remote: String,
    pub merge: String,
}

/// The core repository record stored at `config.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    pub bare: bool,
    pub format_version: u32,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub branches: BTreeMap<String, BranchTracking>,
}

impl CoreConfig {
    pub fn new(bare: bool) -> Self {
        CoreConfig {
            bare,
            format_version: FORMAT_VERSION,
            branches: BTreeMap::new(),
        }
    }
}

/// Handle on the configuration records of one repository.
pub struct Config {
    path: Box<Path>,
}

impl Config {
    pub fn new(path: Box<Path>) -> Self {
        Config { path }
    }

    fn config_path(&self) -> PathBuf {
        self.path.join(CONFIG_FILE)
    }

    fn remote_path(&self, name: &str) -> PathBuf {
        self.path.join(REMOTES_DIR).join(format!("{name}.json"))
    }

    pub fn load(&self) -> Result<CoreConfig> {
        let raw = std::fs::read(self.config_path())?;
        Ok(serde_json::from_slice(&raw)?)
    }

    pub fn save(&self, config: &CoreConfig) -> Result<()> {
        let raw = serde_json::to_vec_pretty(config)?;
        std::fs::write(self.config_path(), raw)?;

        Ok(())
    }

    /// Record (or replace) the upstream tracking entry of a branch.
    pub fn set_branch_tracking(&self, branch: &str, tracking: BranchTracking) -> Result<()> {
        let mut config = self.load()?;
        config.branches.insert(branch.to_string(), tracking);
        self.save(&config)
    }

    pub fn remote_exists(&self, name: &str) -> bool {
        self.remote_path(name).is_file()
    }

    pub fn load_remote(&self, name: &str) -> Result<RemoteDescriptor> {
        let raw = std::fs::read(self.remote_path(name)).map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => Error::ConfigError {
                remote: name.to_string(),
                reason: String::from("remote is not registered"),
            },
            _ => Error::Io(err),
        })?;

        Ok(serde_json::from_slice(&raw)?)
    }

    pub fn save_remote(&self, remote: &RemoteDescriptor) -> Result<()> {
        let path = self.remote_path(remote.name());
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let raw = serde_json::to_vec_pretty(remote)?;
        std::fs::write(path, raw)?;

        Ok(())
    }
}

use crate::areas::config::Config;
use crate::areas::database::Database;
use crate::areas::index::Index;
use crate::areas::refs::Refs;
use crate::areas::workspace::Workspace;
use crate::errors::{Error, Result};
use std::path::{Path, PathBuf};

/// Name of the state directory nested inside a working directory.
pub const STATE_DIR: &str = ".keel";
/// Branch a freshly created repository points HEAD at.
pub const DEFAULT_BRANCH: &str = "main";

pub const OBJECTS_DIR: &str = "objects";
pub const INDEX_FILE: &str = "index";

/// One on-disk repository: the object database, reference store and
/// configuration under the state directory, plus (for non-bare
/// repositories) the working directory and staging index around it.
pub struct Repository {
    path: Box<Path>,
    state_path: Box<Path>,
    database: Database,
    refs: Refs,
    config: Config,
    workspace: Option<Workspace>,
}

impl Repository {
    /// Open an existing repository: either a working directory containing
    /// the [`STATE_DIR`] subdirectory, or a bare state directory itself.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path
            .as_ref()
            .canonicalize()
            .map_err(|_| Error::NotARepository {
                path: path.as_ref().to_path_buf(),
            })?;

        let nested_state = path.join(STATE_DIR);
        if nested_state.is_dir() {
            return Ok(Self::assemble(path, nested_state, false));
        }

        let looks_bare = path.join(crate::artifacts::reference::HEAD).is_file()
            && path.join(OBJECTS_DIR).is_dir();
        if looks_bare {
            let state = path.clone();
            return Ok(Self::assemble(path, state, true));
        }

        Err(Error::NotARepository { path })
    }

    fn assemble(path: PathBuf, state: PathBuf, bare: bool) -> Self {
        let database = Database::new(state.join(OBJECTS_DIR).into_boxed_path());
        let refs = Refs::new(state.clone().into_boxed_path());
        let config = Config::new(state.clone().into_boxed_path());
        let workspace = (!bare).then(|| Workspace::new(path.clone().into_boxed_path()));

        Repository {
            path: path.into_boxed_path(),
            state_path: state.into_boxed_path(),
            database,
            refs,
            config,
            workspace,
        }
    }

    /// The working directory for non-bare repositories, the state directory
    /// for bare ones.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    pub fn is_bare(&self) -> bool {
        self.workspace.is_none()
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn refs(&self) -> &Refs {
        &self.refs
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn workspace(&self) -> Result<&Workspace> {
        self.workspace.as_ref().ok_or_else(|| Error::BareRepository {
            path: self.path.to_path_buf(),
        })
    }

    /// The staging index, freshly rehydrated from disk. Bare repositories
    /// have none.
    pub fn index(&self) -> Result<Index> {
        if self.is_bare() {
            return Err(Error::BareRepository {
                path: self.path.to_path_buf(),
            });
        }

        let mut index = Index::new(self.state_path.join(INDEX_FILE).into_boxed_path());
        index.rehydrate()?;

        Ok(index)
    }
}

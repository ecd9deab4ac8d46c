use crate::areas::config::{Config, CoreConfig};
use crate::areas::refs::Refs;
use crate::areas::repository::{DEFAULT_BRANCH, OBJECTS_DIR, Repository, STATE_DIR};
use crate::artifacts::reference::HEAD;
use crate::artifacts::reference::ref_name::RefName;
use crate::errors::{Error, Result};
use std::path::Path;

impl Repository {
    /// Initialize a working-directory repository at `path` and open it.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        std::fs::create_dir_all(path).map_err(|err| Error::filesystem(path, err))?;

        init_state(&path.join(STATE_DIR), false)?;
        Self::open(path)
    }

    /// Initialize a bare repository (the state directory is `path` itself)
    /// and open it.
    pub fn create_bare(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        std::fs::create_dir_all(path).map_err(|err| Error::filesystem(path, err))?;

        init_state(path, true)?;
        Self::open(path)
    }
}

/// Lay out an empty state directory: object store, ref namespaces, core
/// config, and HEAD linked to the default branch (unborn until the first
/// commit).
fn init_state(state: &Path, bare: bool) -> Result<()> {
    if state.join(HEAD).exists() {
        return Err(Error::AlreadyExists {
            name: state.display().to_string(),
        });
    }

    for dir in [OBJECTS_DIR, "refs/heads", "refs/tags", "logs"] {
        let dir = state.join(dir);
        std::fs::create_dir_all(&dir).map_err(|err| Error::filesystem(&dir, err))?;
    }

    Config::new(state.to_path_buf().into_boxed_path()).save(&CoreConfig::new(bare))?;

    let refs = Refs::new(state.to_path_buf().into_boxed_path());
    refs.link(&RefName::head(), &RefName::branch(DEFAULT_BRANCH)?)?;

    tracing::debug!(state = %state.display(), bare, "initialized repository");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn scratch() -> assert_fs::TempDir {
        assert_fs::TempDir::new().unwrap()
    }

    #[rstest]
    fn test_create_lays_out_the_state_directory(scratch: assert_fs::TempDir) {
        let repository = Repository::create(scratch.path().join("project")).unwrap();

        assert!(!repository.is_bare());
        assert!(repository.state_path().join("objects").is_dir());
        assert!(repository.state_path().join("refs/heads").is_dir());
        assert_eq!(
            std::fs::read_to_string(repository.state_path().join("HEAD")).unwrap(),
            "ref: refs/heads/main\n"
        );
        assert!(!repository.config().load().unwrap().bare);
    }

    #[rstest]
    fn test_create_bare_uses_the_path_as_state_directory(scratch: assert_fs::TempDir) {
        let repository = Repository::create_bare(scratch.path().join("upstream")).unwrap();

        assert!(repository.is_bare());
        assert_eq!(repository.path(), repository.state_path());
        assert!(repository.config().load().unwrap().bare);
    }

    #[rstest]
    fn test_create_rejects_an_existing_repository(scratch: assert_fs::TempDir) {
        let project = scratch.path().join("project");
        Repository::create(&project).unwrap();

        let result = Repository::create(&project);

        assert!(matches!(result, Err(Error::AlreadyExists { .. })));
    }
}

use crate::areas::repository::Repository;
use crate::artifacts::sync::fetch::{self, FetchOutcome};
use crate::artifacts::sync::transport::FileTransport;
use crate::errors::Result;

impl Repository {
    /// Fetch from a registered remote over the filesystem transport.
    ///
    /// `ConfigError` when the remote is unregistered or unusable; per-ref
    /// verdicts live in the returned [`FetchOutcome`].
    pub fn fetch(&self, remote_name: &str) -> Result<FetchOutcome> {
        let remote = self.config().load_remote(remote_name)?;

        fetch::fetch(self, &FileTransport::new(), &remote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;
    use rstest::{fixture, rstest};

    #[fixture]
    fn project() -> assert_fs::TempDir {
        assert_fs::TempDir::new().unwrap()
    }

    #[rstest]
    fn test_fetch_from_an_unregistered_remote_fails_fast(project: assert_fs::TempDir) {
        let repository = Repository::create(project.path()).unwrap();

        let result = repository.fetch("origin");

        assert!(matches!(
            result,
            Err(Error::ConfigError { remote, .. }) if remote == "origin"
        ));
    }
}

use crate::areas::repository::Repository;
use crate::artifacts::sync::push::{self, PushOutcome};
use crate::artifacts::sync::transport::FileTransport;
use crate::errors::Result;

impl Repository {
    /// Push to a registered remote's push-URIs over the filesystem
    /// transport.
    ///
    /// `ConfigError` without push ref-specs, `TransportError` when no URI
    /// could be reached; per-ref and per-URI verdicts live in the returned
    /// [`PushOutcome`].
    pub fn push(&self, remote_name: &str) -> Result<PushOutcome> {
        let remote = self.config().load_remote(remote_name)?;

        push::push(self, &FileTransport::new(), &remote)
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
    fn test_push_without_push_specs_fails_fast(project: assert_fs::TempDir) {
        let repository = Repository::create(project.path()).unwrap();
        repository.register_remote("origin", "/srv/upstream").unwrap();

        let result = repository.push("origin");

        assert!(matches!(result, Err(Error::ConfigError { .. })));
    }
}

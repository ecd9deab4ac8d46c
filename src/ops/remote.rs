use crate::areas::repository::Repository;
use crate::artifacts::remote::descriptor::RemoteDescriptor;
use crate::artifacts::remote::refspec::RefSpec;
use crate::errors::{Error, Result};

impl Repository {
    /// Register remote `name` at `url` with the default fetch ref-spec
    /// (`+refs/heads/*:refs/remotes/<name>/*`).
    pub fn register_remote(&self, name: &str, url: &str) -> Result<()> {
        if self.config().remote_exists(name) {
            return Err(Error::AlreadyExists {
                name: name.to_string(),
            });
        }

        self.config()
            .save_remote(&RemoteDescriptor::new(name, url))?;

        tracing::debug!(remote = %name, url = %url, "registered remote");

        Ok(())
    }

    /// Add a push URL to remote `name` and install the conventional push
    /// ref-specs: `+refs/heads/*:refs/heads/*` when `push_heads`, plus
    /// `+refs/tags/*:refs/tags/*` when `push_tags`.
    pub fn set_push_target(
        &self,
        name: &str,
        url: &str,
        push_heads: bool,
        push_tags: bool,
    ) -> Result<()> {
        let mut remote = self.config().load_remote(name)?;

        remote.add_push_url(url);
        if push_heads {
            remote.add_push_spec(RefSpec::mirror_heads());
        }
        if push_tags {
            remote.add_push_spec(RefSpec::mirror_tags());
        }

        self.config().save_remote(&remote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn project() -> assert_fs::TempDir {
        assert_fs::TempDir::new().unwrap()
    }

    #[rstest]
    fn test_register_remote_writes_the_descriptor(project: assert_fs::TempDir) {
        let repository = Repository::create(project.path()).unwrap();

        repository.register_remote("origin", "/srv/upstream").unwrap();

        let remote = repository.config().load_remote("origin").unwrap();
        assert_eq!(remote.fetch_urls(), ["/srv/upstream"]);
        assert_eq!(
            remote.fetch_specs(),
            [RefSpec::try_parse("+refs/heads/*:refs/remotes/origin/*").unwrap()]
        );

        let duplicate = repository.register_remote("origin", "/srv/other");
        assert!(matches!(duplicate, Err(Error::AlreadyExists { .. })));
    }

    #[rstest]
    fn test_set_push_target_installs_conventional_specs(project: assert_fs::TempDir) {
        let repository = Repository::create(project.path()).unwrap();
        repository.register_remote("origin", "/srv/upstream").unwrap();

        repository
            .set_push_target("origin", "/srv/mirror", true, true)
            .unwrap();

        let remote = repository.config().load_remote("origin").unwrap();
        assert_eq!(remote.push_urls(), ["/srv/mirror"]);
        assert_eq!(
            remote.push_specs(),
            [RefSpec::mirror_heads(), RefSpec::mirror_tags()]
        );
    }

    #[rstest]
    fn test_push_target_for_an_unregistered_remote_fails(project: assert_fs::TempDir) {
        let repository = Repository::create(project.path()).unwrap();

        let result = repository.set_push_target("origin", "/srv/mirror", true, false);

        assert!(matches!(result, Err(Error::ConfigError { .. })));
    }
}

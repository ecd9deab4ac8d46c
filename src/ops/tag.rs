use crate::areas::repository::Repository;
use crate::artifacts::objects::commit::Author;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::tag::Tag;
use crate::artifacts::reference::ref_name::RefName;
use crate::artifacts::reference::update::Expect;
use crate::errors::{Error, Result};

impl Repository {
    /// Create annotated tag `name` pointing at `source` (a ref name or
    /// literal OID) and return the tag object's OID.
    ///
    /// `refs/tags/<name>` must not already exist unless `force` is set, in
    /// which case it is overwritten.
    pub fn tag(&self, source: &str, name: &str, message: &str, force: bool) -> Result<ObjectId> {
        let target = self.resolve_target(source)?;
        let target_type = self.database().object_type(&target)?;

        let tag = Tag::new(
            target,
            target_type,
            name.to_string(),
            Author::from_env(),
            message.trim().to_string(),
        );
        let oid = self.database().store(&tag)?;

        let tag_ref = RefName::tag(name)?;
        let expect = if force { Expect::Any } else { Expect::Absent };
        let outcome = self.refs().update(
            self.database(),
            &tag_ref,
            &expect,
            &oid,
            &format!("tag: tagging {name}"),
        )?;
        if outcome.is_rejected() {
            return Err(Error::AlreadyExists {
                name: tag_ref.to_string(),
            });
        }

        tracing::debug!(tag = %tag_ref, oid = %oid, "created tag");

        Ok(oid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::objects::object_type::ObjectType;
    use assert_fs::prelude::*;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn project() -> assert_fs::TempDir {
        assert_fs::TempDir::new().unwrap()
    }

    #[rstest]
    fn test_tag_stores_an_annotated_object(project: assert_fs::TempDir) {
        let repository = Repository::create(project.path()).unwrap();
        project.child("a.txt").write_str("hi").unwrap();
        let commit = repository.commit("first", &["."]).unwrap();

        let oid = repository.tag("HEAD", "v1", "first release", false).unwrap();

        let tag = repository
            .database()
            .parse_object_as_tag(&oid)
            .unwrap()
            .unwrap();
        assert_eq!(tag.target(), &commit);
        assert_eq!(tag.target_type(), ObjectType::Commit);
        assert_eq!(tag.name(), "v1");
        assert!(repository.has_ref("refs/tags/v1"));
    }

    #[rstest]
    fn test_retagging_requires_force(project: assert_fs::TempDir) {
        let repository = Repository::create(project.path()).unwrap();
        project.child("a.txt").write_str("hi").unwrap();
        repository.commit("first", &["."]).unwrap();
        repository.tag("HEAD", "v1", "first", false).unwrap();

        let result = repository.tag("HEAD", "v1", "again", false);
        assert!(matches!(result, Err(Error::AlreadyExists { .. })));

        let forced = repository.tag("HEAD", "v1", "again", true).unwrap();
        let tag_ref = RefName::try_parse("refs/tags/v1").unwrap();
        assert_eq!(repository.refs().resolve(&tag_ref).unwrap(), forced);
    }
}

use crate::areas::repository::Repository;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::reference::ref_name::RefName;
use crate::errors::Result;

impl Repository {
    /// The commit HEAD currently resolves to. `UnknownRef` on an unborn
    /// branch (no commit yet).
    pub fn head_id(&self) -> Result<ObjectId> {
        self.refs().resolve(&RefName::head())
    }

    /// The terminal ref name HEAD points at: the checked-out branch, or
    /// `HEAD` itself when detached.
    pub fn head_target(&self) -> Result<RefName> {
        self.refs().resolve_terminal_name(&RefName::head())
    }

    /// Whether `name` (aliases like `@` included) currently resolves to an
    /// object. Unparseable names are simply not refs.
    pub fn has_ref(&self, name: &str) -> bool {
        let Ok(name) = RefName::try_parse(name) else {
            return false;
        };

        matches!(self.refs().try_resolve(&name), Ok(Some(_)))
    }

    /// Dereference `target` as a ref name, or parse it as a literal OID.
    pub(crate) fn resolve_target(&self, target: &str) -> Result<ObjectId> {
        if let Ok(name) = RefName::try_parse(target) {
            if let Some(oid) = self.refs().try_resolve(&name)? {
                return Ok(oid);
            }
        }

        ObjectId::try_parse(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;
    use rstest::{fixture, rstest};

    #[fixture]
    fn scratch() -> assert_fs::TempDir {
        assert_fs::TempDir::new().unwrap()
    }

    #[rstest]
    fn test_unborn_head_has_a_target_but_no_id(scratch: assert_fs::TempDir) {
        let repository = Repository::create(scratch.path().join("project")).unwrap();

        assert_eq!(
            repository.head_target().unwrap(),
            RefName::try_parse("refs/heads/main").unwrap()
        );
        assert!(matches!(repository.head_id(), Err(Error::UnknownRef { .. })));
        assert!(!repository.has_ref("HEAD"));
        assert!(!repository.has_ref("@"));
    }

    #[rstest]
    fn test_has_ref_rejects_garbage_names(scratch: assert_fs::TempDir) {
        let repository = Repository::create(scratch.path().join("project")).unwrap();

        assert!(!repository.has_ref("refs/heads/bad..name"));
        assert!(!repository.has_ref(""));
    }
}

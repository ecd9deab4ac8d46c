use crate::areas::repository::Repository;
use crate::artifacts::checkout::migration::Migration;
use crate::artifacts::reference::ref_name::RefName;
use crate::artifacts::reference::reflog::ReflogEntry;
use crate::artifacts::reference::update::Expect;
use crate::errors::{Error, Result};

impl Repository {
    /// Create branch `name` at `source` (a ref name or literal OID,
    /// defaulting to HEAD) and switch to it.
    ///
    /// Creation always switches: the working directory and index migrate to
    /// the branch's tree and HEAD is re-linked. The steps are not atomic;
    /// if the checkout fails the branch still exists, and checking it out
    /// again converges the working directory.
    pub fn branch(&self, name: &str, source: Option<&str>) -> Result<()> {
        let branch_ref = RefName::branch(name)?;
        let source_oid = match source {
            Some(target) => self.resolve_target(target)?,
            None => self.head_id()?,
        };

        let old_oid = self.refs().try_resolve(&RefName::head())?;
        let old_label = self.checkout_label()?;

        let created = self.refs().update(
            self.database(),
            &branch_ref,
            &Expect::Absent,
            &source_oid,
            &format!("branch: Created from {}", source.unwrap_or("HEAD")),
        )?;
        if created.is_rejected() {
            return Err(Error::AlreadyExists {
                name: branch_ref.to_string(),
            });
        }

        if !self.is_bare() {
            let migration = Migration::new(
                self.database(),
                self.workspace()?,
                old_oid.as_ref(),
                Some(&source_oid),
            )?;
            let mut index = self.index()?;
            migration.apply(&mut index)?;
        }

        self.refs().link(&RefName::head(), &branch_ref)?;
        self.refs().append_log(
            &RefName::head(),
            &ReflogEntry::now(
                old_oid,
                source_oid,
                format!("checkout: moving from {old_label} to {name}"),
            ),
        )?;

        tracing::debug!(branch = %branch_ref, "created and switched to branch");

        Ok(())
    }

    /// Label for reflog messages describing what HEAD pointed at: the
    /// current branch's short name, or the abbreviated commit OID when
    /// detached.
    pub(crate) fn checkout_label(&self) -> Result<String> {
        let target = self.head_target()?;
        if target.is_head() {
            match self.refs().try_resolve(&target)? {
                Some(oid) => Ok(oid.to_short_oid()),
                None => Ok(target.to_string()),
            }
        } else {
            Ok(target.short_name().to_string())
        }
    }
}

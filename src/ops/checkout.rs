use crate::areas::repository::Repository;
use crate::artifacts::checkout::migration::Migration;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::reference::ref_name::RefName;
use crate::artifacts::reference::reflog::ReflogEntry;
use crate::errors::{Error, Result};

impl Repository {
    /// Switch the working directory to `target`: a branch short name, or a
    /// literal OID for a detached checkout.
    ///
    /// The filesystem work is the minimal set of operations derived from
    /// diffing the current HEAD tree against the target tree; afterwards the
    /// index mirrors the target tree exactly and HEAD points at the target
    /// (symbolic link for a branch, direct OID when detached). A mid-way
    /// failure leaves a partial migration; re-running the same checkout
    /// converges it.
    pub fn checkout(&self, target: &str) -> Result<()> {
        let workspace = self.workspace()?;

        let old_oid = self.refs().try_resolve(&RefName::head())?;
        let old_label = self.checkout_label()?;

        let branch = match RefName::branch(target) {
            Ok(name) if self.refs().exists(&name)? => Some(name),
            _ => None,
        };
        let new_oid = match &branch {
            Some(name) => self.refs().resolve(name)?,
            None => {
                let oid = ObjectId::try_parse(target).map_err(|_| Error::UnknownRef {
                    name: target.to_string(),
                })?;
                if !self.database().contains(&oid) {
                    return Err(Error::NotFound {
                        oid: oid.to_string(),
                    });
                }
                oid
            }
        };

        let migration = Migration::new(
            self.database(),
            workspace,
            old_oid.as_ref(),
            Some(&new_oid),
        )?;
        let mut index = self.index()?;
        migration.apply(&mut index)?;

        match &branch {
            Some(name) => self.refs().link(&RefName::head(), name)?,
            None => self.refs().write_direct(&RefName::head(), &new_oid)?,
        }
        self.refs().append_log(
            &RefName::head(),
            &ReflogEntry::now(
                old_oid,
                new_oid,
                format!("checkout: moving from {old_label} to {target}"),
            ),
        )?;

        tracing::debug!(target = %target, "checked out");

        Ok(())
    }
}

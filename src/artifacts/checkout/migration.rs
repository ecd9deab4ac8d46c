//! Checkout migration: converge workspace and index on a target tree.
//!
//! A migration is planned from a [`TreeDiff`] and applied in a fixed order:
//!
//! 1. delete files the target tree no longer has
//! 2. remove directories left empty, deepest first
//! 3. create directories new files need, shallowest first
//! 4. write modified files, then added files
//!
//! Only paths named by the diff are touched; everything else on disk is
//! trusted as-is, never rescanned. After the filesystem converges, the index
//! is rewritten wholesale to mirror the target tree.
//!
//! There is no rollback: a failed step aborts in a partially-applied state,
//! and re-running the same migration converges the remainder.

use crate::areas::database::Database;
use crate::areas::index::Index;
use crate::areas::workspace::Workspace;
use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::diff::tree_diff::TreeChange;
use crate::artifacts::index::entry_mode::FileMode;
use crate::artifacts::index::index_entry::IndexEntry;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::{Error, Result};
use bytes::Bytes;
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Planned filesystem convergence from one tree to another.
pub struct Migration<'r> {
    database: &'r Database,
    workspace: &'r Workspace,
    new_tree: Option<ObjectId>,
    adds: Vec<(PathBuf, DatabaseEntry)>,
    modifies: Vec<(PathBuf, DatabaseEntry)>,
    deletes: Vec<PathBuf>,
    mkdirs: BTreeSet<PathBuf>,
    rmdirs: BTreeSet<PathBuf>,
}

impl<'r> Migration<'r> {
    /// Diff `old_tree` against `new_tree` and plan the filesystem actions.
    /// Either side may be `None` (the empty tree) or a commit OID (its root
    /// tree).
    pub fn new(
        database: &'r Database,
        workspace: &'r Workspace,
        old_tree: Option<&ObjectId>,
        new_tree: Option<&ObjectId>,
    ) -> Result<Self> {
        let tree_diff = database.tree_diff(old_tree, new_tree)?;

        let mut migration = Migration {
            database,
            workspace,
            new_tree: new_tree.cloned(),
            adds: Vec::new(),
            modifies: Vec::new(),
            deletes: Vec::new(),
            mkdirs: BTreeSet::new(),
            rmdirs: BTreeSet::new(),
        };
        migration.plan_changes(tree_diff.changes());

        Ok(migration)
    }

    fn plan_changes(&mut self, changes: &std::collections::BTreeMap<PathBuf, TreeChange>) {
        for (path, change) in changes {
            let parents = path
                .ancestors()
                .skip(1)
                .filter(|ancestor| !ancestor.as_os_str().is_empty())
                .map(PathBuf::from);

            match change {
                TreeChange::Added(entry) => {
                    self.mkdirs.extend(parents);
                    self.adds.push((path.clone(), entry.clone()));
                }
                TreeChange::Modified { new, .. } => {
                    self.mkdirs.extend(parents);
                    self.modifies.push((path.clone(), new.clone()));
                }
                TreeChange::Deleted(_) => {
                    self.rmdirs.extend(parents);
                    self.deletes.push(path.clone());
                }
            }
        }
    }

    pub fn adds(&self) -> &[(PathBuf, DatabaseEntry)] {
        &self.adds
    }

    pub fn modifies(&self) -> &[(PathBuf, DatabaseEntry)] {
        &self.modifies
    }

    pub fn deletes(&self) -> &[PathBuf] {
        &self.deletes
    }

    /// Directories new files need, shallowest first in iteration order.
    pub fn mkdirs(&self) -> &BTreeSet<PathBuf> {
        &self.mkdirs
    }

    /// Candidate directories for removal; only those actually left empty
    /// are removed.
    pub fn rmdirs(&self) -> &BTreeSet<PathBuf> {
        &self.rmdirs
    }

    pub fn is_noop(&self) -> bool {
        self.adds.is_empty() && self.modifies.is_empty() && self.deletes.is_empty()
    }

    /// Blob payload for a planned write.
    pub fn load_blob(&self, oid: &ObjectId) -> Result<Bytes> {
        let blob = self
            .database
            .parse_object_as_blob(oid)?
            .ok_or_else(|| Error::malformed("blob", format!("{oid} is not a blob object")))?;

        Ok(blob.into_content())
    }

    /// Apply the plan to the workspace, then rewrite `index` to mirror the
    /// target tree exactly.
    pub fn apply(&self, index: &mut Index) -> Result<()> {
        self.workspace.apply_migration(self)?;

        let entries = self
            .database
            .read_tree_flat(self.new_tree.as_ref())?
            .into_iter()
            .map(|(path, entry)| {
                Ok(IndexEntry::new(
                    path,
                    entry.oid,
                    FileMode::try_from(entry.mode)?,
                ))
            })
            .collect::<Result<Vec<_>>>()?;
        index.replace_with(entries);
        index.write_updates()?;

        tracing::debug!(
            adds = self.adds.len(),
            modifies = self.modifies.len(),
            deletes = self.deletes.len(),
            "applied migration"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::index::entry_mode::EntryMode;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    fn oid(byte: char) -> ObjectId {
        ObjectId::try_parse(byte.to_string().repeat(40)).unwrap()
    }

    fn file_entry(byte: char) -> DatabaseEntry {
        DatabaseEntry::new(oid(byte), EntryMode::File(FileMode::Regular))
    }

    #[test]
    fn plan_collects_parent_dirs_but_not_the_file_itself() {
        let dir = assert_fs::TempDir::new().unwrap();
        let database = Database::new(dir.path().join("objects").into_boxed_path());
        let workspace = Workspace::new(dir.path().to_path_buf().into_boxed_path());

        let mut migration = Migration {
            database: &database,
            workspace: &workspace,
            new_tree: None,
            adds: Vec::new(),
            modifies: Vec::new(),
            deletes: Vec::new(),
            mkdirs: BTreeSet::new(),
            rmdirs: BTreeSet::new(),
        };

        assert!(migration.is_noop());

        let changes = [
            (
                PathBuf::from("a/b/new.txt"),
                TreeChange::Added(file_entry('a')),
            ),
            (
                PathBuf::from("c/old.txt"),
                TreeChange::Deleted(file_entry('b')),
            ),
        ]
        .into_iter()
        .collect();
        migration.plan_changes(&changes);

        assert!(!migration.is_noop());

        let mkdirs: Vec<&Path> = migration.mkdirs().iter().map(PathBuf::as_path).collect();
        assert_eq!(mkdirs, vec![Path::new("a"), Path::new("a/b")]);

        let rmdirs: Vec<&Path> = migration.rmdirs().iter().map(PathBuf::as_path).collect();
        assert_eq!(rmdirs, vec![Path::new("c")]);

        assert_eq!(migration.adds().len(), 1);
        assert_eq!(migration.deletes(), [PathBuf::from("c/old.txt")]);
    }
}

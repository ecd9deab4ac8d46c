//! Recursive tree-to-tree comparison.
//!
//! Produces the per-path change set the checkout engine turns into
//! filesystem operations. Subtrees with identical OIDs are skipped without
//! descending, so the cost scales with the size of the change, not the size
//! of the repository.

use crate::areas::database::Database;
use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::Result;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// One changed path between the old and new trees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeChange {
    Added(DatabaseEntry),
    Deleted(DatabaseEntry),
    Modified {
        old: DatabaseEntry,
        new: DatabaseEntry,
    },
}

impl TreeChange {
    pub fn from_entries(old: Option<DatabaseEntry>, new: Option<DatabaseEntry>) -> Option<Self> {
        match (old, new) {
            (None, Some(new)) => Some(TreeChange::Added(new)),
            (Some(old), None) => Some(TreeChange::Deleted(old)),
            (Some(old), Some(new)) if old != new => Some(TreeChange::Modified { old, new }),
            _ => None,
        }
    }
}

pub type ChangeSet = BTreeMap<PathBuf, TreeChange>;
type TreeEntryMap = BTreeMap<String, DatabaseEntry>;

/// Accumulated diff of two trees, keyed by workspace-relative path.
#[derive(Debug)]
pub struct TreeDiff<'r> {
    database: &'r Database,
    change_set: ChangeSet,
}

impl<'r> TreeDiff<'r> {
    pub fn new(database: &'r Database) -> Self {
        TreeDiff {
            database,
            change_set: BTreeMap::new(),
        }
    }

    pub fn changes(&self) -> &ChangeSet {
        &self.change_set
    }

    pub fn is_empty(&self) -> bool {
        self.change_set.is_empty()
    }

    /// Compare two trees by OID; `None` stands for the empty tree, and a
    /// commit OID stands for its root tree.
    pub fn compare_oids(
        &mut self,
        old: Option<&ObjectId>,
        new: Option<&ObjectId>,
    ) -> Result<()> {
        self.compare_at(old, new, Path::new(""))
    }

    fn compare_at(
        &mut self,
        old: Option<&ObjectId>,
        new: Option<&ObjectId>,
        prefix: &Path,
    ) -> Result<()> {
        if old == new {
            return Ok(());
        }

        let old_entries = self.inflate_entries(old)?;
        let new_entries = self.inflate_entries(new)?;

        self.detect_deletions(&old_entries, &new_entries, prefix)?;
        self.detect_additions(&old_entries, &new_entries, prefix)?;

        Ok(())
    }

    fn inflate_entries(&self, oid: Option<&ObjectId>) -> Result<TreeEntryMap> {
        match oid {
            None => Ok(BTreeMap::new()),
            Some(oid) => Ok(self.database.load_tree(oid)?.into_entries().collect()),
        }
    }

    /// Walk the old side: paths missing from or different in the new tree.
    fn detect_deletions(
        &mut self,
        old: &TreeEntryMap,
        new: &TreeEntryMap,
        prefix: &Path,
    ) -> Result<()> {
        for (name, entry) in old {
            let path = prefix.join(name);
            let other = new.get(name);

            if other == Some(entry) {
                continue;
            }

            let old_subtree = entry.is_tree().then_some(&entry.oid);
            let new_subtree = other.filter(|other| other.is_tree()).map(|other| &other.oid);
            self.compare_at(old_subtree, new_subtree, &path)?;

            let old_blob = (!entry.is_tree()).then(|| entry.clone());
            let new_blob = other.filter(|other| !other.is_tree()).cloned();
            if let Some(change) = TreeChange::from_entries(old_blob, new_blob) {
                self.change_set.insert(path, change);
            }
        }

        Ok(())
    }

    /// Walk the new side: paths absent from the old tree entirely.
    fn detect_additions(
        &mut self,
        old: &TreeEntryMap,
        new: &TreeEntryMap,
        prefix: &Path,
    ) -> Result<()> {
        for (name, entry) in new {
            if old.contains_key(name) {
                continue;
            }

            let path = prefix.join(name);
            if entry.is_tree() {
                self.compare_at(None, Some(&entry.oid), &path)?;
            } else {
                self.change_set.insert(path, TreeChange::Added(entry.clone()));
            }
        }

        Ok(())
    }
}

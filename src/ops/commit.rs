use crate::areas::repository::Repository;
use crate::artifacts::index::index_entry::IndexEntry;
use crate::artifacts::objects::commit::{Author, Commit};
use crate::artifacts::objects::object::Object;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::tree::Tree;
use crate::artifacts::reference::ref_name::RefName;
use crate::artifacts::reference::update::Expect;
use crate::errors::Result;
use std::path::Path;

impl Repository {
    /// Stage every workspace file under the given path prefixes (`"."`
    /// stages everything), snapshot the index as a tree, and commit it on
    /// top of the current HEAD.
    ///
    /// Staging replaces the index's view of each prefix wholesale, so files
    /// deleted from the workspace fall out of the snapshot. HEAD moves by
    /// compare-and-set against the parent commit; a concurrent move of the
    /// same branch surfaces as `CasRejected`.
    pub fn commit(&self, message: &str, path_patterns: &[&str]) -> Result<ObjectId> {
        let workspace = self.workspace()?;
        let mut index = self.index()?;

        for pattern in path_patterns {
            let prefix = Path::new(pattern);
            index.remove_under(prefix);

            for file in workspace.list_files(prefix)? {
                let blob = workspace.read_blob(&file)?;
                let mode = workspace.file_mode(&file);
                let oid = self.database().store(&blob)?;
                index.add(IndexEntry::new(file, oid, mode));
            }
        }
        index.write_updates()?;

        let tree = Tree::build(index.entries())?;
        let store_tree = &|tree: &Tree| self.database().store(tree).map(|_| ());
        tree.traverse(store_tree)?;
        let tree_oid = tree.object_id()?;

        let head = RefName::head();
        let parent = self.refs().try_resolve(&head)?;

        let author = Author::from_env();
        let commit = Commit::new(
            parent.clone().into_iter().collect(),
            tree_oid,
            author,
            message.trim().to_string(),
        );
        let commit_oid = self.database().store(&commit)?;

        let expect = match &parent {
            Some(oid) => Expect::At(oid.clone()),
            None => Expect::Absent,
        };
        let log_message = match &parent {
            Some(_) => format!("commit: {}", commit.short_message()),
            None => format!("commit (initial): {}", commit.short_message()),
        };

        self.refs()
            .update(self.database(), &head, &expect, &commit_oid, &log_message)?
            .required(&head)?;

        tracing::debug!(oid = %commit_oid, "created commit");

        Ok(commit_oid)
    }
}

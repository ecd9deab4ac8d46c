//! Tree object.
//!
//! Trees are directory snapshots: ordered entries mapping a name to the OID
//! and mode of a blob (file) or another tree (subdirectory).
//!
//! ## Format
//!
//! On disk: `tree <size>\0<entries>`, each entry `<mode> <name>\0<20-byte
//! oid>`. Entries are kept in a BTree, so serialization order (and with it
//! the tree's OID) is canonical for a given set of entries.
//!
//! ## Building
//!
//! A tree is either built bottom-up from flat index entries (for commits)
//! or deserialized from the database (for diffs and checkouts).

use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::index::entry_mode::EntryMode;
use crate::artifacts::index::index_entry::IndexEntry;
use crate::artifacts::objects::object::Unpackable;
use crate::artifacts::objects::object::{Object, Packable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::{Error, Result};
use bytes::Bytes;
use std::collections::BTreeMap;
use std::io::{BufRead, Write};
use std::path::Path;

#[derive(Debug, Clone)]
enum TreeNode {
    /// File entry (blob)
    File(IndexEntry),
    /// Directory entry (nested tree)
    Directory(Tree),
}

impl TreeNode {
    fn mode(&self) -> EntryMode {
        match self {
            TreeNode::File(entry) => entry.entry_mode(),
            TreeNode::Directory(_) => EntryMode::Directory,
        }
    }

    fn oid(&self) -> Result<ObjectId> {
        match self {
            TreeNode::File(entry) => Ok(entry.oid.clone()),
            TreeNode::Directory(tree) => tree.object_id(),
        }
    }
}

/// Directory snapshot.
///
/// Two entry sets back the two directions of use: `readable_entries` holds
/// what was deserialized from the database, `writeable_entries` holds the
/// hierarchy being built from index entries before storing.
#[derive(Debug, Clone, Default)]
pub struct Tree {
    /// Entries loaded from the database (read mode)
    readable_entries: BTreeMap<String, DatabaseEntry>,
    /// Entries being built (write mode)
    writeable_entries: BTreeMap<String, TreeNode>,
}

impl Tree {
    /// Build a hierarchical tree from flat index entries.
    pub fn build<'e>(entries: impl Iterator<Item = &'e IndexEntry>) -> Result<Self> {
        let mut root = Self::default();

        for entry in entries {
            let parents = entry.parent_dirs();
            root.add_entry(parents, entry)?;
        }

        Ok(root)
    }

    /// Visit every subtree post-order (children before parents), so a
    /// storing visitor knows child OIDs before it serializes the parent.
    pub fn traverse<F>(&self, func: &F) -> Result<()>
    where
        F: Fn(&Tree) -> Result<()>,
    {
        for node in self.writeable_entries.values() {
            if let TreeNode::Directory(tree) = node {
                tree.traverse(func)?;
            }
        }
        func(self)
    }

    fn add_entry(&mut self, parents: Vec<&Path>, entry: &IndexEntry) -> Result<()> {
        if parents.is_empty() {
            self.writeable_entries
                .insert(entry.basename()?.to_string(), TreeNode::File(entry.clone()));
            return Ok(());
        }

        let parent = parents[0]
            .file_name()
            .and_then(|s| s.to_str())
            .ok_or_else(|| Error::malformed("tree", "invalid parent directory name"))?;
        // directory keys carry a trailing '/' so siblings sort the same way
        // the serialized form does
        let parent = format!("{parent}/");

        let node = self
            .writeable_entries
            .entry(parent)
            .or_insert_with(|| TreeNode::Directory(Tree::default()));
        match node {
            TreeNode::Directory(tree) => tree.add_entry(parents[1..].to_vec(), entry),
            TreeNode::File(_) => Err(Error::malformed(
                "tree",
                format!("path collision on {:?}", entry.name),
            )),
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = (&String, &DatabaseEntry)> {
        self.readable_entries.iter()
    }

    pub fn into_entries(self) -> impl Iterator<Item = (String, DatabaseEntry)> {
        self.readable_entries.into_iter()
    }

    pub fn is_empty(&self) -> bool {
        self.readable_entries.is_empty() && self.writeable_entries.is_empty()
    }
}

impl Packable for Tree {
    fn serialize(&self) -> Result<Bytes> {
        let mut content_bytes = Vec::new();
        for (name, node) in &self.writeable_entries {
            let name = name.trim_end_matches('/');

            let header = format!("{:o} {}", node.mode().as_u32(), name);
            content_bytes.write_all(header.as_bytes())?;
            content_bytes.push(0);
            node.oid()?.write_h40_to(&mut content_bytes)?;
        }

        let mut tree_bytes = Vec::new();
        let header = format!("{} {}\0", self.object_type().as_str(), content_bytes.len());
        tree_bytes.write_all(header.as_bytes())?;
        tree_bytes.write_all(&content_bytes)?;

        Ok(Bytes::from(tree_bytes))
    }
}

impl Unpackable for Tree {
    fn deserialize(reader: impl BufRead) -> Result<Self> {
        let mut entries = BTreeMap::new();
        let mut reader = reader;

        // Reuse scratch buffers across entries
        let mut mode_bytes = Vec::new();
        let mut name_bytes = Vec::new();

        loop {
            mode_bytes.clear();
            let n = reader.read_until(b' ', &mut mode_bytes)?;
            if n == 0 {
                break; // clean EOF: no more entries
            }
            if *mode_bytes.last().unwrap() != b' ' {
                return Err(Error::malformed("tree", "unexpected EOF in entry mode"));
            }
            mode_bytes.pop();

            let mode_str = std::str::from_utf8(&mode_bytes)
                .map_err(|_| Error::malformed("tree", "non-UTF-8 entry mode"))?;
            let mode = EntryMode::try_from(mode_str)?;

            name_bytes.clear();
            let n = reader.read_until(b'\0', &mut name_bytes)?;
            if n == 0 || *name_bytes.last().unwrap() != b'\0' {
                return Err(Error::malformed("tree", "unexpected EOF in entry name"));
            }
            name_bytes.pop();
            let name = std::str::from_utf8(&name_bytes)
                .map_err(|_| Error::malformed("tree", "non-UTF-8 entry name"))?
                .to_owned();

            let oid = ObjectId::read_h40_from(&mut reader)
                .map_err(|_| Error::malformed("tree", "unexpected EOF in object id"))?;

            entries.insert(name, DatabaseEntry::new(oid, mode));
        }

        Ok(Tree {
            readable_entries: entries,
            writeable_entries: Default::default(),
        })
    }
}

impl Object for Tree {
    fn object_type(&self) -> ObjectType {
        ObjectType::Tree
    }
}

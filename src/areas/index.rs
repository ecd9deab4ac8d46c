//! Index (staged-state snapshot).
//!
//! The index records, path by path, what tree the working directory is
//! believed to represent: `path -> {blob OID, file mode}`. Commit builds its
//! tree from it; checkout rewrites it wholesale to mirror the target tree.
//!
//! ## File format
//!
//! - Header: signature, version, entry count
//! - Entries: sorted by path, NUL-terminated names, 8-byte aligned
//! - Checksum: SHA-1 of everything before it
//!
//! The index carries no filesystem stat data, so identical tree state always
//! serializes to identical bytes.

use crate::artifacts::index::checksum::Checksum;
use crate::artifacts::index::index_entry::{ENTRY_BLOCK, ENTRY_MIN_SIZE, IndexEntry};
use crate::artifacts::index::index_header::IndexHeader;
use crate::artifacts::index::{HEADER_SIZE, SIGNATURE, VERSION};
use crate::artifacts::objects::object::{Packable, Unpackable};
use crate::errors::{Error, Result};
use std::collections::BTreeMap;
use std::ops::DerefMut;
use std::path::{Path, PathBuf};

/// In-memory copy of the index file, edited and written back as a whole.
#[derive(Debug, Clone)]
pub struct Index {
    path: Box<Path>,
    entries: BTreeMap<PathBuf, IndexEntry>,
    changed: bool,
}

impl Index {
    pub fn new(path: Box<Path>) -> Self {
        Index {
            path,
            entries: BTreeMap::new(),
            changed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entry_by_path(&self, path: &Path) -> Option<&IndexEntry> {
        self.entries.get(path)
    }

    /// Entries in path order (the on-disk order).
    pub fn entries(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.values()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.changed = false;
    }

    /// Load the index from disk, verifying the trailing checksum.
    ///
    /// A missing file is created empty. Holds a shared lock on the file
    /// while reading.
    pub fn rehydrate(&mut self) -> Result<()> {
        if !self.path.exists() {
            self.clear();
            std::fs::File::create(&self.path)?;
        }

        let mut index_file = std::fs::OpenOptions::new().read(true).open(&self.path)?;
        let mut lock = file_guard::lock(&mut index_file, file_guard::Lock::Shared, 0, 1)?;

        self.clear();

        if lock.deref_mut().metadata()?.len() == 0 {
            return Ok(());
        }

        let mut reader = Checksum::new(lock);
        let entries_count = self.parse_header(&mut reader)?;
        self.parse_entries(entries_count, &mut reader)?;

        reader.verify()
    }

    fn parse_header(&self, reader: &mut Checksum) -> Result<u32> {
        let header_bytes = reader.read(HEADER_SIZE)?;
        let header = IndexHeader::deserialize(std::io::Cursor::new(header_bytes))?;

        if header.marker != SIGNATURE {
            return Err(Error::malformed("index", "invalid signature"));
        }
        if header.version != VERSION {
            return Err(Error::malformed(
                "index",
                format!("unsupported version {}", header.version),
            ));
        }

        Ok(header.entries_count)
    }

    /// Entries are framed without a length prefix: read the minimum block,
    /// then extend block by block until the terminating NUL padding shows.
    fn parse_entries(&mut self, entries_count: u32, reader: &mut Checksum) -> Result<()> {
        for _ in 0..entries_count {
            let mut entry_bytes = reader.read(ENTRY_MIN_SIZE)?.to_vec();

            while entry_bytes[entry_bytes.len() - 1] != 0 {
                entry_bytes.extend_from_slice(&reader.read(ENTRY_BLOCK)?);
            }

            let entry = IndexEntry::deserialize(std::io::Cursor::new(entry_bytes))?;
            self.entries.insert(entry.name.clone(), entry);
        }

        Ok(())
    }

    /// Stage one entry, evicting whatever conflicts with it: a file entry
    /// sitting where this entry needs a parent directory, and any entries
    /// nested under this entry's own path.
    pub fn add(&mut self, entry: IndexEntry) {
        for parent in entry.parent_dirs() {
            self.entries.remove(parent);
        }
        self.remove_nested(&entry.name);

        self.entries.insert(entry.name.clone(), entry);
        self.changed = true;
    }

    /// Drop the entry at `path` and anything nested under it.
    pub fn remove(&mut self, path: &Path) {
        self.entries.remove(path);
        self.remove_nested(path);
        self.changed = true;
    }

    /// Drop every entry at or under `prefix`; `.` clears the whole index.
    ///
    /// Staging re-adds what the workspace still holds afterwards, so files
    /// deleted on disk fall out of the index.
    pub fn remove_under(&mut self, prefix: &Path) {
        if prefix == Path::new(".") || prefix == Path::new("") {
            self.entries.clear();
        } else {
            self.entries
                .retain(|name, _| name != prefix && !name.starts_with(prefix));
        }
        self.changed = true;
    }

    /// Replace the whole index with `entries` (checkout's full rewrite).
    pub fn replace_with(&mut self, entries: impl IntoIterator<Item = IndexEntry>) {
        self.entries = entries
            .into_iter()
            .map(|entry| (entry.name.clone(), entry))
            .collect();
        self.changed = true;
    }

    fn remove_nested(&mut self, path: &Path) {
        self.entries
            .retain(|name, _| name == path || !name.starts_with(path));
    }

    /// Serialize the index back to its file under an exclusive lock.
    ///
    /// Skipped entirely when nothing changed since the last load or write.
    pub fn write_updates(&mut self) -> Result<()> {
        if !self.changed {
            return Ok(());
        }

        let mut index_file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)?;
        let lock = file_guard::lock(&mut index_file, file_guard::Lock::Exclusive, 0, 1)?;

        let mut writer = Checksum::new(lock);

        let header = IndexHeader::new(String::from(SIGNATURE), VERSION, self.entries.len() as u32);
        writer.write(&header.serialize()?)?;

        for entry in self.entries.values() {
            writer.write(&entry.serialize()?)?;
        }

        writer.write_checksum()?;
        self.changed = false;

        tracing::debug!(path = %self.path.display(), entries = self.entries.len(), "wrote index");
        Ok(())
    }
}

//! Index entry representation.
//!
//! Each entry names one tracked file: its path relative to the workspace
//! root, the blob OID of its content, and its file mode. Entries serialize
//! with NUL-terminated paths padded to 8-byte alignment, so a reader can
//! frame them without a length prefix.

use crate::artifacts::index::entry_mode::{EntryMode, FileMode};
use crate::artifacts::objects::object::{Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::{Error, Result};
use byteorder::{ByteOrder, WriteBytesExt};
use bytes::Bytes;
use derive_new::new;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

/// Block size for entry alignment (8 bytes).
pub const ENTRY_BLOCK: usize = 8;

/// Minimum size of a serialized entry: the fixed fields plus at least one
/// path byte and its NUL terminator, aligned.
pub const ENTRY_MIN_SIZE: usize = 32;

/// One tracked file in the index.
#[derive(Debug, Clone, Default, new)]
pub struct IndexEntry {
    /// File path relative to the workspace root
    pub name: PathBuf,
    /// Blob OID of the file content
    pub oid: ObjectId,
    /// File mode
    pub mode: FileMode,
}

impl IndexEntry {
    pub fn basename(&self) -> Result<&str> {
        self.name
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| Error::malformed("index entry", "invalid file name"))
    }

    /// Ancestor directories of this entry, shallowest first, excluding the
    /// workspace root itself.
    pub fn parent_dirs(&self) -> Vec<&Path> {
        let mut dirs = Vec::new();
        let mut parent = self.name.parent();

        while let Some(new_parent) = parent {
            dirs.push(new_parent);
            parent = new_parent.parent();
        }
        dirs.reverse();

        // the first element is the empty root path
        dirs[1..].to_vec()
    }

    pub fn entry_mode(&self) -> EntryMode {
        EntryMode::File(self.mode)
    }
}

impl PartialEq for IndexEntry {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for IndexEntry {}

impl PartialOrd for IndexEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for IndexEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.name.cmp(&other.name)
    }
}

impl Packable for IndexEntry {
    fn serialize(&self) -> Result<Bytes> {
        let entry_name = self
            .name
            .to_str()
            .ok_or_else(|| Error::malformed("index entry", "non-UTF-8 entry name"))?;

        let mut entry_bytes = Vec::new();
        entry_bytes.write_u32::<byteorder::NetworkEndian>(self.entry_mode().as_u32())?;
        self.oid.write_h40_to(&mut entry_bytes)?;
        entry_bytes.write_all(entry_name.as_bytes())?;

        // NUL terminator, then pad to the alignment block
        entry_bytes.push(0);
        while entry_bytes.len() % ENTRY_BLOCK != 0 {
            entry_bytes.push(0);
        }

        Ok(Bytes::from(entry_bytes))
    }
}

impl Unpackable for IndexEntry {
    fn deserialize(reader: impl BufRead) -> Result<Self> {
        let bytes = reader
            .bytes()
            .collect::<std::result::Result<Vec<u8>, std::io::Error>>()?;

        if bytes.len() < ENTRY_MIN_SIZE {
            return Err(Error::malformed("index entry", "truncated entry"));
        }

        let mode = EntryMode::try_from_u32(byteorder::NetworkEndian::read_u32(&bytes[0..4]))?;
        let mode = FileMode::try_from(mode)?;
        let mut oid_bytes = std::io::Cursor::new(&bytes[4..24]);
        let oid = ObjectId::read_h40_from(&mut oid_bytes)?;

        let name_end = bytes[24..]
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| Error::malformed("index entry", "missing NUL after entry name"))?;
        let name_bytes = &bytes[24..24 + name_end];
        let name = PathBuf::from(
            std::str::from_utf8(name_bytes)
                .map_err(|_| Error::malformed("index entry", "non-UTF-8 entry name"))?,
        );

        Ok(IndexEntry { name, oid, mode })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};
    use sha1::Digest;

    #[fixture]
    fn oid() -> ObjectId {
        let mut hasher = sha1::Sha1::new();
        hasher.update("test data");
        ObjectId::try_parse(format!("{:x}", hasher.finalize())).unwrap()
    }

    #[rstest]
    fn entry_parent_dirs(oid: ObjectId) {
        let entry = IndexEntry::new(PathBuf::from("a/b/c"), oid, FileMode::Regular);

        assert_eq!(entry.parent_dirs(), vec![Path::new("a"), Path::new("a/b")]);
    }

    #[rstest]
    fn entry_at_root_has_no_parent_dirs(oid: ObjectId) {
        let entry = IndexEntry::new(PathBuf::from("a"), oid, FileMode::Regular);

        assert_eq!(entry.parent_dirs(), Vec::<&Path>::new());
    }

    #[rstest]
    fn serialized_entry_is_block_aligned_and_roundtrips(oid: ObjectId) {
        let entry = IndexEntry::new(PathBuf::from("dir/file.txt"), oid.clone(), FileMode::Executable);

        let bytes = entry.serialize().unwrap();
        assert_eq!(bytes.len() % ENTRY_BLOCK, 0);

        let parsed = IndexEntry::deserialize(std::io::Cursor::new(bytes)).unwrap();
        assert_eq!(parsed.name, PathBuf::from("dir/file.txt"));
        assert_eq!(parsed.oid, oid);
        assert_eq!(parsed.mode, FileMode::Executable);
    }
}

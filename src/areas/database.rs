use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::diff::tree_diff::TreeDiff;
use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object::{Object, ParsedObject, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tag::Tag;
use crate::artifacts::objects::tree::Tree;
use crate::errors::{Error, Result};
use bytes::Bytes;
use sha1::{Digest, Sha1};
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::io::{BufRead, Cursor, Read, Write};
use std::path::{Path, PathBuf};

/// Content-addressed object store over a fan-out directory.
///
/// Writes are idempotent (an existing object path short-circuits) and
/// durable before return: content lands under a randomized temporary name
/// and is renamed into place, so a partially-written object is never
/// visible under its OID.
#[derive(Debug)]
pub struct Database {
    path: Box<Path>,
}

impl Database {
    pub fn new(path: Box<Path>) -> Self {
        Database { path }
    }

    pub fn objects_path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, object_id: &ObjectId) -> bool {
        self.path.join(object_id.to_path()).exists()
    }

    pub fn store(&self, object: &impl Object) -> Result<ObjectId> {
        let object_id = object.object_id()?;
        let object_path = self.path.join(object_id.to_path());

        // idempotent: identical content already lives at this path
        if !object_path.exists() {
            let object_content = object.serialize()?;
            std::fs::create_dir_all(object_path.parent().ok_or_else(|| {
                Error::malformed("object path", object_path.display().to_string())
            })?)?;

            self.write_object(&object_path, object_content)?;
            tracing::debug!(oid = %object_id, kind = %object.object_type(), "stored object");
        }

        Ok(object_id)
    }

    pub fn load(&self, object_id: &ObjectId) -> Result<Bytes> {
        self.read_object(object_id)
    }

    /// Store an already-encoded envelope under its OID, verifying the
    /// content address first. Transports use this to copy objects between
    /// stores without re-parsing them.
    pub fn store_raw(&self, object_id: &ObjectId, envelope: Bytes) -> Result<()> {
        let mut hasher = Sha1::new();
        hasher.update(&envelope);
        let actual = format!("{:x}", hasher.finalize());
        if actual != object_id.as_ref() {
            return Err(Error::malformed(
                "object",
                format!("content hashes to {actual}, expected {object_id}"),
            ));
        }

        let object_path = self.path.join(object_id.to_path());
        if !object_path.exists() {
            std::fs::create_dir_all(object_path.parent().ok_or_else(|| {
                Error::malformed("object path", object_path.display().to_string())
            })?)?;

            self.write_object(&object_path, envelope)?;
            tracing::debug!(oid = %object_id, "copied object");
        }

        Ok(())
    }

    pub fn parse_object(&self, object_id: &ObjectId) -> Result<ParsedObject> {
        let (object_type, object_reader) = self.parse_object_as_bytes(object_id)?;

        match object_type {
            ObjectType::Blob => Ok(ParsedObject::Blob(Box::new(Blob::deserialize(
                object_reader,
            )?))),
            ObjectType::Tree => Ok(ParsedObject::Tree(Box::new(Tree::deserialize(
                object_reader,
            )?))),
            ObjectType::Commit => Ok(ParsedObject::Commit(Box::new(Commit::deserialize(
                object_reader,
            )?))),
            ObjectType::Tag => Ok(ParsedObject::Tag(Box::new(Tag::deserialize(
                object_reader,
            )?))),
        }
    }

    pub fn parse_object_as_blob(&self, object_id: &ObjectId) -> Result<Option<Blob>> {
        let (object_type, object_reader) = self.parse_object_as_bytes(object_id)?;

        match object_type {
            ObjectType::Blob => Ok(Some(Blob::deserialize(object_reader)?)),
            _ => Ok(None),
        }
    }

    pub fn parse_object_as_tree(&self, object_id: &ObjectId) -> Result<Option<Tree>> {
        let (object_type, object_reader) = self.parse_object_as_bytes(object_id)?;

        match object_type {
            ObjectType::Tree => Ok(Some(Tree::deserialize(object_reader)?)),
            _ => Ok(None),
        }
    }

    pub fn parse_object_as_commit(&self, object_id: &ObjectId) -> Result<Option<Commit>> {
        let (object_type, object_reader) = self.parse_object_as_bytes(object_id)?;

        match object_type {
            ObjectType::Commit => Ok(Some(Commit::deserialize(object_reader)?)),
            _ => Ok(None),
        }
    }

    pub fn parse_object_as_tag(&self, object_id: &ObjectId) -> Result<Option<Tag>> {
        let (object_type, object_reader) = self.parse_object_as_bytes(object_id)?;

        match object_type {
            ObjectType::Tag => Ok(Some(Tag::deserialize(object_reader)?)),
            _ => Ok(None),
        }
    }

    pub fn object_type(&self, object_id: &ObjectId) -> Result<ObjectType> {
        let (object_type, _) = self.parse_object_as_bytes(object_id)?;
        Ok(object_type)
    }

    /// The tree named by `oid`, dereferencing a commit to its root tree.
    pub fn load_tree(&self, oid: &ObjectId) -> Result<Tree> {
        match self.parse_object(oid)? {
            ParsedObject::Tree(tree) => Ok(*tree),
            ParsedObject::Commit(commit) => {
                self.parse_object_as_tree(commit.tree_oid())?.ok_or_else(|| {
                    Error::malformed("tree", format!("{} is not a tree object", commit.tree_oid()))
                })
            }
            _ => Err(Error::malformed(
                "tree",
                format!("{oid} is not a tree object"),
            )),
        }
    }

    /// Diff two trees by OID; `None` stands for the empty tree.
    pub fn tree_diff(
        &self,
        old_oid: Option<&ObjectId>,
        new_oid: Option<&ObjectId>,
    ) -> Result<TreeDiff<'_>> {
        let mut tree_diff = TreeDiff::new(self);
        tree_diff.compare_oids(old_oid, new_oid)?;
        Ok(tree_diff)
    }

    /// Flatten a tree into its full path → entry listing, recursing through
    /// subtrees. `None` yields the empty listing.
    pub fn read_tree_flat(
        &self,
        tree_oid: Option<&ObjectId>,
    ) -> Result<BTreeMap<PathBuf, DatabaseEntry>> {
        let mut entries = BTreeMap::new();
        if let Some(oid) = tree_oid {
            self.collect_tree_entries(oid, Path::new(""), &mut entries)?;
        }
        Ok(entries)
    }

    fn collect_tree_entries(
        &self,
        tree_oid: &ObjectId,
        prefix: &Path,
        out: &mut BTreeMap<PathBuf, DatabaseEntry>,
    ) -> Result<()> {
        let tree = self.load_tree(tree_oid)?;

        for (name, entry) in tree.into_entries() {
            let path = prefix.join(name);
            if entry.is_tree() {
                self.collect_tree_entries(&entry.oid, &path, out)?;
            } else {
                out.insert(path, entry);
            }
        }

        Ok(())
    }

    /// Whether `ancestor` is reachable from `descendant` over parent edges.
    ///
    /// Breadth-first walk; non-commit objects terminate their branch. Used
    /// to classify ref updates as fast-forward or forced.
    pub fn is_ancestor(&self, ancestor: &ObjectId, descendant: &ObjectId) -> Result<bool> {
        if ancestor == descendant {
            return Ok(true);
        }

        let mut queue = VecDeque::from([descendant.clone()]);
        let mut seen = HashSet::new();

        while let Some(oid) = queue.pop_front() {
            if !seen.insert(oid.clone()) {
                continue;
            }
            let Some(commit) = self.parse_object_as_commit(&oid)? else {
                continue;
            };
            for parent in commit.parents() {
                if parent == ancestor {
                    return Ok(true);
                }
                queue.push_back(parent.clone());
            }
        }

        Ok(false)
    }

    fn parse_object_as_bytes(&self, object_id: &ObjectId) -> Result<(ObjectType, impl BufRead)> {
        let object_content = self.read_object(object_id)?;
        let mut object_reader = Cursor::new(object_content);

        let object_type = ObjectType::parse_header(&mut object_reader)?;

        Ok((object_type, object_reader))
    }

    fn read_object(&self, object_id: &ObjectId) -> Result<Bytes> {
        let object_path = self.path.join(object_id.to_path());

        let object_content = std::fs::read(&object_path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::NotFound {
                    oid: object_id.to_string(),
                }
            } else {
                Error::Io(e)
            }
        })?;

        Self::decompress(object_content.into())
    }

    fn write_object(&self, object_path: &Path, object_content: Bytes) -> Result<()> {
        let object_dir = object_path
            .parent()
            .ok_or_else(|| Error::malformed("object path", object_path.display().to_string()))?;
        let temp_object_path = object_dir.join(Self::generate_temp_name());

        let object_content = Self::compress(object_content)?;

        let mut file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_object_path)?;
        file.write_all(&object_content)?;

        // rename makes the object visible atomically
        std::fs::rename(&temp_object_path, object_path)?;

        Ok(())
    }

    fn compress(data: Bytes) -> Result<Bytes> {
        let mut encoder =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(&data)?;

        Ok(encoder.finish()?.into())
    }

    fn decompress(data: Bytes) -> Result<Bytes> {
        let mut decoder = flate2::read::ZlibDecoder::new(&*data);
        let mut decompressed_content = Vec::new();
        decoder.read_to_end(&mut decompressed_content)?;

        Ok(decompressed_content.into())
    }

    fn generate_temp_name() -> String {
        format!("tmp-obj-{}", rand::random::<u32>())
    }
}

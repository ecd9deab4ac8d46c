use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tag::Tag;
use crate::artifacts::objects::tree::Tree;
use crate::errors::Result;
use bytes::Bytes;
use sha1::{Digest, Sha1};
use std::io::BufRead;
use std::path::PathBuf;

/// Canonical envelope encoding: `<type> <size>\0<payload>`.
pub trait Packable {
    fn serialize(&self) -> Result<Bytes>;
}

/// Decode from a reader positioned after the envelope header.
pub trait Unpackable {
    fn deserialize(reader: impl BufRead) -> Result<Self>
    where
        Self: Sized;
}

pub trait Object: Packable {
    fn object_type(&self) -> ObjectType;

    /// The identifier is the SHA-1 of the canonical encoding, which makes
    /// storage idempotent: identical content always lands at the same path.
    fn object_id(&self) -> Result<ObjectId> {
        let content = self.serialize()?;
        let mut hasher = Sha1::new();
        hasher.update(&content);

        let oid = hasher.finalize();
        ObjectId::try_parse(format!("{oid:x}"))
    }

    fn object_path(&self) -> Result<PathBuf> {
        Ok(self.object_id()?.to_path())
    }
}

/// A deserialized object of any kind, dispatched on its type discriminator.
pub enum ParsedObject {
    Blob(Box<Blob>),
    Tree(Box<Tree>),
    Commit(Box<Commit>),
    Tag(Box<Tag>),
}

impl ParsedObject {
    pub fn object_type(&self) -> ObjectType {
        match self {
            ParsedObject::Blob(_) => ObjectType::Blob,
            ParsedObject::Tree(_) => ObjectType::Tree,
            ParsedObject::Commit(_) => ObjectType::Commit,
            ParsedObject::Tag(_) => ObjectType::Tag,
        }
    }
}

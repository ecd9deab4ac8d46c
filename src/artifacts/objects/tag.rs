//! Annotated tag object.
//!
//! A tag names another object (usually a commit) and records who tagged
//! it and why. Lightweight tags are plain refs and never produce one of
//! these; only annotated tags are stored as objects.
//!
//! ## Format
//!
//! On disk:
//! ```text
//! tag <size>\0
//! object <target-oid>
//! type <target-type>
//! tag <name>
//! tagger <name> <email> <timestamp> <timezone>
//!
//! <message>
//! ```

use crate::artifacts::objects::commit::Author;
use crate::artifacts::objects::object::Unpackable;
use crate::artifacts::objects::object::{Object, Packable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::{Error, Result};
use bytes::Bytes;
use derive_new::new;
use std::io::{BufRead, Write};

/// Annotated pointer at another object.
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct Tag {
    target: ObjectId,
    target_type: ObjectType,
    name: String,
    tagger: Author,
    message: String,
}

impl Tag {
    pub fn target(&self) -> &ObjectId {
        &self.target
    }

    pub fn target_type(&self) -> ObjectType {
        self.target_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tagger(&self) -> &Author {
        &self.tagger
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Packable for Tag {
    fn serialize(&self) -> Result<Bytes> {
        let mut object_content = vec![];

        object_content.push(format!("object {}", self.target.as_ref()));
        object_content.push(format!("type {}", self.target_type.as_str()));
        object_content.push(format!("tag {}", self.name));
        object_content.push(format!("tagger {}", self.tagger.display()));
        object_content.push(String::new());
        object_content.push(self.message.to_string());

        let content_bytes = object_content.join("\n").into_bytes();

        let mut tag_bytes = Vec::new();
        let header = format!("{} {}\0", self.object_type().as_str(), content_bytes.len());
        tag_bytes.write_all(header.as_bytes())?;
        tag_bytes.write_all(&content_bytes)?;

        Ok(Bytes::from(tag_bytes))
    }
}

impl Unpackable for Tag {
    fn deserialize(reader: impl BufRead) -> Result<Self> {
        let content = reader
            .bytes()
            .collect::<std::result::Result<Vec<u8>, std::io::Error>>()?;

        let content =
            String::from_utf8(content).map_err(|_| Error::malformed("tag", "non-UTF-8 payload"))?;
        let mut lines = content.lines();

        let target = lines
            .next()
            .and_then(|line| line.strip_prefix("object "))
            .ok_or_else(|| Error::malformed("tag", "missing object line"))?;
        let target = ObjectId::try_parse(target.to_string())?;

        let target_type = lines
            .next()
            .and_then(|line| line.strip_prefix("type "))
            .ok_or_else(|| Error::malformed("tag", "missing type line"))?;
        let target_type = ObjectType::try_from(target_type)?;

        let name = lines
            .next()
            .and_then(|line| line.strip_prefix("tag "))
            .ok_or_else(|| Error::malformed("tag", "missing tag line"))?
            .to_string();

        let tagger = lines
            .next()
            .and_then(|line| line.strip_prefix("tagger "))
            .ok_or_else(|| Error::malformed("tag", "missing tagger line"))?;
        let tagger = Author::try_from(tagger)?;

        // skip the blank separator line
        lines.next();

        let message = lines.collect::<Vec<&str>>().join("\n");
        Ok(Self::new(target, target_type, name, tagger, message))
    }
}

impl Object for Tag {
    fn object_type(&self) -> ObjectType {
        ObjectType::Tag
    }
}

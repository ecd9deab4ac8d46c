//! Blob object.
//!
//! Blobs hold file content and nothing else: no name, no permissions
//! (those live in tree entries). The payload is raw bytes; binary content
//! round-trips untouched.
//!
//! ## Format
//!
//! On disk: `blob <size>\0<content>`

use crate::artifacts::objects::object::Unpackable;
use crate::artifacts::objects::object::{Object, Packable};
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::Result;
use bytes::Bytes;
use derive_new::new;
use std::io::{BufRead, Write};

/// File content, identified by the SHA-1 of its envelope.
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct Blob {
    content: Bytes,
}

impl Blob {
    pub fn from_slice(content: &[u8]) -> Self {
        Self::new(Bytes::copy_from_slice(content))
    }

    pub fn content(&self) -> &Bytes {
        &self.content
    }

    pub fn into_content(self) -> Bytes {
        self.content
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

impl Packable for Blob {
    fn serialize(&self) -> Result<Bytes> {
        let mut blob_bytes = Vec::new();
        let header = format!("{} {}\0", self.object_type().as_str(), self.content.len());
        blob_bytes.write_all(header.as_bytes())?;
        blob_bytes.write_all(&self.content)?;

        Ok(Bytes::from(blob_bytes))
    }
}

impl Unpackable for Blob {
    fn deserialize(reader: impl BufRead) -> Result<Self> {
        // the envelope header has already been read
        let content = reader
            .bytes()
            .collect::<std::result::Result<Vec<u8>, std::io::Error>>()?;

        Ok(Self::new(Bytes::from(content)))
    }
}

impl Object for Blob {
    fn object_type(&self) -> ObjectType {
        ObjectType::Blob
    }
}

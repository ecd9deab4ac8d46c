//! Commit object.
//!
//! Commits snapshot the repository at a point in time:
//! - a tree object ID (directory snapshot)
//! - parent commit ID(s) (history; empty for the first commit)
//! - author and committer identity
//! - message
//!
//! ## Format
//!
//! On disk:
//! ```text
//! commit <size>\0
//! tree <tree-oid>
//! parent <parent-oid>
//! author <name> <email> <timestamp> <timezone>
//! committer <name> <email> <timestamp> <timezone>
//!
//! <message>
//! ```

use crate::artifacts::objects::object::Unpackable;
use crate::artifacts::objects::object::{Object, Packable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::{Error, Result};
use bytes::Bytes;
use std::io::{BufRead, Write};

/// Author or committer identity with its timestamp.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Author {
    name: String,
    email: String,
    timestamp: chrono::DateTime<chrono::FixedOffset>,
}

impl Author {
    /// Identity stamped with the current local time.
    pub fn new(name: String, email: String) -> Self {
        Author {
            name,
            email,
            timestamp: chrono::Local::now().fixed_offset(),
        }
    }

    pub fn new_with_timestamp(
        name: String,
        email: String,
        timestamp: chrono::DateTime<chrono::FixedOffset>,
    ) -> Self {
        Author {
            name,
            email,
            timestamp,
        }
    }

    /// Identity from `KEEL_AUTHOR_NAME` / `KEEL_AUTHOR_EMAIL` /
    /// `KEEL_AUTHOR_DATE` (RFC 2822), falling back to a neutral identity
    /// when unset. The engine keeps no per-repository identity config.
    pub fn from_env() -> Self {
        let name =
            std::env::var("KEEL_AUTHOR_NAME").unwrap_or_else(|_| String::from("keel"));
        let email = std::env::var("KEEL_AUTHOR_EMAIL")
            .unwrap_or_else(|_| String::from("keel@localhost"));
        let timestamp = std::env::var("KEEL_AUTHOR_DATE")
            .ok()
            .and_then(|date_str| chrono::DateTime::parse_from_rfc2822(&date_str).ok());

        match timestamp {
            Some(ts) => Author::new_with_timestamp(name, email, ts),
            None => Author::new(name, email),
        }
    }

    /// `Name <email> timestamp timezone`, the header-line form.
    pub fn display(&self) -> String {
        format!(
            "{} <{}> {} {}",
            self.name,
            self.email,
            self.timestamp.timestamp(),
            self.timestamp.format("%z")
        )
    }

    pub fn timestamp(&self) -> chrono::DateTime<chrono::FixedOffset> {
        self.timestamp
    }
}

impl TryFrom<&str> for Author {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        // Format: "name <email> timestamp timezone"; split from the right so
        // names containing spaces survive
        let parts: Vec<&str> = value.rsplitn(3, ' ').collect();
        if parts.len() < 3 {
            return Err(Error::malformed("author", format!("{value:?}")));
        }

        let timezone = parts[0];
        let seconds = parts[1];
        let name_email_part = parts[2];

        let email_start = name_email_part
            .find('<')
            .ok_or_else(|| Error::malformed("author", "missing '<'"))?;
        let email_end = name_email_part
            .find('>')
            .ok_or_else(|| Error::malformed("author", "missing '>'"))?;

        let name = name_email_part[..email_start].trim().to_string();
        let email = name_email_part[email_start + 1..email_end].to_string();

        let datetime =
            chrono::DateTime::parse_from_str(&format!("{seconds} {timezone}"), "%s %z")
                .map_err(|_| Error::malformed("author", "invalid timestamp"))?;

        Ok(Author {
            name,
            email,
            timestamp: datetime,
        })
    }
}

/// Snapshot of the repository with metadata and history links.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Commit {
    /// Parent commit IDs (empty for the initial commit)
    parents: Vec<ObjectId>,
    /// Tree object ID for the directory snapshot
    tree_oid: ObjectId,
    author: Author,
    committer: Author,
    message: String,
}

impl Commit {
    pub fn new(
        parents: Vec<ObjectId>,
        tree_oid: ObjectId,
        author: Author,
        message: String,
    ) -> Self {
        Commit {
            parents,
            tree_oid,
            author: author.clone(),
            committer: author,
            message,
        }
    }

    /// First line of the message, for reflog entries and summaries.
    pub fn short_message(&self) -> String {
        self.message.lines().next().unwrap_or("").to_string()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn tree_oid(&self) -> &ObjectId {
        &self.tree_oid
    }

    pub fn parent(&self) -> Option<&ObjectId> {
        self.parents.first()
    }

    pub fn parents(&self) -> &[ObjectId] {
        &self.parents
    }

    pub fn author(&self) -> &Author {
        &self.author
    }
}

impl Packable for Commit {
    fn serialize(&self) -> Result<Bytes> {
        let mut object_content = vec![];

        object_content.push(format!("tree {}", self.tree_oid.as_ref()));
        for parent in &self.parents {
            object_content.push(format!("parent {}", parent.as_ref()));
        }
        object_content.push(format!("author {}", self.author.display()));
        object_content.push(format!("committer {}", self.committer.display()));
        object_content.push(String::new());
        object_content.push(self.message.to_string());

        let content_bytes = object_content.join("\n").into_bytes();

        let mut commit_bytes = Vec::new();
        let header = format!("{} {}\0", self.object_type().as_str(), content_bytes.len());
        commit_bytes.write_all(header.as_bytes())?;
        commit_bytes.write_all(&content_bytes)?;

        Ok(Bytes::from(commit_bytes))
    }
}

impl Unpackable for Commit {
    fn deserialize(reader: impl BufRead) -> Result<Self> {
        let content = reader
            .bytes()
            .collect::<std::result::Result<Vec<u8>, std::io::Error>>()?;

        let content = String::from_utf8(content)
            .map_err(|_| Error::malformed("commit", "non-UTF-8 payload"))?;
        let mut lines = content.lines();

        let tree_line = lines
            .next()
            .ok_or_else(|| Error::malformed("commit", "missing tree line"))?;
        let tree_oid = tree_line
            .strip_prefix("tree ")
            .ok_or_else(|| Error::malformed("commit", "invalid tree line"))?
            .to_string();
        let tree_oid = ObjectId::try_parse(tree_oid)?;

        // Zero or more parent lines precede the author line
        let mut parents = Vec::new();
        let mut next_line = lines
            .next()
            .ok_or_else(|| Error::malformed("commit", "missing author line"))?;

        while let Some(parent_oid) = next_line.strip_prefix("parent ") {
            parents.push(ObjectId::try_parse(parent_oid.to_string())?);

            next_line = lines
                .next()
                .ok_or_else(|| Error::malformed("commit", "missing author line"))?;
        }

        let author = next_line
            .strip_prefix("author ")
            .ok_or_else(|| Error::malformed("commit", "invalid author line"))?;
        let author = Author::try_from(author)?;

        let committer_line = lines
            .next()
            .ok_or_else(|| Error::malformed("commit", "missing committer line"))?;
        let committer = committer_line
            .strip_prefix("committer ")
            .ok_or_else(|| Error::malformed("commit", "invalid committer line"))?;
        let committer = Author::try_from(committer)?;

        // skip the blank separator line
        lines.next();

        let message = lines.collect::<Vec<&str>>().join("\n");
        Ok(Commit {
            parents,
            tree_oid,
            author,
            committer,
            message,
        })
    }
}

impl Object for Commit {
    fn object_type(&self) -> ObjectType {
        ObjectType::Commit
    }
}

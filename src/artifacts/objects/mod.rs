//! Object types stored in the database.
//!
//! All repository content is held as immutable objects identified by the
//! SHA-1 of their canonical encoding. There are four kinds:
//!
//! - **Blob**: opaque file payload (binary-safe)
//! - **Tree**: directory listing (names, modes, and object IDs)
//! - **Commit**: snapshot with metadata (author, message, parents, tree)
//! - **Tag**: annotated pointer at another object (tagger, message, target)
//!
//! All objects share one canonical envelope: `<type> <size>\0<content>`.
//! The OID is the digest of the uncompressed envelope; the database stores
//! it zlib-compressed.

pub mod blob;
pub mod commit;
pub mod object;
pub mod object_id;
pub mod object_type;
pub mod tag;
pub mod tree;

/// Length of a SHA-1 digest in hexadecimal form.
pub const OBJECT_ID_LENGTH: usize = 40;

//! Index file format.
//!
//! The index is the staged-state snapshot: the flat list of path → {OID,
//! mode} the working directory is believed to match. It carries no stat
//! cache, and checkout rewrites it wholesale from the target tree, so
//! identical tree state always serializes to identical bytes.
//!
//! ## File Format (Version 1)
//!
//! ```text
//! Header (12 bytes):
//!   - Signature: "KIDX" (4 bytes)
//!   - Version: 1 (4 bytes)
//!   - Entry count (4 bytes)
//!
//! Entries (variable length, sorted by path):
//!   - Mode (4 bytes), OID (20 bytes), NUL-terminated path
//!   - Each entry padded with NULs to 8-byte alignment
//!
//! Checksum (20 bytes):
//!   - SHA-1 hash of all preceding bytes
//! ```

pub mod checksum;
pub mod entry_mode;
pub mod index_entry;
pub mod index_header;

/// Size of the SHA-1 checksum in bytes.
pub const CHECKSUM_SIZE: usize = 20;

/// Size of the index header in bytes.
pub const HEADER_SIZE: usize = 12;

/// Magic signature identifying index files.
pub const SIGNATURE: &str = "KIDX";

/// Index file format version.
pub const VERSION: u32 = 1;

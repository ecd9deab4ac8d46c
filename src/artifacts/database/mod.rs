//! Database entry types.
//!
//! Types used when reading objects back out of the database: an entry pairs
//! an object ID with the mode it carries in its parent tree.

pub mod database_entry;

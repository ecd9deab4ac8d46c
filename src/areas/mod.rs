//! The on-disk surfaces one repository is made of:
//!
//! - `database`: content-addressed object store under `objects/`
//! - `refs`: reference store with compare-and-set updates and reflogs
//! - `index`: binary staged-state snapshot mirroring the checked-out tree
//! - `workspace`: working-directory reads and checkout file operations
//! - `config`: core record and remote descriptors (JSON)
//! - `repository`: composition of the above around one state directory

pub mod config;
pub mod database;
pub mod index;
pub mod refs;
pub mod repository;
pub mod workspace;

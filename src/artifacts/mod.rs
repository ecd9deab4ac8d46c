//! Domain types and algorithms, independent of any one repository's disk
//! state:
//!
//! - `objects`: the immutable object kinds (blob, tree, commit, tag)
//! - `reference`: ref names, reflog lines, update outcomes
//! - `database`: tree entry records shared by trees and the index
//! - `index`: index entry encoding and checksummed framing
//! - `diff`: tree-to-tree comparison
//! - `checkout`: migration planning and application
//! - `remote`: remote descriptors and ref-spec mappings
//! - `sync`: transports plus the fetch/push orchestrations

pub mod checkout;
pub mod database;
pub mod diff;
pub mod index;
pub mod objects;
pub mod reference;
pub mod remote;
pub mod sync;

//! keel: a minimal version-control engine.
//!
//! The crate is a library with no command surface: callers drive it through
//! [`Repository`]. It is organized in two layers:
//!
//! - `areas`: stateful stores rooted in the repository directory (object
//!   database, index, refs, workspace, configuration)
//! - `artifacts`: the data structures and algorithms those stores exchange
//!   (objects, tree diffs, checkout migrations, ref-specs, sync pipelines)
//!
//! `ops` composes the areas into the user-facing operations: init/open,
//! clone, commit, branch, tag, checkout, fetch, and push.

pub mod areas;
pub mod artifacts;
pub mod errors;
pub mod ops;

pub use areas::repository::Repository;
pub use artifacts::objects::object_id::ObjectId;
pub use errors::{Error, Result};

//! Checkout: planning and applying the filesystem and index changes that
//! move a working directory from one tree to another.
//!
//! The plan is derived purely from the tree-to-tree diff; the working
//! directory is never scanned. Application is ordered but not atomic: a
//! mid-apply failure leaves a partial migration behind, and re-running the
//! same checkout converges it.

pub mod migration;

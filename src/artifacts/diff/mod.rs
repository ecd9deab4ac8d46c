//! Tree-to-tree comparison: the change set checkout plans from.

pub mod tree_diff;

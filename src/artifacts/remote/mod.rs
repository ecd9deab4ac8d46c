//! Remote configuration: descriptors and ref-spec mappings.

pub mod descriptor;
pub mod refspec;

/// The remote name a cloned repository registers its source under.
pub const DEFAULT_REMOTE: &str = "origin";

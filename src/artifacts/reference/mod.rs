//! Reference names, update outcomes, and the reflog line format.
//!
//! A reference is a mutable name for an object:
//! - `HEAD` plus everything under `refs/` (`refs/heads/`, `refs/tags/`,
//!   `refs/remotes/<remote>/`)
//! - stored either as a direct ref (a 40-hex OID) or as a symbolic ref
//!   (`ref: <target>`) pointing at another reference
//! - mutated only through the compare-and-set update of [`crate::areas::refs`],
//!   which mirrors every applied change into an append-only log under `logs/`

pub mod ref_name;
pub mod reflog;
pub mod update;

pub const HEAD: &str = "HEAD";
pub const HEADS_NAMESPACE: &str = "refs/heads/";
pub const TAGS_NAMESPACE: &str = "refs/tags/";
pub const REMOTES_NAMESPACE: &str = "refs/remotes/";

/// Content prefix of a symbolic reference file.
pub const SYMREF_PREFIX: &str = "ref: ";
pub const SYMREF_REGEX: &str = r"^ref: (.+)$";

/// How many symbolic hops resolution follows before reporting the chain
/// unresolvable.
pub const MAX_SYMREF_DEPTH: usize = 5;

pub const INVALID_REF_NAME_REGEX: &str =
    r"^\.|\/\.|\.\.|^\/|\/$|\.lock$|@\{|[\x00-\x20\*:\?\[\\~\^\x7f]";
pub const REF_ALIASES: phf::Map<&'static str, &'static str> = phf::phf_map! {
    "@" => "HEAD",
};

//! Crate-wide error taxonomy.
//!
//! Every fallible operation reports one of these variants synchronously to
//! its caller, carrying enough context (ref name, expected vs. actual OID,
//! remote name, path) to diagnose the failure without inspecting internals.
//! Nothing is retried inside the engine; `CasRejected` is the one variant a
//! caller is expected to routinely retry after re-resolving.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Placeholder for an absent value in CAS diagnostics.
pub const NO_VALUE: &str = "<none>";

#[derive(Debug, Error)]
pub enum Error {
    /// An object is absent from the object database.
    #[error("object {oid} not found")]
    NotFound { oid: String },

    /// A reference name does not exist anywhere in its resolution chain.
    #[error("unknown reference: {name}")]
    UnknownRef { name: String },

    /// A symbolic-ref chain exceeded the dereference depth limit.
    #[error("unresolvable reference (symbolic chain too deep): {name}")]
    UnresolvableRef { name: String },

    /// A remote is unusable for the requested network operation.
    #[error("remote {remote}: {reason}")]
    ConfigError { remote: String, reason: String },

    /// A compare-and-set ref update found a value other than the expected
    /// one. `<none>` stands for "ref absent" on either side.
    #[error("update of {name} rejected: expected {expected}, found {actual}")]
    CasRejected {
        name: String,
        expected: String,
        actual: String,
    },

    /// The transport could not reach or converse with the remote.
    #[error("transport to {url} failed: {reason}")]
    TransportError { url: String, reason: String },

    /// A workspace write or delete failed mid-checkout. The working
    /// directory is left partially migrated; re-running the checkout
    /// converges it.
    #[error("filesystem operation on {path} failed")]
    FilesystemError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A branch or tag with this name already exists and force was not set.
    #[error("{name} already exists")]
    AlreadyExists { name: String },

    /// The path holds no repository state directory.
    #[error("not a keel repository: {path}")]
    NotARepository { path: PathBuf },

    /// A working-directory operation was invoked on a bare repository.
    #[error("bare repository has no working directory: {path}")]
    BareRepository { path: PathBuf },

    #[error("invalid reference name: {name}")]
    InvalidRefName { name: String },

    #[error("invalid ref-spec: {spec}")]
    InvalidRefSpec { spec: String },

    #[error("invalid object id: {value}")]
    InvalidOid { value: String },

    /// Stored bytes that do not deserialize as the named kind of record.
    #[error("malformed {kind}: {reason}")]
    Malformed { kind: &'static str, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Attach the offending path to an I/O failure from the workspace.
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::FilesystemError {
            path: path.into(),
            source,
        }
    }

    pub fn malformed(kind: &'static str, reason: impl Into<String>) -> Self {
        Error::Malformed {
            kind,
            reason: reason.into(),
        }
    }
}

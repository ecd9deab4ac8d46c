use crate::areas::database::Database;
use crate::areas::repository::Repository;
use crate::artifacts::objects::object::ParsedObject;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::reference::ref_name::RefName;
use crate::artifacts::reference::update::{Expect, RefUpdate};
use crate::errors::{Error, Result};

/// URL scheme prefix accepted (and stripped) by [`FileTransport`].
pub const FILE_SCHEME: &str = "file://";

/// One requested ref change transmitted by a push.
#[derive(Debug, Clone)]
pub struct RemoteRefUpdate {
    pub name: RefName,
    /// Last-known remote value, taken from the local remote-tracking ref.
    pub expected_old: Expect,
    pub new_oid: ObjectId,
    pub force: bool,
}

/// Remote-side verdict on one requested ref change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefPushStatus {
    Updated,
    NoChange,
    Rejected { reason: String },
}

impl RefPushStatus {
    pub fn is_rejected(&self) -> bool {
        matches!(self, RefPushStatus::Rejected { .. })
    }
}

impl std::fmt::Display for RefPushStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefPushStatus::Updated => write!(f, "updated"),
            RefPushStatus::NoChange => write!(f, "no-change"),
            RefPushStatus::Rejected { reason } => write!(f, "rejected ({reason})"),
        }
    }
}

/// How sync operations converse with a remote repository.
///
/// Implementations connect per call; failure to reach the remote surfaces
/// as `TransportError` carrying the URL. Per-ref verdicts are data, not
/// errors.
pub trait Transport {
    /// Every ref the remote advertises, resolved and sorted by name.
    fn advertise_refs(&self, url: &str) -> Result<Vec<(RefName, ObjectId)>>;

    /// Copy the object closures of `wanted` into `sink`, pruning any
    /// subgraph the sink already stores. Returns the number of objects
    /// newly stored.
    fn fetch_objects(&self, url: &str, wanted: &[ObjectId], sink: &Repository) -> Result<usize>;

    /// Transmit the closures of the updates' new values out of `source`,
    /// then ask the remote to apply the ref changes under its
    /// fast-forward policy. One verdict per requested update, in order.
    fn push_objects(
        &self,
        url: &str,
        source: &Repository,
        updates: &[RemoteRefUpdate],
    ) -> Result<Vec<RefPushStatus>>;
}

/// [`Transport`] between repositories on the local filesystem. The URL is a
/// path, optionally behind a `file://` prefix.
#[derive(Debug, Default)]
pub struct FileTransport;

impl FileTransport {
    pub fn new() -> Self {
        FileTransport
    }

    fn open_peer(url: &str) -> Result<Repository> {
        let path = url.strip_prefix(FILE_SCHEME).unwrap_or(url);

        Repository::open(path).map_err(|err| Error::TransportError {
            url: url.to_string(),
            reason: err.to_string(),
        })
    }
}

impl Transport for FileTransport {
    fn advertise_refs(&self, url: &str) -> Result<Vec<(RefName, ObjectId)>> {
        let peer = Self::open_peer(url)?;
        peer.refs().list("refs/")
    }

    fn fetch_objects(&self, url: &str, wanted: &[ObjectId], sink: &Repository) -> Result<usize> {
        let peer = Self::open_peer(url)?;

        let mut copied = 0;
        for oid in wanted {
            copied += copy_closure(peer.database(), sink.database(), oid)?;
        }

        tracing::debug!(url = %url, objects = copied, "fetched objects");

        Ok(copied)
    }

    fn push_objects(
        &self,
        url: &str,
        source: &Repository,
        updates: &[RemoteRefUpdate],
    ) -> Result<Vec<RefPushStatus>> {
        let peer = Self::open_peer(url)?;

        let mut statuses = Vec::with_capacity(updates.len());
        for update in updates {
            statuses.push(apply_push_update(source, &peer, update)?);
        }

        Ok(statuses)
    }
}

/// Apply one pushed ref change on the receiving side: land the objects,
/// enforce the fast-forward policy, then compare-and-set the ref.
fn apply_push_update(
    source: &Repository,
    peer: &Repository,
    update: &RemoteRefUpdate,
) -> Result<RefPushStatus> {
    let current = peer.refs().try_resolve(&update.name)?;
    if current.as_ref() == Some(&update.new_oid) {
        return Ok(RefPushStatus::NoChange);
    }

    // Objects land before the ref moves; a rejected update leaves them
    // unreferenced, never a ref pointing at missing history.
    copy_closure(source.database(), peer.database(), &update.new_oid)?;

    if !update.force {
        if let Some(current) = &current {
            if !peer.database().is_ancestor(current, &update.new_oid)? {
                return Ok(RefPushStatus::Rejected {
                    reason: String::from("non-fast-forward"),
                });
            }
        }
    }

    let expect = if update.force {
        Expect::Any
    } else {
        update.expected_old.clone()
    };

    let message = if update.force {
        "push: forced-update"
    } else {
        "push: fast-forward"
    };

    let outcome = peer.refs().update(
        peer.database(),
        &update.name,
        &expect,
        &update.new_oid,
        message,
    )?;

    Ok(match outcome {
        RefUpdate::Rejected { expected, actual } => RefPushStatus::Rejected {
            reason: format!("expected {expected}, found {actual}"),
        },
        RefUpdate::NoChange => RefPushStatus::NoChange,
        _ => RefPushStatus::Updated,
    })
}

/// Copy the object graph rooted at `root` from one store into another,
/// skipping every subgraph the sink already holds. Returns how many objects
/// were newly stored.
pub fn copy_closure(source: &Database, sink: &Database, root: &ObjectId) -> Result<usize> {
    let mut pending = vec![root.clone()];
    let mut copied = 0;

    while let Some(oid) = pending.pop() {
        // an object's presence implies its whole subgraph is present
        if sink.contains(&oid) {
            continue;
        }

        pending.extend(referenced_oids(&source.parse_object(&oid)?));
        sink.store_raw(&oid, source.load(&oid)?)?;
        copied += 1;
    }

    Ok(copied)
}

fn referenced_oids(object: &ParsedObject) -> Vec<ObjectId> {
    match object {
        ParsedObject::Blob(_) => Vec::new(),
        ParsedObject::Tree(tree) => tree.entries().map(|(_, entry)| entry.oid.clone()).collect(),
        ParsedObject::Commit(commit) => std::iter::once(commit.tree_oid())
            .chain(commit.parents())
            .cloned()
            .collect(),
        ParsedObject::Tag(tag) => vec![tag.target().clone()],
    }
}

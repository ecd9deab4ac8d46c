use crate::areas::config::BranchTracking;
use crate::areas::repository::Repository;
use crate::artifacts::checkout::migration::Migration;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::reference::HEADS_NAMESPACE;
use crate::artifacts::reference::ref_name::RefName;
use crate::artifacts::reference::reflog::ReflogEntry;
use crate::artifacts::reference::update::Expect;
use crate::artifacts::remote::DEFAULT_REMOTE;
use crate::artifacts::remote::descriptor::RemoteDescriptor;
use crate::artifacts::sync::fetch::{self, FetchOutcome};
use crate::artifacts::sync::transport::FileTransport;
use crate::errors::Result;
use std::path::Path;

impl Repository {
    /// Clone the repository at `url` into `directory`.
    ///
    /// Initializes the directory, registers the source as remote `origin`
    /// with the default fetch ref-spec, fetches, then checks out `branch`
    /// (defaulting to `main`, then `master`, then the lexicographically
    /// first advertised branch) and records its upstream tracking entry.
    /// An empty remote (or a requested branch it does not advertise)
    /// leaves the default branch unborn. On failure the partially created
    /// directory is left for the caller to clean up.
    pub fn clone(
        url: &str,
        directory: impl AsRef<Path>,
        branch: Option<&str>,
        bare: bool,
    ) -> Result<Self> {
        let repository = if bare {
            Self::create_bare(&directory)?
        } else {
            Self::create(&directory)?
        };

        let remote = RemoteDescriptor::new(DEFAULT_REMOTE, url);
        repository.config().save_remote(&remote)?;

        let outcome = fetch::fetch(&repository, &FileTransport::new(), &remote)?;

        let Some((branch, oid)) = select_branch(&outcome, branch) else {
            return Ok(repository);
        };

        let branch_ref = RefName::branch(&branch)?;
        repository
            .refs()
            .update(
                repository.database(),
                &branch_ref,
                &Expect::Absent,
                &oid,
                &format!("clone: from {url}"),
            )?
            .required(&branch_ref)?;

        repository.refs().link(&RefName::head(), &branch_ref)?;
        repository.refs().append_log(
            &RefName::head(),
            &ReflogEntry::now(None, oid.clone(), format!("clone: from {url}")),
        )?;

        repository.config().set_branch_tracking(
            &branch,
            BranchTracking {
                remote: DEFAULT_REMOTE.to_string(),
                merge: format!("{HEADS_NAMESPACE}{branch}"),
            },
        )?;

        if !bare {
            let migration = Migration::new(
                repository.database(),
                repository.workspace()?,
                None,
                Some(&oid),
            )?;
            let mut index = repository.index()?;
            migration.apply(&mut index)?;
        }

        tracing::debug!(url = %url, branch = %branch, "cloned repository");

        Ok(repository)
    }
}

/// The branch a fresh clone checks out: the requested one, else `main`,
/// else `master`, else the first advertised branch in name order. `None`
/// when the choice was not advertised.
fn select_branch(outcome: &FetchOutcome, requested: Option<&str>) -> Option<(String, ObjectId)> {
    // the advertisement is sorted by name, so `heads` is already in
    // lexicographic order
    let heads: Vec<(&str, &ObjectId)> = outcome
        .advertised()
        .iter()
        .filter_map(|(name, oid)| {
            name.as_str()
                .strip_prefix(HEADS_NAMESPACE)
                .map(|short| (short, oid))
        })
        .collect();

    let short = match requested {
        Some(short) => short,
        None => {
            if heads.iter().any(|(short, _)| *short == "main") {
                "main"
            } else if heads.iter().any(|(short, _)| *short == "master") {
                "master"
            } else {
                heads.first()?.0
            }
        }
    };

    heads
        .iter()
        .find(|(head, _)| *head == short)
        .map(|(head, oid)| (head.to_string(), (*oid).clone()))
}

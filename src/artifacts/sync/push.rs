use crate::areas::repository::Repository;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::reference::ref_name::RefName;
use crate::artifacts::reference::update::Expect;
use crate::artifacts::remote::descriptor::RemoteDescriptor;
use crate::artifacts::sync::transport::{RefPushStatus, RemoteRefUpdate, Transport};
use crate::errors::{Error, Result};

/// Summary of one push: the requested ref changes and what every push-URI
/// did with them.
#[derive(Debug)]
pub struct PushOutcome {
    updates: Vec<RemoteRefUpdate>,
    attempts: Vec<UriAttempt>,
}

/// One push-URI's reply: per-ref verdicts parallel to the requested
/// updates, or the connection failure that prevented any.
#[derive(Debug)]
pub struct UriAttempt {
    url: String,
    result: UriResult,
}

#[derive(Debug)]
pub enum UriResult {
    Completed(Vec<RefPushStatus>),
    ConnectionFailed { reason: String },
}

impl UriAttempt {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn result(&self) -> &UriResult {
        &self.result
    }

    pub fn statuses(&self) -> Option<&[RefPushStatus]> {
        match &self.result {
            UriResult::Completed(statuses) => Some(statuses),
            UriResult::ConnectionFailed { .. } => None,
        }
    }

    pub fn connection_failed(&self) -> bool {
        matches!(self.result, UriResult::ConnectionFailed { .. })
    }
}

impl PushOutcome {
    pub fn updates(&self) -> &[RemoteRefUpdate] {
        &self.updates
    }

    pub fn attempts(&self) -> &[UriAttempt] {
        &self.attempts
    }

    /// Verdict one URI gave for one remote-side ref name.
    pub fn status_for(&self, url: &str, name: &RefName) -> Option<&RefPushStatus> {
        let attempt = self.attempts.iter().find(|attempt| attempt.url == url)?;
        let statuses = attempt.statuses()?;
        let position = self.updates.iter().position(|update| update.name == *name)?;
        statuses.get(position)
    }
}

/// Transmit local refs matched by `remote`'s push ref-specs to every
/// configured push-URI.
///
/// The requested updates are computed once, against the remote-tracking
/// refs as the last-known remote state. Every URI is attempted even when an
/// earlier one fails to connect; the push itself fails with
/// `TransportError` only when no URI could be reached at all. Per-ref
/// rejections are data in the outcome, never errors. Refs accepted by at
/// least one URI advance their local remote-tracking ref.
pub fn push(
    repository: &Repository,
    transport: &dyn Transport,
    remote: &RemoteDescriptor,
) -> Result<PushOutcome> {
    let urls = remote.push_urls();
    if urls.is_empty() {
        return Err(Error::ConfigError {
            remote: remote.name().to_string(),
            reason: String::from("no push URL configured"),
        });
    }
    if remote.push_specs().is_empty() {
        return Err(Error::ConfigError {
            remote: remote.name().to_string(),
            reason: String::from("no push ref-specs configured"),
        });
    }

    let updates = compute_updates(repository, remote)?;

    let mut attempts = Vec::with_capacity(urls.len());
    for url in urls {
        let result = match transport.push_objects(url, repository, &updates) {
            Ok(statuses) => UriResult::Completed(statuses),
            Err(Error::TransportError { reason, .. }) => {
                tracing::warn!(url = %url, reason = %reason, "push-URI unreachable");
                UriResult::ConnectionFailed { reason }
            }
            Err(other) => return Err(other),
        };
        attempts.push(UriAttempt {
            url: url.clone(),
            result,
        });
    }

    if attempts.iter().all(UriAttempt::connection_failed) {
        let failed = &attempts[0];
        let UriResult::ConnectionFailed { reason } = &failed.result else {
            unreachable!("all attempts are connection failures");
        };
        return Err(Error::TransportError {
            url: failed.url.clone(),
            reason: reason.clone(),
        });
    }

    advance_tracking_refs(repository, remote, &updates, &attempts)?;

    Ok(PushOutcome { updates, attempts })
}

/// One requested change per push ref-spec match, compared against the
/// remote-tracking refs.
fn compute_updates(
    repository: &Repository,
    remote: &RemoteDescriptor,
) -> Result<Vec<RemoteRefUpdate>> {
    let mut updates: Vec<RemoteRefUpdate> = Vec::new();

    for spec in remote.push_specs() {
        let sources: Vec<(RefName, ObjectId)> = if spec.is_glob() {
            repository
                .refs()
                .list(spec.source().trim_end_matches('*'))?
        } else {
            let source = RefName::try_parse(spec.source())?;
            vec![(source.clone(), repository.refs().resolve(&source)?)]
        };

        for (source_name, oid) in sources {
            let Some(destination) = spec.map_source(source_name.as_str()) else {
                continue;
            };
            let destination = RefName::try_parse(destination)?;
            if updates.iter().any(|update| update.name == destination) {
                continue;
            }

            let expected_old = match tracking_name(remote, &destination)? {
                Some(tracking) => match repository.refs().try_resolve(&tracking)? {
                    Some(known) => Expect::At(known),
                    None => Expect::Absent,
                },
                None => Expect::Any,
            };

            updates.push(RemoteRefUpdate {
                name: destination,
                expected_old,
                new_oid: oid,
                force: spec.force(),
            });
        }
    }

    Ok(updates)
}

/// The local remote-tracking ref recording a remote-side name, per the
/// remote's fetch ref-specs. `None` when no fetch spec covers the name.
fn tracking_name(remote: &RemoteDescriptor, remote_side: &RefName) -> Result<Option<RefName>> {
    for spec in remote.fetch_specs() {
        if let Some(tracking) = spec.map_source(remote_side.as_str()) {
            return Ok(Some(RefName::try_parse(tracking)?));
        }
    }
    Ok(None)
}

/// Advance remote-tracking refs for every update at least one URI accepted.
fn advance_tracking_refs(
    repository: &Repository,
    remote: &RemoteDescriptor,
    updates: &[RemoteRefUpdate],
    attempts: &[UriAttempt],
) -> Result<()> {
    for (position, update) in updates.iter().enumerate() {
        let accepted = attempts.iter().any(|attempt| {
            attempt
                .statuses()
                .and_then(|statuses| statuses.get(position))
                .is_some_and(|status| !status.is_rejected())
        });
        if !accepted {
            continue;
        }

        let Some(tracking) = tracking_name(remote, &update.name)? else {
            continue;
        };

        let message = if update.force {
            "push: forced-update"
        } else {
            "push: fast-forward"
        };
        repository.refs().update(
            repository.database(),
            &tracking,
            &Expect::Any,
            &update.new_oid,
            message,
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn oid(fill: char) -> ObjectId {
        ObjectId::try_parse(fill.to_string().repeat(40)).unwrap()
    }

    fn name(raw: &str) -> RefName {
        RefName::try_parse(raw).unwrap()
    }

    #[test]
    fn test_status_for_pairs_a_url_with_a_ref() {
        let outcome = PushOutcome {
            updates: vec![
                RemoteRefUpdate {
                    name: name("refs/heads/dev"),
                    expected_old: Expect::Absent,
                    new_oid: oid('a'),
                    force: false,
                },
                RemoteRefUpdate {
                    name: name("refs/heads/main"),
                    expected_old: Expect::Any,
                    new_oid: oid('b'),
                    force: true,
                },
            ],
            attempts: vec![UriAttempt {
                url: String::from("/srv/upstream"),
                result: UriResult::Completed(vec![
                    RefPushStatus::Rejected {
                        reason: String::from("non-fast-forward"),
                    },
                    RefPushStatus::Updated,
                ]),
            }],
        };

        assert_eq!(
            outcome.status_for("/srv/upstream", &name("refs/heads/main")),
            Some(&RefPushStatus::Updated)
        );
        assert!(
            outcome
                .status_for("/srv/upstream", &name("refs/heads/dev"))
                .unwrap()
                .is_rejected()
        );
        assert_eq!(outcome.status_for("/srv/other", &name("refs/heads/main")), None);
    }

    #[test]
    fn test_tracking_name_follows_the_fetch_specs() {
        let remote = RemoteDescriptor::new("origin", "/srv/upstream");

        let tracking = tracking_name(&remote, &name("refs/heads/main")).unwrap();
        assert_eq!(tracking, Some(name("refs/remotes/origin/main")));

        let unmapped = tracking_name(&remote, &name("refs/tags/v1")).unwrap();
        assert_eq!(unmapped, None);
    }
}

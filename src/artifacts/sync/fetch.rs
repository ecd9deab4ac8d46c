use crate::areas::repository::Repository;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::reference::ref_name::RefName;
use crate::artifacts::reference::update::{Expect, RefUpdate};
use crate::artifacts::remote::descriptor::RemoteDescriptor;
use crate::artifacts::remote::refspec::RefSpec;
use crate::artifacts::sync::transport::Transport;
use crate::errors::{Error, Result};

/// Summary of one fetch: what the remote advertised, what each matched
/// destination ref did, and how many objects arrived.
#[derive(Debug)]
pub struct FetchOutcome {
    advertised: Vec<(RefName, ObjectId)>,
    updates: Vec<(RefName, RefUpdate)>,
    received_objects: usize,
}

impl FetchOutcome {
    pub fn advertised(&self) -> &[(RefName, ObjectId)] {
        &self.advertised
    }

    pub fn advertised_oid(&self, name: &RefName) -> Option<&ObjectId> {
        self.advertised
            .iter()
            .find(|(advertised, _)| advertised == name)
            .map(|(_, oid)| oid)
    }

    pub fn updates(&self) -> &[(RefName, RefUpdate)] {
        &self.updates
    }

    pub fn update_for(&self, name: &RefName) -> Option<&RefUpdate> {
        self.updates
            .iter()
            .find(|(updated, _)| updated == name)
            .map(|(_, update)| update)
    }

    pub fn received_objects(&self) -> usize {
        self.received_objects
    }
}

/// One advertised ref a fetch ref-spec matched, mapped to its destination.
#[derive(Debug, PartialEq, Eq)]
struct PlannedFetch {
    destination: RefName,
    oid: ObjectId,
    force: bool,
}

/// Bring `remote`'s advertised refs into the repository per its fetch
/// ref-specs.
///
/// Fails fast with `ConfigError` when the descriptor carries no URL or no
/// fetch ref-specs. Only objects absent from the local store are requested;
/// an unchanged remote transfers nothing. Each matched destination ref is
/// updated by compare-and-set against its current value; a non-fast-forward
/// move is applied only under a forced ref-spec and recorded as rejected
/// otherwise, without aborting the remaining refs.
pub fn fetch(
    repository: &Repository,
    transport: &dyn Transport,
    remote: &RemoteDescriptor,
) -> Result<FetchOutcome> {
    let url = remote
        .fetch_urls()
        .first()
        .ok_or_else(|| Error::ConfigError {
            remote: remote.name().to_string(),
            reason: String::from("no fetch URL configured"),
        })?;
    if remote.fetch_specs().is_empty() {
        return Err(Error::ConfigError {
            remote: remote.name().to_string(),
            reason: String::from("no fetch ref-specs configured"),
        });
    }

    let advertised = transport.advertise_refs(url)?;
    let planned = plan(remote.fetch_specs(), &advertised)?;

    let mut wanted: Vec<ObjectId> = Vec::new();
    for fetch in &planned {
        if !repository.database().contains(&fetch.oid) && !wanted.contains(&fetch.oid) {
            wanted.push(fetch.oid.clone());
        }
    }

    let received_objects = if wanted.is_empty() {
        0
    } else {
        transport.fetch_objects(url, &wanted, repository)?
    };

    let message = format!("fetch: {}", remote.name());
    let mut updates = Vec::with_capacity(planned.len());
    for fetch in planned {
        let outcome = apply_planned_fetch(repository, &fetch, &message)?;
        updates.push((fetch.destination, outcome));
    }

    tracing::debug!(
        remote = %remote.name(),
        refs = updates.len(),
        objects = received_objects,
        "fetch finished"
    );

    Ok(FetchOutcome {
        advertised,
        updates,
        received_objects,
    })
}

/// Expand the fetch ref-specs against an advertisement, preserving the
/// advertisement's order.
fn plan(specs: &[RefSpec], advertised: &[(RefName, ObjectId)]) -> Result<Vec<PlannedFetch>> {
    let mut planned: Vec<PlannedFetch> = Vec::new();

    for (name, oid) in advertised {
        for spec in specs {
            let Some(destination) = spec.map_source(name.as_str()) else {
                continue;
            };
            let destination = RefName::try_parse(destination)?;
            if planned.iter().any(|fetch| fetch.destination == destination) {
                continue;
            }

            planned.push(PlannedFetch {
                destination,
                oid: oid.clone(),
                force: spec.force(),
            });
        }
    }

    Ok(planned)
}

fn apply_planned_fetch(
    repository: &Repository,
    fetch: &PlannedFetch,
    message: &str,
) -> Result<RefUpdate> {
    let current = repository.refs().try_resolve(&fetch.destination)?;

    if let Some(current_oid) = &current {
        let moved = *current_oid != fetch.oid;
        if moved && !fetch.force && !repository.database().is_ancestor(current_oid, &fetch.oid)? {
            return Ok(RefUpdate::Rejected {
                expected: format!("fast-forward of {current_oid}"),
                actual: fetch.oid.to_string(),
            });
        }
    }

    let expect = match current {
        Some(oid) => Expect::At(oid),
        None => Expect::Absent,
    };

    repository.refs().update(
        repository.database(),
        &fetch.destination,
        &expect,
        &fetch.oid,
        message,
    )
}

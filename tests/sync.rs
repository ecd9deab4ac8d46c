use keel::artifacts::reference::ref_name::RefName;
use keel::artifacts::reference::update::RefUpdate;
use keel::artifacts::remote::refspec::RefSpec;
use keel::artifacts::sync::transport::RefPushStatus;
use keel::{Error, Repository};
use pretty_assertions::assert_eq;

mod common;

type TestResult = anyhow::Result<()>;

#[test]
fn clone_checks_out_the_advertised_main_branch() -> TestResult {
    let dir = assert_fs::TempDir::new()?;
    let upstream_dir = dir.path().join("upstream");
    let (upstream, _) = common::seeded_upstream(&upstream_dir);
    common::write_file(&upstream_dir, "src/lib.rs", "pub fn two() {}");
    let tip = upstream.commit("second", &["."])?;

    let url = upstream_dir.display().to_string();
    let local = Repository::clone(&url, dir.path().join("local"), None, false)?;

    assert_eq!(local.head_id()?, tip);
    assert_eq!(local.head_target()?, RefName::branch("main")?);
    assert_eq!(
        std::fs::read_to_string(local.path().join("src/lib.rs"))?,
        "pub fn two() {}"
    );
    assert_eq!(
        local
            .refs()
            .resolve(&RefName::try_parse("refs/remotes/origin/main")?)?,
        tip
    );

    let head_log = local.refs().read_log(&RefName::head())?;
    assert_eq!(head_log.len(), 1);
    assert_eq!(head_log[0].message(), format!("clone: from {url}"));

    Ok(())
}

#[test]
fn fetching_an_unchanged_remote_transfers_nothing() -> TestResult {
    let dir = assert_fs::TempDir::new()?;
    let upstream_dir = dir.path().join("upstream");
    common::seeded_upstream(&upstream_dir);

    let url = upstream_dir.display().to_string();
    let local = Repository::clone(&url, dir.path().join("local"), None, false)?;

    let outcome = local.fetch("origin")?;

    assert_eq!(outcome.received_objects(), 0);
    assert!(!outcome.updates().is_empty());
    assert!(
        outcome
            .updates()
            .iter()
            .all(|(_, update)| *update == RefUpdate::NoChange)
    );

    Ok(())
}

#[test]
fn fetch_fast_forwards_the_tracking_ref() -> TestResult {
    let dir = assert_fs::TempDir::new()?;
    let upstream_dir = dir.path().join("upstream");
    let (upstream, _) = common::seeded_upstream(&upstream_dir);

    let url = upstream_dir.display().to_string();
    let local = Repository::clone(&url, dir.path().join("local"), None, false)?;

    common::write_file(&upstream_dir, "README.md", "updated upstream");
    let advanced = upstream.commit("third", &["."])?;

    let outcome = local.fetch("origin")?;
    let tracking = RefName::try_parse("refs/remotes/origin/main")?;

    assert!(outcome.received_objects() > 0);
    assert_eq!(
        outcome.advertised_oid(&RefName::branch("main")?),
        Some(&advanced)
    );
    assert_eq!(outcome.update_for(&tracking), Some(&RefUpdate::FastForward));
    assert_eq!(local.refs().resolve(&tracking)?, advanced);

    Ok(())
}

#[test]
fn forceless_fetch_rejects_a_rewound_remote_ref() -> TestResult {
    let dir = assert_fs::TempDir::new()?;
    let upstream_dir = dir.path().join("upstream");
    let (upstream, first) = common::seeded_upstream(&upstream_dir);
    common::write_file(&upstream_dir, "src/lib.rs", "pub fn two() {}");
    let advanced = upstream.commit("second", &["."])?;

    let url = upstream_dir.display().to_string();
    let local = Repository::clone(&url, dir.path().join("local"), None, false)?;

    // upstream history rewritten out from under the clone
    upstream
        .refs()
        .write_direct(&RefName::branch("main")?, &first)?;

    let mut descriptor = local.config().load_remote("origin")?;
    descriptor.set_fetch_specs(vec![RefSpec::try_parse("refs/heads/*:refs/remotes/origin/*")?]);
    local.config().save_remote(&descriptor)?;

    let outcome = local.fetch("origin")?;
    let tracking = RefName::try_parse("refs/remotes/origin/main")?;

    assert_eq!(
        outcome.update_for(&tracking),
        Some(&RefUpdate::Rejected {
            expected: format!("fast-forward of {advanced}"),
            actual: first.to_string(),
        })
    );
    // the tracking ref keeps its pre-fetch value
    assert_eq!(local.refs().resolve(&tracking)?, advanced);

    Ok(())
}

#[test]
fn push_reports_a_rejected_ref_without_failing_the_call() -> TestResult {
    let dir = assert_fs::TempDir::new()?;
    let upstream_dir = dir.path().join("upstream");
    let (upstream, shared_tip) = common::seeded_upstream(&upstream_dir);

    let url = upstream_dir.display().to_string();
    let local = Repository::clone(&url, dir.path().join("local"), None, false)?;

    // upstream moves on, putting local main behind
    common::write_file(&upstream_dir, "README.md", "upstream moved on");
    let upstream_tip = upstream.commit("upstream-only", &["."])?;

    // a branch only local has
    local.branch("topic", None)?;

    let mut descriptor = local.config().load_remote("origin")?;
    descriptor.add_push_spec(RefSpec::try_parse("refs/heads/main:refs/heads/main")?);
    descriptor.add_push_spec(RefSpec::try_parse("refs/heads/topic:refs/heads/topic")?);
    local.config().save_remote(&descriptor)?;

    let outcome = local.push("origin")?;

    let main = RefName::branch("main")?;
    let topic = RefName::branch("topic")?;
    assert_eq!(
        outcome.status_for(&url, &main),
        Some(&RefPushStatus::Rejected {
            reason: String::from("non-fast-forward"),
        })
    );
    assert_eq!(outcome.status_for(&url, &topic), Some(&RefPushStatus::Updated));

    // the rejected ref is untouched on the peer; the accepted one landed
    assert_eq!(upstream.refs().resolve(&main)?, upstream_tip);
    assert_eq!(upstream.refs().resolve(&topic)?, shared_tip);

    // only the accepted ref advanced its local tracking ref
    assert_eq!(
        local
            .refs()
            .resolve(&RefName::try_parse("refs/remotes/origin/topic")?)?,
        shared_tip
    );
    assert_eq!(
        local
            .refs()
            .resolve(&RefName::try_parse("refs/remotes/origin/main")?)?,
        shared_tip
    );

    Ok(())
}

#[test]
fn every_push_uri_is_attempted_independently() -> TestResult {
    let dir = assert_fs::TempDir::new()?;
    let upstream_dir = dir.path().join("upstream");
    common::seeded_upstream(&upstream_dir);

    let url = upstream_dir.display().to_string();
    let local = Repository::clone(&url, dir.path().join("local"), None, false)?;
    common::write_file(local.path(), "src/lib.rs", "local change");
    local.commit("local change", &["."])?;

    let unreachable = dir.path().join("missing").display().to_string();
    let mut descriptor = local.config().load_remote("origin")?;
    descriptor.add_push_url(url.clone());
    descriptor.add_push_url(unreachable.clone());
    descriptor.add_push_spec(RefSpec::mirror_heads());
    local.config().save_remote(&descriptor)?;

    let outcome = local.push("origin")?;

    assert_eq!(outcome.attempts().len(), 2);
    assert_eq!(outcome.attempts()[0].url(), url);
    assert!(!outcome.attempts()[0].connection_failed());
    assert_eq!(outcome.attempts()[1].url(), unreachable);
    assert!(outcome.attempts()[1].connection_failed());

    Ok(())
}

#[test]
fn push_fails_only_when_no_uri_is_reachable() -> TestResult {
    let dir = assert_fs::TempDir::new()?;
    let project = dir.path().join("project");
    let local = Repository::create(&project)?;
    common::write_file(&project, "a.txt", "hi");
    local.commit("first", &["."])?;

    let unreachable = dir.path().join("missing").display().to_string();
    local.register_remote("mirror", &unreachable)?;
    local.set_push_target("mirror", &unreachable, true, false)?;

    let result = local.push("mirror");

    assert!(matches!(result, Err(Error::TransportError { .. })));

    Ok(())
}

#[test]
fn bare_clone_skips_the_checkout() -> TestResult {
    let dir = assert_fs::TempDir::new()?;
    let upstream_dir = dir.path().join("upstream");
    let (_, tip) = common::seeded_upstream(&upstream_dir);

    let url = upstream_dir.display().to_string();
    let mirror = Repository::clone(&url, dir.path().join("mirror"), None, true)?;

    assert!(mirror.is_bare());
    assert_eq!(mirror.head_id()?, tip);
    assert!(matches!(mirror.index(), Err(Error::BareRepository { .. })));
    // no working-tree files in a bare repository
    assert!(!mirror.path().join("src").exists());
    assert!(!mirror.path().join("README.md").exists());

    Ok(())
}

use keel::artifacts::reference::ref_name::RefName;
use keel::artifacts::reference::update::{Expect, RefUpdate};
use keel::{Error, ObjectId, Repository};
use pretty_assertions::assert_eq;

mod common;

type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Two commits on main, giving real stored OIDs to point refs at.
fn repository_with_history(dir: &assert_fs::TempDir) -> (Repository, ObjectId, ObjectId) {
    let repository = Repository::create(dir.path()).unwrap();
    common::write_file(dir.path(), "a.txt", "one");
    let first = repository.commit("one", &["."]).unwrap();
    common::write_file(dir.path(), "a.txt", "two");
    let second = repository.commit("two", &["."]).unwrap();

    (repository, first, second)
}

#[test]
fn a_losing_writer_observes_the_winning_value() -> TestResult {
    let dir = assert_fs::TempDir::new()?;
    let (repository, first, second) = repository_with_history(&dir);

    let contested = RefName::branch("contested")?;
    repository
        .refs()
        .update(
            repository.database(),
            &contested,
            &Expect::Absent,
            &first,
            "branch: Created from HEAD",
        )?
        .required(&contested)?;

    // both writers read `first`; the slower one must lose
    let winner = repository.refs().update(
        repository.database(),
        &contested,
        &Expect::At(first.clone()),
        &second,
        "simulated writer A",
    )?;
    let loser = repository.refs().update(
        repository.database(),
        &contested,
        &Expect::At(first.clone()),
        &second,
        "simulated writer B",
    )?;

    assert_eq!(winner, RefUpdate::FastForward);
    assert_eq!(
        loser,
        RefUpdate::Rejected {
            expected: first.to_string(),
            actual: second.to_string(),
        }
    );
    assert_eq!(repository.refs().resolve(&contested)?, second);

    Ok(())
}

#[test]
fn update_outcomes_classify_the_kind_of_move() -> TestResult {
    let dir = assert_fs::TempDir::new()?;
    let (repository, first, second) = repository_with_history(&dir);

    let name = RefName::branch("classify")?;
    let refs = repository.refs();
    let database = repository.database();

    let created = refs.update(database, &name, &Expect::Absent, &first, "created")?;
    assert_eq!(created, RefUpdate::New);

    let forward = refs.update(database, &name, &Expect::At(first.clone()), &second, "forward")?;
    assert_eq!(forward, RefUpdate::FastForward);

    let settled = refs.update(database, &name, &Expect::At(second.clone()), &second, "same")?;
    assert_eq!(settled, RefUpdate::NoChange);

    // moving back to an ancestor is not a fast-forward
    let rewound = refs.update(database, &name, &Expect::At(second.clone()), &first, "rewind")?;
    assert_eq!(rewound, RefUpdate::Forced);

    Ok(())
}

#[test]
fn a_six_deep_symbolic_cycle_is_unresolvable() -> TestResult {
    let dir = assert_fs::TempDir::new()?;
    let (repository, ..) = repository_with_history(&dir);

    // hand-write the cycle; `link` would refuse to create it
    let heads = repository.state_path().join("refs/heads");
    for hop in 1..=6 {
        let next = if hop == 6 { 1 } else { hop + 1 };
        std::fs::write(heads.join(format!("s{hop}")), format!("ref: refs/heads/s{next}\n"))?;
    }

    let result = repository.refs().resolve(&RefName::branch("s1")?);
    assert!(matches!(result, Err(Error::UnresolvableRef { .. })));

    Ok(())
}

#[test]
fn linking_back_into_a_chain_is_refused() -> TestResult {
    let dir = assert_fs::TempDir::new()?;
    let (repository, _, second) = repository_with_history(&dir);

    let alias = RefName::branch("alias")?;
    let main = RefName::branch("main")?;
    repository.refs().link(&alias, &main)?;
    assert_eq!(repository.refs().resolve(&alias)?, second);

    let cycle = repository.refs().link(&main, &alias);
    assert!(matches!(cycle, Err(Error::UnresolvableRef { .. })));
    // the refused link left main untouched
    assert_eq!(repository.refs().resolve(&main)?, second);

    Ok(())
}

#[test]
fn reflogs_accumulate_in_operation_order() -> TestResult {
    let dir = assert_fs::TempDir::new()?;
    let (repository, first, second) = repository_with_history(&dir);
    repository.branch("topic", None)?;

    let messages = |name: &RefName| -> Vec<String> {
        repository
            .refs()
            .read_log(name)
            .unwrap()
            .iter()
            .map(|entry| entry.message().to_string())
            .collect()
    };

    assert_eq!(
        messages(&RefName::head()),
        [
            "commit (initial): one",
            "commit: two",
            "checkout: moving from main to topic",
        ]
    );
    assert_eq!(
        messages(&RefName::branch("main")?),
        ["commit (initial): one", "commit: two"]
    );
    assert_eq!(
        messages(&RefName::branch("topic")?),
        ["branch: Created from HEAD"]
    );

    let main_log = repository.refs().read_log(&RefName::branch("main")?)?;
    assert_eq!(main_log[0].old(), None);
    assert_eq!(main_log[0].new_value(), &first);
    assert_eq!(main_log[1].old(), Some(&first));
    assert_eq!(main_log[1].new_value(), &second);

    Ok(())
}

#[test]
fn deleting_a_ref_honors_the_cas_discipline() -> TestResult {
    let dir = assert_fs::TempDir::new()?;
    let (repository, first, second) = repository_with_history(&dir);

    let doomed = RefName::branch("doomed")?;
    repository
        .refs()
        .update(
            repository.database(),
            &doomed,
            &Expect::Absent,
            &second,
            "branch: Created from HEAD",
        )?
        .required(&doomed)?;
    assert!(!repository.refs().read_log(&doomed)?.is_empty());

    let stale = repository.refs().delete(&doomed, &Expect::At(first));
    assert!(matches!(stale, Err(Error::CasRejected { .. })));
    assert_eq!(repository.refs().resolve(&doomed)?, second);

    repository.refs().delete(&doomed, &Expect::At(second))?;

    assert!(matches!(
        repository.refs().resolve(&doomed),
        Err(Error::UnknownRef { .. })
    ));
    assert!(repository.refs().read_log(&doomed)?.is_empty());
    // deleting what is already gone is a no-op under Any
    repository.refs().delete(&doomed, &Expect::Any)?;

    Ok(())
}

#[test]
fn listing_refs_is_ordered_and_prefix_filtered() -> TestResult {
    let dir = assert_fs::TempDir::new()?;
    let (repository, _, second) = repository_with_history(&dir);

    for name in ["zeta", "alpha"] {
        repository.refs().update(
            repository.database(),
            &RefName::branch(name)?,
            &Expect::Absent,
            &second,
            "branch: Created from HEAD",
        )?;
    }
    repository.tag("HEAD", "v1", "release", false)?;

    let heads: Vec<String> = repository
        .refs()
        .list("refs/heads/")?
        .into_iter()
        .map(|(name, _)| name.to_string())
        .collect();
    assert_eq!(heads, ["refs/heads/alpha", "refs/heads/main", "refs/heads/zeta"]);

    let everything = repository.refs().list("refs/")?;
    assert!(everything.iter().any(|(name, _)| name.as_str() == "refs/tags/v1"));

    Ok(())
}

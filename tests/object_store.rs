use keel::artifacts::objects::blob::Blob;
use keel::{Error, ObjectId, Repository};
use pretty_assertions::assert_eq;

mod common;

type TestResult = Result<(), Box<dyn std::error::Error>>;

#[test]
fn identical_content_is_stored_exactly_once() -> TestResult {
    let dir = assert_fs::TempDir::new()?;
    let repository = Repository::create(dir.path())?;

    let first = repository.database().store(&Blob::from_slice(b"same payload"))?;
    let second = repository.database().store(&Blob::from_slice(b"same payload"))?;

    assert_eq!(first, second);
    assert_eq!(common::object_count(&repository), 1);

    // fan-out layout: first OID byte names the bucket
    let hex = first.to_string();
    let object_path = repository
        .state_path()
        .join("objects")
        .join(&hex[..2])
        .join(&hex[2..]);
    assert!(object_path.is_file());

    Ok(())
}

#[test]
fn loading_an_absent_object_reports_not_found() -> TestResult {
    let dir = assert_fs::TempDir::new()?;
    let repository = Repository::create(dir.path())?;

    let absent = ObjectId::try_parse("a".repeat(40))?;
    let result = repository.database().load(&absent);

    assert!(matches!(result, Err(Error::NotFound { .. })));
    assert!(!repository.database().contains(&absent));

    Ok(())
}

#[test]
fn stored_objects_survive_reopening_the_repository() -> TestResult {
    let dir = assert_fs::TempDir::new()?;
    let oid = {
        let repository = Repository::create(dir.path())?;
        repository
            .database()
            .store(&Blob::from_slice(b"durable bytes"))?
    };

    let reopened = Repository::open(dir.path())?;
    let blob = reopened
        .database()
        .parse_object_as_blob(&oid)?
        .expect("stored object is not a blob");

    assert_eq!(blob.content().as_ref(), b"durable bytes");

    Ok(())
}

#[test]
fn commit_history_orders_ancestry() -> TestResult {
    let dir = assert_fs::TempDir::new()?;
    let repository = Repository::create(dir.path())?;

    common::write_file(dir.path(), "a.txt", "one");
    let first = repository.commit("one", &["."])?;
    common::write_file(dir.path(), "a.txt", "two");
    let second = repository.commit("two", &["."])?;

    assert!(repository.database().is_ancestor(&first, &second)?);
    assert!(!repository.database().is_ancestor(&second, &first)?);
    // every commit is its own ancestor
    assert!(repository.database().is_ancestor(&second, &second)?);

    Ok(())
}

use keel::Repository;
use keel::artifacts::reference::ref_name::RefName;
use pretty_assertions::assert_eq;

mod common;

type TestResult = Result<(), Box<dyn std::error::Error>>;

#[test]
fn checkout_of_the_current_tree_touches_nothing() -> TestResult {
    let dir = assert_fs::TempDir::new()?;
    let repository = Repository::create(dir.path())?;
    common::write_file(dir.path(), "src/lib.rs", "pub fn one() {}");
    repository.commit("first", &["."])?;

    let index_before = std::fs::read(repository.state_path().join("index"))?;
    // a local edit the same-tree diff must not revert
    common::write_file(dir.path(), "src/lib.rs", "dirty local edit");

    repository.checkout("main")?;

    assert_eq!(
        std::fs::read_to_string(dir.path().join("src/lib.rs"))?,
        "dirty local edit"
    );
    assert_eq!(
        std::fs::read(repository.state_path().join("index"))?,
        index_before
    );
    assert_eq!(repository.head_target()?, RefName::branch("main")?);

    Ok(())
}

#[test]
fn roundtrip_between_the_empty_tree_and_a_nested_file() -> TestResult {
    let dir = assert_fs::TempDir::new()?;
    let repository = Repository::create(dir.path())?;

    let empty = repository.commit("empty", &["."])?;
    common::write_file(dir.path(), "nested/deep/a.txt", "hi");
    let full = repository.commit("add a.txt", &["."])?;

    repository.checkout(empty.as_ref())?;
    assert!(!dir.path().join("nested/deep/a.txt").exists());
    // parent directories left empty go with the file
    assert!(!dir.path().join("nested").exists());
    assert!(repository.index()?.is_empty());

    repository.checkout(full.as_ref())?;
    assert_eq!(
        std::fs::read_to_string(dir.path().join("nested/deep/a.txt"))?,
        "hi"
    );
    assert!(
        repository
            .index()?
            .entry_by_path(std::path::Path::new("nested/deep/a.txt"))
            .is_some()
    );

    Ok(())
}

#[test]
fn switching_branches_converges_files_and_index() -> TestResult {
    let dir = assert_fs::TempDir::new()?;
    let repository = Repository::create(dir.path())?;
    common::write_file(dir.path(), "shared.txt", "shared");
    common::write_file(dir.path(), "main-only.txt", "main");
    repository.commit("on main", &["."])?;

    repository.branch("topic", None)?;
    std::fs::remove_file(dir.path().join("main-only.txt"))?;
    common::write_file(dir.path(), "topic-only.txt", "topic");
    repository.commit("on topic", &["."])?;

    repository.checkout("main")?;
    assert!(dir.path().join("main-only.txt").exists());
    assert!(!dir.path().join("topic-only.txt").exists());
    assert_eq!(repository.head_target()?, RefName::branch("main")?);

    repository.checkout("topic")?;
    assert!(!dir.path().join("main-only.txt").exists());
    assert!(dir.path().join("topic-only.txt").exists());
    // untouched by either checkout
    assert_eq!(
        std::fs::read_to_string(dir.path().join("shared.txt"))?,
        "shared"
    );

    Ok(())
}

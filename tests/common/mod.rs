#![allow(dead_code)]

use fake::Fake;
use fake::faker::lorem::en::{Word, Words};
use keel::{ObjectId, Repository};
use std::path::Path;

pub fn random_file_name() -> String {
    format!("{}.txt", Word().fake::<String>())
}

pub fn random_content() -> String {
    Words(5..10).fake::<Vec<String>>().join(" ")
}

pub fn write_file(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("failed to create parent directories");
    }
    std::fs::write(path, content).expect("failed to write file");
}

/// A work-directory repository with one commit of a small nested project,
/// for scenarios that need an upstream to sync against.
pub fn seeded_upstream(dir: &Path) -> (Repository, ObjectId) {
    let repository = Repository::create(dir).expect("failed to create upstream");
    write_file(dir, "README.md", &random_content());
    write_file(dir, "src/lib.rs", &random_content());
    let tip = repository
        .commit("initial import", &["."])
        .expect("failed to seed upstream");

    (repository, tip)
}

/// Number of loose objects under the repository's fan-out store.
pub fn object_count(repository: &Repository) -> usize {
    let objects = repository.database().objects_path();
    let mut count = 0;

    for bucket in std::fs::read_dir(objects).expect("no objects directory") {
        let bucket = bucket.unwrap().path();
        if !bucket.is_dir() {
            continue;
        }
        count += std::fs::read_dir(bucket).unwrap().count();
    }

    count
}

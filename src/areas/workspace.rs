//! Working directory reads and writes.
//!
//! The workspace is the live filesystem tree the user edits. It is read
//! when staging (walking files into blobs) and written when a checkout
//! migration converges it on a target tree. The repository state directory
//! is invisible to both directions.

use crate::artifacts::checkout::migration::Migration;
use crate::artifacts::index::entry_mode::FileMode;
use crate::artifacts::objects::blob::Blob;
use crate::errors::{Error, Result};
use bytes::Bytes;
use is_executable::IsExecutable;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug)]
pub struct Workspace {
    path: Box<Path>,
    ignored: Vec<String>,
}

impl Workspace {
    pub fn new(path: Box<Path>) -> Self {
        Workspace {
            path,
            ignored: vec![
                crate::areas::repository::STATE_DIR.to_string(),
                ".".to_string(),
                "..".to_string(),
            ],
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Workspace-relative paths of every file at or under `prefix`,
    /// skipping repository state. `.` means the whole workspace; a prefix
    /// that matches nothing yields an empty listing.
    pub fn list_files(&self, prefix: &Path) -> Result<Vec<PathBuf>> {
        let root = if prefix == Path::new(".") || prefix.as_os_str().is_empty() {
            self.path.to_path_buf()
        } else {
            self.path.join(prefix)
        };

        if !root.exists() || self.is_ignored(&root) {
            return Ok(Vec::new());
        }
        if root.is_file() {
            return Ok(vec![self.relative(&root)?]);
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&root).into_iter().filter_map(|e| e.ok()) {
            if entry.file_type().is_file() && !self.is_ignored(entry.path()) {
                files.push(self.relative(entry.path())?);
            }
        }
        files.sort();

        Ok(files)
    }

    /// Read one workspace file into a blob, byte for byte.
    pub fn read_blob(&self, file_path: &Path) -> Result<Blob> {
        let full_path = self.path.join(file_path);
        let data =
            std::fs::read(&full_path).map_err(|err| Error::filesystem(full_path.clone(), err))?;

        Ok(Blob::new(Bytes::from(data)))
    }

    pub fn file_mode(&self, file_path: &Path) -> FileMode {
        if self.path.join(file_path).is_executable() {
            FileMode::Executable
        } else {
            FileMode::Regular
        }
    }

    /// Apply a planned migration in converging order: deletes, directory
    /// removals (deepest first, only if actually empty), directory
    /// creations (shallowest first), modifies, adds.
    ///
    /// Any failure aborts immediately in a partially-applied state; the
    /// same migration can be re-applied to converge the remainder.
    pub fn apply_migration(&self, migration: &Migration) -> Result<()> {
        for file_path in migration.deletes() {
            self.remove_file(file_path)?;
        }

        for dir_path in migration.rmdirs().iter().rev() {
            self.remove_directory_if_empty(dir_path)?;
        }

        for dir_path in migration.mkdirs() {
            self.make_directory(dir_path)?;
        }

        for (file_path, entry) in migration.modifies().iter().chain(migration.adds()) {
            let data = migration.load_blob(&entry.oid)?;
            let mode = FileMode::try_from(entry.mode)?;
            self.write_file(file_path, &data, mode)?;
        }

        Ok(())
    }

    /// Overwrite-on-write: truncate, write, set mode.
    pub fn write_file(&self, file_path: &Path, data: &[u8], mode: FileMode) -> Result<()> {
        let full_path = self.path.join(file_path);

        std::fs::write(&full_path, data).map_err(|err| Error::filesystem(full_path.clone(), err))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(match mode {
                FileMode::Executable => 0o755,
                FileMode::Regular => 0o644,
            });
            std::fs::set_permissions(&full_path, permissions)
                .map_err(|err| Error::filesystem(full_path.clone(), err))?;
        }
        #[cfg(not(unix))]
        let _ = mode;

        Ok(())
    }

    fn remove_file(&self, file_path: &Path) -> Result<()> {
        let full_path = self.path.join(file_path);

        match std::fs::remove_file(&full_path) {
            Ok(()) => Ok(()),
            // already gone: a re-run over a partially-applied migration
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(Error::filesystem(full_path, err)),
        }
    }

    fn remove_directory_if_empty(&self, dir_path: &Path) -> Result<()> {
        let full_path = self.path.join(dir_path);

        if !full_path.is_dir() {
            return Ok(());
        }
        let mut entries =
            std::fs::read_dir(&full_path).map_err(|err| Error::filesystem(full_path.clone(), err))?;
        if entries.next().is_some() {
            return Ok(());
        }

        std::fs::remove_dir(&full_path).map_err(|err| Error::filesystem(full_path.clone(), err))
    }

    fn make_directory(&self, dir_path: &Path) -> Result<()> {
        let full_path = self.path.join(dir_path);

        if full_path.is_file() {
            std::fs::remove_file(&full_path)
                .map_err(|err| Error::filesystem(full_path.clone(), err))?;
        }
        if !full_path.is_dir() {
            std::fs::create_dir(&full_path)
                .map_err(|err| Error::filesystem(full_path.clone(), err))?;
        }

        Ok(())
    }

    fn is_ignored(&self, path: &Path) -> bool {
        path.components().any(|component| {
            if let std::path::Component::Normal(name) = component {
                let name = name.to_string_lossy();
                self.ignored.iter().any(|ignored| ignored.as_str() == name)
            } else {
                false
            }
        })
    }

    fn relative(&self, path: &Path) -> Result<PathBuf> {
        Ok(path
            .strip_prefix(self.path.as_ref())
            .map_err(|err| Error::malformed("workspace path", err.to_string()))?
            .to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::Workspace;
    use crate::artifacts::index::entry_mode::FileMode;
    use assert_fs::prelude::*;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};
    use std::path::{Path, PathBuf};

    #[fixture]
    fn workspace_dir() -> assert_fs::TempDir {
        assert_fs::TempDir::new().unwrap()
    }

    #[rstest]
    fn list_files_skips_repository_state(workspace_dir: assert_fs::TempDir) {
        workspace_dir.child("a.txt").write_str("a").unwrap();
        workspace_dir.child("src/lib.rs").write_str("lib").unwrap();
        workspace_dir
            .child(".keel/objects/ab/cdef")
            .write_str("zlib")
            .unwrap();

        let workspace = Workspace::new(workspace_dir.path().to_path_buf().into_boxed_path());
        let files = workspace.list_files(Path::new(".")).unwrap();

        assert_eq!(
            files,
            vec![PathBuf::from("a.txt"), PathBuf::from("src/lib.rs")]
        );
    }

    #[rstest]
    fn list_files_under_prefix(workspace_dir: assert_fs::TempDir) {
        workspace_dir.child("a.txt").write_str("a").unwrap();
        workspace_dir.child("src/lib.rs").write_str("lib").unwrap();

        let workspace = Workspace::new(workspace_dir.path().to_path_buf().into_boxed_path());

        assert_eq!(
            workspace.list_files(Path::new("src")).unwrap(),
            vec![PathBuf::from("src/lib.rs")]
        );
        assert_eq!(
            workspace.list_files(Path::new("missing")).unwrap(),
            Vec::<PathBuf>::new()
        );
    }

    #[rstest]
    fn write_file_sets_executable_mode(workspace_dir: assert_fs::TempDir) {
        let workspace = Workspace::new(workspace_dir.path().to_path_buf().into_boxed_path());

        workspace
            .write_file(Path::new("run.sh"), b"#!/bin/sh\n", FileMode::Executable)
            .unwrap();

        assert_eq!(workspace.file_mode(Path::new("run.sh")), FileMode::Executable);
    }

    #[rstest]
    fn read_blob_roundtrips_binary_content(workspace_dir: assert_fs::TempDir) {
        let workspace = Workspace::new(workspace_dir.path().to_path_buf().into_boxed_path());
        let payload = [0u8, 159, 146, 150, 10, 255];

        workspace
            .write_file(Path::new("bin.dat"), &payload, FileMode::Regular)
            .unwrap();
        let blob = workspace.read_blob(Path::new("bin.dat")).unwrap();

        assert_eq!(blob.content().as_ref(), payload);
    }
}

//! Reference store: the mutable name layer over the object database.
//!
//! A ref file holds either a 40-hex OID (direct ref) or `ref: <target>`
//! (symbolic ref). All mutation goes through compare-and-set:
//! - the writer takes a blocking exclusive lock on the ref file, re-reads the
//!   current value under the lock, checks the caller's precondition, and only
//!   then writes; a racing writer waits its turn, re-reads the winner's
//!   value, and reports [`RefUpdate::Rejected`]
//! - locks are per ref file, so unrelated refs update fully in parallel
//! - every applied update appends a line to the ref's log under `logs/`
//!
//! Reads are lock-free: a ref file is small enough that the in-place write
//! of its replacement is effectively atomic for readers.

use crate::areas::database::Database;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::reference::ref_name::RefName;
use crate::artifacts::reference::reflog::ReflogEntry;
use crate::artifacts::reference::update::{Expect, RefUpdate};
use crate::artifacts::reference::{MAX_SYMREF_DEPTH, SYMREF_PREFIX, SYMREF_REGEX};
use crate::errors::{Error, NO_VALUE, Result};
use file_guard::Lock;
use std::io::{Read, Seek, SeekFrom, Write};
use std::ops::DerefMut;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const REFS_DIR: &str = "refs";
const LOGS_DIR: &str = "logs";

/// Decoded content of one ref file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefValue {
    /// The file names another reference (`ref: <target>`).
    Symbolic(RefName),
    /// The file names an object directly.
    Direct(ObjectId),
}

impl RefValue {
    fn read_from(path: &Path) -> Result<Option<RefValue>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    fn parse(content: &str) -> Result<Option<RefValue>> {
        let content = content.trim();

        if content.is_empty() {
            return Ok(None);
        }

        let symref_match = regex::Regex::new(SYMREF_REGEX)
            .map_err(|err| Error::malformed("symref pattern", err.to_string()))?
            .captures(content);
        if let Some(symref_match) = symref_match {
            Ok(Some(RefValue::Symbolic(RefName::try_parse(
                &symref_match[1],
            )?)))
        } else {
            Ok(Some(RefValue::Direct(ObjectId::try_parse(content)?)))
        }
    }
}

/// Reference store rooted at the repository state directory.
#[derive(Debug)]
pub struct Refs {
    path: Box<Path>,
}

impl Refs {
    pub fn new(path: Box<Path>) -> Self {
        Refs { path }
    }

    fn ref_path(&self, name: &RefName) -> PathBuf {
        self.path.join(name.as_str())
    }

    fn log_path(&self, name: &RefName) -> PathBuf {
        self.path.join(LOGS_DIR).join(name.as_str())
    }

    fn refs_path(&self) -> PathBuf {
        self.path.join(REFS_DIR)
    }

    /// Raw read of one ref file, no dereferencing.
    pub fn read_value(&self, name: &RefName) -> Result<Option<RefValue>> {
        RefValue::read_from(&self.ref_path(name))
    }

    /// Whether the name currently holds any value (direct or symbolic).
    pub fn exists(&self, name: &RefName) -> Result<bool> {
        Ok(self.read_value(name)?.is_some())
    }

    /// Dereference a name to the OID it ultimately points at.
    ///
    /// Follows at most [`MAX_SYMREF_DEPTH`] symbolic hops; a chain longer
    /// than that (any cycle included) is reported as `UnresolvableRef`, and
    /// a missing name anywhere in the chain as `UnknownRef`.
    pub fn resolve(&self, name: &RefName) -> Result<ObjectId> {
        let mut current = name.clone();

        for _ in 0..=MAX_SYMREF_DEPTH {
            match self.read_value(&current)? {
                None => {
                    return Err(Error::UnknownRef {
                        name: current.to_string(),
                    });
                }
                Some(RefValue::Direct(oid)) => return Ok(oid),
                Some(RefValue::Symbolic(target)) => current = target,
            }
        }

        Err(Error::UnresolvableRef {
            name: name.to_string(),
        })
    }

    /// [`Refs::resolve`], with a missing name softened to `None`.
    ///
    /// An unborn branch (HEAD linked to a branch no commit has created yet)
    /// resolves to `None`; a too-deep chain is still an error.
    pub fn try_resolve(&self, name: &RefName) -> Result<Option<ObjectId>> {
        match self.resolve(name) {
            Ok(oid) => Ok(Some(oid)),
            Err(Error::UnknownRef { .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Follow symbolic hops from `name` and return the final name in the
    /// chain: the first one whose file is a direct ref or does not exist.
    pub fn resolve_terminal_name(&self, name: &RefName) -> Result<RefName> {
        let mut current = name.clone();

        for _ in 0..=MAX_SYMREF_DEPTH {
            match self.read_value(&current)? {
                Some(RefValue::Symbolic(target)) => current = target,
                Some(RefValue::Direct(_)) | None => return Ok(current),
            }
        }

        Err(Error::UnresolvableRef {
            name: name.to_string(),
        })
    }

    /// Compare-and-set update of `name` (written through symbolic hops to
    /// the terminal ref, so updating `HEAD` on a branch moves the branch).
    ///
    /// The caller's `expected` precondition is checked against the value
    /// re-read under the exclusive lock; on mismatch nothing is written and
    /// the outcome is [`RefUpdate::Rejected`]. Applied updates append
    /// `message` to the terminal ref's log (and to HEAD's log when the
    /// update was addressed to HEAD).
    pub fn update(
        &self,
        database: &Database,
        name: &RefName,
        expected: &Expect,
        new_oid: &ObjectId,
        message: &str,
    ) -> Result<RefUpdate> {
        let terminal = self.resolve_terminal_name(name)?;
        let ref_path = self.ref_path(&terminal);

        std::fs::create_dir_all(ref_path.parent().ok_or_else(|| {
            Error::malformed("ref path", ref_path.display().to_string())
        })?)?;

        let mut ref_file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&ref_path)?;
        let mut lock = file_guard::lock(&mut ref_file, Lock::Exclusive, 0, 1)?;

        let mut content = String::new();
        lock.deref_mut().read_to_string(&mut content)?;
        let current = match RefValue::parse(&content)? {
            Some(RefValue::Direct(oid)) => Some(oid),
            Some(RefValue::Symbolic(_)) => {
                return Err(Error::malformed(
                    "ref",
                    format!("{terminal} turned symbolic during update"),
                ));
            }
            None => None,
        };

        if !expected.admits(current.as_ref()) {
            let actual = current
                .as_ref()
                .map_or_else(|| NO_VALUE.to_string(), ToString::to_string);
            tracing::debug!(name = %terminal, %expected, %actual, "ref update rejected");
            return Ok(RefUpdate::Rejected {
                expected: expected.to_string(),
                actual,
            });
        }

        if current.as_ref() == Some(new_oid) {
            return Ok(RefUpdate::NoChange);
        }

        let outcome = match &current {
            None => RefUpdate::New,
            Some(old) => {
                if database.is_ancestor(old, new_oid)? {
                    RefUpdate::FastForward
                } else {
                    RefUpdate::Forced
                }
            }
        };

        let file = lock.deref_mut();
        file.seek(SeekFrom::Start(0))?;
        file.write_all(format!("{new_oid}\n").as_bytes())?;
        file.set_len((new_oid.as_ref().len() + 1) as u64)?;

        let entry = ReflogEntry::now(current, new_oid.clone(), message);
        self.append_log(&terminal, &entry)?;
        if name.is_head() && !terminal.is_head() {
            self.append_log(&RefName::head(), &entry)?;
        }

        tracing::debug!(name = %terminal, oid = %new_oid, %outcome, "ref updated");
        Ok(outcome)
    }

    /// Create or retarget the symbolic ref `name` to point at `target`.
    ///
    /// Refuses a link that would make `name` unreachable from itself, i.e.
    /// one whose target chain loops back to `name`.
    pub fn link(&self, name: &RefName, target: &RefName) -> Result<()> {
        let mut probe = target.clone();
        for _ in 0..=MAX_SYMREF_DEPTH {
            if probe == *name {
                return Err(Error::UnresolvableRef {
                    name: name.to_string(),
                });
            }
            match self.read_value(&probe)? {
                Some(RefValue::Symbolic(next)) => probe = next,
                Some(RefValue::Direct(_)) | None => break,
            }
        }

        self.write_ref_file(name, &format!("{SYMREF_PREFIX}{target}\n"))?;
        tracing::debug!(name = %name, target = %target, "linked symbolic ref");

        Ok(())
    }

    /// Point `name` directly at an OID, without dereferencing symbolic
    /// content. Detached-HEAD checkouts use this to overwrite the symref.
    pub fn write_direct(&self, name: &RefName, oid: &ObjectId) -> Result<()> {
        self.write_ref_file(name, &format!("{oid}\n"))
    }

    /// Remove `name` under the same CAS discipline as [`Refs::update`]:
    /// `expected` must admit the current value. The ref file, its log, and
    /// any parent directories left empty are all removed.
    pub fn delete(&self, name: &RefName, expected: &Expect) -> Result<()> {
        let ref_path = self.ref_path(name);

        if !ref_path.exists() {
            if expected.admits(None) {
                return Ok(());
            }
            return Err(Error::CasRejected {
                name: name.to_string(),
                expected: expected.to_string(),
                actual: NO_VALUE.to_string(),
            });
        }

        {
            let mut ref_file = std::fs::OpenOptions::new()
                .read(true)
                .write(true)
                .open(&ref_path)?;
            let mut lock = file_guard::lock(&mut ref_file, Lock::Exclusive, 0, 1)?;

            let mut content = String::new();
            lock.deref_mut().read_to_string(&mut content)?;
            let current = match RefValue::parse(&content)? {
                Some(RefValue::Direct(oid)) => Some(oid),
                Some(RefValue::Symbolic(_)) | None => None,
            };

            if !expected.admits(current.as_ref()) {
                return Err(Error::CasRejected {
                    name: name.to_string(),
                    expected: expected.to_string(),
                    actual: current
                        .as_ref()
                        .map_or_else(|| NO_VALUE.to_string(), ToString::to_string),
                });
            }

            std::fs::remove_file(&ref_path)?;
        }

        let log_path = self.log_path(name);
        if log_path.exists() {
            std::fs::remove_file(&log_path)?;
            self.prune_empty_parent_dirs(&log_path, &self.path.join(LOGS_DIR))?;
        }
        self.prune_empty_parent_dirs(&ref_path, &self.refs_path())?;

        tracing::debug!(name = %name, "deleted ref");
        Ok(())
    }

    /// Ordered snapshot of the `refs/` namespace, filtered to names starting
    /// with `prefix` (`""` lists everything). Symbolic entries are resolved
    /// to their OID; unresolvable or unborn entries are skipped.
    pub fn list(&self, prefix: &str) -> Result<Vec<(RefName, ObjectId)>> {
        let refs_path = self.refs_path();
        if !refs_path.exists() {
            return Ok(Vec::new());
        }

        let mut refs = Vec::new();

        for entry in WalkDir::new(&refs_path).into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(&self.path)
                .map_err(|err| Error::malformed("ref path", err.to_string()))?;
            let Some(relative) = relative.to_str() else {
                continue;
            };
            if !relative.starts_with(prefix) {
                continue;
            }

            // lock litter and other invalid names are not refs
            let Ok(name) = RefName::try_parse(relative) else {
                continue;
            };

            if let Some(oid) = self.try_resolve(&name)? {
                refs.push((name, oid));
            }
        }

        refs.sort_by(|(left, _), (right, _)| left.cmp(right));
        Ok(refs)
    }

    /// Parsed log of `name`, oldest entry first; empty if no log exists.
    pub fn read_log(&self, name: &RefName) -> Result<Vec<ReflogEntry>> {
        let log_path = self.log_path(name);
        if !log_path.exists() {
            return Ok(Vec::new());
        }

        std::fs::read_to_string(log_path)?
            .lines()
            .map(ReflogEntry::parse_line)
            .collect()
    }

    /// Append one log line for `name` without touching the ref itself.
    ///
    /// Checkout uses this to record HEAD movements that change no ref value
    /// (branch switches retarget a symref, which CAS updates never log).
    pub fn append_log(&self, name: &RefName, entry: &ReflogEntry) -> Result<()> {
        let log_path = self.log_path(name);
        std::fs::create_dir_all(log_path.parent().ok_or_else(|| {
            Error::malformed("reflog path", log_path.display().to_string())
        })?)?;

        let mut log_file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;
        log_file.write_all(entry.to_line().as_bytes())?;

        Ok(())
    }

    fn write_ref_file(&self, name: &RefName, raw_ref: &str) -> Result<()> {
        let ref_path = self.ref_path(name);

        std::fs::create_dir_all(ref_path.parent().ok_or_else(|| {
            Error::malformed("ref path", ref_path.display().to_string())
        })?)?;

        let mut ref_file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&ref_path)?;
        let mut lock = file_guard::lock(&mut ref_file, Lock::Exclusive, 0, 1)?;
        lock.deref_mut().write_all(raw_ref.as_bytes())?;

        Ok(())
    }

    /// Remove directories left empty between `removed` and `root`
    /// (exclusive), deepest first.
    fn prune_empty_parent_dirs(&self, removed: &Path, root: &Path) -> Result<()> {
        let mut current = removed.parent();

        while let Some(dir) = current {
            if dir == root || !dir.starts_with(root) {
                break;
            }
            if std::fs::read_dir(dir)?.next().is_some() {
                break;
            }
            std::fs::remove_dir(dir)?;
            current = dir.parent();
        }

        Ok(())
    }
}

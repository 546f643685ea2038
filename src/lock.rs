//! Cross-thread and cross-process exclusive locks on filesystem paths.
//!
//! A [`PathLock`] combines two layers:
//!
//! - an in-process mutex, striped by the canonical path string, so threads of
//!   one process serialize even where advisory locks are per-process;
//! - an `fs2` advisory lock on a sibling `<path>.lock` file, for other
//!   processes.
//!
//! Locks are released in reverse acquisition order when the guard is
//! released or dropped. The lock file itself is never removed: unlinking a
//! lock file that another process still holds would let a third process
//! lock a fresh inode at the same path.

use std::collections::hash_map::DefaultHasher;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use parking_lot::{Mutex, MutexGuard};

use crate::error::{IoContext, Result};

const LOCK_STRIPES: usize = 64;

static STRIPES: [Mutex<()>; LOCK_STRIPES] = [const { parking_lot::const_mutex(()) }; LOCK_STRIPES];

/// An exclusive lock on a path. Released on [`PathLock::release`] or drop.
#[derive(Debug)]
pub struct PathLock {
    path: PathBuf,
    file: Option<File>,
    guard: Option<MutexGuard<'static, ()>>,
}

impl PathLock {
    /// Block until `path` is exclusively ours.
    pub fn acquire(path: &Path) -> Result<PathLock> {
        let guard = stripe_for(&lock_key(path)).lock();

        // Past this point `guard` (and `file`, once opened) unwind through
        // Drop, in reverse order, if any step fails.
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .io_context(|| format!("Failed to create lock directory {}", parent.display()))?;
        }

        let lock_path = lock_file_path(path);
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .io_context(|| format!("Failed to open lock file {}", lock_path.display()))?;

        tracing::debug!("waiting for lock on {}", lock_path.display());
        file.lock_exclusive()
            .io_context(|| format!("Failed to lock {}", lock_path.display()))?;

        Ok(PathLock {
            path: path.to_path_buf(),
            file: Some(file),
            guard: Some(guard),
        })
    }

    /// The path this lock protects (not the `.lock` file).
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the lock. Safe to call more than once.
    pub fn release(&mut self) {
        if let Some(file) = self.file.take() {
            let _ = FileExt::unlock(&file);
            drop(file);
        }
        self.guard.take();
    }
}

impl Drop for PathLock {
    fn drop(&mut self) {
        self.release();
    }
}

/// `<path>.lock`, next to `path`.
pub fn lock_file_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".lock");
    PathBuf::from(name)
}

/// Best-effort canonical string for `path`, which need not exist yet.
fn lock_key(path: &Path) -> String {
    if let Ok(canonical) = fs::canonicalize(path) {
        return canonical.to_string_lossy().into_owned();
    }
    if let (Some(parent), Some(name)) = (path.parent(), path.file_name()) {
        if let Ok(parent) = fs::canonicalize(parent) {
            return parent.join(name).to_string_lossy().into_owned();
        }
    }
    std::path::absolute(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .to_string_lossy()
        .into_owned()
}

fn stripe_for(key: &str) -> &'static Mutex<()> {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    &STRIPES[(hasher.finish() % LOCK_STRIPES as u64) as usize]
}

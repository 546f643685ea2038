//! Directory helpers shared by the install paths.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::error::{IoContext, Result};

const SUFFIX_LEN: usize = 12;

/// Sibling of `final_path` used while an install is being assembled:
/// `<final>.in-progress-<random>`.
pub fn in_progress_path(final_path: &Path) -> PathBuf {
    let mut name = final_path.as_os_str().to_owned();
    name.push(".in-progress-");
    name.push(random_suffix());
    PathBuf::from(name)
}

fn random_suffix() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SUFFIX_LEN)
        .map(char::from)
        .collect()
}

/// Copy a directory tree, recreating symlinks rather than following them.
pub fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<()> {
    fs::create_dir_all(dst).io_context(|| format!("Failed to create {}", dst.display()))?;

    for entry in fs::read_dir(src).io_context(|| format!("Failed to read {}", src.display()))? {
        let entry = entry.io_context(|| format!("Failed to read {}", src.display()))?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());
        let file_type = entry
            .file_type()
            .io_context(|| format!("Failed to stat {}", src_path.display()))?;

        if file_type.is_symlink() {
            copy_symlink(&src_path, &dst_path)?;
        } else if file_type.is_dir() {
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            fs::copy(&src_path, &dst_path).io_context(|| {
                format!("Failed to copy {} to {}", src_path.display(), dst_path.display())
            })?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dst: &Path) -> Result<()> {
    let target = fs::read_link(src).io_context(|| format!("Failed to read link {}", src.display()))?;
    std::os::unix::fs::symlink(&target, dst)
        .io_context(|| format!("Failed to create symlink {}", dst.display()))
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, dst: &Path) -> Result<()> {
    if src.is_dir() {
        copy_dir_recursive(src, dst)
    } else {
        fs::copy(src, dst)
            .map(|_| ())
            .io_context(|| format!("Failed to copy {} to {}", src.display(), dst.display()))
    }
}

/// Remove a directory tree; a path that is already gone is fine.
pub fn remove_dir_if_exists(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(crate::error::Error::io(
            format!("Failed to remove {}", path.display()),
            e,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn in_progress_paths_are_unique_siblings() {
        let final_path = Path::new("/store/amazon-corretto-21-abcd");
        let a = in_progress_path(final_path);
        let b = in_progress_path(final_path);
        assert_ne!(a, b);
        assert_eq!(a.parent(), final_path.parent());
        assert!(a
            .to_string_lossy()
            .starts_with("/store/amazon-corretto-21-abcd.in-progress-"));
    }

    #[cfg(unix)]
    #[test]
    fn copy_preserves_tree_and_symlinks() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        let dst = temp.path().join("dst");
        fs::create_dir_all(src.join("bin")).unwrap();
        fs::write(src.join("bin/java"), "#!/bin/sh\n").unwrap();
        fs::write(src.join("release"), "JAVA_VERSION=\"21\"\n").unwrap();
        std::os::unix::fs::symlink("bin/java", src.join("java")).unwrap();

        copy_dir_recursive(&src, &dst).unwrap();

        assert_eq!(fs::read_to_string(dst.join("release")).unwrap(), "JAVA_VERSION=\"21\"\n");
        assert!(dst.join("bin/java").is_file());
        assert!(dst.join("java").is_symlink());
        assert_eq!(fs::read_link(dst.join("java")).unwrap(), Path::new("bin/java"));
    }

    #[test]
    fn removing_missing_directory_is_ok() {
        let temp = TempDir::new().unwrap();
        remove_dir_if_exists(&temp.path().join("never-created")).unwrap();

        let present = temp.path().join("present/nested");
        fs::create_dir_all(&present).unwrap();
        remove_dir_if_exists(&temp.path().join("present")).unwrap();
        assert!(!temp.path().join("present").exists());
    }
}

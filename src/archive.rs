//! Unpacking vendor archives and locating the JDK root inside them.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use walkdir::WalkDir;

use crate::error::{Error, IoContext, Result};
use crate::platform::Os;

/// Extract a `.tar.gz`/`.tgz` or `.zip` archive into `dest`.
pub fn unpack(archive: &Path, dest: &Path) -> Result<()> {
    let name = archive
        .file_name()
        .map(|n| n.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    fs::create_dir_all(dest).io_context(|| format!("Failed to create {}", dest.display()))?;
    let f = File::open(archive).io_context(|| format!("Failed to open {}", archive.display()))?;
    let unpack_error = |message: String| Error::Unpack {
        archive: archive.to_path_buf(),
        message,
    };

    if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
        let mut tar = tar::Archive::new(GzDecoder::new(f));
        tar.set_preserve_permissions(true);
        tar.unpack(dest).map_err(|e| unpack_error(e.to_string()))?;
    } else if name.ends_with(".zip") {
        let mut zip = zip::ZipArchive::new(f).map_err(|e| unpack_error(e.to_string()))?;
        zip.extract(dest).map_err(|e| unpack_error(e.to_string()))?;
    } else {
        return Err(Error::UnsupportedArchive(archive.to_path_buf()));
    }

    tracing::debug!("unpacked {} into {}", archive.display(), dest.display());
    Ok(())
}

/// The JDK root inside an unpacked tree: two levels above the shallowest
/// regular (non-symlink) `bin/java`.
///
/// Symlinked launchers are ignored; macOS bundles often place one next to
/// `Contents/Home`.
pub fn find_java_home(root: &Path, os: Os) -> Result<PathBuf> {
    let java = os.executable("java");
    WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && entry.file_name() == java.as_str())
        .filter(|entry| {
            entry
                .path()
                .parent()
                .and_then(Path::file_name)
                .is_some_and(|dir| dir == "bin")
        })
        .min_by_key(|entry| entry.depth())
        .and_then(|entry| entry.path().parent()?.parent().map(Path::to_path_buf))
        .ok_or_else(|| Error::JavaHomeNotFound(root.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::write_fake_jdk_tar_gz;
    use tempfile::TempDir;

    #[test]
    fn unpacks_tar_gz() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("jdk.tar.gz");
        write_fake_jdk_tar_gz(&archive, "jdk-21.0.2");

        let dest = temp.path().join("out");
        unpack(&archive, &dest).unwrap();
        assert!(dest.join("jdk-21.0.2/bin/java").is_file());
        assert!(dest.join("jdk-21.0.2/release").is_file());
    }

    #[cfg(unix)]
    #[test]
    fn tar_gz_keeps_executable_bit() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("jdk.tgz");
        write_fake_jdk_tar_gz(&archive, "jdk");
        let dest = temp.path().join("out");
        unpack(&archive, &dest).unwrap();

        let mode = fs::metadata(dest.join("jdk/bin/keytool")).unwrap().permissions().mode();
        assert_ne!(mode & 0o111, 0);
    }

    #[test]
    fn unpacks_zip() {
        use std::io::Write;

        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("jdk.zip");
        let mut writer = zip::ZipWriter::new(File::create(&archive).unwrap());
        let options = zip::write::SimpleFileOptions::default();
        writer.add_directory("jdk-21/bin/", options).unwrap();
        writer.start_file("jdk-21/bin/java.exe", options).unwrap();
        writer.write_all(b"MZ").unwrap();
        writer.finish().unwrap();

        let dest = temp.path().join("out");
        unpack(&archive, &dest).unwrap();
        assert_eq!(find_java_home(&dest, Os::Windows).unwrap(), dest.join("jdk-21"));
    }

    #[test]
    fn rejects_unknown_extension() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("jdk.7z");
        fs::write(&archive, b"7z").unwrap();
        assert!(matches!(
            unpack(&archive, &temp.path().join("out")),
            Err(Error::UnsupportedArchive(_))
        ));
    }

    #[test]
    fn corrupt_tar_gz_is_an_unpack_error() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("jdk.tar.gz");
        fs::write(&archive, b"not gzip at all").unwrap();
        assert!(matches!(
            unpack(&archive, &temp.path().join("out")),
            Err(Error::Unpack { .. })
        ));
    }

    #[test]
    fn java_home_is_two_levels_above_bin_java() {
        let temp = TempDir::new().unwrap();
        let home = temp.path().join("jdk-21.0.2.jdk/Contents/Home");
        fs::create_dir_all(home.join("bin")).unwrap();
        fs::write(home.join("bin/java"), "").unwrap();

        assert_eq!(find_java_home(temp.path(), Os::MacOs).unwrap(), home);
    }

    #[cfg(unix)]
    #[test]
    fn shallow_symlink_is_ignored_for_deep_real_binary() {
        let temp = TempDir::new().unwrap();
        let home = temp.path().join("jdk/Contents/Home");
        fs::create_dir_all(home.join("bin")).unwrap();
        fs::write(home.join("bin/java"), "").unwrap();
        fs::create_dir_all(temp.path().join("jdk/bin")).unwrap();
        std::os::unix::fs::symlink(home.join("bin/java"), temp.path().join("jdk/bin/java"))
            .unwrap();

        assert_eq!(find_java_home(temp.path(), Os::MacOs).unwrap(), home);
    }

    #[test]
    fn nested_jre_does_not_win_over_jdk_root() {
        let temp = TempDir::new().unwrap();
        let jdk = temp.path().join("jdk8");
        fs::create_dir_all(jdk.join("bin")).unwrap();
        fs::create_dir_all(jdk.join("jre/bin")).unwrap();
        fs::write(jdk.join("bin/java"), "").unwrap();
        fs::write(jdk.join("jre/bin/java"), "").unwrap();

        assert_eq!(find_java_home(temp.path(), Os::LinuxGlibc).unwrap(), jdk);
    }

    #[test]
    fn missing_java_is_reported() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("jdk/lib")).unwrap();
        assert!(matches!(
            find_java_home(temp.path(), Os::LinuxGlibc),
            Err(Error::JavaHomeNotFound(_))
        ));
    }
}

//! Fixtures shared by the unit tests: fake JDK archives and a scripted keytool.

use std::fs::{self, File};
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;

/// Stand-in for `keytool`. Records its arguments in `<jdk>/keytool-calls`
/// and keeps imported aliases in `<jdk>/keystore-aliases`.
pub const FAKE_KEYTOOL: &str = r#"#!/bin/sh
root="$(cd "$(dirname "$0")/.." && pwd)"
echo "$*" >> "$root/keytool-calls"
alias=""
file=""
prev=""
for arg in "$@"; do
  case "$prev" in
    -alias) alias="$arg" ;;
    -file) file="$arg" ;;
  esac
  prev="$arg"
done
case "$1" in
  -list)
    if [ "$alias" = "broken" ]; then
      echo "keytool error: java.io.IOException: Keystore was tampered with, or password was incorrect"
      exit 1
    fi
    if [ -f "$root/keystore-aliases" ] && grep -qx "$alias" "$root/keystore-aliases"; then
      echo "$alias, trustedCertEntry"
      exit 0
    fi
    echo "keytool error: java.lang.Exception: Alias <$alias> does not exist"
    exit 1
    ;;
  -importcert)
    grep -q "BEGIN CERTIFICATE" "$file" || exit 2
    echo "$alias" >> "$root/keystore-aliases"
    echo "Certificate was added to keystore"
    ;;
esac
"#;

/// Write `bin/keytool` under `jdk_root`.
#[cfg(unix)]
pub fn install_fake_keytool(jdk_root: &Path) {
    use std::os::unix::fs::PermissionsExt;

    let bin = jdk_root.join("bin");
    fs::create_dir_all(&bin).unwrap();
    let keytool = bin.join("keytool");
    fs::write(&keytool, FAKE_KEYTOOL).unwrap();
    fs::set_permissions(&keytool, fs::Permissions::from_mode(0o755)).unwrap();
}

/// Lines recorded by the fake keytool, one per invocation.
pub fn keytool_calls(jdk_root: &Path) -> Vec<String> {
    fs::read_to_string(jdk_root.join("keytool-calls"))
        .map(|s| s.lines().map(str::to_string).collect())
        .unwrap_or_default()
}

/// A minimal Linux JDK tarball with everything under `top/`.
pub fn write_fake_jdk_tar_gz(archive: &Path, top: &str) {
    let gz = GzEncoder::new(File::create(archive).unwrap(), Compression::default());
    let mut builder = tar::Builder::new(gz);

    let entries: [(&str, &[u8], u32); 3] = [
        ("bin/java", b"#!/bin/sh\necho fake java\n", 0o755),
        ("bin/keytool", FAKE_KEYTOOL.as_bytes(), 0o755),
        ("release", b"JAVA_VERSION=\"21.0.2\"\n", 0o644),
    ];
    for (path, data, mode) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(mode);
        header.set_entry_type(tar::EntryType::Regular);
        header.set_cksum();
        builder
            .append_data(&mut header, format!("{top}/{path}"), data)
            .unwrap();
    }

    builder.into_inner().unwrap().finish().unwrap();
}

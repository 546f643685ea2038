//! Host platform model: operating system and CPU architecture.
//!
//! The string forms returned by `Display` are stable: they feed the `JdkSpec`
//! hash and must never change for an existing variant.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Os {
    MacOs,
    LinuxGlibc,
    LinuxMusl,
    Windows,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Arch {
    X86,
    X86_64,
    Aarch64,
}

impl Os {
    pub const ALL: [Os; 4] = [Os::MacOs, Os::LinuxGlibc, Os::LinuxMusl, Os::Windows];

    /// Detect the OS this process runs on.
    ///
    /// Linux is split into glibc and musl by looking for the musl dynamic
    /// loader, so a glibc binary running on Alpine still reports musl.
    pub fn current() -> Result<Os> {
        match std::env::consts::OS {
            "macos" => Ok(Os::MacOs),
            "windows" => Ok(Os::Windows),
            "linux" => {
                if cfg!(target_env = "musl") || has_musl_loader(Path::new("/lib")) {
                    Ok(Os::LinuxMusl)
                } else {
                    Ok(Os::LinuxGlibc)
                }
            }
            other => Err(Error::UnknownPlatform {
                kind: "operating system",
                value: other.to_string(),
            }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Os::MacOs => "macos",
            Os::LinuxGlibc => "linux-glibc",
            Os::LinuxMusl => "linux-musl",
            Os::Windows => "windows",
        }
    }

    pub fn is_linux(&self) -> bool {
        matches!(self, Os::LinuxGlibc | Os::LinuxMusl)
    }

    /// Name of a JDK executable on this OS (`java` -> `java.exe` on Windows).
    pub fn executable(&self, name: &str) -> String {
        match self {
            Os::Windows => format!("{name}.exe"),
            _ => name.to_string(),
        }
    }
}

impl Arch {
    pub const ALL: [Arch; 3] = [Arch::X86, Arch::X86_64, Arch::Aarch64];

    pub fn current() -> Result<Arch> {
        match std::env::consts::ARCH {
            "x86" => Ok(Arch::X86),
            "x86_64" => Ok(Arch::X86_64),
            "aarch64" => Ok(Arch::Aarch64),
            other => Err(Error::UnknownPlatform {
                kind: "architecture",
                value: other.to_string(),
            }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Arch::X86 => "x86",
            Arch::X86_64 => "x86-64",
            Arch::Aarch64 => "aarch64",
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Os {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "macos" | "mac" | "osx" | "darwin" => Ok(Os::MacOs),
            "linux-glibc" | "linux" | "glibc" => Ok(Os::LinuxGlibc),
            "linux-musl" | "musl" | "alpine" => Ok(Os::LinuxMusl),
            "windows" | "win" => Ok(Os::Windows),
            other => Err(Error::UnknownPlatform {
                kind: "operating system",
                value: other.to_string(),
            }),
        }
    }
}

impl FromStr for Arch {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "x86" | "i386" | "i686" => Ok(Arch::X86),
            "x86-64" | "x86_64" | "amd64" | "x64" => Ok(Arch::X86_64),
            "aarch64" | "arm64" => Ok(Arch::Aarch64),
            other => Err(Error::UnknownPlatform {
                kind: "architecture",
                value: other.to_string(),
            }),
        }
    }
}

fn has_musl_loader(lib_dir: &Path) -> bool {
    let Ok(entries) = fs::read_dir(lib_dir) else {
        return false;
    };
    entries
        .filter_map(|entry| entry.ok())
        .any(|entry| entry.file_name().to_string_lossy().starts_with("ld-musl-"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn display_roundtrips_through_from_str() {
        for os in Os::ALL {
            assert_eq!(os.to_string().parse::<Os>().unwrap(), os);
        }
        for arch in Arch::ALL {
            assert_eq!(arch.to_string().parse::<Arch>().unwrap(), arch);
        }
    }

    #[test]
    fn vendor_aliases_parse() {
        assert_eq!("amd64".parse::<Arch>().unwrap(), Arch::X86_64);
        assert_eq!("arm64".parse::<Arch>().unwrap(), Arch::Aarch64);
        assert_eq!("darwin".parse::<Os>().unwrap(), Os::MacOs);
        assert!("sparc".parse::<Arch>().is_err());
    }

    #[test]
    fn musl_loader_detection() {
        let temp = TempDir::new().unwrap();
        assert!(!has_musl_loader(temp.path()));
        fs::write(temp.path().join("ld-musl-x86_64.so.1"), b"").unwrap();
        assert!(has_musl_loader(temp.path()));
        assert!(!has_musl_loader(&temp.path().join("missing")));
    }

    #[test]
    fn windows_executables_get_exe_suffix() {
        assert_eq!(Os::Windows.executable("keytool"), "keytool.exe");
        assert_eq!(Os::LinuxGlibc.executable("keytool"), "keytool");
    }
}

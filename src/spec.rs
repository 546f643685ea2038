//! Content-addressed description of a JDK installation.
//!
//! A [`JdkSpec`] names everything that influences the bytes of an installed
//! JDK: vendor, version, platform and the CA certificates baked into its
//! truststore. [`JdkSpec::consistent_short_hash`] turns that into the
//! identity used for deduplication and for the install directory name.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use sha2::{Digest, Sha256};

use crate::error::{Error, IoContext, Result};
use crate::platform::{Arch, Os};

/// Number of leading SHA-256 bytes kept in the short hash.
const SHORT_HASH_BYTES: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum JdkDistributionName {
    AmazonCorretto,
    AzulZulu,
    GraalVmCommunity,
    OpenJdkEarlyAccess,
}

impl JdkDistributionName {
    pub const ALL: [JdkDistributionName; 4] = [
        JdkDistributionName::AmazonCorretto,
        JdkDistributionName::AzulZulu,
        JdkDistributionName::GraalVmCommunity,
        JdkDistributionName::OpenJdkEarlyAccess,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JdkDistributionName::AmazonCorretto => "amazon-corretto",
            JdkDistributionName::AzulZulu => "azul-zulu",
            JdkDistributionName::GraalVmCommunity => "graalvm-ce",
            JdkDistributionName::OpenJdkEarlyAccess => "openjdk-ea",
        }
    }
}

impl fmt::Display for JdkDistributionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JdkDistributionName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "amazon-corretto" | "corretto" => Ok(JdkDistributionName::AmazonCorretto),
            "azul-zulu" | "zulu" => Ok(JdkDistributionName::AzulZulu),
            "graalvm-ce" | "graalvm-community" | "graalvm" => {
                Ok(JdkDistributionName::GraalVmCommunity)
            }
            "openjdk-ea" | "openjdk-early-access" | "openjdk" => {
                Ok(JdkDistributionName::OpenJdkEarlyAccess)
            }
            _ => Err(Error::UnknownDistribution(s.to_string())),
        }
    }
}

/// A vendor release for one platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JdkRelease {
    pub version: String,
    pub os: Os,
    pub arch: Arch,
}

impl JdkRelease {
    pub fn new(version: impl Into<String>, os: Os, arch: Arch) -> Self {
        Self {
            version: version.into(),
            os,
            arch,
        }
    }
}

/// CA certificates to import, keyed by keystore alias.
///
/// Backed by a `BTreeMap`, so iteration is always in lexicographic alias
/// order no matter how the map was built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaCerts {
    certs: BTreeMap<String, String>,
}

impl CaCerts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read every `alias -> path` entry into memory.
    pub fn from_files<I, A, P>(files: I) -> Result<Self>
    where
        I: IntoIterator<Item = (A, P)>,
        A: Into<String>,
        P: AsRef<Path>,
    {
        let mut certs = BTreeMap::new();
        for (alias, path) in files {
            let path = path.as_ref();
            let content = fs::read_to_string(path)
                .io_context(|| format!("Failed to read CA certificate {}", path.display()))?;
            certs.insert(alias.into(), content);
        }
        Ok(Self { certs })
    }

    pub fn insert(&mut self, alias: impl Into<String>, content: impl Into<String>) {
        self.certs.insert(alias.into(), content.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.certs.iter().map(|(a, c)| (a.as_str(), c.as_str()))
    }

    pub fn len(&self) -> usize {
        self.certs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certs.is_empty()
    }
}

impl<A: Into<String>, C: Into<String>> FromIterator<(A, C)> for CaCerts {
    fn from_iter<T: IntoIterator<Item = (A, C)>>(iter: T) -> Self {
        Self {
            certs: iter
                .into_iter()
                .map(|(a, c)| (a.into(), c.into()))
                .collect(),
        }
    }
}

/// Everything that determines the contents of an installed JDK.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JdkSpec {
    pub distribution: JdkDistributionName,
    pub release: JdkRelease,
    pub ca_certs: CaCerts,
}

impl JdkSpec {
    pub fn new(distribution: JdkDistributionName, release: JdkRelease, ca_certs: CaCerts) -> Self {
        Self {
            distribution,
            release,
            ca_certs,
        }
    }

    /// The canonical text block that is hashed. One `key:value` per line.
    ///
    /// Free-form values carry their byte length so that a value containing
    /// newlines can never be read as the start of another entry.
    pub fn canonical_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("distribution:{}\n", self.distribution));
        out.push_str(&format!("version:{}\n", framed(&self.release.version)));
        out.push_str(&format!("os:{}\n", self.release.os));
        out.push_str(&format!("arch:{}\n", self.release.arch));
        for (alias, content) in self.ca_certs.iter() {
            out.push_str(&format!("cert:{}:{}\n", framed(alias), framed(content)));
        }
        out
    }

    /// First eight bytes of the SHA-256 of [`Self::canonical_text`], as hex.
    pub fn consistent_short_hash(&self) -> String {
        let digest = Sha256::digest(self.canonical_text().as_bytes());
        digest[..SHORT_HASH_BYTES]
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect()
    }

    /// Directory name of this JDK under the storage root.
    ///
    /// Fails with [`Error::InvalidVersion`] when the version could not stand
    /// as a single path component.
    pub fn install_dir_name(&self) -> Result<String> {
        self.check_version_component()?;
        Ok(format!(
            "{}-{}-{}",
            self.distribution,
            self.release.version,
            self.consistent_short_hash()
        ))
    }

    fn check_version_component(&self) -> Result<()> {
        let version = &self.release.version;
        let reason = if version.is_empty() {
            "version is empty"
        } else if version.contains(['/', '\\']) {
            "version contains a path separator"
        } else if version.contains("..") {
            "version contains '..'"
        } else if version.chars().any(char::is_control) {
            "version contains a control character"
        } else {
            return Ok(());
        };
        Err(Error::InvalidVersion {
            distribution: self.distribution,
            version: version.clone(),
            reason: reason.to_string(),
        })
    }
}

fn framed(value: &str) -> String {
    format!("{}:{value}", value.len())
}

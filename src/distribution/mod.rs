//! JDK vendors and their download layouts.
//!
//! Each vendor is a small record implementing [`JdkDistribution`]: it owns
//! its OS/arch vocabulary and version grammar and maps a [`JdkRelease`] to
//! the relative path of an archive under the vendor's base URL.
//!
//! The set of vendors is closed and keyed by [`JdkDistributionName`]. A
//! [`JdkDistributions`] registry is built once and handed to whoever needs
//! to resolve downloads.

pub mod amazon_corretto;
pub mod azul_zulu;
pub mod graalvm_ce;
pub mod openjdk_ea;

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Error, Result};
use crate::platform::{Arch, Os};
use crate::spec::{JdkDistributionName, JdkRelease};

pub use amazon_corretto::AmazonCorretto;
pub use azul_zulu::AzulZulu;
pub use graalvm_ce::GraalVmCommunity;
pub use openjdk_ea::OpenJdkEarlyAccess;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveExtension {
    Zip,
    TarGz,
}

impl ArchiveExtension {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArchiveExtension::Zip => "zip",
            ArchiveExtension::TarGz => "tar.gz",
        }
    }

    /// `.zip` on Windows, `.tar.gz` everywhere else.
    pub fn for_os(os: Os) -> Self {
        match os {
            Os::Windows => ArchiveExtension::Zip,
            _ => ArchiveExtension::TarGz,
        }
    }
}

impl fmt::Display for ArchiveExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Location of an archive relative to a distribution's base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JdkPath {
    /// Relative path without the extension, e.g. `zulu17.34.19-ca-jdk17.0.3-linux_x64`.
    pub filename: String,
    pub extension: ArchiveExtension,
}

impl JdkPath {
    pub fn file_name_with_extension(&self) -> String {
        format!("{}.{}", self.filename, self.extension)
    }
}

pub trait JdkDistribution: fmt::Debug + Send + Sync {
    fn name(&self) -> JdkDistributionName;

    fn default_base_url(&self) -> &'static str;

    /// Resolve the archive path for `release`.
    ///
    /// Fails with [`Error::UnsupportedCombination`] when the vendor does not
    /// publish the requested OS/arch pair.
    fn path(&self, release: &JdkRelease) -> Result<JdkPath>;
}

pub(crate) fn unsupported(distribution: JdkDistributionName, os: Os, arch: Arch) -> Error {
    Error::UnsupportedCombination {
        distribution,
        os,
        arch,
    }
}

/// All known distributions, with optional base-URL overrides.
#[derive(Debug)]
pub struct JdkDistributions {
    distributions: BTreeMap<JdkDistributionName, Box<dyn JdkDistribution>>,
    base_urls: BTreeMap<JdkDistributionName, String>,
}

impl JdkDistributions {
    pub fn new() -> Self {
        let all: [Box<dyn JdkDistribution>; 4] = [
            Box::new(AmazonCorretto),
            Box::new(AzulZulu),
            Box::new(GraalVmCommunity),
            Box::new(OpenJdkEarlyAccess),
        ];
        Self {
            distributions: all.into_iter().map(|d| (d.name(), d)).collect(),
            base_urls: BTreeMap::new(),
        }
    }

    /// Point a distribution at a mirror instead of its public host.
    pub fn with_base_url(mut self, name: JdkDistributionName, base_url: impl Into<String>) -> Self {
        self.base_urls.insert(name, base_url.into());
        self
    }

    pub fn get(&self, name: JdkDistributionName) -> &dyn JdkDistribution {
        // Every variant is registered in `new`.
        self.distributions[&name].as_ref()
    }

    pub fn base_url(&self, name: JdkDistributionName) -> &str {
        self.base_urls
            .get(&name)
            .map(String::as_str)
            .unwrap_or_else(|| self.get(name).default_base_url())
    }

    /// Full download URL for `release` of `name`.
    pub fn download_url(&self, name: JdkDistributionName, release: &JdkRelease) -> Result<String> {
        let path = self.get(name).path(release)?;
        Ok(format!(
            "{}/{}",
            self.base_url(name).trim_end_matches('/'),
            path.file_name_with_extension()
        ))
    }
}

impl Default for JdkDistributions {
    fn default() -> Self {
        Self::new()
    }
}

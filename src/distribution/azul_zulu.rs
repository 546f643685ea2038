//! Azul Zulu: combined `<zulu-version>-<java-version>` strings,
//! e.g. `17.34.19-17.0.3`.

use super::{unsupported, ArchiveExtension, JdkDistribution, JdkPath};
use crate::error::{Error, Result};
use crate::platform::{Arch, Os};
use crate::spec::{JdkDistributionName, JdkRelease};

#[derive(Debug, Clone, Copy, Default)]
pub struct AzulZulu;

/// The two halves of a Zulu version string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZuluVersion {
    pub zulu_version: String,
    pub java_version: String,
}

impl ZuluVersion {
    /// Split at the first `-`. Both halves must be non-empty.
    pub fn parse(version: &str) -> Result<ZuluVersion> {
        let invalid = |reason: &str| Error::InvalidVersion {
            distribution: JdkDistributionName::AzulZulu,
            version: version.to_string(),
            reason: reason.to_string(),
        };
        let (zulu, java) = version
            .split_once('-')
            .ok_or_else(|| invalid("expected <zulu-version>-<java-version>"))?;
        if zulu.is_empty() || java.is_empty() {
            return Err(invalid("both the zulu and java version must be present"));
        }
        Ok(ZuluVersion {
            zulu_version: zulu.to_string(),
            java_version: java.to_string(),
        })
    }
}

impl JdkDistribution for AzulZulu {
    fn name(&self) -> JdkDistributionName {
        JdkDistributionName::AzulZulu
    }

    fn default_base_url(&self) -> &'static str {
        "https://cdn.azul.com/zulu/bin"
    }

    fn path(&self, release: &JdkRelease) -> Result<JdkPath> {
        let os = match release.os {
            Os::MacOs => "macosx",
            Os::LinuxGlibc => "linux",
            Os::LinuxMusl => "linux_musl",
            Os::Windows => "win",
        };
        let arch = match (release.os, release.arch) {
            (Os::MacOs | Os::LinuxMusl, Arch::X86) => {
                return Err(unsupported(self.name(), release.os, release.arch))
            }
            (_, Arch::X86) => "i686",
            (_, Arch::X86_64) => "x64",
            (_, Arch::Aarch64) => "aarch64",
        };
        let version = ZuluVersion::parse(&release.version)?;
        Ok(JdkPath {
            filename: format!(
                "zulu{}-ca-jdk{}-{os}_{arch}",
                version.zulu_version, version.java_version
            ),
            extension: ArchiveExtension::for_os(release.os),
        })
    }
}

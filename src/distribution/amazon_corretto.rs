//! Amazon Corretto: plain dotted versions, e.g. `17.0.3.6.1`.

use super::{unsupported, ArchiveExtension, JdkDistribution, JdkPath};
use crate::error::Result;
use crate::platform::{Arch, Os};
use crate::spec::{JdkDistributionName, JdkRelease};

#[derive(Debug, Clone, Copy, Default)]
pub struct AmazonCorretto;

impl JdkDistribution for AmazonCorretto {
    fn name(&self) -> JdkDistributionName {
        JdkDistributionName::AmazonCorretto
    }

    fn default_base_url(&self) -> &'static str {
        "https://corretto.aws"
    }

    fn path(&self, release: &JdkRelease) -> Result<JdkPath> {
        let name = self.name();
        let os = match release.os {
            Os::MacOs => "macosx",
            Os::LinuxGlibc => "linux",
            Os::LinuxMusl => "alpine-linux",
            Os::Windows => "windows",
        };
        let arch = match (release.os, release.arch) {
            (Os::MacOs | Os::LinuxMusl, Arch::X86) | (Os::Windows, Arch::Aarch64) => {
                return Err(unsupported(name, release.os, release.arch))
            }
            (_, Arch::X86) => "x86",
            (_, Arch::X86_64) => "x64",
            (_, Arch::Aarch64) => "aarch64",
        };
        // Windows archives carry a `-jdk` qualifier; the others do not.
        let qualifier = if release.os == Os::Windows { "-jdk" } else { "" };
        let version = &release.version;
        Ok(JdkPath {
            filename: format!(
                "downloads/resources/{version}/amazon-corretto-{version}-{os}-{arch}{qualifier}"
            ),
            extension: ArchiveExtension::for_os(release.os),
        })
    }
}

//! GraalVM Community Edition, published as GitHub release assets.

use super::{unsupported, ArchiveExtension, JdkDistribution, JdkPath};
use crate::error::Result;
use crate::platform::{Arch, Os};
use crate::spec::{JdkDistributionName, JdkRelease};

#[derive(Debug, Clone, Copy, Default)]
pub struct GraalVmCommunity;

impl JdkDistribution for GraalVmCommunity {
    fn name(&self) -> JdkDistributionName {
        JdkDistributionName::GraalVmCommunity
    }

    fn default_base_url(&self) -> &'static str {
        "https://github.com/graalvm/graalvm-ce-builds/releases/download"
    }

    fn path(&self, release: &JdkRelease) -> Result<JdkPath> {
        let (os, arch) = match (release.os, release.arch) {
            (Os::MacOs, Arch::X86_64) => ("macos", "x64"),
            (Os::MacOs, Arch::Aarch64) => ("macos", "aarch64"),
            (Os::LinuxGlibc, Arch::X86_64) => ("linux", "x64"),
            (Os::LinuxGlibc, Arch::Aarch64) => ("linux", "aarch64"),
            (Os::Windows, Arch::X86_64) => ("windows", "x64"),
            (os, arch) => return Err(unsupported(self.name(), os, arch)),
        };
        let version = &release.version;
        Ok(JdkPath {
            filename: format!("jdk-{version}/graalvm-community-jdk-{version}_{os}-{arch}_bin"),
            extension: ArchiveExtension::for_os(release.os),
        })
    }
}

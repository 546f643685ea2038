//! OpenJDK early-access builds from jdk.java.net.
//!
//! Versions follow `<major>+<build>[-<minor-build>]`. Mainline builds use a
//! major of the form `25-ea`; project builds name the project instead, as in
//! `24-loom+7-60`, and are published under the project's own directory.

use super::{unsupported, ArchiveExtension, JdkDistribution, JdkPath};
use crate::error::{Error, Result};
use crate::platform::{Arch, Os};
use crate::spec::{JdkDistributionName, JdkRelease};

#[derive(Debug, Clone, Copy, Default)]
pub struct OpenJdkEarlyAccess;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EarlyAccessVersion {
    pub major_version: String,
    pub build_major: String,
    pub build_minor: Option<String>,
}

impl EarlyAccessVersion {
    pub fn parse(version: &str) -> Result<EarlyAccessVersion> {
        let invalid = |reason: &str| Error::InvalidVersion {
            distribution: JdkDistributionName::OpenJdkEarlyAccess,
            version: version.to_string(),
            reason: reason.to_string(),
        };
        let (major, build) = version
            .split_once('+')
            .ok_or_else(|| invalid("expected <major>+<build>[-<minor-build>]"))?;
        if major.is_empty() {
            return Err(invalid("missing major version"));
        }
        let (build_major, build_minor) = match build.split_once('-') {
            Some((major_build, minor_build)) => (major_build, Some(minor_build)),
            None => (build, None),
        };
        let is_number = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
        if !is_number(build_major) {
            return Err(invalid("build number must be numeric"));
        }
        if let Some(minor) = build_minor {
            if !is_number(minor) {
                return Err(invalid("minor build number must be numeric"));
            }
        }
        Ok(EarlyAccessVersion {
            major_version: major.to_string(),
            build_major: build_major.to_string(),
            build_minor: build_minor.map(str::to_string),
        })
    }

    /// Feature release number, e.g. `24` for `24-loom`.
    pub fn feature(&self) -> &str {
        self.major_version
            .split_once('-')
            .map_or(self.major_version.as_str(), |(feature, _)| feature)
    }

    /// Project name for project builds (`loom`, `valhalla`, ...), `None` for mainline EA.
    pub fn project(&self) -> Option<&str> {
        match self.major_version.split_once('-') {
            Some((_, "ea")) | None => None,
            Some((_, project)) => Some(project),
        }
    }
}

impl JdkDistribution for OpenJdkEarlyAccess {
    fn name(&self) -> JdkDistributionName {
        JdkDistributionName::OpenJdkEarlyAccess
    }

    fn default_base_url(&self) -> &'static str {
        "https://download.java.net/java/early_access"
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
        let version = EarlyAccessVersion::parse(&release.version)?;
        let dir = match version.project() {
            Some(project) => format!("{project}/{}", version.build_major),
            None => format!("jdk{}/{}/GPL", version.feature(), version.build_major),
        };
        Ok(JdkPath {
            filename: format!("{dir}/openjdk-{}_{os}-{arch}_bin", release.version),
            extension: ArchiveExtension::for_os(release.os),
        })
    }
}

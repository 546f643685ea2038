//! The installation engine.
//!
//! Each [`JdkSpec`] maps to one directory under the storage root, named by
//! its content hash. A directory at that path is always complete: installs
//! are assembled in a private `.in-progress-*` sibling and renamed into
//! place, so racing installers converge on whichever rename lands first.

use std::fs;
use std::path::{Path, PathBuf};

use crate::archive;
use crate::certs::{CaResources, Certificate};
use crate::distribution::JdkDistributions;
use crate::error::{Error, IoContext, Result};
use crate::fetch::ArchiveFetcher;
use crate::fsutil;
use crate::spec::JdkSpec;

pub struct JdkManager {
    storage_root: PathBuf,
    distributions: JdkDistributions,
    fetcher: Box<dyn ArchiveFetcher>,
    ca_resources: CaResources,
}

impl JdkManager {
    pub fn new(
        storage_root: impl Into<PathBuf>,
        distributions: JdkDistributions,
        fetcher: Box<dyn ArchiveFetcher>,
        ca_resources: CaResources,
    ) -> Self {
        Self {
            storage_root: storage_root.into(),
            distributions,
            fetcher,
            ca_resources,
        }
    }

    pub fn storage_root(&self) -> &Path {
        &self.storage_root
    }

    /// Where `spec` is (or will be) installed.
    pub fn install_path(&self, spec: &JdkSpec) -> Result<PathBuf> {
        Ok(self.storage_root.join(spec.install_dir_name()?))
    }

    /// Download URL for `spec`.
    pub fn download_url(&self, spec: &JdkSpec) -> Result<String> {
        self.distributions
            .download_url(spec.distribution, &spec.release)
    }

    /// Return the JDK root for `spec`, installing it first if needed.
    pub fn jdk(&self, spec: &JdkSpec) -> Result<PathBuf> {
        let final_path = self.install_path(spec)?;
        if final_path.exists() {
            tracing::debug!("{} already installed", final_path.display());
            return Ok(final_path);
        }

        let url = self.download_url(spec)?;
        let archive = self.fetcher.fetch(&url)?;

        fs::create_dir_all(&self.storage_root)
            .io_context(|| format!("Failed to create {}", self.storage_root.display()))?;
        let in_progress = fsutil::in_progress_path(&final_path);
        let result = self.assemble(spec, &archive, &in_progress, &final_path);
        if let Err(e) = fsutil::remove_dir_if_exists(&in_progress) {
            tracing::warn!("{e}");
        }
        result
    }

    fn assemble(
        &self,
        spec: &JdkSpec,
        archive: &Path,
        in_progress: &Path,
        final_path: &Path,
    ) -> Result<PathBuf> {
        archive::unpack(archive, in_progress)?;
        let java_home = archive::find_java_home(in_progress, spec.release.os)?;

        let certs: Vec<Certificate> = spec
            .ca_certs
            .iter()
            .map(|(alias, content)| Certificate {
                alias: alias.to_string(),
                content: content.to_string(),
            })
            .collect();
        self.ca_resources.import_certificates(&certs, &java_home)?;

        match fs::rename(&java_home, final_path) {
            Ok(()) => {
                tracing::info!(
                    "Installed {} {} to {}",
                    spec.distribution,
                    spec.release.version,
                    final_path.display()
                );
            }
            Err(_) if final_path.exists() => {
                tracing::debug!(
                    "{} was installed concurrently, discarding this copy",
                    final_path.display()
                );
            }
            Err(e) => {
                return Err(Error::io(
                    format!(
                        "Failed to move {} to {}",
                        java_home.display(),
                        final_path.display()
                    ),
                    e,
                ))
            }
        }
        Ok(final_path.to_path_buf())
    }
}

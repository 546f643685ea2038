//! Standalone install of an existing JDK into a fixed destination.
//!
//! Used by the `install` command: the JDK that runs the installer is copied
//! into place once, with the requested system CA certificates imported into
//! the copy before it is published.

use std::fs;
use std::path::Path;

use crate::certs::{serials, CaResources, CertificateImport};
use crate::error::{Error, IoContext, Result};
use crate::fsutil;
use crate::lock::PathLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    Installed,
    AlreadyInstalled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub outcome: InstallOutcome,
    pub certificates: Vec<CertificateImport>,
}

/// Copy `source_jdk` to `destination` (once) and import the certificates
/// named by the serial files in `certs_dir`.
///
/// A fresh copy gets its certificates while still in a private
/// `.in-progress-*` sibling, so `destination` only ever appears fully
/// configured. An existing destination is topped up with any missing
/// aliases. The destination stays locked throughout.
pub fn install_from_local(
    source_jdk: &Path,
    destination: &Path,
    certs_dir: &Path,
    ca_resources: &CaResources,
) -> Result<InstallReport> {
    let java = source_jdk.join("bin").join(ca_resources.os().executable("java"));
    if !java.is_file() {
        return Err(Error::JavaHomeNotFound(source_jdk.to_path_buf()));
    }
    let alias_by_serial = serials::read_serials_dir(certs_dir)?;

    let mut lock = PathLock::acquire(destination)?;
    let report = if destination.exists() {
        tracing::info!("JDK already installed at {}", destination.display());
        InstallReport {
            outcome: InstallOutcome::AlreadyInstalled,
            certificates: ca_resources.import_system_certificates(&alias_by_serial, destination)?,
        }
    } else {
        let certificates = copy_into_place(source_jdk, destination, |jdk| {
            ca_resources.import_system_certificates(&alias_by_serial, jdk)
        })?;
        InstallReport {
            outcome: InstallOutcome::Installed,
            certificates,
        }
    };
    lock.release();

    Ok(report)
}

/// Copy into a temporary sibling, run `configure` on it, then rename it onto
/// `destination`. The sibling is removed on any failure.
fn copy_into_place<T>(
    source_jdk: &Path,
    destination: &Path,
    configure: impl FnOnce(&Path) -> Result<T>,
) -> Result<T> {
    let tmp = fsutil::in_progress_path(destination);
    let placed = fsutil::copy_dir_recursive(source_jdk, &tmp)
        .and_then(|()| configure(&tmp))
        .and_then(|configured| {
            fs::rename(&tmp, destination)
                .io_context(|| {
                    format!(
                        "Failed to move {} to {}",
                        tmp.display(),
                        destination.display()
                    )
                })
                .map(|()| configured)
        });
    if placed.is_err() {
        if let Err(e) = fsutil::remove_dir_if_exists(&tmp) {
            tracing::warn!("{e}");
        }
    }
    let configured = placed?;

    tracing::info!(
        "Installed JDK from {} to {}",
        source_jdk.display(),
        destination.display()
    );
    Ok(configured)
}

//! CA certificates: read the host trust store, pick certificates by serial,
//! and import them into a JDK's `cacerts` with the JDK's own `keytool`.

pub mod parse;
pub mod serials;

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::command::CommandRunner;
use crate::error::{Error, IoContext, Result};
use crate::platform::Os;

pub use parse::{
    encode_pem, parse_certificates, select_certificates, Certificate, CertificateSelection,
    ParsedCertificate,
};

/// PEM bundles checked on Linux, in order.
pub const DEFAULT_LINUX_CA_BUNDLES: [&str; 4] = [
    "/etc/ssl/certs/ca-certificates.crt",
    "/etc/pki/tls/certs/ca-bundle.crt",
    "/etc/ssl/ca-bundle.pem",
    "/etc/pki/ca-trust/extracted/pem/tls-ca-bundle.pem",
];

const MACOS_KEYCHAINS: [&str; 2] = [
    "/System/Library/Keychains/SystemRootCertificates.keychain",
    "/Library/Keychains/System.keychain",
];

const TRUSTSTORE_PASSWORD: &str = "changeit";

/// Whether an alias exists in a JDK truststore.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeystoreEntry {
    Present,
    Absent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportOutcome {
    Imported,
    AlreadyPresent,
    /// Truststore import is not supported on this OS.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateImport {
    pub alias: String,
    pub outcome: ImportOutcome,
}

/// Host trust store access plus `keytool` import.
#[derive(Debug, Clone)]
pub struct CaResources {
    runner: CommandRunner,
    os: Os,
    linux_ca_bundles: Vec<PathBuf>,
}

impl CaResources {
    pub fn new(os: Os) -> Self {
        Self {
            runner: CommandRunner::new(),
            os,
            linux_ca_bundles: DEFAULT_LINUX_CA_BUNDLES.iter().map(PathBuf::from).collect(),
        }
    }

    /// Replace the Linux bundle candidates.
    pub fn with_linux_ca_bundles(mut self, bundles: Vec<PathBuf>) -> Self {
        self.linux_ca_bundles = bundles;
        self
    }

    pub fn os(&self) -> Os {
        self.os
    }

    /// Raw bytes of the host trust store.
    pub fn resolve_system_certificates(&self) -> Result<Vec<u8>> {
        match self.os {
            Os::MacOs => self.export_macos_keychains(),
            os if os.is_linux() => self.read_linux_bundle(),
            os => Err(Error::TruststoreNotSupported(os)),
        }
    }

    fn export_macos_keychains(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        for keychain in MACOS_KEYCHAINS {
            let pem = self.runner.run(
                &["security", "export", "-t", "certs", "-f", "pemseq", "-k", keychain],
                None,
            )?;
            out.extend_from_slice(pem.as_bytes());
            out.push(b'\n');
        }
        Ok(out)
    }

    fn read_linux_bundle(&self) -> Result<Vec<u8>> {
        let Some(bundle) = self.linux_ca_bundles.iter().find(|p| p.is_file()) else {
            return Err(Error::NoTruststoreFound {
                checked: self.linux_ca_bundles.clone(),
            });
        };
        tracing::debug!("reading system certificates from {}", bundle.display());
        std::fs::read(bundle).io_context(|| format!("Failed to read {}", bundle.display()))
    }

    /// Look `alias` up in the truststore of the JDK at `jdk_root`.
    pub fn keystore_entry(&self, alias: &str, jdk_root: &Path) -> Result<KeystoreEntry> {
        let keytool = self.keytool(jdk_root);
        let args: [&OsStr; 7] = [
            keytool.as_os_str(),
            "-list".as_ref(),
            "-alias".as_ref(),
            alias.as_ref(),
            "-cacerts".as_ref(),
            "-storepass".as_ref(),
            TRUSTSTORE_PASSWORD.as_ref(),
        ];
        match self.runner.run(&args, None) {
            Ok(_) => Ok(KeystoreEntry::Present),
            Err(Error::CommandFailed { stdout, stderr, .. })
                if stdout.contains("does not exist") || stderr.contains("does not exist") =>
            {
                Ok(KeystoreEntry::Absent)
            }
            Err(e) => Err(e),
        }
    }

    /// Import each certificate not already present under its alias.
    pub fn import_certificates(
        &self,
        certs: &[Certificate],
        jdk_root: &Path,
    ) -> Result<Vec<CertificateImport>> {
        certs
            .iter()
            .map(|cert| {
                let outcome = self.import_certificate(cert, jdk_root)?;
                Ok(CertificateImport {
                    alias: cert.alias.clone(),
                    outcome,
                })
            })
            .collect()
    }

    pub fn import_certificate(&self, cert: &Certificate, jdk_root: &Path) -> Result<ImportOutcome> {
        if !matches!(self.os, Os::MacOs | Os::LinuxGlibc | Os::LinuxMusl) {
            tracing::info!(
                "Not importing CA certificate {}: truststore import is not supported on {}",
                cert.alias,
                self.os
            );
            return Ok(ImportOutcome::Skipped);
        }

        if self.keystore_entry(&cert.alias, jdk_root)? == KeystoreEntry::Present {
            tracing::info!(
                "CA certificate {} is already present in the JDK truststore, skipping",
                cert.alias
            );
            return Ok(ImportOutcome::AlreadyPresent);
        }

        let mut pem = tempfile::Builder::new()
            .prefix(&format!("{}-", cert.alias))
            .suffix(".pem")
            .tempfile()
            .io_context(|| format!("Failed to create temporary file for {}", cert.alias))?;
        pem.write_all(cert.content.as_bytes())
            .and_then(|()| pem.flush())
            .io_context(|| format!("Failed to write {}", pem.path().display()))?;

        let keytool = self.keytool(jdk_root);
        let args: [&OsStr; 11] = [
            keytool.as_os_str(),
            "-importcert".as_ref(),
            "-noprompt".as_ref(),
            "-trustcacerts".as_ref(),
            "-alias".as_ref(),
            cert.alias.as_ref(),
            "-cacerts".as_ref(),
            "-storepass".as_ref(),
            TRUSTSTORE_PASSWORD.as_ref(),
            "-file".as_ref(),
            pem.path().as_os_str(),
        ];
        self.runner.run(&args, None)?;
        tracing::info!(
            "Successfully imported CA certificate {} into the JDK truststore",
            cert.alias
        );
        Ok(ImportOutcome::Imported)
    }

    /// Find the host certificates whose serials are listed in `alias_by_serial`
    /// and import them into the JDK at `jdk_root`.
    ///
    /// Serials missing from the host store produce one warning, not an error.
    pub fn import_system_certificates(
        &self,
        alias_by_serial: &BTreeMap<String, String>,
        jdk_root: &Path,
    ) -> Result<Vec<CertificateImport>> {
        if alias_by_serial.is_empty() {
            tracing::debug!("no CA certificates requested");
            return Ok(Vec::new());
        }
        let system = self.resolve_system_certificates()?;
        let parsed = parse_certificates(&system);
        tracing::debug!("parsed {} certificates from the system truststore", parsed.len());

        let selection = select_certificates(&parsed, alias_by_serial);
        if !selection.missing.is_empty() {
            let missing: Vec<&str> = selection.missing.iter().map(String::as_str).collect();
            tracing::warn!(
                "Certificates '{}' could not be found in the system keystore. These certificates were not imported.",
                missing.join(", ")
            );
        }
        self.import_certificates(&selection.found, jdk_root)
    }

    fn keytool(&self, jdk_root: &Path) -> PathBuf {
        jdk_root.join("bin").join(self.os.executable("keytool"))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::testutil::{install_fake_keytool, keytool_calls};
    use std::fs;
    use tempfile::TempDir;

    const CA_1001: &str = include_str!("../../testdata/certs/test-root-ca-1001.pem");
    const SYSTEM_BUNDLE: &str = include_str!("../../testdata/certs/system-bundle.pem");

    fn linux() -> CaResources {
        CaResources::new(Os::LinuxGlibc)
    }

    fn cert(alias: &str) -> Certificate {
        Certificate {
            alias: alias.to_string(),
            content: CA_1001.to_string(),
        }
    }

    #[test]
    fn first_existing_linux_bundle_wins() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("missing.crt");
        let second = temp.path().join("second.crt");
        let third = temp.path().join("third.crt");
        fs::write(&second, "second").unwrap();
        fs::write(&third, "third").unwrap();

        let ca = linux().with_linux_ca_bundles(vec![missing, second, third]);
        assert_eq!(ca.resolve_system_certificates().unwrap(), b"second");
    }

    #[test]
    fn no_linux_bundle_lists_checked_paths() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("missing.crt");
        let ca = linux().with_linux_ca_bundles(vec![missing.clone()]);
        match ca.resolve_system_certificates() {
            Err(Error::NoTruststoreFound { checked }) => assert_eq!(checked, vec![missing]),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn windows_truststore_is_unsupported() {
        assert!(matches!(
            CaResources::new(Os::Windows).resolve_system_certificates(),
            Err(Error::TruststoreNotSupported(Os::Windows))
        ));
    }

    #[test]
    fn absent_alias_is_imported_then_present() {
        let jdk = TempDir::new().unwrap();
        install_fake_keytool(jdk.path());
        let ca = linux();

        assert_eq!(
            ca.keystore_entry("corp", jdk.path()).unwrap(),
            KeystoreEntry::Absent
        );
        assert_eq!(
            ca.import_certificate(&cert("corp"), jdk.path()).unwrap(),
            ImportOutcome::Imported
        );
        assert_eq!(
            ca.keystore_entry("corp", jdk.path()).unwrap(),
            KeystoreEntry::Present
        );
        assert_eq!(
            ca.import_certificate(&cert("corp"), jdk.path()).unwrap(),
            ImportOutcome::AlreadyPresent
        );

        let imports = keytool_calls(jdk.path())
            .iter()
            .filter(|c| c.starts_with("-importcert"))
            .count();
        assert_eq!(imports, 1);
    }

    #[test]
    fn import_passes_truststore_flags() {
        let jdk = TempDir::new().unwrap();
        install_fake_keytool(jdk.path());
        linux().import_certificate(&cert("corp"), jdk.path()).unwrap();

        let calls = keytool_calls(jdk.path());
        assert!(calls[0].starts_with("-list -alias corp -cacerts -storepass changeit"));
        assert!(calls[1].starts_with(
            "-importcert -noprompt -trustcacerts -alias corp -cacerts -storepass changeit -file "
        ));
    }

    #[test]
    fn other_keytool_failures_are_fatal() {
        let jdk = TempDir::new().unwrap();
        install_fake_keytool(jdk.path());
        let err = linux().keystore_entry("broken", jdk.path()).unwrap_err();
        match err {
            Error::CommandFailed { stdout, .. } => assert!(stdout.contains("tampered")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn missing_keytool_is_a_launch_error() {
        let jdk = TempDir::new().unwrap();
        assert!(matches!(
            linux().keystore_entry("corp", jdk.path()),
            Err(Error::Launch { .. })
        ));
    }

    #[test]
    fn unsupported_os_skips_without_running_keytool() {
        let jdk = TempDir::new().unwrap();
        let outcome = CaResources::new(Os::Windows)
            .import_certificate(&cert("corp"), jdk.path())
            .unwrap();
        assert_eq!(outcome, ImportOutcome::Skipped);
    }

    #[test]
    fn system_import_selects_by_serial() {
        let temp = TempDir::new().unwrap();
        let bundle = temp.path().join("bundle.crt");
        fs::write(&bundle, SYSTEM_BUNDLE).unwrap();
        let jdk = temp.path().join("jdk");
        install_fake_keytool(&jdk);

        let ca = linux().with_linux_ca_bundles(vec![bundle]);
        let requested: BTreeMap<String, String> = [
            ("1002".to_string(), "corp-two".to_string()),
            ("4004".to_string(), "gone".to_string()),
        ]
        .into_iter()
        .collect();

        let imports = ca.import_system_certificates(&requested, &jdk).unwrap();
        assert_eq!(
            imports,
            vec![CertificateImport {
                alias: "corp-two".to_string(),
                outcome: ImportOutcome::Imported,
            }]
        );
    }

    #[test]
    fn empty_request_does_not_touch_truststore() {
        let temp = TempDir::new().unwrap();
        let ca = linux().with_linux_ca_bundles(vec![temp.path().join("missing")]);
        assert!(ca
            .import_system_certificates(&BTreeMap::new(), temp.path())
            .unwrap()
            .is_empty());
    }
}

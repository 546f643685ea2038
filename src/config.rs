//! Installer configuration.
//!
//! An optional TOML file supplies the storage root, the Linux CA bundle
//! candidates and per-distribution mirror URLs:
//!
//! ```toml
//! storage_root = "/opt/jdks"
//! linux_ca_bundles = ["/etc/ssl/certs/ca-certificates.crt"]
//!
//! [distributions.amazon-corretto]
//! base_url = "https://mirror.example.com/corretto"
//! ```
//!
//! The file is taken from `--config`, else `$JDK_PROVISION_CONFIG`, else
//! `~/.jdk-provision/config.toml` when it exists. `$JDK_PROVISION_STORAGE`
//! overrides `storage_root`.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::certs::{CaResources, DEFAULT_LINUX_CA_BUNDLES};
use crate::distribution::JdkDistributions;
use crate::error::{Error, IoContext, Result};
use crate::platform::Os;
use crate::spec::JdkDistributionName;

pub const CONFIG_ENV: &str = "JDK_PROVISION_CONFIG";
pub const STORAGE_ENV: &str = "JDK_PROVISION_STORAGE";
const STATE_DIR: &str = ".jdk-provision";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct InstallerConfigToml {
    storage_root: Option<PathBuf>,
    linux_ca_bundles: Option<Vec<PathBuf>>,
    #[serde(default)]
    distributions: BTreeMap<String, DistributionToml>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DistributionToml {
    base_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallerConfig {
    pub storage_root: PathBuf,
    pub linux_ca_bundles: Vec<PathBuf>,
    pub base_urls: BTreeMap<JdkDistributionName, String>,
}

impl InstallerConfig {
    /// Load using the standard lookup order and environment overrides.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let config_path = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));
        let storage_override = std::env::var_os(STORAGE_ENV).map(PathBuf::from);
        Self::load_from(config_path.as_deref(), storage_override)
    }

    /// Load from `config_path` (which must exist when given) or the default
    /// location (which may be absent).
    pub fn load_from(config_path: Option<&Path>, storage_override: Option<PathBuf>) -> Result<Self> {
        let (parsed, base_dir) = match config_path {
            Some(path) => (read_config(path)?, path.parent().map(Path::to_path_buf)),
            None => match default_config_path().filter(|p| p.is_file()) {
                Some(path) => (read_config(&path)?, path.parent().map(Path::to_path_buf)),
                None => (InstallerConfigToml::default(), None),
            },
        };
        let config_file = config_path.map(Path::to_path_buf).unwrap_or_default();

        // Relative config paths are relative to the config file.
        let storage_root = match (storage_override, parsed.storage_root) {
            (Some(root), _) => root,
            (None, Some(root)) if root.is_relative() => base_dir.unwrap_or_default().join(root),
            (None, Some(root)) => root,
            (None, None) => default_storage_root().ok_or_else(|| Error::Config {
                path: config_file.clone(),
                message: "cannot determine home directory for the default storage root".into(),
            })?,
        };

        let mut base_urls = BTreeMap::new();
        for (name, dist) in parsed.distributions {
            let distribution: JdkDistributionName = name.parse().map_err(|_| Error::Config {
                path: config_file.clone(),
                message: format!("unknown distribution '{name}'"),
            })?;
            if let Some(url) = dist.base_url {
                base_urls.insert(distribution, url);
            }
        }

        Ok(InstallerConfig {
            storage_root,
            linux_ca_bundles: parsed.linux_ca_bundles.unwrap_or_else(default_linux_ca_bundles),
            base_urls,
        })
    }

    /// Distribution registry with configured mirrors applied.
    pub fn distributions(&self) -> JdkDistributions {
        self.base_urls
            .iter()
            .fold(JdkDistributions::new(), |d, (name, url)| d.with_base_url(*name, url.clone()))
    }

    pub fn ca_resources(&self, os: Os) -> CaResources {
        CaResources::new(os).with_linux_ca_bundles(self.linux_ca_bundles.clone())
    }

    /// Cache for downloaded archives, next to the installed JDKs.
    pub fn download_cache(&self) -> PathBuf {
        self.storage_root.join(".downloads")
    }
}

fn read_config(path: &Path) -> Result<InstallerConfigToml> {
    let text = fs::read_to_string(path)
        .io_context(|| format!("Failed to read config {}", path.display()))?;
    toml::from_str(&text).map_err(|e| Error::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(STATE_DIR).join("config.toml"))
}

pub fn default_storage_root() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(STATE_DIR).join("jdks"))
}

fn default_linux_ca_bundles() -> Vec<PathBuf> {
    DEFAULT_LINUX_CA_BUNDLES.iter().map(PathBuf::from).collect()
}

/// Read a one-value file. Missing or blank files read as `None`.
pub fn read_value_file(path: &Path) -> Result<Option<String>> {
    let s = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(Error::io(format!("Failed to read {}", path.display()), e)),
    };
    let value = s.trim();
    if value.is_empty() {
        return Ok(None);
    }
    Ok(Some(value.to_string()))
}

/// Write `value` followed by a single newline.
pub fn write_value_file(path: &Path, value: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).io_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", value.trim_end()))
        .io_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Arch;
    use crate::spec::JdkRelease;
    use tempfile::TempDir;

    #[test]
    fn value_files_round_trip_with_trailing_newline() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("state/java-home");
        write_value_file(&path, "/opt/jdk\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "/opt/jdk\n");
        assert_eq!(read_value_file(&path).unwrap().as_deref(), Some("/opt/jdk"));
    }

    #[test]
    fn missing_or_blank_value_file_is_none() {
        let temp = TempDir::new().unwrap();
        assert_eq!(read_value_file(&temp.path().join("absent")).unwrap(), None);
        let blank = temp.path().join("blank");
        fs::write(&blank, "  \n").unwrap();
        assert_eq!(read_value_file(&blank).unwrap(), None);
    }

    #[test]
    fn parses_full_config() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(
            &path,
            r#"
storage_root = "jdks"
linux_ca_bundles = ["/custom/bundle.pem"]

[distributions.amazon-corretto]
base_url = "https://mirror.example/corretto/"
"#,
        )
        .unwrap();

        let config = InstallerConfig::load_from(Some(&path), None).unwrap();
        assert_eq!(config.storage_root, temp.path().join("jdks"));
        assert_eq!(config.linux_ca_bundles, vec![PathBuf::from("/custom/bundle.pem")]);

        let release = JdkRelease::new("21.0.2.13.1", Os::LinuxGlibc, Arch::X86_64);
        let url = config
            .distributions()
            .download_url(JdkDistributionName::AmazonCorretto, &release)
            .unwrap();
        assert!(url.starts_with("https://mirror.example/corretto/downloads/resources/"));
    }

    #[test]
    fn storage_override_wins() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "storage_root = \"/from/config\"\n").unwrap();
        let config =
            InstallerConfig::load_from(Some(&path), Some(PathBuf::from("/from/env"))).unwrap();
        assert_eq!(config.storage_root, PathBuf::from("/from/env"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "storage = \"/typo\"\n").unwrap();
        assert!(matches!(
            InstallerConfig::load_from(Some(&path), None),
            Err(Error::Config { .. })
        ));
    }

    #[test]
    fn unknown_distribution_is_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "[distributions.oracle]\nbase_url = \"https://x\"\n").unwrap();
        let err = InstallerConfig::load_from(Some(&path), None).unwrap_err();
        assert!(err.to_string().contains("unknown distribution 'oracle'"));
    }

    #[test]
    fn explicit_missing_config_is_an_error() {
        let temp = TempDir::new().unwrap();
        assert!(InstallerConfig::load_from(Some(&temp.path().join("nope.toml")), None).is_err());
    }
}

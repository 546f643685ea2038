//! Deterministic JDK provisioning.
//!
//! A [`JdkSpec`] names a distribution, version, platform and a set of CA
//! certificates. Its short content hash picks an install directory, and
//! [`JdkManager`] makes sure that directory holds a complete JDK with those
//! certificates in its truststore, installing it at most once even when many
//! processes ask at the same time.
//!
//! # Architecture
//!
//! ```text
//! JdkManager::jdk(spec)
//!     │
//!     ├── spec          JdkSpec → "<distribution>-<version>-<hash>"
//!     ├── distribution  vendor URL layout per os/arch
//!     ├── fetch         archive download (cached, locked per URL)
//!     ├── archive       unpack + locate bin/java
//!     ├── certs         keytool import into the unpacked JDK
//!     └── rename        .in-progress-* → final directory
//!
//! installer::install_from_local
//!     ├── lock          PathLock on the destination
//!     ├── fsutil        copy the running JDK into place
//!     └── certs         host trust store → serial match → keytool import
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use jdk_provision::{CaCerts, JdkDistributionName, JdkRelease, JdkSpec};
//! use jdk_provision::platform::{Arch, Os};
//!
//! let spec = JdkSpec::new(
//!     JdkDistributionName::AzulZulu,
//!     JdkRelease::new("17.34.19-17.0.3", Os::LinuxGlibc, Arch::X86_64),
//!     CaCerts::new(),
//! );
//! let java_home = manager.jdk(&spec)?;
//! ```

pub mod archive;
pub mod certs;
pub mod command;
pub mod config;
pub mod distribution;
pub mod error;
pub mod fetch;
pub mod fsutil;
pub mod installer;
pub mod lock;
pub mod logging;
pub mod manager;
pub mod platform;
pub mod spec;

#[cfg(test)]
mod testutil;

pub use certs::CaResources;
pub use config::InstallerConfig;
pub use error::{Error, Result};
pub use fetch::{ArchiveFetcher, HttpArchiveFetcher};
pub use lock::PathLock;
pub use manager::JdkManager;
pub use spec::{CaCerts, JdkDistributionName, JdkRelease, JdkSpec};

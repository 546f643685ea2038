//! Error types for JDK provisioning.
//!
//! Library code returns [`Error`]; the binary wraps it in `anyhow` and adds
//! context at the call site.

use std::path::PathBuf;

use crate::platform::{Arch, Os};
use crate::spec::JdkDistributionName;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The process could not be started at all.
    #[error("failed to launch '{command}': {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The process ran and exited non-zero.
    #[error(
        "command '{command}' failed with exit code {}\nstdout:\n{}\nstderr:\n{}",
        .exit_code.map_or_else(|| "<signal>".to_string(), |c| c.to_string()),
        .stdout.trim_end(),
        .stderr.trim_end()
    )]
    CommandFailed {
        command: String,
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    #[error("{distribution} does not publish builds for {os} {arch}")]
    UnsupportedCombination {
        distribution: JdkDistributionName,
        os: Os,
        arch: Arch,
    },

    #[error("invalid {distribution} version '{version}': {reason}")]
    InvalidVersion {
        distribution: JdkDistributionName,
        version: String,
        reason: String,
    },

    #[error("system truststore discovery is not supported on {0}")]
    TruststoreNotSupported(Os),

    #[error("no system truststore found (checked: {})", .checked.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(", "))]
    NoTruststoreFound { checked: Vec<PathBuf> },

    #[error("could not find bin/java inside '{}'", .0.display())]
    JavaHomeNotFound(PathBuf),

    #[error("unsupported archive '{}': expected .zip or .tar.gz", .0.display())]
    UnsupportedArchive(PathBuf),

    #[error("failed to unpack '{}': {message}", .archive.display())]
    Unpack { archive: PathBuf, message: String },

    #[error("failed to download '{url}': {message}")]
    Download { url: String, message: String },

    #[error("unknown JDK distribution '{0}'")]
    UnknownDistribution(String),

    #[error("unknown {kind} '{value}'")]
    UnknownPlatform { kind: &'static str, value: String },

    #[error("invalid serial number '{serial}' in '{}'", .path.display())]
    InvalidSerial { path: PathBuf, serial: String },

    #[error("invalid config '{}': {message}", .path.display())]
    Config { path: PathBuf, message: String },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Error::Io {
            context: context.into(),
            source,
        }
    }
}

/// Attach a human-readable context to `std::io` results.
pub(crate) trait IoContext<T> {
    fn io_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T> IoContext<T> for std::io::Result<T> {
    fn io_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|source| Error::io(f(), source))
    }
}

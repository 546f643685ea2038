//! Getting a vendor archive onto local disk.

use std::fs;
use std::path::{Path, PathBuf};

use reqwest::blocking::Client;
use sha2::{Digest, Sha256};

use crate::error::{Error, IoContext, Result};
use crate::lock::PathLock;

/// Something that turns a download URL into a local archive file.
///
/// The returned file name must keep the archive extension; unpacking picks
/// the format from it.
pub trait ArchiveFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<PathBuf>;
}

/// Downloads over HTTP(S) into a cache directory, one file per URL.
///
/// `file://` URLs are copied, which is handy for local mirrors.
#[derive(Debug, Clone)]
pub struct HttpArchiveFetcher {
    client: Client,
    cache_dir: PathBuf,
}

impl HttpArchiveFetcher {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("jdk-provision/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Download {
                url: String::new(),
                message: format!("Failed to create HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            cache_dir: cache_dir.into(),
        })
    }

    /// Where `url` is cached: `<cache>/<url-hash>/<last path segment>`.
    pub fn cache_path(&self, url: &str) -> PathBuf {
        let digest = Sha256::digest(url.as_bytes());
        let key: String = digest[..8].iter().map(|b| format!("{b:02x}")).collect();
        let name = url
            .rsplit('/')
            .next()
            .filter(|segment| !segment.is_empty())
            .unwrap_or("archive");
        self.cache_dir.join(key).join(name)
    }

    fn download(&self, url: &str, dest: &Path) -> Result<()> {
        let download_error = |message: String| Error::Download {
            url: url.to_string(),
            message,
        };
        let dir = dest.parent().unwrap_or(&self.cache_dir);
        let mut tmp = tempfile::Builder::new()
            .prefix(".download-")
            .tempfile_in(dir)
            .io_context(|| format!("Failed to create download file in {}", dir.display()))?;

        if let Some(local) = url.strip_prefix("file://") {
            let mut src = fs::File::open(local).io_context(|| format!("Failed to open {local}"))?;
            std::io::copy(&mut src, &mut tmp).io_context(|| format!("Failed to copy {local}"))?;
        } else {
            tracing::info!("Downloading {url}");
            let mut response = self
                .client
                .get(url)
                .send()
                .and_then(|r| r.error_for_status())
                .map_err(|e| download_error(e.to_string()))?;
            response
                .copy_to(&mut tmp)
                .map_err(|e| download_error(e.to_string()))?;
        }

        tmp.persist(dest)
            .map_err(|e| Error::io(format!("Failed to publish {}", dest.display()), e.error))?;
        Ok(())
    }
}

impl ArchiveFetcher for HttpArchiveFetcher {
    fn fetch(&self, url: &str) -> Result<PathBuf> {
        let dest = self.cache_path(url);
        let _lock = PathLock::acquire(&dest)?;
        if dest.is_file() {
            tracing::debug!("using cached {}", dest.display());
            return Ok(dest);
        }
        self.download(url, &dest)?;
        Ok(dest)
    }
}

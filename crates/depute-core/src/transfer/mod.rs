//! Transfer primitives: stream a remote archive to disk, extract it, and
//! swap an extracted tree into a live directory.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::RefreshConfig;
use crate::error::{RefreshError, Result};

pub mod download;
pub mod extract;
pub mod install;

pub use download::download;
pub use extract::extract;
pub use install::install;

/// The three primitives the refresh routine drives, behind one seam so a
/// refresh can run against stubs.
#[async_trait]
pub trait Transfer: Send + Sync {
    async fn download(&self, url: &str, dest: &Path) -> Result<()>;
    async fn extract(&self, archive: &Path, dest: &Path) -> Result<()>;
    async fn install(&self, src: &Path, dest: &Path) -> Result<()>;
}

/// Production [`Transfer`] over HTTP(S) and the local filesystem.
#[derive(Debug, Clone)]
pub struct HttpTransfer {
    client: reqwest::Client,
    progress_interval: Option<Duration>,
}

impl HttpTransfer {
    pub fn new(config: &RefreshConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(RefreshError::Client)?;
        Ok(Self {
            client,
            progress_interval: config.progress_interval(),
        })
    }
}

#[async_trait]
impl Transfer for HttpTransfer {
    async fn download(&self, url: &str, dest: &Path) -> Result<()> {
        download::download(&self.client, url, dest, self.progress_interval).await
    }

    async fn extract(&self, archive: &Path, dest: &Path) -> Result<()> {
        extract::extract(archive, dest).await
    }

    async fn install(&self, src: &Path, dest: &Path) -> Result<()> {
        install::install(src, dest).await
    }
}

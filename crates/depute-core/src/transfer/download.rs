use std::path::Path;
use std::time::Duration;

use futures::StreamExt;
use reqwest::{Client, Url};
use tokio::io::{AsyncWriteExt, BufWriter};

use crate::error::{RefreshError, Result};
use crate::progress::ProgressLog;

/// Size of the buffered writes to the destination file.
pub const CHUNK_SIZE: usize = 4096;

/// Stream `url` into the file at `dest`.
///
/// The parent directory of `dest` must already exist. Every failure is logged
/// once with a message specific to its cause and returned; nothing is retried.
pub async fn download(
    client: &Client,
    url: &str,
    dest: &Path,
    progress_interval: Option<Duration>,
) -> Result<()> {
    let parsed = match parse_url(url) {
        Some(parsed) => parsed,
        None => {
            tracing::error!("Invalid url {url}");
            return Err(RefreshError::InvalidUrl(url.to_string()));
        }
    };

    let response = match client.get(parsed).send().await {
        Ok(response) => response,
        Err(e) if e.is_builder() => {
            tracing::error!("Invalid url {url}");
            return Err(RefreshError::InvalidUrl(url.to_string()));
        }
        Err(e) => {
            tracing::error!("Connection error from {url}");
            return Err(RefreshError::Connection {
                url: url.to_string(),
                source: e,
            });
        }
    };

    let status = response.status();
    if !status.is_success() {
        tracing::error!("Invalid response from {url}");
        return Err(RefreshError::BadResponse {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let file = match tokio::fs::File::create(dest).await {
        Ok(file) => file,
        Err(e) => {
            tracing::error!("Invalid path {}", dest.display());
            return Err(RefreshError::InvalidPath {
                path: dest.to_path_buf(),
                source: e,
            });
        }
    };

    tracing::info!("Downloading {url} to {}", dest.display());
    let mut progress = ProgressLog::new(url, response.content_length(), progress_interval);
    let mut writer = BufWriter::with_capacity(CHUNK_SIZE, file);
    let mut body = response.bytes_stream();

    while let Some(chunk) = body.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                tracing::error!("Connection error from {url}");
                return Err(RefreshError::Connection {
                    url: url.to_string(),
                    source: e,
                });
            }
        };
        if let Err(e) = writer.write_all(&chunk).await {
            return Err(write_failed(dest, e));
        }
        progress.advance(chunk.len());
    }
    if let Err(e) = writer.flush().await {
        return Err(write_failed(dest, e));
    }

    tracing::info!("Download done");
    Ok(())
}

fn write_failed(dest: &Path, source: std::io::Error) -> RefreshError {
    tracing::error!("Cannot write {}", dest.display());
    RefreshError::InvalidPath {
        path: dest.to_path_buf(),
        source,
    }
}

/// Only absolute http(s) URLs with a host are accepted.
fn parse_url(url: &str) -> Option<Url> {
    let parsed = Url::parse(url).ok()?;
    let scheme_ok = matches!(parsed.scheme(), "http" | "https");
    let host_ok = parsed.host_str().is_some_and(|h| !h.is_empty());
    (scheme_ok && host_ok).then_some(parsed)
}

use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use zip::result::ZipError;
use zip::ZipArchive;

use crate::error::{RefreshError, Result};

/// Decompress every entry of the zip at `archive` into `dest`, keeping the
/// relative paths of the entries. Runs on the blocking pool.
pub async fn extract(archive: &Path, dest: &Path) -> Result<()> {
    tracing::info!("Unzipping file {} to {}", archive.display(), dest.display());

    let (archive_buf, dest_buf) = (archive.to_path_buf(), dest.to_path_buf());
    let result = tokio::task::spawn_blocking(move || unzip(&archive_buf, &dest_buf))
        .await
        .map_err(|e| RefreshError::TaskJoin(e.to_string()))?;

    match &result {
        Ok(()) => tracing::info!("Unzip done"),
        Err(RefreshError::ArchiveNotFound(_)) => {
            tracing::error!("{} does not exist.", archive.display())
        }
        Err(RefreshError::BadArchive { .. }) => {
            tracing::error!("{} is not a correct Zip File.", archive.display())
        }
        Err(e) => tracing::error!("Unzipping {} failed: {e}", archive.display()),
    }
    result
}

/// Blocking half of [`extract`].
pub fn unzip(archive: &Path, dest: &Path) -> Result<()> {
    let file = File::open(archive).map_err(|e| match e.kind() {
        ErrorKind::NotFound => RefreshError::ArchiveNotFound(archive.to_path_buf()),
        _ => RefreshError::Io(e),
    })?;

    let mut zip = ZipArchive::new(file).map_err(|e| bad_archive(archive, e))?;
    std::fs::create_dir_all(dest)?;
    zip.extract(dest).map_err(|e| match e {
        ZipError::Io(io) => RefreshError::Io(io),
        other => bad_archive(archive, other),
    })?;
    Ok(())
}

fn bad_archive(archive: &Path, err: ZipError) -> RefreshError {
    RefreshError::BadArchive {
        path: PathBuf::from(archive),
        reason: err.to_string(),
    }
}

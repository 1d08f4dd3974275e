use std::io::{self, ErrorKind};
use std::path::Path;

use walkdir::WalkDir;

use crate::error::{RefreshError, Result};

/// Replace the directory at `dst` with the directory at `src`.
///
/// Logs the move and its outcome; the work itself runs on the blocking pool.
pub async fn install(src: &Path, dst: &Path) -> Result<()> {
    tracing::info!("Moving file from {} to {}", src.display(), dst.display());

    let (src_buf, dst_buf) = (src.to_path_buf(), dst.to_path_buf());
    let result = tokio::task::spawn_blocking(move || install_dir(&src_buf, &dst_buf))
        .await
        .map_err(|e| RefreshError::TaskJoin(e.to_string()))?;

    match &result {
        Ok(()) => tracing::info!("Move file done"),
        Err(RefreshError::SourceNotFound { .. }) => tracing::error!(
            "{} and/or {} does not exist",
            src.display(),
            dst.display()
        ),
        Err(e) => tracing::error!(
            "Moving {} to {} failed: {e}",
            src.display(),
            dst.display()
        ),
    }
    result
}

/// Blocking half of [`install`].
///
/// `dst` is removed first if present, then `src` is renamed onto it. When the
/// two paths live on different filesystems the tree is copied and `src`
/// removed afterwards. The parent of `dst` must exist.
pub fn install_dir(src: &Path, dst: &Path) -> Result<()> {
    let not_found = || RefreshError::SourceNotFound {
        src: src.to_path_buf(),
        dst: dst.to_path_buf(),
    };
    if !src.exists() {
        return Err(not_found());
    }

    remove_if_present(dst)?;

    match std::fs::rename(src, dst) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::CrossesDevices => {
            copy_tree(src, dst)?;
            std::fs::remove_dir_all(src)?;
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Err(not_found()),
        Err(e) => Err(e.into()),
    }
}

/// Remove `path` whether it is a directory or a file. Missing is fine.
pub fn remove_if_present(path: &Path) -> io::Result<()> {
    let result = if path.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    };
    match result {
        Err(e) if e.kind() != ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

fn copy_tree(src: &Path, dst: &Path) -> io::Result<()> {
    for entry in WalkDir::new(src) {
        let entry = entry?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(io::Error::other)?;
        let target = dst.join(rel);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::LogCapture;
    use tempfile::TempDir;

    fn setup(dir: &TempDir) -> (std::path::PathBuf, std::path::PathBuf) {
        let src = dir.path().join("src_folder");
        let dst = dir.path().join("dst_folder");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::write(src.join("test.txt"), "This is a test file.").unwrap();
        (src, dst)
    }

    #[tokio::test]
    async fn install_onto_missing_destination() {
        let dir = TempDir::new().unwrap();
        let (src, dst) = setup(&dir);

        let (logs, _guard) = LogCapture::install();
        install(&src, &dst).await.unwrap();

        assert!(!src.exists());
        assert_eq!(
            std::fs::read_to_string(dst.join("test.txt")).unwrap(),
            "This is a test file."
        );
        assert_eq!(
            logs.at("INFO"),
            vec![
                format!("Moving file from {} to {}", src.display(), dst.display()),
                "Move file done".to_string(),
            ]
        );
    }

    #[test]
    fn install_replaces_existing_destination() {
        let dir = TempDir::new().unwrap();
        let (src, dst) = setup(&dir);
        std::fs::create_dir_all(dst.join("nested")).unwrap();
        std::fs::write(dst.join("old.txt"), "stale").unwrap();
        std::fs::write(dst.join("nested/old.json"), "{}").unwrap();

        install_dir(&src, &dst).unwrap();

        let names: Vec<_> = std::fs::read_dir(&dst)
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["test.txt".to_string()]);
    }

    #[test]
    fn second_install_does_not_merge() {
        let dir = TempDir::new().unwrap();
        let (src, dst) = setup(&dir);
        install_dir(&src, &dst).unwrap();

        std::fs::create_dir_all(&src).unwrap();
        std::fs::write(src.join("other.txt"), "second").unwrap();
        install_dir(&src, &dst).unwrap();

        assert!(!dst.join("test.txt").exists());
        assert_eq!(
            std::fs::read_to_string(dst.join("other.txt")).unwrap(),
            "second"
        );
    }

    #[tokio::test]
    async fn missing_source_is_not_found() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("nope");
        let dst = dir.path().join("dst_folder");
        std::fs::create_dir_all(&dst).unwrap();
        std::fs::write(dst.join("keep.txt"), "kept").unwrap();

        let (logs, _guard) = LogCapture::install();
        let err = install(&src, &dst).await.unwrap_err();

        assert!(matches!(err, RefreshError::SourceNotFound { .. }));
        assert_eq!(
            logs.at("ERROR"),
            vec![format!(
                "{} and/or {} does not exist",
                src.display(),
                dst.display()
            )]
        );
        // Nothing to install: the live directory stays untouched.
        assert!(dst.join("keep.txt").exists());
    }

    #[test]
    fn missing_destination_parent_is_not_found() {
        let dir = TempDir::new().unwrap();
        let (src, _) = setup(&dir);
        let dst = dir.path().join("no/parent/dst");

        let err = install_dir(&src, &dst).unwrap_err();
        assert!(matches!(err, RefreshError::SourceNotFound { .. }));
        assert!(src.exists());
    }

    #[test]
    fn copy_tree_mirrors_nested_layout() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("a");
        std::fs::create_dir_all(src.join("json/acteur")).unwrap();
        std::fs::write(src.join("json/acteur/PA1.json"), "1").unwrap();
        let dst = dir.path().join("b");

        copy_tree(&src, &dst).unwrap();
        assert_eq!(
            std::fs::read_to_string(dst.join("json/acteur/PA1.json")).unwrap(),
            "1"
        );
    }

    #[test]
    fn remove_if_present_tolerates_missing() {
        let dir = TempDir::new().unwrap();
        remove_if_present(&dir.path().join("ghost")).unwrap();
    }
}

use std::path::Path;

use tempfile::TempDir;

use crate::dataset::{DatasetPlan, Stage};
use crate::error::{RefreshError, Result};
use crate::transfer::Transfer;

// ---------------------------------------------------------------------------
// Staging
// ---------------------------------------------------------------------------

/// The two scratch directories of one refresh attempt: downloaded archives
/// and extracted trees. Created fresh per attempt, never shared.
#[derive(Debug)]
pub struct Staging {
    download: TempDir,
    extract: TempDir,
}

impl Staging {
    /// Create both directories under `root`, or the system temp dir.
    pub fn create(root: Option<&Path>) -> Result<Self> {
        let make = |prefix: &str| -> std::io::Result<TempDir> {
            let mut builder = tempfile::Builder::new();
            builder.prefix(prefix);
            match root {
                Some(root) => {
                    std::fs::create_dir_all(root)?;
                    builder.tempdir_in(root)
                }
                None => builder.tempdir(),
            }
        };
        Ok(Self {
            download: make("depute-download-").map_err(RefreshError::Staging)?,
            extract: make("depute-extract-").map_err(RefreshError::Staging)?,
        })
    }

    pub fn download_dir(&self) -> &Path {
        self.download.path()
    }

    pub fn extract_dir(&self) -> &Path {
        self.extract.path()
    }

    #[cfg(test)]
    fn paths(&self) -> Vec<std::path::PathBuf> {
        vec![self.download_dir().to_path_buf(), self.extract_dir().to_path_buf()]
    }

    /// Remove both directories. Failures are logged, never returned.
    pub fn cleanup(self) {
        for dir in [self.download, self.extract] {
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                tracing::warn!("Could not remove staging dir {}: {e}", path.display());
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset refresh
// ---------------------------------------------------------------------------

/// Download, extract and install one dataset.
///
/// Stops at the first failing stage. The failure is logged as a triplet
/// (stage, cause, dataset banner) and returned as [`RefreshError::Stage`].
/// Directories installed before the failure are left in place.
pub async fn refresh_dataset(
    transfer: &dyn Transfer,
    plan: &DatasetPlan,
    download_dir: &Path,
    extract_dir: &Path,
) -> Result<()> {
    let result = run_stages(transfer, plan, download_dir, extract_dir).await;
    if let Err(RefreshError::Stage { stage, source, .. }) = &result {
        tracing::error!("Update failed : {stage}");
        tracing::error!("Error : {source}");
        tracing::error!("=== Update {} failed ===", plan.dataset);
    }
    result
}

async fn run_stages(
    transfer: &dyn Transfer,
    plan: &DatasetPlan,
    download_dir: &Path,
    extract_dir: &Path,
) -> Result<()> {
    let dataset = plan.dataset;
    let archive = plan.archive_path(download_dir);
    let extracted = plan.extract_path(extract_dir);

    transfer
        .download(&plan.url, &archive)
        .await
        .map_err(|e| e.at_stage(dataset, Stage::Download))?;

    transfer
        .extract(&archive, &extracted)
        .await
        .map_err(|e| e.at_stage(dataset, Stage::Extract))?;

    for target in &plan.targets {
        transfer
            .install(&extracted.join(&target.sub_path), &target.final_dir)
            .await
            .map_err(|e| e.at_stage(dataset, Stage::Install))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RefreshConfig;
    use std::path::PathBuf;
    use crate::dataset::Dataset;
    use crate::testing::{Call, LogCapture, StubTransfer};

    fn tmp() -> PathBuf {
        PathBuf::from("/tmp_dir")
    }

    #[tokio::test]
    async fn votes_runs_all_three_stages() {
        let config = RefreshConfig::default();
        let plan = DatasetPlan::votes(&config);
        let stub = StubTransfer::default();

        let (logs, _guard) = LogCapture::install();
        refresh_dataset(&stub, &plan, &tmp(), &tmp()).await.unwrap();

        assert_eq!(
            stub.calls(),
            vec![
                Call::Download(config.votes_url.clone(), tmp().join("data_scrutins.zip")),
                Call::Extract(tmp().join("data_scrutins.zip"), tmp().join("scrutins")),
                Call::Install(tmp().join("scrutins/json"), config.votes_dir.clone()),
            ]
        );
        assert!(logs.lines().is_empty());
    }

    #[tokio::test]
    async fn actors_install_both_sub_trees() {
        let config = RefreshConfig::default();
        let plan = DatasetPlan::actors_and_groups(&config);
        let stub = StubTransfer::default();

        refresh_dataset(&stub, &plan, &tmp(), &tmp()).await.unwrap();

        let calls = stub.calls();
        assert_eq!(
            calls[0],
            Call::Download(
                config.actors_groups_url.clone(),
                tmp().join("data_acteur_organe.zip")
            )
        );
        assert_eq!(
            &calls[2..],
            &[
                Call::Install(tmp().join("acteur_organe/json/acteur"), config.actors_dir.clone()),
                Call::Install(tmp().join("acteur_organe/json/organe"), config.groups_dir.clone()),
            ]
        );
    }

    #[tokio::test]
    async fn download_failure_skips_remaining_stages() {
        let plan = DatasetPlan::votes(&RefreshConfig::default());
        let stub = StubTransfer::failing(Stage::Download, 0);

        let (logs, _guard) = LogCapture::install();
        let err = refresh_dataset(&stub, &plan, &tmp(), &tmp())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            RefreshError::Stage {
                dataset: Dataset::Votes,
                stage: Stage::Download,
                ..
            }
        ));
        assert_eq!(stub.calls().len(), 1);
        assert_eq!(
            logs.at("ERROR"),
            vec![
                "Update failed : download failed".to_string(),
                "Error : download failed (stub)".to_string(),
                "=== Update scrutins failed ===".to_string(),
            ]
        );
        assert!(logs.at("INFO").is_empty());
    }

    #[tokio::test]
    async fn extract_failure_skips_install() {
        let plan = DatasetPlan::votes(&RefreshConfig::default());
        let stub = StubTransfer::failing(Stage::Extract, 0);

        let (logs, _guard) = LogCapture::install();
        let err = refresh_dataset(&stub, &plan, &tmp(), &tmp())
            .await
            .unwrap_err();

        assert!(matches!(err, RefreshError::Stage { stage: Stage::Extract, .. }));
        assert!(!stub.calls().iter().any(|c| matches!(c, Call::Install(..))));
        assert_eq!(logs.at("ERROR")[0], "Update failed : unzipping failed");
    }

    #[tokio::test]
    async fn install_failure_keeps_earlier_installs() {
        let config = RefreshConfig::default();
        let plan = DatasetPlan::actors_and_groups(&config);
        let stub = StubTransfer::failing(Stage::Install, 1);

        let (logs, _guard) = LogCapture::install();
        let err = refresh_dataset(&stub, &plan, &tmp(), &tmp())
            .await
            .unwrap_err();

        assert!(matches!(err, RefreshError::Stage { stage: Stage::Install, .. }));
        let installs: Vec<_> = stub
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Install(..)))
            .collect();
        assert_eq!(installs.len(), 2);
        assert_eq!(
            logs.at("ERROR"),
            vec![
                "Update failed : moving folder failed".to_string(),
                "Error : moving folder failed (stub)".to_string(),
                "=== Update acteur and organe failed ===".to_string(),
            ]
        );
    }

    #[test]
    fn staging_dirs_are_removed_on_cleanup() {
        let root = tempfile::TempDir::new().unwrap();
        let staging = Staging::create(Some(root.path())).unwrap();
        let paths = staging.paths();
        std::fs::write(staging.download_dir().join("a.zip"), "x").unwrap();
        assert!(paths.iter().all(|p| p.is_dir() && p.starts_with(root.path())));

        staging.cleanup();
        assert!(paths.iter().all(|p| !p.exists()));
    }

    #[test]
    fn staging_root_is_created_when_missing() {
        let root = tempfile::TempDir::new().unwrap();
        let nested = root.path().join("staging/area");
        let staging = Staging::create(Some(&nested)).unwrap();
        assert!(staging.download_dir().starts_with(&nested));
        staging.cleanup();
    }
}

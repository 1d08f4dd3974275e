use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::RefreshConfig;

// ---------------------------------------------------------------------------
// Dataset / Stage
// ---------------------------------------------------------------------------

/// An independently refreshable collection of records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dataset {
    /// Scrutins.
    Votes,
    /// Acteurs and their organes, shipped in a single archive.
    ActorsAndGroups,
}

impl Dataset {
    /// File name of the downloaded archive inside the download staging dir.
    pub fn archive_file_name(self) -> &'static str {
        match self {
            Dataset::Votes => "data_scrutins.zip",
            Dataset::ActorsAndGroups => "data_acteur_organe.zip",
        }
    }

    /// Directory name the archive is extracted to inside the extraction staging dir.
    pub fn extract_dir_name(self) -> &'static str {
        match self {
            Dataset::Votes => "scrutins",
            Dataset::ActorsAndGroups => "acteur_organe",
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dataset::Votes => write!(f, "scrutins"),
            Dataset::ActorsAndGroups => write!(f, "acteur and organe"),
        }
    }
}

/// One step of a dataset refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Download,
    Extract,
    Install,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Download => write!(f, "download failed"),
            Stage::Extract => write!(f, "unzipping failed"),
            Stage::Install => write!(f, "moving folder failed"),
        }
    }
}

// ---------------------------------------------------------------------------
// DatasetPlan
// ---------------------------------------------------------------------------

/// A sub-tree of the extracted archive and the final directory it replaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallTarget {
    /// Path relative to the extraction directory of the dataset.
    pub sub_path: PathBuf,
    pub final_dir: PathBuf,
}

/// Everything the refresh routine needs to know about one dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetPlan {
    pub dataset: Dataset,
    pub url: String,
    pub targets: Vec<InstallTarget>,
}

impl DatasetPlan {
    pub fn votes(config: &RefreshConfig) -> Self {
        Self {
            dataset: Dataset::Votes,
            url: config.votes_url.clone(),
            targets: vec![InstallTarget {
                sub_path: PathBuf::from("json"),
                final_dir: config.votes_dir.clone(),
            }],
        }
    }

    pub fn actors_and_groups(config: &RefreshConfig) -> Self {
        Self {
            dataset: Dataset::ActorsAndGroups,
            url: config.actors_groups_url.clone(),
            targets: vec![
                InstallTarget {
                    sub_path: Path::new("json").join("acteur"),
                    final_dir: config.actors_dir.clone(),
                },
                InstallTarget {
                    sub_path: Path::new("json").join("organe"),
                    final_dir: config.groups_dir.clone(),
                },
            ],
        }
    }

    /// Where the archive lands inside `download_dir`.
    pub fn archive_path(&self, download_dir: &Path) -> PathBuf {
        download_dir.join(self.dataset.archive_file_name())
    }

    /// Where the archive is extracted inside `extract_dir`.
    pub fn extract_path(&self, extract_dir: &Path) -> PathBuf {
        extract_dir.join(self.dataset.extract_dir_name())
    }
}

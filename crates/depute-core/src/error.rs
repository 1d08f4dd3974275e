use std::path::PathBuf;

use thiserror::Error;

use crate::dataset::{Dataset, Stage};

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("connection error from {url}: {source}")]
    Connection {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("could not build http client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("invalid response from {url}: {status}")]
    BadResponse { url: String, status: u16 },

    #[error("invalid path {path}: {source}")]
    InvalidPath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("archive not found: {0}")]
    ArchiveNotFound(PathBuf),

    #[error("{path} is not a correct zip file: {reason}")]
    BadArchive { path: PathBuf, reason: String },

    #[error("{src} and/or {dst} does not exist")]
    SourceNotFound { src: PathBuf, dst: PathBuf },

    #[error("invalid hour format '{0}': expected HH:MM:SS")]
    InvalidScheduleTime(String),

    #[error("invalid value '{value}' for {key}")]
    InvalidConfig { key: String, value: String },

    #[error("{dataset}: {stage}: {source}")]
    Stage {
        dataset: Dataset,
        stage: Stage,
        #[source]
        source: Box<RefreshError>,
    },

    #[error("could not create staging directory: {0}")]
    Staging(#[source] std::io::Error),

    #[error("background task failed: {0}")]
    TaskJoin(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RefreshError {
    /// Wrap a primitive failure with the dataset and stage it interrupted.
    pub fn at_stage(self, dataset: Dataset, stage: Stage) -> Self {
        RefreshError::Stage {
            dataset,
            stage,
            source: Box::new(self),
        }
    }
}

pub type Result<T> = std::result::Result<T, RefreshError>;

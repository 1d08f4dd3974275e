use crate::error::{RefreshError, Result};
use crate::schedule::DailyTime;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_VOTES_URL: &str =
    "https://data.assemblee-nationale.fr/static/openData/repository/17/loi/scrutins/Scrutins.json.zip";
pub const DEFAULT_ACTORS_GROUPS_URL: &str = "https://data.assemblee-nationale.fr/static/openData/repository/17/amo/deputes_actifs_mandats_actifs_organes/AMO10_deputes_actifs_mandats_actifs_organes.json.zip";
pub const DEFAULT_UPDATE_HOUR: &str = "08:00:00";

const SECRET_PLACEHOLDER: &str = "***secret***";

// ---------------------------------------------------------------------------
// RefreshConfig
// ---------------------------------------------------------------------------

/// Settings of the refresh pipeline and its trigger surfaces.
///
/// Immutable once the process has started; every component receives the
/// pieces it needs at construction time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshConfig {
    pub votes_url: String,
    pub actors_groups_url: String,
    /// Daily refresh time, `HH:MM:SS`. Kept raw: the scheduler parses it on
    /// every iteration.
    pub update_hour: String,
    pub update_at_launch: bool,
    /// Seconds between two download progress lines, `0` disables them.
    pub progress_interval_secs: u64,
    /// Whether scheduled refreshes include the actors/groups dataset.
    pub scheduled_actors: bool,
    pub votes_dir: PathBuf,
    pub actors_dir: PathBuf,
    pub groups_dir: PathBuf,
    /// Parent of the per-attempt staging dirs. `None` uses the system temp dir.
    #[serde(default)]
    pub staging_dir: Option<PathBuf>,
    pub connect_timeout_secs: u64,
    pub tcp_host: String,
    pub tcp_port: u16,
    /// Shared secret of the trigger surfaces. `None` disables them.
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub http_port: Option<u16>,
    pub log_level: String,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            votes_url: DEFAULT_VOTES_URL.to_string(),
            actors_groups_url: DEFAULT_ACTORS_GROUPS_URL.to_string(),
            update_hour: DEFAULT_UPDATE_HOUR.to_string(),
            update_at_launch: true,
            progress_interval_secs: 2,
            scheduled_actors: true,
            votes_dir: PathBuf::from("data/scrutins"),
            actors_dir: PathBuf::from("data/acteur"),
            groups_dir: PathBuf::from("data/organe"),
            staging_dir: None,
            connect_timeout_secs: 10,
            tcp_host: "127.0.0.1".to_string(),
            tcp_port: 8765,
            token: None,
            http_port: None,
            log_level: "INFO".to_string(),
        }
    }
}

impl RefreshConfig {
    /// Build the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// Missing and empty values fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(v) = get("UPDATE_URL_DOWNLOAD_SCRUTINS") {
            config.votes_url = v;
        }
        if let Some(v) = get("UPDATE_URL_DOWNLOAD_ACTEUR_ORGANE") {
            config.actors_groups_url = v;
        }
        if let Some(v) = get("UPDATE_HOUR") {
            config.update_hour = v;
        }
        if let Some(v) = get("UPDATE_AT_LAUNCH") {
            config.update_at_launch = parse_flag(&v);
        }
        if let Some(v) = get("UPDATE_DOWNLOAD_PROGRESS_SECOND") {
            config.progress_interval_secs = parse_number("UPDATE_DOWNLOAD_PROGRESS_SECOND", &v)?;
        }
        if let Some(v) = get("UPDATE_SCHEDULED_ACTEUR_ORGANE") {
            config.scheduled_actors = parse_flag(&v);
        }
        if let Some(v) = get("SCRUTINS_FOLDER") {
            config.votes_dir = PathBuf::from(v);
        }
        if let Some(v) = get("ACTEUR_FOLDER") {
            config.actors_dir = PathBuf::from(v);
        }
        if let Some(v) = get("ORGANE_FOLDER") {
            config.groups_dir = PathBuf::from(v);
        }
        if let Some(v) = get("UPDATE_STAGING_DIR") {
            config.staging_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = get("UPDATE_CONNECT_TIMEOUT_SECOND") {
            config.connect_timeout_secs = parse_number("UPDATE_CONNECT_TIMEOUT_SECOND", &v)?;
        }
        if let Some(v) = get("TCP_SERVER_HOST") {
            config.tcp_host = v;
        }
        if let Some(v) = get("TCP_SERVER_PORT") {
            config.tcp_port = parse_number("TCP_SERVER_PORT", &v)?;
        }
        config.token = get("TCP_TOKEN");
        if let Some(v) = get("HTTP_SERVER_PORT") {
            config.http_port = Some(parse_number("HTTP_SERVER_PORT", &v)?);
        }
        if let Some(v) = get("LOG_LEVEL") {
            config.log_level = v.to_uppercase();
        }

        Ok(config)
    }

    /// `None` when progress lines are disabled.
    pub fn progress_interval(&self) -> Option<Duration> {
        match self.progress_interval_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Parse `update_hour`, failing on anything but strict `HH:MM:SS`.
    pub fn daily_time(&self) -> Result<DailyTime> {
        self.update_hour.parse()
    }

    /// A copy safe to print or log: the token is masked.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.token.is_some() {
            copy.token = Some(SECRET_PLACEHOLDER.to_string());
        }
        copy
    }

    /// Log every setting at debug level, secrets masked.
    pub fn log_summary(&self) {
        let shown = self.redacted();
        tracing::debug!("UPDATE_URL_DOWNLOAD_SCRUTINS : {}", shown.votes_url);
        tracing::debug!("UPDATE_URL_DOWNLOAD_ACTEUR_ORGANE : {}", shown.actors_groups_url);
        tracing::debug!("UPDATE_HOUR : {}", shown.update_hour);
        tracing::debug!("UPDATE_AT_LAUNCH : {}", shown.update_at_launch);
        tracing::debug!("UPDATE_DOWNLOAD_PROGRESS_SECOND : {}", shown.progress_interval_secs);
        tracing::debug!("UPDATE_SCHEDULED_ACTEUR_ORGANE : {}", shown.scheduled_actors);
        tracing::debug!("SCRUTINS_FOLDER : {}", shown.votes_dir.display());
        tracing::debug!("ACTEUR_FOLDER : {}", shown.actors_dir.display());
        tracing::debug!("ORGANE_FOLDER : {}", shown.groups_dir.display());
        tracing::debug!("UPDATE_STAGING_DIR : {:?}", shown.staging_dir);
        tracing::debug!("UPDATE_CONNECT_TIMEOUT_SECOND : {}", shown.connect_timeout_secs);
        tracing::debug!("TCP_SERVER_HOST : {}", shown.tcp_host);
        tracing::debug!("TCP_SERVER_PORT : {}", shown.tcp_port);
        tracing::debug!("TCP_TOKEN : {:?}", shown.token);
        tracing::debug!("HTTP_SERVER_PORT : {:?}", shown.http_port);
        tracing::debug!("LOG_LEVEL : {}", shown.log_level);
    }
}

/// Boolean-like strings: `TRUE`, `T` and `1` (any case) are true, anything else false.
pub fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_uppercase().as_str(), "TRUE" | "1" | "T")
}

fn parse_number<N: std::str::FromStr>(key: &str, value: &str) -> Result<N> {
    value
        .trim()
        .parse()
        .map_err(|_| RefreshError::InvalidConfig {
            key: key.to_string(),
            value: value.to_string(),
        })
}

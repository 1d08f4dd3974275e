pub mod cmd;
pub mod output;

use clap::{Args, Parser, Subcommand};
use depute_core::RefreshConfig;
use tracing::Level;

#[derive(Parser)]
#[command(
    name = "mydepute",
    about = "Keep the deputies and votes open-data snapshots fresh",
    version,
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the daily scheduler and the refresh triggers until Ctrl-C
    Run,

    /// Run one refresh attempt now
    Refresh {
        /// Only refresh the votes dataset
        #[arg(long)]
        skip_actors: bool,
    },

    /// Show when the next scheduled refresh happens
    Next,

    /// Show the effective configuration (token masked)
    Config,
}

impl Commands {
    /// Commands that drive refreshes log at the configured level; the
    /// read-only ones stay quiet.
    pub fn is_service(&self) -> bool {
        matches!(self, Commands::Run | Commands::Refresh { .. })
    }
}

/// Every setting can come from a flag or from its environment variable.
/// Values are handed raw to [`RefreshConfig::from_lookup`], which owns
/// defaults and validation.
#[derive(Args, Debug, Default, Clone)]
pub struct ConfigArgs {
    /// Votes archive URL
    #[arg(long, global = true, env = "UPDATE_URL_DOWNLOAD_SCRUTINS")]
    pub votes_url: Option<String>,

    /// Actors and groups archive URL
    #[arg(long, global = true, env = "UPDATE_URL_DOWNLOAD_ACTEUR_ORGANE")]
    pub actors_url: Option<String>,

    /// Daily refresh time, HH:MM:SS
    #[arg(long, global = true, env = "UPDATE_HOUR")]
    pub update_hour: Option<String>,

    /// Refresh once at startup (TRUE/FALSE)
    #[arg(long, global = true, env = "UPDATE_AT_LAUNCH")]
    pub update_at_launch: Option<String>,

    /// Seconds between download progress lines, 0 to disable
    #[arg(long, global = true, env = "UPDATE_DOWNLOAD_PROGRESS_SECOND")]
    pub progress_interval: Option<String>,

    /// Scheduled refreshes include actors and groups (TRUE/FALSE)
    #[arg(long, global = true, env = "UPDATE_SCHEDULED_ACTEUR_ORGANE")]
    pub scheduled_actors: Option<String>,

    /// Live votes directory
    #[arg(long, global = true, env = "SCRUTINS_FOLDER")]
    pub votes_dir: Option<String>,

    /// Live actors directory
    #[arg(long, global = true, env = "ACTEUR_FOLDER")]
    pub actors_dir: Option<String>,

    /// Live groups directory
    #[arg(long, global = true, env = "ORGANE_FOLDER")]
    pub groups_dir: Option<String>,

    /// Parent of the per-attempt staging directories
    #[arg(long, global = true, env = "UPDATE_STAGING_DIR")]
    pub staging_dir: Option<String>,

    /// HTTP connect timeout in seconds
    #[arg(long, global = true, env = "UPDATE_CONNECT_TIMEOUT_SECOND")]
    pub connect_timeout: Option<String>,

    /// Bind address of the trigger listeners
    #[arg(long, global = true, env = "TCP_SERVER_HOST")]
    pub tcp_host: Option<String>,

    /// Port of the line-based trigger
    #[arg(long, global = true, env = "TCP_SERVER_PORT")]
    pub tcp_port: Option<String>,

    /// Shared secret of the triggers; unset disables them
    #[arg(long, global = true, env = "TCP_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Port of the HTTP API; unset disables it
    #[arg(long, global = true, env = "HTTP_SERVER_PORT")]
    pub http_port: Option<String>,

    /// DEBUG, INFO, WARNING, ERROR or CRITICAL
    #[arg(long, global = true, env = "LOG_LEVEL")]
    pub log_level: Option<String>,
}

impl ConfigArgs {
    fn get(&self, key: &str) -> Option<String> {
        let value = match key {
            "UPDATE_URL_DOWNLOAD_SCRUTINS" => &self.votes_url,
            "UPDATE_URL_DOWNLOAD_ACTEUR_ORGANE" => &self.actors_url,
            "UPDATE_HOUR" => &self.update_hour,
            "UPDATE_AT_LAUNCH" => &self.update_at_launch,
            "UPDATE_DOWNLOAD_PROGRESS_SECOND" => &self.progress_interval,
            "UPDATE_SCHEDULED_ACTEUR_ORGANE" => &self.scheduled_actors,
            "SCRUTINS_FOLDER" => &self.votes_dir,
            "ACTEUR_FOLDER" => &self.actors_dir,
            "ORGANE_FOLDER" => &self.groups_dir,
            "UPDATE_STAGING_DIR" => &self.staging_dir,
            "UPDATE_CONNECT_TIMEOUT_SECOND" => &self.connect_timeout,
            "TCP_SERVER_HOST" => &self.tcp_host,
            "TCP_SERVER_PORT" => &self.tcp_port,
            "TCP_TOKEN" => &self.token,
            "HTTP_SERVER_PORT" => &self.http_port,
            "LOG_LEVEL" => &self.log_level,
            _ => return None,
        };
        value.clone()
    }

    pub fn resolve(&self) -> depute_core::Result<RefreshConfig> {
        RefreshConfig::from_lookup(|key| self.get(key))
    }
}

/// Map a `LOG_LEVEL` value to a tracing level. Unknown names fall back to INFO.
pub fn parse_level(value: &str) -> Level {
    match value.trim().to_uppercase().as_str() {
        "TRACE" => Level::TRACE,
        "DEBUG" => Level::DEBUG,
        "WARN" | "WARNING" => Level::WARN,
        "ERROR" | "CRITICAL" | "FATAL" => Level::ERROR,
        _ => Level::INFO,
    }
}

use anyhow::Result;
use depute_core::RefreshConfig;

use crate::output::{print_json, print_pairs};

pub fn run(config: &RefreshConfig, json: bool) -> Result<()> {
    let shown = config.redacted();
    if json {
        return print_json(&shown);
    }

    let unset = || "-".to_string();
    print_pairs(&[
        ("UPDATE_URL_DOWNLOAD_SCRUTINS", shown.votes_url.clone()),
        ("UPDATE_URL_DOWNLOAD_ACTEUR_ORGANE", shown.actors_groups_url.clone()),
        ("UPDATE_HOUR", shown.update_hour.clone()),
        ("UPDATE_AT_LAUNCH", shown.update_at_launch.to_string()),
        ("UPDATE_DOWNLOAD_PROGRESS_SECOND", shown.progress_interval_secs.to_string()),
        ("UPDATE_SCHEDULED_ACTEUR_ORGANE", shown.scheduled_actors.to_string()),
        ("SCRUTINS_FOLDER", shown.votes_dir.display().to_string()),
        ("ACTEUR_FOLDER", shown.actors_dir.display().to_string()),
        ("ORGANE_FOLDER", shown.groups_dir.display().to_string()),
        (
            "UPDATE_STAGING_DIR",
            shown
                .staging_dir
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(unset),
        ),
        ("UPDATE_CONNECT_TIMEOUT_SECOND", shown.connect_timeout_secs.to_string()),
        ("TCP_SERVER_HOST", shown.tcp_host.clone()),
        ("TCP_SERVER_PORT", shown.tcp_port.to_string()),
        ("TCP_TOKEN", shown.token.clone().unwrap_or_else(unset)),
        (
            "HTTP_SERVER_PORT",
            shown.http_port.map(|p| p.to_string()).unwrap_or_else(unset),
        ),
        ("LOG_LEVEL", shown.log_level.clone()),
    ]);
    Ok(())
}

use anyhow::Result;
use chrono::Local;
use depute_core::schedule::compute_time_for_update;
use depute_core::RefreshConfig;

use crate::output::print_json;

pub fn run(config: &RefreshConfig, json: bool) -> Result<()> {
    let (next, delay) = compute_time_for_update(&config.update_hour, Local::now().naive_local())?;
    let next = next.format("%Y-%m-%d %H:%M:%S").to_string();

    if json {
        return print_json(&serde_json::json!({
            "next": next,
            "in_seconds": delay.as_secs(),
        }));
    }

    let secs = delay.as_secs();
    println!(
        "Next update at {next} (in {}h{:02}m{:02}s)",
        secs / 3600,
        secs % 3600 / 60,
        secs % 60
    );
    Ok(())
}

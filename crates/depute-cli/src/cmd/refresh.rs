use anyhow::{bail, Context, Result};
use depute_core::{RefreshConfig, RefreshCoordinator, RefreshOutcome};

use crate::output::print_json;

pub fn run(config: &RefreshConfig, skip_actors: bool, json: bool) -> Result<()> {
    let rt = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    let outcome = rt.block_on(async {
        let coordinator = RefreshCoordinator::from_config(config)?;
        anyhow::Ok(coordinator.refresh(!skip_actors).await)
    })?;

    if json {
        print_json(&outcome)?;
    }
    match outcome {
        RefreshOutcome::Success => {
            if !json {
                println!("Update success");
            }
            Ok(())
        }
        RefreshOutcome::Failed { reason } => bail!("update failed: {reason}"),
    }
}

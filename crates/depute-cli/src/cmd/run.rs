use std::sync::Arc;

use anyhow::{Context, Result};
use depute_core::schedule::Scheduler;
use depute_core::{RefreshConfig, RefreshCoordinator};
use depute_server::AppState;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Run the scheduler and the configured triggers until Ctrl-C or until the
/// scheduler gives up.
pub fn run(config: &RefreshConfig) -> Result<()> {
    let rt = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    rt.block_on(serve(config))
}

async fn serve(config: &RefreshConfig) -> Result<()> {
    config.log_summary();
    // Fail before the launch refresh rather than after it.
    config
        .daily_time()
        .context("Invalid hour format given for updates. Expected '%H:%M:%S' format.")?;

    let coordinator = Arc::new(RefreshCoordinator::from_config(config)?);
    let scheduler = Scheduler::new(coordinator.clone(), config);
    let at_launch = config.update_at_launch;
    // Own task, so leaving the select below never cuts an attempt short.
    let mut planning = tokio::spawn(async move { scheduler.start_planning(at_launch).await });

    let line_trigger = async {
        let Some(token) = config.token.as_deref() else {
            tracing::warn!("TCP_TOKEN is not set, update server disabled");
            return std::future::pending::<Result<()>>().await;
        };
        let listener = TcpListener::bind((config.tcp_host.as_str(), config.tcp_port))
            .await
            .with_context(|| format!("cannot bind {}:{}", config.tcp_host, config.tcp_port))?;
        depute_server::serve_trigger(listener, coordinator.clone(), Arc::from(token)).await?;
        Ok(())
    };

    let http_api = async {
        let Some(port) = config.http_port else {
            return std::future::pending::<Result<()>>().await;
        };
        let listener = TcpListener::bind((config.tcp_host.as_str(), port))
            .await
            .with_context(|| format!("cannot bind {}:{port}", config.tcp_host))?;
        depute_server::serve_on(AppState::new(coordinator.clone(), config), listener).await
    };

    tokio::select! {
        joined = &mut planning => {
            joined.context("scheduler task failed")?.context("scheduler stopped")?;
        }
        result = line_trigger => result.context("update server stopped")?,
        result = http_api => result.context("HTTP API stopped")?,
        signal = tokio::signal::ctrl_c() => {
            signal.context("cannot listen for Ctrl-C")?;
            tracing::info!("Shutting down");
        }
    }
    finish_in_flight(&coordinator, planning).await;
    Ok(())
}

/// Let the attempt in flight, if any, run to completion, then stop planning.
async fn finish_in_flight(
    coordinator: &RefreshCoordinator,
    planning: JoinHandle<depute_core::Result<()>>,
) {
    if coordinator.is_refreshing() {
        tracing::info!("Waiting for the update in progress to finish");
    }
    coordinator.wait_idle().await;
    planning.abort();
}

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, Mutex};

use crate::config::RefreshConfig;
use crate::dataset::DatasetPlan;
use crate::error::Result;
use crate::routine::{refresh_dataset, Staging};
use crate::transfer::{HttpTransfer, Transfer};

// ---------------------------------------------------------------------------
// Outcome / report
// ---------------------------------------------------------------------------

/// Terminal result of one refresh attempt. Failures are values, not errors:
/// callers of [`Refresh::refresh`] never see a propagated error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RefreshOutcome {
    Success,
    Failed { reason: String },
}

impl RefreshOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RefreshOutcome::Success)
    }
}

/// What downstream consumers (notifications, status endpoints) learn about
/// an attempt once it is over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub secondary_requested: bool,
    pub outcome: RefreshOutcome,
}

/// Anything that can run a refresh attempt. The scheduler and the trigger
/// surfaces only depend on this.
#[async_trait]
pub trait Refresh: Send + Sync {
    async fn refresh(&self, run_secondary: bool) -> RefreshOutcome;
}

// ---------------------------------------------------------------------------
// RefreshCoordinator
// ---------------------------------------------------------------------------

/// Owner of the refresh gate and the "currently refreshing" flag.
///
/// Share it as `Arc<RefreshCoordinator>`. Only [`refresh`](Self::refresh)
/// acquires the gate or flips the flag; everyone else reads
/// [`is_refreshing`](Self::is_refreshing), which never blocks.
pub struct RefreshCoordinator {
    gate: Mutex<()>,
    refreshing: AtomicBool,
    transfer: Arc<dyn Transfer>,
    votes: DatasetPlan,
    actors_groups: DatasetPlan,
    staging_root: Option<PathBuf>,
    events: broadcast::Sender<RefreshReport>,
    last: StdMutex<Option<RefreshReport>>,
}

impl RefreshCoordinator {
    pub fn new(config: &RefreshConfig, transfer: Arc<dyn Transfer>) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            gate: Mutex::new(()),
            refreshing: AtomicBool::new(false),
            transfer,
            votes: DatasetPlan::votes(config),
            actors_groups: DatasetPlan::actors_and_groups(config),
            staging_root: config.staging_dir.clone(),
            events,
            last: StdMutex::new(None),
        }
    }

    /// Coordinator backed by the real HTTP/filesystem primitives.
    pub fn from_config(config: &RefreshConfig) -> Result<Self> {
        let transfer = HttpTransfer::new(config)?;
        Ok(Self::new(config, Arc::new(transfer)))
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing.load(Ordering::SeqCst)
    }

    /// Receive a [`RefreshReport`] after every attempt.
    pub fn subscribe(&self) -> broadcast::Receiver<RefreshReport> {
        self.events.subscribe()
    }

    pub fn last_report(&self) -> Option<RefreshReport> {
        self.last
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Resolve once no attempt holds the gate.
    ///
    /// Used at shutdown so an attempt in flight is not cut short.
    pub async fn wait_idle(&self) {
        let _gate = self.gate.lock().await;
    }

    /// Run one refresh attempt: votes, then actors/groups when requested and
    /// votes succeeded.
    ///
    /// Waits for any attempt in flight, then runs a full attempt of its own.
    pub async fn refresh(&self, run_secondary: bool) -> RefreshOutcome {
        let started_at = Utc::now();
        let outcome = {
            let _gate = self.gate.lock().await;
            let _flag = FlagGuard::raise(&self.refreshing);

            tracing::info!("=== Update starting ===");
            match self.attempt(run_secondary).await {
                Ok(()) => {
                    tracing::info!("=== Update success ===");
                    RefreshOutcome::Success
                }
                Err(e) => {
                    tracing::error!("=== Update failed ===");
                    RefreshOutcome::Failed {
                        reason: e.to_string(),
                    }
                }
            }
        };

        let report = RefreshReport {
            started_at,
            finished_at: Utc::now(),
            secondary_requested: run_secondary,
            outcome: outcome.clone(),
        };
        *self.last.lock().unwrap_or_else(PoisonError::into_inner) = Some(report.clone());
        // No subscriber is fine.
        let _ = self.events.send(report);
        outcome
    }

    async fn attempt(&self, run_secondary: bool) -> Result<()> {
        let staging = match Staging::create(self.staging_root.as_deref()) {
            Ok(staging) => staging,
            Err(e) => {
                tracing::error!("Error : {e}");
                return Err(e);
            }
        };
        let result = self.run_datasets(&staging, run_secondary).await;
        staging.cleanup();
        result
    }

    async fn run_datasets(&self, staging: &Staging, run_secondary: bool) -> Result<()> {
        let (download, extract) = (staging.download_dir(), staging.extract_dir());
        refresh_dataset(self.transfer.as_ref(), &self.votes, download, extract).await?;
        if run_secondary {
            refresh_dataset(self.transfer.as_ref(), &self.actors_groups, download, extract)
                .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Refresh for RefreshCoordinator {
    async fn refresh(&self, run_secondary: bool) -> RefreshOutcome {
        RefreshCoordinator::refresh(self, run_secondary).await
    }
}

/// Sets the flag on creation and clears it on drop, so the flag is lowered on
/// every exit path, cancellation included.
struct FlagGuard<'a>(&'a AtomicBool);

impl<'a> FlagGuard<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for FlagGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

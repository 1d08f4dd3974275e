pub mod config;
pub mod coordinator;
pub mod dataset;
pub mod error;
pub mod progress;
pub mod routine;
pub mod schedule;
pub mod transfer;

#[cfg(test)]
mod testing;

pub use config::RefreshConfig;
pub use coordinator::{Refresh, RefreshCoordinator, RefreshOutcome, RefreshReport};
pub use error::{RefreshError, Result};

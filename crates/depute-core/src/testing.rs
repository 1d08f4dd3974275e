//! Test doubles: log capture and a recording [`Transfer`].
//!
//! [`LogCapture`] installs a thread-local `fmt` subscriber writing into a shared buffer.
//! `#[tokio::test]` runs on a current-thread runtime, so spawned tasks log
//! into the same buffer; `spawn_blocking` closures do not.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;

use crate::dataset::Stage;
use crate::error::{RefreshError, Result};
use crate::transfer::Transfer;

#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    pub fn install() -> (Self, DefaultGuard) {
        let capture = Self::default();
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::new("depute_core=debug"))
            .with_writer(capture.clone())
            .with_ansi(false)
            .with_target(false)
            .without_time()
            .finish();
        let guard = tracing::subscriber::set_default(subscriber);
        (capture, guard)
    }

    pub fn lines(&self) -> Vec<String> {
        let buf = self.0.lock().unwrap();
        String::from_utf8_lossy(&buf)
            .lines()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect()
    }

    /// Messages logged at `level` ("INFO", "ERROR", ...), level prefix stripped.
    pub fn at(&self, level: &str) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter_map(|l| {
                l.strip_prefix(level)
                    .map(|rest| rest.trim_start().to_string())
            })
            .collect()
    }

    pub fn count(&self, level: &str, message: &str) -> usize {
        self.at(level).iter().filter(|m| *m == message).count()
    }
}

pub struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

impl io::Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = CaptureWriter;

    fn make_writer(&'a self) -> Self::Writer {
        CaptureWriter(self.0.clone())
    }
}

// ---------------------------------------------------------------------------
// StubTransfer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Download(String, PathBuf),
    Extract(PathBuf, PathBuf),
    Install(PathBuf, PathBuf),
}

/// Records every primitive call, writes a placeholder archive into the
/// download dir, and fails on request.
#[derive(Default)]
pub struct StubTransfer {
    calls: Mutex<Vec<Call>>,
    /// Fail the n-th (0-based) call of this stage.
    failure: Option<(Stage, usize)>,
    delay: Option<Duration>,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl StubTransfer {
    pub fn failing(stage: Stage, nth: usize) -> Self {
        Self {
            failure: Some((stage, nth)),
            ..Default::default()
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Highest number of downloads observed in flight at once.
    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    fn record(&self, stage: Stage, call: Call) -> Result<()> {
        let mut calls = self.calls.lock().unwrap();
        let seen = calls
            .iter()
            .filter(|c| stage_of(c) == stage)
            .count();
        calls.push(call);
        match self.failure {
            Some((s, nth)) if s == stage && nth == seen => Err(RefreshError::Io(
                std::io::Error::other(format!("{stage} (stub)")),
            )),
            _ => Ok(()),
        }
    }
}

fn stage_of(call: &Call) -> Stage {
    match call {
        Call::Download(..) => Stage::Download,
        Call::Extract(..) => Stage::Extract,
        Call::Install(..) => Stage::Install,
    }
}

#[async_trait]
impl Transfer for StubTransfer {
    async fn download(&self, url: &str, dest: &Path) -> Result<()> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.active.fetch_sub(1, Ordering::SeqCst);
        self.record(
            Stage::Download,
            Call::Download(url.to_string(), dest.to_path_buf()),
        )?;
        let _ = std::fs::write(dest, b"stub");
        Ok(())
    }

    async fn extract(&self, archive: &Path, dest: &Path) -> Result<()> {
        self.record(
            Stage::Extract,
            Call::Extract(archive.to_path_buf(), dest.to_path_buf()),
        )
    }

    async fn install(&self, src: &Path, dest: &Path) -> Result<()> {
        self.record(
            Stage::Install,
            Call::Install(src.to_path_buf(), dest.to_path_buf()),
        )
    }
}

use std::time::{Duration, Instant};

const MIB: f64 = 1024.0 * 1024.0;

/// Throttled download progress lines.
///
/// The first chunk is always reported, then at most one line per `interval`.
/// A `None` interval keeps the reporter silent.
#[derive(Debug)]
pub struct ProgressLog {
    name: String,
    total: Option<u64>,
    interval: Option<Duration>,
    written: u64,
    last_shown: Option<Instant>,
}

impl ProgressLog {
    pub fn new(url: &str, total: Option<u64>, interval: Option<Duration>) -> Self {
        Self {
            name: file_name_of(url).to_string(),
            total,
            interval,
            written: 0,
            last_shown: None,
        }
    }

    /// Account for `len` freshly written bytes; returns true if a line was logged.
    pub fn advance(&mut self, len: usize) -> bool {
        self.advance_at(len, Instant::now())
    }

    fn advance_at(&mut self, len: usize, now: Instant) -> bool {
        self.written += len as u64;
        let Some(interval) = self.interval else {
            return false;
        };
        let due = match self.last_shown {
            None => true,
            Some(last) => now.duration_since(last) > interval,
        };
        if !due {
            return false;
        }
        self.last_shown = Some(now);
        tracing::info!("Download {} : {}", self.name, self.describe());
        true
    }

    #[cfg(test)]
    fn written(&self) -> u64 {
        self.written
    }

    fn describe(&self) -> String {
        let done = self.written as f64 / MIB;
        match self.total {
            Some(total) => format!("{done:.2} MB / {:.2} MB", total as f64 / MIB),
            None => format!("{done:.2} MB / ??? MB"),
        }
    }
}

fn file_name_of(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.rsplit('/').find(|s| !s.is_empty()).unwrap_or(path)
}

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime, NaiveTime, Timelike};

use crate::config::RefreshConfig;
use crate::coordinator::Refresh;
use crate::error::{RefreshError, Result};

// ---------------------------------------------------------------------------
// DailyTime
// ---------------------------------------------------------------------------

/// A wall-clock time of day, parsed from strict 24-hour `HH:MM:SS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyTime(NaiveTime);

impl DailyTime {
    pub fn time(&self) -> NaiveTime {
        self.0
    }

    /// The first instant strictly after `now` at this time of day.
    pub fn next_after(&self, now: NaiveDateTime) -> NaiveDateTime {
        let candidate = now.date().and_time(self.0);
        if candidate <= now {
            candidate + chrono::Duration::days(1)
        } else {
            candidate
        }
    }
}

impl FromStr for DailyTime {
    type Err = RefreshError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || RefreshError::InvalidScheduleTime(s.to_string());
        let b = s.as_bytes();
        let shaped = b.len() == 8
            && b[2] == b':'
            && b[5] == b':'
            && [0, 1, 3, 4, 6, 7].iter().all(|&i| b[i].is_ascii_digit());
        if !shaped {
            return Err(invalid());
        }
        let time = NaiveTime::parse_from_str(s, "%H:%M:%S").map_err(|_| invalid())?;
        // chrono accepts ":60" as a leap second.
        if time.nanosecond() >= 1_000_000_000 {
            return Err(invalid());
        }
        Ok(Self(time))
    }
}

impl fmt::Display for DailyTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M:%S"))
    }
}

/// Next refresh instant after `now` and the delay until it.
pub fn compute_time_for_update(update_hour: &str, now: NaiveDateTime) -> Result<(NaiveDateTime, Duration)> {
    let at: DailyTime = update_hour.parse()?;
    let target = at.next_after(now);
    let delay = (target - now).to_std().unwrap_or(Duration::ZERO);
    Ok((target, delay))
}

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Source of "now" and of timed suspension for the scheduler.
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
    async fn sleep(&self, duration: Duration);
}

/// Local wall clock and tokio timers.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Drives daily refreshes at the configured time of day.
pub struct Scheduler<R: ?Sized, C = SystemClock> {
    refresher: Arc<R>,
    update_hour: String,
    run_secondary: bool,
    clock: C,
}

impl<R: Refresh + ?Sized> Scheduler<R, SystemClock> {
    pub fn new(refresher: Arc<R>, config: &RefreshConfig) -> Self {
        Self {
            refresher,
            update_hour: config.update_hour.clone(),
            run_secondary: config.scheduled_actors,
            clock: SystemClock,
        }
    }
}

impl<R: Refresh + ?Sized, C: Clock> Scheduler<R, C> {
    pub fn with_clock<C2: Clock>(self, clock: C2) -> Scheduler<R, C2> {
        Scheduler {
            refresher: self.refresher,
            update_hour: self.update_hour,
            run_secondary: self.run_secondary,
            clock,
        }
    }

    /// Next target instant and delay, measured from the clock's "now".
    pub fn next_slot(&self) -> Result<(NaiveDateTime, Duration)> {
        compute_time_for_update(&self.update_hour, self.clock.now())
    }

    /// Refresh at launch if asked, then every day at the configured time.
    ///
    /// Only returns on a malformed time of day.
    pub async fn start_planning(&self, refresh_at_launch: bool) -> Result<()> {
        self.run(refresh_at_launch, None).await
    }

    /// [`start_planning`](Self::start_planning) bounded to `max_iterations`
    /// scheduled refreshes (the launch refresh is not counted).
    pub async fn run(&self, refresh_at_launch: bool, max_iterations: Option<usize>) -> Result<()> {
        if refresh_at_launch {
            tracing::info!("First update...");
            self.refresher.refresh(self.run_secondary).await;
        }

        let mut iterations = 0usize;
        while max_iterations.map_or(true, |max| iterations < max) {
            let (target, delay) = match self.next_slot() {
                Ok(slot) => slot,
                Err(e) => {
                    tracing::error!(
                        "Invalid hour format given for updates. Expected '%H:%M:%S' format."
                    );
                    return Err(e);
                }
            };

            tracing::info!(
                "Update planned at {} in {} seconds.",
                target.format("%Y-%m-%d %H:%M:%S"),
                delay.as_secs_f64()
            );
            self.clock.sleep(delay).await;
            self.refresher.refresh(self.run_secondary).await;
            iterations += 1;
        }
        Ok(())
    }
}

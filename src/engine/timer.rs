// src/engine/timer.rs

use std::time::Duration;

use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};

/// Fixed-interval progress timer with synchronous, idempotent cancellation.
///
/// The first tick fires one full period after start. Once cancelled,
/// [`ProgressTimer::tick`] never completes, so a `select!` arm waiting on it
/// simply goes quiet.
#[derive(Debug)]
pub struct ProgressTimer {
    interval: Option<Interval>,
}

impl ProgressTimer {
    pub fn start(period: Duration) -> Self {
        let period = period.max(Duration::from_millis(1));
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self {
            interval: Some(interval),
        }
    }

    /// Wait for the next tick.
    pub async fn tick(&mut self) {
        match self.interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
            }
            None => std::future::pending::<()>().await,
        }
    }

    pub fn cancel(&mut self) {
        self.interval = None;
    }
}

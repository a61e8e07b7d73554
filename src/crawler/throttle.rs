//! Crawl-wide request rate limiting
//!
//! A single [`Throttle`] is shared by every fetch worker, so the limit bounds
//! the aggregate request rate of the pool rather than each worker.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

/// A ticking permit source
///
/// Permits are issued one per period. The first permit is issued one period
/// after creation, and ticks missed while no worker is waiting are not saved
/// up into a burst.
#[derive(Debug)]
pub struct Throttle {
    ticker: Mutex<Interval>,
    period: Duration,
}

impl Throttle {
    /// Creates a throttle issuing `requests_per_minute` permits per minute
    ///
    /// Returns `None` for a limit of 0, which means unlimited. Must be called
    /// from within a Tokio runtime.
    pub fn per_minute(requests_per_minute: u32) -> Option<Self> {
        if requests_per_minute == 0 {
            return None;
        }

        let period = Duration::from_secs(60) / requests_per_minute;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        Some(Self {
            ticker: Mutex::new(ticker),
            period,
        })
    }

    /// Waits until the next permit is issued
    pub async fn acquire(&self) {
        self.ticker.lock().await.tick().await;
    }

    /// Time between two permits
    pub fn period(&self) -> Duration {
        self.period
    }
}

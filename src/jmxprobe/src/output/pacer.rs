use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crate::constants::SHUTDOWN_POLL_INTERVAL_MS;

static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);

/// Makes `SIGINT` and `SIGTERM` end the watch loop at its next pause
/// instead of killing the process outright.
pub fn install_shutdown_handlers() -> Result<()> {
    ctrlc::set_handler(|| SHUTDOWN_REQUESTED.store(true, Ordering::SeqCst))
        .context("Failed to install the SIGINT/SIGTERM handler")
}

pub fn shutdown_requested() -> bool {
    SHUTDOWN_REQUESTED.load(Ordering::SeqCst)
}

/// Clock and sleep of the watch loop.
#[cfg_attr(test, mockall::automock)]
pub trait Pacer {
    /// Seconds since the epoch.
    fn now(&self) -> i64;

    /// Waits for `interval`. Returns `false` when the run should stop
    /// instead of starting another pass.
    fn pause(&self, interval: Duration) -> bool;
}

pub struct SystemPacer;

impl Pacer for SystemPacer {
    fn now(&self) -> i64 {
        Utc::now().timestamp()
    }

    fn pause(&self, interval: Duration) -> bool {
        sleep_unless(interval, &SHUTDOWN_REQUESTED)
    }
}

/// Sleeps in short slices until `interval` has elapsed or `stop` is set.
/// Measured as elapsed time, so any interval is fine, however long.
fn sleep_unless(interval: Duration, stop: &AtomicBool) -> bool {
    let slice = Duration::from_millis(SHUTDOWN_POLL_INTERVAL_MS);
    let started = Instant::now();
    loop {
        if stop.load(Ordering::SeqCst) {
            return false;
        }
        let elapsed = started.elapsed();
        if elapsed >= interval {
            return true;
        }
        thread::sleep(slice.min(interval - elapsed));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_system_pause_waits_for_the_interval() {
        let started = Instant::now();
        assert!(SystemPacer.pause(Duration::from_millis(150)));
        assert!(started.elapsed() >= Duration::from_millis(150));
    }

    #[test]
    fn test_longest_pause_still_stops_on_request() {
        let stop = Arc::new(AtomicBool::new(false));
        let trigger = {
            let stop = stop.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(150));
                stop.store(true, Ordering::SeqCst);
            })
        };

        assert!(!sleep_unless(Duration::from_secs(u64::MAX), &stop));
        trigger.join().unwrap();
    }

    #[test]
    fn test_pause_returns_at_once_when_already_stopped() {
        let started = Instant::now();
        assert!(!sleep_unless(Duration::MAX, &AtomicBool::new(true)));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_system_clock_is_in_seconds() {
        // 2020-09-13, well in the past, and still far below millisecond values
        let now = SystemPacer.now();
        assert!(now > 1_600_000_000 && now < 100_000_000_000);
    }
}

//! Deadline and stop flag shared by the search threads.
//!
//! The budget is handed to [`TimeControl::start`] by the search itself, taken
//! from its configuration. Clones share the same state, so a caller holding a
//! clone can end a running search with [`TimeControl::stop`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

/// How many visited nodes pass between two clock reads.
pub const CHECK_INTERVAL: u64 = 64;

#[derive(Debug, Clone, Copy)]
struct Clock {
    started: Instant,
    deadline: Option<Instant>,
}

#[derive(Debug, Clone, Default)]
pub struct TimeControl {
    stopped: Arc<AtomicBool>,
    clock: Arc<RwLock<Option<Clock>>>,
}

impl TimeControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts the clock for one search and clears any previous stop request.
    ///
    /// # Arguments
    /// * `budget` - Wall-clock allowance for the search, `None` for no deadline.
    pub fn start(&self, budget: Option<Duration>) {
        let started = Instant::now();
        let deadline = budget.and_then(|b| started.checked_add(b));
        let mut clock = self
            .clock
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *clock = Some(Clock { started, deadline });
        self.stopped.store(false, Ordering::SeqCst);
    }

    /// Asks the running search to stop as soon as possible.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Relaxed)
    }

    fn clock(&self) -> Option<Clock> {
        *self
            .clock
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Reads the clock and raises the stop flag once the deadline has passed.
    ///
    /// Returns true if the search should stop.
    pub fn check_time(&self) -> bool {
        if self.is_stopped() {
            return true;
        }
        match self.clock().and_then(|c| c.deadline) {
            Some(deadline) if Instant::now() >= deadline => {
                self.stop();
                true
            }
            _ => false,
        }
    }

    /// Time since the last [`TimeControl::start`], zero if never started.
    pub fn elapsed(&self) -> Duration {
        self.clock()
            .map(|c| c.started.elapsed())
            .unwrap_or(Duration::ZERO)
    }
}

/// Returns true every `CHECK_INTERVAL` nodes.
#[inline]
pub fn should_check_time(nodes: u64) -> bool {
    nodes % CHECK_INTERVAL == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_no_budget_never_expires() {
        let tc = TimeControl::new();
        tc.start(None);
        assert!(!tc.check_time());
        assert!(!tc.is_stopped());
    }

    #[test]
    fn test_zero_budget_expires_immediately() {
        let tc = TimeControl::new();
        tc.start(Some(Duration::ZERO));
        assert!(tc.check_time());
        assert!(tc.is_stopped());
    }

    #[test]
    fn test_not_started_does_not_expire() {
        let tc = TimeControl::new();
        assert!(!tc.check_time());
        assert_eq!(tc.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_restart_replaces_the_deadline() {
        let tc = TimeControl::new();
        tc.start(Some(Duration::ZERO));
        assert!(tc.check_time());

        tc.start(Some(Duration::from_secs(600)));
        assert!(!tc.is_stopped());
        assert!(!tc.check_time());
    }

    #[test]
    fn test_stop_is_shared_between_clones() {
        let tc = TimeControl::new();
        tc.start(Some(Duration::from_secs(60)));
        let remote = tc.clone();
        thread::spawn(move || remote.stop()).join().unwrap();
        assert!(tc.is_stopped());
        assert!(tc.check_time());

        tc.start(None);
        assert!(!tc.is_stopped());
    }

    #[test]
    fn test_should_check_time_interval() {
        assert!(should_check_time(0));
        assert!(!should_check_time(1));
        assert!(should_check_time(CHECK_INTERVAL));
    }
}

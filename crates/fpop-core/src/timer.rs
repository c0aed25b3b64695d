#![forbid(unsafe_code)]

//! Auto-dismiss countdown.
//!
//! Counts down from the `timer` parameter while the popup is open. Time
//! only moves when the host calls [`Timer::tick`]; the engine forwards the
//! deltas it receives from `Popup::advance`.
//!
//! Two independent pauses exist: the caller's (`stop`/`resume`/`toggle`)
//! and the page's (`suspend`/`unsuspend`, driven by visibility). The clock
//! advances only when neither is active.
//!
//! # Example
//! ```
//! use fpop_core::timer::Timer;
//! use std::time::Duration;
//!
//! let mut timer = Timer::new(Duration::from_millis(500));
//! timer.start();
//! assert!(!timer.tick(Duration::from_millis(200)));
//! assert_eq!(timer.remaining(), Duration::from_millis(300));
//! timer.suspend();
//! assert!(!timer.tick(Duration::from_secs(10)));
//! timer.unsuspend();
//! assert!(timer.tick(Duration::from_millis(300)));
//! ```

use std::time::Duration;

/// A countdown timer.
#[derive(Debug, Clone)]
pub struct Timer {
    /// Total duration, grown by [`increase`](Self::increase).
    initial: Duration,
    remaining: Duration,
    /// Caller-controlled run state.
    running: bool,
    /// Page hidden.
    suspended: bool,
    /// Permanently stopped; no further expiry.
    cancelled: bool,
}

impl Timer {
    /// A stopped timer with `duration` remaining.
    #[must_use]
    pub fn new(duration: Duration) -> Self {
        Self {
            initial: duration,
            remaining: duration,
            running: false,
            suspended: false,
            cancelled: false,
        }
    }

    /// A stopped timer from a millisecond count.
    #[must_use]
    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    /// Whether the countdown reached zero.
    #[must_use]
    pub fn finished(&self) -> bool {
        self.remaining.is_zero()
    }

    /// Whether the caller considers the timer running (ignores page
    /// visibility).
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running && !self.cancelled && !self.finished()
    }

    /// Whether [`tick`](Self::tick) would currently advance the clock.
    #[must_use]
    pub fn is_ticking(&self) -> bool {
        self.is_running() && !self.suspended
    }

    /// Whether the timer was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Time left.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    /// Total duration including increases.
    #[must_use]
    pub fn initial(&self) -> Duration {
        self.initial
    }

    /// Fraction elapsed, from 0.0 to 1.0.
    #[must_use]
    pub fn progress(&self) -> f64 {
        if self.initial.is_zero() {
            return 1.0;
        }
        let elapsed = self.initial.saturating_sub(self.remaining);
        elapsed.as_secs_f64() / self.initial.as_secs_f64()
    }

    /// Start counting.
    pub fn start(&mut self) {
        if !self.cancelled {
            self.running = true;
        }
    }

    /// Pause; returns the time left.
    pub fn stop(&mut self) -> Duration {
        self.running = false;
        self.remaining
    }

    /// Resume after [`stop`](Self::stop); returns the time left.
    pub fn resume(&mut self) -> Duration {
        self.start();
        self.remaining
    }

    /// Flip between running and stopped; returns the time left.
    pub fn toggle(&mut self) -> Duration {
        if self.running {
            self.stop()
        } else {
            self.resume()
        }
    }

    /// Add `delta` to the time left; returns the new time left.
    pub fn increase(&mut self, delta: Duration) -> Duration {
        if self.cancelled || self.finished() {
            return self.remaining;
        }
        self.remaining = self.remaining.saturating_add(delta);
        self.initial = self.initial.max(self.remaining);
        self.remaining
    }

    /// Page hidden: hold the clock.
    pub fn suspend(&mut self) {
        self.suspended = true;
    }

    /// Page visible again.
    pub fn unsuspend(&mut self) {
        self.suspended = false;
    }

    /// Stop for good. A cancelled timer never expires.
    pub fn cancel(&mut self) {
        self.cancelled = true;
        self.running = false;
    }

    /// Advance by `delta`. Returns `true` if the timer expired on this tick.
    pub fn tick(&mut self, delta: Duration) -> bool {
        if !self.is_ticking() {
            return false;
        }
        self.remaining = self.remaining.saturating_sub(delta);
        self.remaining.is_zero()
    }
}

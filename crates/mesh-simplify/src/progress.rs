//! Progress reporting for long-running simplification runs.
//!
//! The simplifier runs to completion in a single call; this module provides
//! the optional callback hook invoked at collapse boundaries. Returning
//! `false` from the callback requests cancellation, in which case the caller
//! receives the partially simplified (still valid) mesh.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Progress information passed to callbacks.
#[derive(Debug, Clone)]
pub struct Progress {
    /// Collapses performed so far.
    pub current: u64,

    /// Estimated total collapses for this run.
    pub total: u64,

    /// Human-readable message describing the current state.
    pub message: String,

    /// Elapsed time since the run started.
    pub elapsed: Duration,
}

impl Progress {
    /// Create a new progress report.
    pub fn new(current: u64, total: u64, message: impl Into<String>) -> Self {
        Self {
            current,
            total,
            message: message.into(),
            elapsed: Duration::ZERO,
        }
    }

    /// Get progress as a fraction (0.0 to 1.0).
    #[inline]
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.current as f64) / (self.total as f64)
        }
    }

    /// Get progress as a percentage (0 to 100).
    #[inline]
    pub fn percent(&self) -> u32 {
        (self.fraction() * 100.0).round() as u32
    }
}

/// Callback function for progress reporting.
///
/// Returns `true` to continue, `false` to request cancellation.
pub type ProgressCallback = Box<dyn Fn(&Progress) -> bool + Send + Sync>;

/// Tracks collapse progress and throttles callback invocations.
#[derive(Debug)]
pub struct ProgressTracker {
    current: AtomicU64,
    total: u64,
    cancelled: AtomicBool,
    start_time: Instant,
    last_callback_time: Mutex<Instant>,
    callback_interval: Duration,
}

impl ProgressTracker {
    /// Create a new progress tracker.
    pub fn new(total: u64) -> Self {
        Self {
            current: AtomicU64::new(0),
            total,
            cancelled: AtomicBool::new(false),
            start_time: Instant::now(),
            last_callback_time: Mutex::new(Instant::now()),
            callback_interval: Duration::from_millis(100),
        }
    }

    /// Create a tracker with a custom callback throttle interval.
    pub fn with_interval(total: u64, interval: Duration) -> Self {
        let mut tracker = Self::new(total);
        tracker.callback_interval = interval;
        tracker
    }

    /// Increment progress by one.
    #[inline]
    pub fn increment(&self) {
        self.current.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current progress value.
    #[inline]
    pub fn current(&self) -> u64 {
        self.current.load(Ordering::Relaxed)
    }

    /// Check if cancellation was requested.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Get elapsed time since the tracker was created.
    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Create a `Progress` snapshot with the given message.
    pub fn snapshot(&self, message: impl Into<String>) -> Progress {
        Progress {
            current: self.current(),
            total: self.total,
            message: message.into(),
            elapsed: self.elapsed(),
        }
    }

    /// Call the callback if enough time has passed since the last call.
    ///
    /// Returns `false` if the callback requested cancellation.
    pub fn maybe_callback(
        &self,
        callback: Option<&ProgressCallback>,
        message: impl Into<String>,
    ) -> bool {
        if self.is_cancelled() {
            return false;
        }

        let Some(callback) = callback else {
            return true;
        };

        let now = Instant::now();
        {
            let mut last = match self.last_callback_time.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            if now.duration_since(*last) < self.callback_interval {
                return true;
            }
            *last = now;
        }

        let should_continue = callback(&self.snapshot(message));
        if !should_continue {
            self.cancel();
        }
        should_continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_fraction() {
        let progress = Progress::new(25, 100, "working");
        assert!((progress.fraction() - 0.25).abs() < 1e-12);
        assert_eq!(progress.percent(), 25);
    }

    #[test]
    fn test_progress_zero_total() {
        let progress = Progress::new(0, 0, "empty");
        assert_eq!(progress.fraction(), 0.0);
        assert_eq!(progress.percent(), 0);
    }

    #[test]
    fn test_tracker_increment_and_cancel() {
        let tracker = ProgressTracker::new(10);
        tracker.increment();
        tracker.increment();
        assert_eq!(tracker.current(), 2);

        assert!(!tracker.is_cancelled());
        tracker.cancel();
        assert!(tracker.is_cancelled());
        assert!(!tracker.maybe_callback(None, "after cancel"));
    }

    #[test]
    fn test_maybe_callback_without_callback_continues() {
        let tracker = ProgressTracker::new(10);
        assert!(tracker.maybe_callback(None, "no callback"));
    }
}

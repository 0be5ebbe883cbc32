//! LatencyTimer - processing latency instrumentation
//!
//! Observational only: a timer must never influence dispatch output.

use std::time::Instant;

/// Opaque start mark returned by `LatencyTimer::start`
#[derive(Debug, Clone, Copy)]
pub struct TimerStart(Instant);

impl TimerStart {
    pub fn now() -> Self {
        Self(Instant::now())
    }

    pub fn instant(&self) -> Instant {
        self.0
    }
}

/// Start/finish timing measurement
pub trait LatencyTimer: Send + Sync {
    fn start(&self) -> TimerStart {
        TimerStart::now()
    }

    fn finish(&self, started: TimerStart);
}

/// Finishes its measurement when dropped
///
/// Covers early `?` returns and unwinding alike, so a measurement is never
/// left open.
pub struct TimerGuard<'a> {
    timer: &'a dyn LatencyTimer,
    started: TimerStart,
}

impl<'a> TimerGuard<'a> {
    pub fn start(timer: &'a dyn LatencyTimer) -> Self {
        let started = timer.start();
        Self { timer, started }
    }
}

impl Drop for TimerGuard<'_> {
    fn drop(&mut self) {
        self.timer.finish(self.started);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[derive(Default)]
    struct CountingTimer {
        finished: AtomicU64,
    }

    impl LatencyTimer for CountingTimer {
        fn finish(&self, _started: TimerStart) {
            self.finished.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn failing_receive() -> Result<(), String> {
        Err("receiver down".to_string())
    }

    fn fails_midway(timer: &CountingTimer) -> Result<(), String> {
        let _guard = TimerGuard::start(timer);
        failing_receive()?;
        Ok(())
    }

    #[test]
    fn test_guard_finishes_on_drop() {
        let timer = CountingTimer::default();
        {
            let _guard = TimerGuard::start(&timer);
            assert_eq!(timer.finished.load(Ordering::SeqCst), 0);
        }
        assert_eq!(timer.finished.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_guard_finishes_on_error_path() {
        let timer = CountingTimer::default();
        assert!(fails_midway(&timer).is_err());
        assert_eq!(timer.finished.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_guard_finishes_on_panic() {
        let timer = CountingTimer::default();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = TimerGuard::start(&timer);
            panic!("collaborator blew up");
        }));
        assert!(result.is_err());
        assert_eq!(timer.finished.load(Ordering::SeqCst), 1);
    }
}

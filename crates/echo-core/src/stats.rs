//! Process-wide connection counters.
//!
//! # What is tracked?
//!
//! - **active** – the number of echo sessions currently open.
//! - **max** – the highest value `active` has reached since the process
//!   started.  It never decreases and is never reset.
//!
//! # Thread safety
//!
//! Every echo session runs in its own Tokio task, and the status endpoint reads
//! the counters from yet another task.  Both counters live behind a single
//! `Mutex` so that the two values always change together: a reader can never
//! observe `active > max`, which two independent atomics would allow in the
//! window between bumping `active` and raising `max`.
//!
//! The critical sections are a handful of integer operations with no `.await`
//! inside, so a plain `std::sync::Mutex` is the right tool here.  None of them
//! can panic, which means the lock can never actually be poisoned; we still
//! recover the inner value from a `PoisonError` rather than unwrapping.
//!
//! # Guaranteed decrement
//!
//! [`ConnectionStats::open`] returns a [`ConnectionGuard`].  The decrement
//! happens in [`ConnectionGuard::close`] or, failing that, in the guard's
//! `Drop` impl, so it runs on every exit path of the session: a clean close,
//! an I/O error, a panic that unwinds the task, or the task being dropped by
//! the runtime.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A point-in-time copy of both counters, read under the same lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    /// Number of echo sessions currently open.
    pub active: u64,
    /// Highest `active` value observed since process start.
    pub max: u64,
}

/// Shared active / peak connection counters.
///
/// Create one per process, wrap it in an `Arc`, and hand a clone to every
/// task that opens sessions or reports status.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use echo_core::ConnectionStats;
///
/// let stats = Arc::new(ConnectionStats::new());
/// let guard = stats.open();
/// assert_eq!(stats.active(), 1);
/// drop(guard);
/// assert_eq!(stats.active(), 0);
/// assert_eq!(stats.max(), 1);
/// ```
#[derive(Debug, Default)]
pub struct ConnectionStats {
    counts: Mutex<StatsSnapshot>,
}

impl ConnectionStats {
    /// Creates counters with both values at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a newly opened session and returns the guard that closes it.
    ///
    /// Increments `active` and raises `max` to match if it was exceeded, as one
    /// step.  Keep the returned guard alive for as long as the session runs.
    /// [`ConnectionGuard::opened`] holds the counters exactly as this call left
    /// them.
    #[must_use = "dropping the guard immediately closes the session again"]
    pub fn open(self: &Arc<Self>) -> ConnectionGuard {
        let opened = {
            let mut counts = self.lock();
            counts.active = counts.active.saturating_add(1);
            if counts.active > counts.max {
                counts.max = counts.active;
            }
            *counts
        };

        ConnectionGuard {
            stats: Some(Arc::clone(self)),
            opened,
        }
    }

    /// Returns both counters as read at the same instant.
    pub fn snapshot(&self) -> StatsSnapshot {
        *self.lock()
    }

    /// Returns the number of currently open sessions.
    pub fn active(&self) -> u64 {
        self.snapshot().active
    }

    /// Returns the peak number of simultaneously open sessions.
    pub fn max(&self) -> u64 {
        self.snapshot().max
    }

    /// Records a closed session.  Only reachable through [`ConnectionGuard`].
    fn close(&self) -> StatsSnapshot {
        let mut counts = self.lock();
        counts.active = counts.active.saturating_sub(1);
        *counts
    }

    fn lock(&self) -> MutexGuard<'_, StatsSnapshot> {
        self.counts.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// RAII handle for one open session.
///
/// Dropping the guard, or calling [`close`](Self::close), decrements the
/// active count exactly once.
#[derive(Debug)]
pub struct ConnectionGuard {
    /// `None` once [`close`](Self::close) has run.
    stats: Option<Arc<ConnectionStats>>,
    opened: StatsSnapshot,
}

impl ConnectionGuard {
    /// The counters right after this session was opened.
    pub fn opened(&self) -> StatsSnapshot {
        self.opened
    }

    /// Closes the session now and returns the counters right after the
    /// decrement, read under the same lock.
    pub fn close(mut self) -> StatsSnapshot {
        match self.stats.take() {
            Some(stats) => stats.close(),
            None => self.opened,
        }
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        if let Some(stats) = self.stats.take() {
            stats.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_new_stats_start_at_zero() {
        // Arrange / Act
        let stats = ConnectionStats::new();

        // Assert
        assert_eq!(stats.snapshot(), StatsSnapshot { active: 0, max: 0 });
    }

    #[test]
    fn test_open_increments_active_and_max() {
        // Arrange
        let stats = Arc::new(ConnectionStats::new());

        // Act
        let _guard = stats.open();

        // Assert
        assert_eq!(stats.snapshot(), StatsSnapshot { active: 1, max: 1 });
    }

    #[test]
    fn test_dropping_guard_decrements_active_only() {
        // Arrange
        let stats = Arc::new(ConnectionStats::new());
        let guard = stats.open();

        // Act
        drop(guard);

        // Assert – the peak survives the close
        assert_eq!(stats.snapshot(), StatsSnapshot { active: 0, max: 1 });
    }

    #[test]
    fn test_guard_reports_counts_from_its_own_open() {
        // Arrange
        let stats = Arc::new(ConnectionStats::new());
        let first = stats.open();

        // Act: a later open must not change what the first guard saw
        let second = stats.open();

        // Assert
        assert_eq!(first.opened(), StatsSnapshot { active: 1, max: 1 });
        assert_eq!(second.opened(), StatsSnapshot { active: 2, max: 2 });
    }

    #[test]
    fn test_explicit_close_returns_post_decrement_counts() {
        // Arrange
        let stats = Arc::new(ConnectionStats::new());
        let first = stats.open();
        let _second = stats.open();

        // Act
        let closed = first.close();

        // Assert
        assert_eq!(closed, StatsSnapshot { active: 1, max: 2 });
        assert_eq!(stats.snapshot(), closed, "close must not decrement twice");
    }

    #[test]
    fn test_concurrent_opens_each_see_a_distinct_count() {
        // Arrange
        let stats = Arc::new(ConnectionStats::new());
        let barrier = Arc::new(std::sync::Barrier::new(8));

        // Act – every thread records the active count its own open produced
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let s = Arc::clone(&stats);
                let b = Arc::clone(&barrier);
                thread::spawn(move || {
                    let guard = s.open();
                    let seen = guard.opened().active;
                    b.wait();
                    seen
                })
            })
            .collect();

        let mut seen: Vec<u64> = handles
            .into_iter()
            .map(|h| h.join().expect("thread panicked"))
            .collect();

        // Assert – opens are serialized, so the counts are exactly 1..=8
        seen.sort_unstable();
        assert_eq!(seen, (1..=8).collect::<Vec<u64>>());
    }

    #[test]
    fn test_three_opened_one_closed() {
        // Arrange
        let stats = Arc::new(ConnectionStats::new());
        let mut guards: Vec<_> = (0..3).map(|_| stats.open()).collect();

        // Act
        guards.pop();

        // Assert
        assert_eq!(stats.snapshot(), StatsSnapshot { active: 2, max: 3 });
    }

    #[test]
    fn test_n_opens_then_m_closes() {
        for n in 0..8usize {
            for m in 0..=n {
                // Arrange
                let stats = Arc::new(ConnectionStats::new());
                let mut guards: Vec<_> = (0..n).map(|_| stats.open()).collect();

                // Act
                guards.truncate(n - m);

                // Assert
                assert_eq!(stats.active(), (n - m) as u64, "n={n} m={m}");
                assert_eq!(stats.max(), n as u64, "n={n} m={m}");
            }
        }
    }

    #[test]
    fn test_max_keeps_historical_peak_across_waves() {
        // Arrange: first wave peaks at 5
        let stats = Arc::new(ConnectionStats::new());
        let first: Vec<_> = (0..5).map(|_| stats.open()).collect();
        drop(first);

        // Act: a smaller second wave
        let second: Vec<_> = (0..2).map(|_| stats.open()).collect();

        // Assert
        assert_eq!(stats.snapshot(), StatsSnapshot { active: 2, max: 5 });
        drop(second);
        assert_eq!(stats.snapshot(), StatsSnapshot { active: 0, max: 5 });
    }

    #[test]
    fn test_guard_decrements_when_panic_unwinds() {
        // Arrange
        let stats = Arc::new(ConnectionStats::new());
        let stats_in_thread = Arc::clone(&stats);

        // Act: the session "task" panics while holding its guard
        let result = thread::spawn(move || {
            let _guard = stats_in_thread.open();
            panic!("session blew up");
        })
        .join();

        // Assert
        assert!(result.is_err(), "thread must have panicked");
        assert_eq!(stats.snapshot(), StatsSnapshot { active: 0, max: 1 });
    }

    #[test]
    fn test_concurrent_open_close_loses_no_updates() {
        // Arrange
        let stats = Arc::new(ConnectionStats::new());
        let thread_count = 8;
        let sessions_per_thread = 1000;

        // Act – every thread opens and closes sessions while checking the
        // invariant on each snapshot it reads.
        let handles: Vec<_> = (0..thread_count)
            .map(|_| {
                let s = Arc::clone(&stats);
                thread::spawn(move || {
                    for _ in 0..sessions_per_thread {
                        let guard = s.open();
                        let snap = s.snapshot();
                        assert!(snap.max >= snap.active, "max must never trail active");
                        assert!(snap.active >= 1, "our own session is open");
                        drop(guard);
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().expect("thread panicked");
        }

        // Assert
        let snap = stats.snapshot();
        assert_eq!(snap.active, 0, "every open must be matched by a close");
        assert!(snap.max >= 1 && snap.max <= thread_count as u64);
    }

    #[test]
    fn test_concurrent_holders_reach_exact_peak() {
        // Arrange
        let stats = Arc::new(ConnectionStats::new());
        let barrier = Arc::new(std::sync::Barrier::new(16));

        // Act – all 16 threads hold a guard at the same moment
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let s = Arc::clone(&stats);
                let b = Arc::clone(&barrier);
                thread::spawn(move || {
                    let _guard = s.open();
                    b.wait();
                })
            })
            .collect();

        for h in handles {
            h.join().expect("thread panicked");
        }

        // Assert
        assert_eq!(stats.snapshot(), StatsSnapshot { active: 0, max: 16 });
    }
}

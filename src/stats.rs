//! Run counters shared between the dispatcher, the workers and the progress display.

use std::sync::{Mutex, PoisonError};

/// A point-in-time copy of the run counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Files found by the counting pass, captured before dispatch starts.
    pub total: usize,
    /// Files that reached a final outcome (organized or skipped).
    pub processed: usize,
    /// Files moved into their destination.
    pub organized: usize,
    /// Files left in place: no mapping, or the move failed.
    pub skipped: usize,
}

impl StatsSnapshot {
    /// Percentage of `total` that has been processed, if anything was counted.
    pub fn percent_complete(&self) -> Option<f64> {
        if self.total == 0 {
            None
        } else {
            Some(self.processed as f64 / self.total as f64 * 100.0)
        }
    }
}

/// Mutex-guarded counters. Increments are the only way to change them; `total`
/// is fixed at construction.
#[derive(Debug, Default)]
pub struct Stats {
    inner: Mutex<StatsSnapshot>,
}

impl Stats {
    pub fn with_total(total: usize) -> Self {
        Self {
            inner: Mutex::new(StatsSnapshot {
                total,
                ..StatsSnapshot::default()
            }),
        }
    }

    /// Records a file that was moved.
    pub fn record_organized(&self) {
        self.update(|counters| {
            counters.processed += 1;
            counters.organized += 1;
        });
    }

    /// Records a file that was left in place.
    pub fn record_skipped(&self) {
        self.update(|counters| {
            counters.processed += 1;
            counters.skipped += 1;
        });
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // Every update completes inside the lock, so a poisoned guard still holds
    // consistent counters.
    fn update(&self, apply: impl FnOnce(&mut StatsSnapshot)) {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        apply(&mut *guard);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_new_stats_start_at_zero() {
        let stats = Stats::with_total(7);
        assert_eq!(
            stats.snapshot(),
            StatsSnapshot {
                total: 7,
                ..StatsSnapshot::default()
            }
        );
    }

    #[test]
    fn test_outcomes_also_count_as_processed() {
        let stats = Stats::with_total(3);
        stats.record_organized();
        stats.record_organized();
        stats.record_skipped();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.processed, 3);
        assert_eq!(snapshot.organized, 2);
        assert_eq!(snapshot.skipped, 1);
    }

    #[test]
    fn test_concurrent_increments_are_not_lost() {
        let stats = Arc::new(Stats::with_total(800));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let stats = Arc::clone(&stats);
                thread::spawn(move || {
                    for _ in 0..100 {
                        if i % 2 == 0 {
                            stats.record_organized();
                        } else {
                            stats.record_skipped();
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("worker thread panicked");
        }

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.processed, 800);
        assert_eq!(snapshot.organized, 400);
        assert_eq!(snapshot.skipped, 400);
    }

    #[test]
    fn test_percent_complete() {
        assert_eq!(StatsSnapshot::default().percent_complete(), None);

        let snapshot = StatsSnapshot {
            total: 4,
            processed: 1,
            organized: 1,
            skipped: 0,
        };
        assert_eq!(snapshot.percent_complete(), Some(25.0));
    }
}

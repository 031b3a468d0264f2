//! Rolling time window for success/failure accounting
//!
//! A fixed ring of buckets tracks the trailing window of call outcomes.
//! Bucket granularity trades memory for recency resolution: the minimum
//! observable recency is `window / bucket_count`. Stale buckets are reset
//! lazily the first time they are written after rotating out of the window,
//! which also discards history older than the window without any per-event
//! timestamp bookkeeping.

use std::sync::RwLock;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, Default)]
struct Bucket {
    success: u64,
    total: u64,
    /// Slot number this bucket was last written in (`elapsed / bucket_width`).
    slot: u64,
}

/// Time-bucketed counter of recent call outcomes.
#[derive(Debug)]
pub struct RollingWindow {
    buckets: RwLock<Vec<Bucket>>,
    bucket_width: Duration,
    /// Monotonic time anchor (prevents clock skew issues from NTP)
    start: Instant,
}

impl RollingWindow {
    /// Create a window of the given duration divided into `bucket_count` buckets.
    ///
    /// # Panics
    ///
    /// Panics if `bucket_count` is 0 or the resulting bucket width is zero.
    /// [`Config::validate`](crate::Config) rejects such configurations before
    /// construction.
    pub fn new(window: Duration, bucket_count: usize) -> Self {
        assert!(bucket_count > 0, "bucket count must be greater than 0");
        let bucket_width = Duration::from_nanos((window.as_nanos() / bucket_count as u128) as u64);
        assert!(
            !bucket_width.is_zero(),
            "window must span at least one nanosecond per bucket"
        );
        Self {
            buckets: RwLock::new(vec![Bucket::default(); bucket_count]),
            bucket_width,
            start: Instant::now(),
        }
    }

    fn current_slot(&self) -> u64 {
        (self.start.elapsed().as_nanos() / self.bucket_width.as_nanos()) as u64
    }

    /// Record one call outcome in the active bucket.
    ///
    /// Resets the bucket first if it still holds counts from an earlier
    /// rotation; the check-and-reset happens under the same write lock as the
    /// increment, so concurrent callers never lose updates.
    pub fn add(&self, success: bool) {
        let mut buckets = self.buckets.write().unwrap();
        // Read the clock under the lock so a delayed writer can never roll a
        // bucket back to an earlier slot.
        let slot = self.current_slot();
        let len = buckets.len() as u64;
        let bucket = &mut buckets[(slot % len) as usize];
        if bucket.slot != slot {
            *bucket = Bucket {
                slot,
                ..Bucket::default()
            };
        }
        bucket.total += 1;
        if success {
            bucket.success += 1;
        }
    }

    /// Sum `(success, total)` across the buckets currently inside the window.
    ///
    /// Stale buckets count as zero and are left untouched; this is a
    /// read-only aggregation.
    pub fn summary(&self) -> (u64, u64) {
        let buckets = self.buckets.read().unwrap();
        let slot = self.current_slot();
        let len = buckets.len() as u64;
        let mut success = 0;
        let mut total = 0;
        for bucket in buckets.iter() {
            // saturating: a bucket stamped by a writer whose clock read was a
            // hair ahead of ours is current, not stale.
            if slot.saturating_sub(bucket.slot) < len {
                success += bucket.success;
                total += bucket.total;
            }
        }
        (success, total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_add_and_summary() {
        let window = RollingWindow::new(Duration::from_secs(60), 10);

        window.add(true);
        window.add(true);
        window.add(false);

        assert_eq!(window.summary(), (2, 3));
    }

    #[test]
    fn test_empty_window_is_zero() {
        let window = RollingWindow::new(Duration::from_secs(60), 10);
        assert_eq!(window.summary(), (0, 0));
    }

    #[test]
    fn test_events_expire_after_window() {
        let window = RollingWindow::new(Duration::from_millis(80), 4);

        window.add(true);
        window.add(false);
        assert_eq!(window.summary(), (1, 2));

        thread::sleep(Duration::from_millis(120));

        assert_eq!(window.summary(), (0, 0));
    }

    #[test]
    fn test_summary_does_not_mutate_stale_buckets() {
        let window = RollingWindow::new(Duration::from_millis(80), 4);

        window.add(true);
        thread::sleep(Duration::from_millis(120));

        // Repeated read-only aggregations agree.
        assert_eq!(window.summary(), (0, 0));
        assert_eq!(window.summary(), (0, 0));

        window.add(false);
        assert_eq!(window.summary(), (0, 1));
    }

    #[test]
    fn test_partial_rotation_keeps_recent_buckets() {
        let window = RollingWindow::new(Duration::from_millis(200), 2);

        window.add(true);
        thread::sleep(Duration::from_millis(120));
        window.add(true);

        // Both buckets still inside the trailing window.
        assert_eq!(window.summary(), (2, 2));

        thread::sleep(Duration::from_millis(120));

        // The first bucket has rotated out.
        assert_eq!(window.summary(), (1, 1));
    }

    #[test]
    fn test_stale_bucket_reset_on_reuse() {
        let window = RollingWindow::new(Duration::from_millis(100), 2);

        window.add(true);
        window.add(true);

        // Sleep past the full window so the ring index wraps to the same
        // bucket, which must be reset before the new increment.
        thread::sleep(Duration::from_millis(110));
        window.add(false);

        assert_eq!(window.summary(), (0, 1));
    }

    #[test]
    fn test_concurrent_adds_are_not_lost() {
        let window = Arc::new(RollingWindow::new(Duration::from_secs(60), 10));
        let mut handles = vec![];

        for _ in 0..8 {
            let window = Arc::clone(&window);
            handles.push(thread::spawn(move || {
                for i in 0..100 {
                    window.add(i % 2 == 0);
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        let (success, total) = window.summary();
        assert_eq!(total, 800);
        assert_eq!(success, 400);
    }

    #[test]
    #[should_panic(expected = "bucket count must be greater than 0")]
    fn test_zero_bucket_count_panics() {
        RollingWindow::new(Duration::from_secs(1), 0);
    }
}

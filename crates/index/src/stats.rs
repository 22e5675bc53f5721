//! Scan statistics for the shard index.
//!
//! Counters are updated through `&self` so a shared index can be scanned by
//! several leaf streams of the same query.

use core::sync::atomic::{AtomicUsize, Ordering};

/// Statistics for term scans against a shard index.
#[derive(Debug)]
pub struct TermStats {
    /// Number of term scans started.
    scans: AtomicUsize,
    /// Number of shards handed out by scans.
    shards_scanned: AtomicUsize,
    /// Number of shards replaced by an infinite marker.
    shards_over_threshold: AtomicUsize,
}

impl TermStats {
    /// Creates a new empty stats instance.
    pub fn new() -> Self {
        Self {
            scans: AtomicUsize::new(0),
            shards_scanned: AtomicUsize::new(0),
            shards_over_threshold: AtomicUsize::new(0),
        }
    }

    /// Returns the number of scans started.
    pub fn scans(&self) -> usize {
        self.scans.load(Ordering::Relaxed)
    }

    /// Returns the number of shards handed out.
    pub fn shards_scanned(&self) -> usize {
        self.shards_scanned.load(Ordering::Relaxed)
    }

    /// Returns the number of shards marked infinite.
    pub fn shards_over_threshold(&self) -> usize {
        self.shards_over_threshold.load(Ordering::Relaxed)
    }

    /// Records the start of a scan.
    pub fn record_scan(&self) {
        self.scans.fetch_add(1, Ordering::Relaxed);
    }

    /// Records one shard handed out, and whether it was over threshold.
    pub fn record_shard(&self, over_threshold: bool) {
        self.shards_scanned.fetch_add(1, Ordering::Relaxed);
        if over_threshold {
            self.shards_over_threshold.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Resets all counters to zero.
    pub fn clear(&self) {
        self.scans.store(0, Ordering::Relaxed);
        self.shards_scanned.store(0, Ordering::Relaxed);
        self.shards_over_threshold.store(0, Ordering::Relaxed);
    }
}

impl Default for TermStats {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for TermStats {
    fn clone(&self) -> Self {
        Self {
            scans: AtomicUsize::new(self.scans()),
            shards_scanned: AtomicUsize::new(self.shards_scanned()),
            shards_over_threshold: AtomicUsize::new(self.shards_over_threshold()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = TermStats::new();
        assert_eq!(stats.scans(), 0);
        assert_eq!(stats.shards_scanned(), 0);
        assert_eq!(stats.shards_over_threshold(), 0);
    }

    #[test]
    fn test_stats_record() {
        let stats = TermStats::new();
        stats.record_scan();
        stats.record_shard(false);
        stats.record_shard(true);

        assert_eq!(stats.scans(), 1);
        assert_eq!(stats.shards_scanned(), 2);
        assert_eq!(stats.shards_over_threshold(), 1);
    }

    #[test]
    fn test_stats_clear_and_clone() {
        let stats = TermStats::new();
        stats.record_scan();
        stats.record_shard(true);

        let cloned = stats.clone();
        stats.clear();

        assert_eq!(stats.scans(), 0);
        assert_eq!(cloned.scans(), 1);
        assert_eq!(cloned.shards_over_threshold(), 1);
    }
}

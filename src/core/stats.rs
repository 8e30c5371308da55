use std::sync::atomic::{AtomicUsize, Ordering};
use serde::{Serialize, Deserialize};

/// Cache activity counters, shared by every collection of one indexer
#[derive(Debug, Default)]
pub struct IndexCounters {
    pub base_hits: AtomicUsize,
    pub base_builds: AtomicUsize,
    pub sorted_hits: AtomicUsize,
    pub sorted_builds: AtomicUsize,
    pub sorts_streamed: AtomicUsize,
    pub searches: AtomicUsize,
}

impl IndexCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_base_hit(&self) {
        self.base_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_base_build(&self) {
        self.base_builds.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_sorted_hit(&self) {
        self.sorted_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_sorted_build(&self) {
        self.sorted_builds.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_sort_streamed(&self) {
        self.sorts_streamed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_search(&self) {
        self.searches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> IndexStats {
        IndexStats {
            base_hits: self.base_hits.load(Ordering::Relaxed),
            base_builds: self.base_builds.load(Ordering::Relaxed),
            sorted_hits: self.sorted_hits.load(Ordering::Relaxed),
            sorted_builds: self.sorted_builds.load(Ordering::Relaxed),
            sorts_streamed: self.sorts_streamed.load(Ordering::Relaxed),
            searches: self.searches.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of `IndexCounters`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IndexStats {
    pub base_hits: usize,
    pub base_builds: usize,
    pub sorted_hits: usize,
    pub sorted_builds: usize,
    pub sorts_streamed: usize,
    pub searches: usize,
}

impl IndexStats {
    pub fn base_hit_rate(&self) -> f64 {
        let total = self.base_hits + self.base_builds;
        if total == 0 {
            0.0
        } else {
            self.base_hits as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_rate_counts_hits_over_lookups() {
        let counters = IndexCounters::new();
        assert_eq!(counters.snapshot().base_hit_rate(), 0.0);

        counters.record_base_build();
        counters.record_base_hit();
        counters.record_base_hit();
        counters.record_base_hit();

        let stats = counters.snapshot();
        assert_eq!(stats.base_builds, 1);
        assert_eq!(stats.base_hit_rate(), 0.75);
    }
}

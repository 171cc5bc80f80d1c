//! Shared region → revenue result map

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Final query output: region name → revenue, iterated in key order
pub type ResultMap = BTreeMap<String, f64>;

/// Thread-safe accumulator the workers commit their partial totals into
///
/// Every mutation is one short critical section under a single mutex. A
/// reused aggregator keeps accumulating; call [`ResultAggregator::reset`]
/// between queries that must not see each other's totals.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    results: Mutex<ResultMap>,
    commits: AtomicUsize,
}

impl ResultAggregator {
    /// Create an empty aggregator
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure `region` has an entry, starting at `0.0`
    ///
    /// An existing total is left untouched.
    pub fn init(&self, region: &str) {
        self.results.lock().entry(region.to_string()).or_insert(0.0);
    }

    /// `results[region] += partial`
    pub fn commit(&self, region: &str, partial: f64) {
        {
            let mut results = self.results.lock();
            match results.get_mut(region) {
                Some(total) => *total += partial,
                None => {
                    results.insert(region.to_string(), partial);
                }
            }
        }
        self.commits.fetch_add(1, Ordering::Relaxed);
    }

    /// Current total for one region
    pub fn get(&self, region: &str) -> Option<f64> {
        self.results.lock().get(region).copied()
    }

    /// Number of commits since creation or the last reset
    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::Relaxed)
    }

    /// Drop every entry
    pub fn reset(&self) {
        self.results.lock().clear();
        self.commits.store(0, Ordering::Relaxed);
    }

    /// Copy of the current map
    pub fn snapshot(&self) -> ResultMap {
        self.results.lock().clone()
    }

    /// Consume the aggregator and return its map
    pub fn into_map(self) -> ResultMap {
        self.results.into_inner()
    }
}

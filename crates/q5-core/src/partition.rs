//! Orders range partitioning

use crate::config::MAX_THREADS;
use crate::error::{Error, Result};
use std::ops::Range;

/// A half-open `[start, end)` slice of the orders table handed to one worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    /// Worker slot, `0..num_threads`
    pub index: usize,
    /// First order row (inclusive)
    pub start: usize,
    /// Last order row (exclusive)
    pub end: usize,
}

impl Partition {
    /// Number of orders in the partition
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// True for a partition with no orders
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Row positions covered
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Split `[0, total_orders)` into exactly `num_threads` contiguous partitions
///
/// Every partition but the last holds `total_orders / num_threads` rows; the
/// last one runs to `total_orders` and so absorbs the remainder. With more
/// threads than orders the leading partitions come out empty. More than
/// [`MAX_THREADS`] partitions is a configuration error.
pub fn partition(total_orders: usize, num_threads: usize) -> Result<Vec<Partition>> {
    if num_threads == 0 {
        return Err(Error::config("thread count must be at least 1"));
    }
    if num_threads > MAX_THREADS {
        return Err(Error::config(format!(
            "thread count {num_threads} exceeds the limit of {MAX_THREADS}"
        )));
    }

    let chunk_size = total_orders / num_threads;
    let partitions = (0..num_threads)
        .map(|index| {
            let start = index * chunk_size;
            let end = if index == num_threads - 1 {
                total_orders
            } else {
                start + chunk_size
            };
            Partition { index, start, end }
        })
        .collect();
    Ok(partitions)
}

//! Query driver: partition, dispatch, join barrier, aggregate
//!
//! ```text
//! Init ──► Partitioned ──► Dispatched ──► Joined ──► Aggregated
//! ```
//!
//! Each non-empty orders partition runs on its own scoped thread. A worker
//! commits its partial total straight into the shared [`ResultAggregator`]
//! and returns its counters; the driver only hands the map back after every
//! worker has been joined. Any worker failure fails the query.

use crate::aggregator::{ResultAggregator, ResultMap};
use crate::config::QueryConfig;
use crate::error::{Error, Result};
use crate::join::{JoinStrategy, LineitemIndex, LineitemSource, PartialTotal, join_partition};
use crate::partition::{Partition, partition};
use crate::table::Table;
use std::any::Any;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace};

/// Driver lifecycle, logged at `trace` as the query advances
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryPhase {
    /// Config validated, region entry created
    Init,
    /// Partitions computed (and the lineitem index built, if used)
    Partitioned,
    /// Workers spawned
    Dispatched,
    /// Every worker joined
    Joined,
    /// All partial totals committed; terminal
    Aggregated,
}

/// Counters gathered across the workers of one query
#[derive(Debug, Clone, PartialEq)]
pub struct QueryStats {
    /// Partitions produced
    pub partitions: usize,
    /// Threads actually started (empty partitions are skipped)
    pub workers_spawned: usize,
    /// Orders visited
    pub orders_scanned: usize,
    /// Orders inside the date window
    pub orders_in_window: usize,
    /// Lineitems that contributed revenue
    pub lineitems_matched: usize,
    /// Probe strategy used
    pub join_strategy: JoinStrategy,
    /// Wall time from validation to the last commit
    pub elapsed: Duration,
}

impl QueryStats {
    fn new(partitions: usize, join_strategy: JoinStrategy) -> Self {
        Self {
            partitions,
            workers_spawned: 0,
            orders_scanned: 0,
            orders_in_window: 0,
            lineitems_matched: 0,
            join_strategy,
            elapsed: Duration::ZERO,
        }
    }

    fn absorb(&mut self, partial: &PartialTotal) {
        self.orders_scanned += partial.orders_scanned;
        self.orders_in_window += partial.orders_in_window;
        self.lineitems_matched += partial.lineitems_matched;
    }
}

/// Result of a completed query
#[derive(Debug, Clone)]
pub struct QueryOutcome {
    /// Region → revenue
    pub results: ResultMap,
    /// Execution counters
    pub stats: QueryStats,
}

/// Runs the region revenue query over borrowed, read-only tables
pub struct QueryEngine<'a> {
    orders: &'a Table,
    lineitem: &'a Table,
}

impl<'a> QueryEngine<'a> {
    /// Create an engine over the orders and lineitem tables
    pub fn new(orders: &'a Table, lineitem: &'a Table) -> Self {
        Self { orders, lineitem }
    }

    /// Run a query with a fresh result map
    pub fn execute(&self, config: &QueryConfig) -> Result<QueryOutcome> {
        let aggregator = ResultAggregator::new();
        let stats = self.execute_into(config, &aggregator)?;
        Ok(QueryOutcome {
            results: aggregator.into_map(),
            stats,
        })
    }

    /// Run a query, committing into a caller-owned aggregator
    ///
    /// The aggregator accumulates across calls. If the query fails, the
    /// commits of workers that did succeed remain in it; reset it before
    /// reuse.
    pub fn execute_into(
        &self,
        config: &QueryConfig,
        aggregator: &ResultAggregator,
    ) -> Result<QueryStats> {
        let started = Instant::now();
        config.validate()?;
        let region = config.region_name.as_str();
        let window = config.window();
        aggregator.init(region);
        advance(QueryPhase::Init);

        let partitions = partition(self.orders.len(), config.threads)?;
        let index = match config.join_strategy {
            JoinStrategy::HashIndex => Some(LineitemIndex::build(self.lineitem)?),
            JoinStrategy::NestedLoop => None,
        };
        let source = match &index {
            Some(index) => LineitemSource::Index(index),
            None => LineitemSource::Scan(self.lineitem),
        };
        advance(QueryPhase::Partitioned);

        info!(
            region,
            start = %window.start,
            end = %window.end,
            threads = config.threads,
            strategy = %config.join_strategy,
            orders = self.orders.len(),
            lineitem = self.lineitem.len(),
            "executing revenue query"
        );

        let mut stats = QueryStats::new(partitions.len(), config.join_strategy);
        let orders = self.orders;
        let source = &source;
        let window = &window;

        let (spawned, outcomes) = dispatch(&partitions, |part| {
            let partial = join_partition(orders, source, window, part)?;
            aggregator.commit(region, partial.revenue);
            debug!(
                partition = part.index,
                start = part.start,
                end = part.end,
                revenue = partial.revenue,
                matched = partial.lineitems_matched,
                "worker committed partial total"
            );
            Ok(partial)
        });
        stats.workers_spawned = spawned;
        advance(QueryPhase::Joined);

        settle(outcomes, &mut stats)?;
        advance(QueryPhase::Aggregated);

        stats.elapsed = started.elapsed();
        debug!(?stats, "query finished");
        Ok(stats)
    }
}

/// Run `work` on one scoped thread per non-empty partition and join them all
///
/// Returns the number of threads started and every partition's outcome. A
/// panicking worker becomes an [`Error::Worker`] outcome.
fn dispatch<F>(
    partitions: &[Partition],
    work: F,
) -> (usize, Vec<(Partition, Result<PartialTotal>)>)
where
    F: Fn(Partition) -> Result<PartialTotal> + Sync,
{
    let work = &work;
    thread::scope(|scope| {
        let mut handles = Vec::with_capacity(partitions.len());
        let mut outcomes = Vec::with_capacity(partitions.len());

        for part in partitions.iter().copied().filter(|p| !p.is_empty()) {
            let spawned = thread::Builder::new()
                .name(format!("q5-worker-{}", part.index))
                .spawn_scoped(scope, move || work(part));
            match spawned {
                Ok(handle) => handles.push((part, handle)),
                Err(e) => outcomes.push((
                    part,
                    Err(Error::worker(format!(
                        "failed to spawn worker {}: {e}",
                        part.index
                    ))),
                )),
            }
        }
        let spawned = handles.len();
        advance(QueryPhase::Dispatched);

        for (part, handle) in handles {
            let outcome = handle.join().unwrap_or_else(|payload| {
                Err(Error::worker(format!(
                    "worker {} panicked: {}",
                    part.index,
                    panic_message(payload.as_ref())
                )))
            });
            outcomes.push((part, outcome));
        }
        (spawned, outcomes)
    })
}

/// Fold worker counters into `stats`; the lowest-indexed failure wins
fn settle(
    outcomes: Vec<(Partition, Result<PartialTotal>)>,
    stats: &mut QueryStats,
) -> Result<()> {
    let mut failure: Option<(usize, Error)> = None;
    for (part, outcome) in outcomes {
        match outcome {
            Ok(partial) => stats.absorb(&partial),
            Err(err) => {
                if failure.as_ref().is_none_or(|(first, _)| part.index < *first) {
                    failure = Some((part.index, err));
                }
            }
        }
    }
    match failure {
        Some((index, err)) => {
            debug!(partition = index, error = %err, "query aborted by worker failure");
            Err(err)
        }
        None => Ok(()),
    }
}

fn advance(phase: QueryPhase) {
    trace!(?phase, "query phase");
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

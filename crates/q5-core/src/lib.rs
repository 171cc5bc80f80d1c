//! Q5 Core - Parallel region revenue engine
//!
//! Computes the TPC-H Query 5 style revenue aggregate
//! `sum(l_extendedprice * (1 - l_discount))` over the lineitems of orders
//! placed inside a date window, labelled with a region name.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              Query Engine                    │
//! │  (validate, partition, dispatch, barrier)   │
//! └──────┬───────────────────────────┬──────────┘
//!        │ one scoped thread         │ commit(region, partial)
//!        │ per partition             │
//! ┌──────┴──────────────┐   ┌────────┴──────────┐
//! │  Join-Filter Worker │──►│ Result Aggregator │
//! │ (date filter, join) │   │  (mutex-guarded)  │
//! └──────┬──────────────┘   └───────────────────┘
//!        │ read-only
//! ┌──────┴──────────────────────────────────────┐
//! │   Row Store (orders, lineitem, index)       │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Table loading and result writing live in [`loader`] and [`writer`].

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod aggregator;
pub mod config;
pub mod engine;
pub mod error;
pub mod join;
pub mod loader;
pub mod partition;
pub mod table;
pub mod writer;

pub use aggregator::{ResultAggregator, ResultMap};
pub use config::{MAX_THREADS, QueryConfig};
pub use engine::{QueryEngine, QueryOutcome, QueryPhase, QueryStats};
pub use error::{Error, Result};
pub use join::{DateWindow, JoinStrategy};
pub use loader::{Catalog, load_catalog, load_table};
pub use partition::{Partition, partition};
pub use table::{Row, Table, TableSchema};
pub use writer::{format_results, write_results};

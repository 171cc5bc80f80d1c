//! Orders ⋈ lineitem join with the order-date filter
//!
//! A worker walks its orders partition, keeps the orders whose
//! `O_ORDERDATE` falls inside the window, and sums
//! `L_EXTENDEDPRICE * (1 - L_DISCOUNT)` over the matching lineitems.
//!
//! Two probe strategies are available:
//! - [`JoinStrategy::NestedLoop`] scans the whole lineitem table for every
//!   qualifying order.
//! - [`JoinStrategy::HashIndex`] builds an order key → row positions index
//!   once, shared read-only across workers. Positions keep table order, so
//!   each order's lineitems are summed in the same order as the scan and the
//!   two strategies return identical totals.

use crate::error::{Error, Result};
use crate::partition::Partition;
use crate::table::Table;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Order key column of `orders`
pub const O_ORDERKEY: &str = "O_ORDERKEY";
/// Order date column of `orders`
pub const O_ORDERDATE: &str = "O_ORDERDATE";
/// Order key column of `lineitem`
pub const L_ORDERKEY: &str = "L_ORDERKEY";
/// Extended price column of `lineitem`
pub const L_EXTENDEDPRICE: &str = "L_EXTENDEDPRICE";
/// Discount column of `lineitem`
pub const L_DISCOUNT: &str = "L_DISCOUNT";

/// How a worker finds the lineitems of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JoinStrategy {
    /// Full lineitem scan per qualifying order
    NestedLoop,
    /// Shared order key index built before dispatch
    #[default]
    HashIndex,
}

impl JoinStrategy {
    /// Stable name used on the command line and in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            JoinStrategy::NestedLoop => "nested-loop",
            JoinStrategy::HashIndex => "hash-index",
        }
    }
}

impl fmt::Display for JoinStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JoinStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "nested-loop" => Ok(JoinStrategy::NestedLoop),
            "hash-index" => Ok(JoinStrategy::HashIndex),
            other => Err(format!(
                "unknown join strategy '{other}' (expected nested-loop or hash-index)"
            )),
        }
    }
}

/// Inclusive order-date window compared as plain strings
///
/// Dates must share one zero-padded format (e.g. `YYYY-MM-DD`) for the
/// comparison to follow calendar order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateWindow {
    /// Earliest accepted date
    pub start: String,
    /// Latest accepted date
    pub end: String,
}

impl DateWindow {
    /// Create a window
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    /// `start <= date <= end`
    #[inline]
    pub fn contains(&self, date: &str) -> bool {
        self.start.as_str() <= date && date <= self.end.as_str()
    }

    /// True when no date can fall inside (`start > end`)
    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }
}

/// Resolved column positions of the lineitem table
#[derive(Debug, Clone, Copy)]
struct LineitemColumns {
    order_key: usize,
    extended_price: usize,
    discount: usize,
}

impl LineitemColumns {
    fn resolve(lineitem: &Table) -> Result<Self> {
        Ok(Self {
            order_key: lineitem.require_column(L_ORDERKEY)?,
            extended_price: lineitem.require_column(L_EXTENDEDPRICE)?,
            discount: lineitem.require_column(L_DISCOUNT)?,
        })
    }
}

/// Order key → lineitem row positions, in table order
pub struct LineitemIndex<'a> {
    table: &'a Table,
    by_order_key: HashMap<&'a str, Vec<usize>>,
}

impl<'a> LineitemIndex<'a> {
    /// Build the index with one pass over `lineitem`
    pub fn build(lineitem: &'a Table) -> Result<Self> {
        let order_key = lineitem.require_column(L_ORDERKEY)?;
        let mut by_order_key: HashMap<&'a str, Vec<usize>> = HashMap::new();
        for row in 0..lineitem.len() {
            let key = lineitem.cell(row, order_key)?;
            by_order_key.entry(key).or_default().push(row);
        }
        debug!(
            rows = lineitem.len(),
            keys = by_order_key.len(),
            "built lineitem order key index"
        );
        Ok(Self {
            table: lineitem,
            by_order_key,
        })
    }

    /// Positions of the lineitems for one order key
    #[inline]
    pub fn rows_for(&self, order_key: &str) -> &[usize] {
        self.by_order_key
            .get(order_key)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of distinct order keys
    pub fn key_count(&self) -> usize {
        self.by_order_key.len()
    }

    /// Indexed table
    pub fn table(&self) -> &'a Table {
        self.table
    }
}

/// Where a worker reads lineitems from
pub enum LineitemSource<'a> {
    /// Scan the table
    Scan(&'a Table),
    /// Probe a prebuilt index
    Index(&'a LineitemIndex<'a>),
}

impl<'a> LineitemSource<'a> {
    /// Underlying lineitem table
    pub fn table(&self) -> &'a Table {
        match self {
            LineitemSource::Scan(table) => table,
            LineitemSource::Index(index) => index.table(),
        }
    }

    /// Strategy this source implements
    pub fn strategy(&self) -> JoinStrategy {
        match self {
            LineitemSource::Scan(_) => JoinStrategy::NestedLoop,
            LineitemSource::Index(_) => JoinStrategy::HashIndex,
        }
    }
}

/// A worker's result for one partition
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PartialTotal {
    /// Summed revenue
    pub revenue: f64,
    /// Orders visited
    pub orders_scanned: usize,
    /// Orders whose date passed the window
    pub orders_in_window: usize,
    /// Lineitems that contributed revenue
    pub lineitems_matched: usize,
}

/// Join one orders partition against lineitem and sum its revenue
///
/// Any missing cell or unparsable price/discount fails the whole partition;
/// no default is substituted.
pub fn join_partition(
    orders: &Table,
    lineitem: &LineitemSource<'_>,
    window: &DateWindow,
    partition: Partition,
) -> Result<PartialTotal> {
    let mut total = PartialTotal::default();
    if partition.is_empty() || window.is_empty() {
        total.orders_scanned = partition.len();
        return Ok(total);
    }

    let order_key_col = orders.require_column(O_ORDERKEY)?;
    let order_date_col = orders.require_column(O_ORDERDATE)?;
    let items = lineitem.table();
    let cols = LineitemColumns::resolve(items)?;

    for row in partition.range() {
        total.orders_scanned += 1;
        let order_date = orders.cell(row, order_date_col)?;
        if !window.contains(order_date) {
            continue;
        }
        total.orders_in_window += 1;
        let order_key = orders.cell(row, order_key_col)?;

        match lineitem {
            LineitemSource::Scan(table) => {
                for item in 0..table.len() {
                    if table.cell(item, cols.order_key)? == order_key {
                        total.revenue += line_revenue(table, item, &cols)?;
                        total.lineitems_matched += 1;
                    }
                }
            }
            LineitemSource::Index(index) => {
                for &item in index.rows_for(order_key) {
                    total.revenue += line_revenue(items, item, &cols)?;
                    total.lineitems_matched += 1;
                }
            }
        }
    }

    Ok(total)
}

/// `extended_price * (1 - discount)` of one lineitem row
#[inline]
fn line_revenue(lineitem: &Table, row: usize, cols: &LineitemColumns) -> Result<f64> {
    let price = parse_decimal(lineitem, row, cols.extended_price, L_EXTENDEDPRICE)?;
    let discount = parse_decimal(lineitem, row, cols.discount, L_DISCOUNT)?;
    Ok(price * (1.0 - discount))
}

fn parse_decimal(table: &Table, row: usize, column: usize, name: &str) -> Result<f64> {
    let text = table.cell(row, column)?;
    text.trim().parse::<f64>().map_err(|e| {
        Error::data(
            table.name(),
            row,
            name,
            format!("cannot parse '{text}' as a number: {e}"),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{LINEITEM, ORDERS};

    fn orders(rows: &[(&str, &str)]) -> Table {
        Table::from_rows(
            &ORDERS,
            rows.iter()
                .map(|(key, date)| vec![*key, "0", "O", "0.00", *date]),
        )
    }

    fn lineitem(rows: &[(&str, &str, &str)]) -> Table {
        Table::from_rows(
            &LINEITEM,
            rows.iter()
                .map(|(key, price, disc)| vec![*key, "0", "0", "1", "1", *price, *disc]),
        )
    }

    fn whole(table: &Table) -> Partition {
        Partition {
            index: 0,
            start: 0,
            end: table.len(),
        }
    }

    fn window_1995() -> DateWindow {
        DateWindow::new("1995-01-01", "1995-12-31")
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let window = window_1995();
        assert!(window.contains("1995-01-01"));
        assert!(window.contains("1995-12-31"));
        assert!(!window.contains("1994-12-31"));
        assert!(!window.contains("1996-01-01"));
    }

    #[test]
    fn test_single_match_revenue() {
        let o = orders(&[("1", "1995-06-01")]);
        let l = lineitem(&[("1", "100.00", "0.10")]);
        let total = join_partition(&o, &LineitemSource::Scan(&l), &window_1995(), whole(&o))
            .unwrap();
        assert!((total.revenue - 90.0).abs() < 1e-9);
        assert_eq!(total.lineitems_matched, 1);
    }

    #[test]
    fn test_out_of_window_order_is_skipped() {
        let o = orders(&[("1", "1994-06-01"), ("2", "1995-03-15")]);
        let l = lineitem(&[("1", "500.00", "0.00"), ("2", "10.00", "0.50")]);
        let total = join_partition(&o, &LineitemSource::Scan(&l), &window_1995(), whole(&o))
            .unwrap();
        assert_eq!(total.revenue, 5.0);
        assert_eq!(total.orders_in_window, 1);
    }

    #[test]
    fn test_order_without_lineitems_contributes_zero() {
        let o = orders(&[("42", "1995-06-01")]);
        let l = lineitem(&[("1", "100.00", "0.10")]);
        let total = join_partition(&o, &LineitemSource::Scan(&l), &window_1995(), whole(&o))
            .unwrap();
        assert_eq!(total.revenue, 0.0);
        assert_eq!(total.orders_in_window, 1);
    }

    #[test]
    fn test_inverted_window_is_zero() {
        let o = orders(&[("1", "1995-06-01")]);
        let l = lineitem(&[("1", "100.00", "0.10")]);
        let window = DateWindow::new("1995-12-31", "1995-01-01");
        let total = join_partition(&o, &LineitemSource::Scan(&l), &window, whole(&o)).unwrap();
        assert_eq!(total.revenue, 0.0);
    }

    #[test]
    fn test_malformed_price_fails() {
        let o = orders(&[("1", "1995-06-01")]);
        let l = lineitem(&[("1", "12x.00", "0.10")]);
        let err = join_partition(&o, &LineitemSource::Scan(&l), &window_1995(), whole(&o))
            .unwrap_err();
        match err {
            Error::Data { column, row, .. } => {
                assert_eq!(column, L_EXTENDEDPRICE);
                assert_eq!(row, 0);
            }
            other => panic!("expected Data error, got {other:?}"),
        }
    }

    #[test]
    fn test_index_matches_scan_exactly() {
        let o = orders(&[
            ("1", "1995-02-01"),
            ("2", "1995-05-05"),
            ("3", "1996-01-01"),
            ("4", "1995-11-30"),
        ]);
        let l = lineitem(&[
            ("1", "1234.56", "0.04"),
            ("2", "99.99", "0.00"),
            ("1", "17.10", "0.10"),
            ("4", "0.33", "0.07"),
            ("3", "1000.00", "0.05"),
            ("1", "81234.01", "0.02"),
        ]);
        let index = LineitemIndex::build(&l).unwrap();
        assert_eq!(index.key_count(), 4);
        assert_eq!(index.rows_for("1"), &[0, 2, 5]);

        let scan = join_partition(&o, &LineitemSource::Scan(&l), &window_1995(), whole(&o))
            .unwrap();
        let probe = join_partition(&o, &LineitemSource::Index(&index), &window_1995(), whole(&o))
            .unwrap();
        assert_eq!(scan, probe);
        assert_eq!(scan.lineitems_matched, 5);
    }

    #[test]
    fn test_strategy_names_round_trip() {
        for strategy in [JoinStrategy::NestedLoop, JoinStrategy::HashIndex] {
            assert_eq!(strategy.as_str().parse::<JoinStrategy>().unwrap(), strategy);
        }
        assert!("merge".parse::<JoinStrategy>().is_err());
    }
}

//! Flat-file table loading
//!
//! TPC-H `dbgen` output: one `<table>.tbl` file per table, one row per line,
//! cells separated by `|`, usually with a trailing `|`.

use crate::error::{Error, Result};
use crate::table::{TPCH_TABLES, Table, TableSchema};
use rayon::prelude::*;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// Cell separator in `.tbl` files
pub const FIELD_DELIMITER: char = '|';

/// File extension of table files
pub const TABLE_EXTENSION: &str = "tbl";

/// Every table read for a query run
#[derive(Debug, Clone)]
pub struct Catalog {
    /// `customer.tbl`
    pub customer: Table,
    /// `orders.tbl`
    pub orders: Table,
    /// `lineitem.tbl`
    pub lineitem: Table,
    /// `supplier.tbl`
    pub supplier: Table,
    /// `nation.tbl`
    pub nation: Table,
    /// `region.tbl`
    pub region: Table,
}

impl Catalog {
    /// Table by name
    pub fn table(&self, name: &str) -> Option<&Table> {
        match name {
            "customer" => Some(&self.customer),
            "orders" => Some(&self.orders),
            "lineitem" => Some(&self.lineitem),
            "supplier" => Some(&self.supplier),
            "nation" => Some(&self.nation),
            "region" => Some(&self.region),
            _ => None,
        }
    }
}

/// Path of a table file inside a directory
pub fn table_file(dir: &Path, schema: &TableSchema) -> PathBuf {
    dir.join(format!("{}.{}", schema.name, TABLE_EXTENSION))
}

/// Load a single table from `<dir>/<name>.tbl`
///
/// Fails with [`Error::Io`] naming the file if it cannot be opened or read;
/// nothing partial is returned.
pub fn load_table(dir: &Path, schema: &TableSchema) -> Result<Table> {
    let path = table_file(dir, schema);
    let start = Instant::now();
    let file = File::open(&path).map_err(|e| Error::io(&path, e))?;

    let mut table = Table::with_schema(schema);
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|e| Error::io(&path, e))?;
        if let Some(values) = split_record(&line) {
            table.push_row(values);
        }
    }

    debug!(
        table = schema.name,
        rows = table.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "loaded table"
    );
    Ok(table)
}

/// Load all six TPC-H tables concurrently
pub fn load_catalog(dir: &Path) -> Result<Catalog> {
    let start = Instant::now();
    let tables: Vec<Table> = TPCH_TABLES
        .par_iter()
        .map(|schema| load_table(dir, schema))
        .collect::<Result<_>>()?;

    // `collect` keeps input order, so the tables line up with TPCH_TABLES.
    let [customer, orders, lineitem, supplier, nation, region]: [Table; 6] = tables
        .try_into()
        .map_err(|_| Error::config("table loader returned an incomplete catalog"))?;
    let catalog = Catalog {
        customer,
        orders,
        lineitem,
        supplier,
        nation,
        region,
    };

    info!(
        path = %dir.display(),
        orders = catalog.orders.len(),
        lineitem = catalog.lineitem.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "catalog loaded"
    );
    Ok(catalog)
}

/// Split one line into cells; `None` for blank lines
fn split_record(line: &str) -> Option<Vec<String>> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    if line.is_empty() {
        return None;
    }
    let line = line.strip_suffix(FIELD_DELIMITER).unwrap_or(line);
    Some(line.split(FIELD_DELIMITER).map(str::to_owned).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{ORDERS, REGION};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_split_record_trailing_delimiter() {
        assert_eq!(
            split_record("1|AMERICA|hs use ironic|").unwrap(),
            vec!["1", "AMERICA", "hs use ironic"]
        );
    }

    #[test]
    fn test_split_record_keeps_empty_inner_cells() {
        assert_eq!(split_record("a||b").unwrap(), vec!["a", "", "b"]);
        assert_eq!(split_record("a||").unwrap(), vec!["a", ""]);
    }

    #[test]
    fn test_split_record_blank_lines() {
        assert!(split_record("").is_none());
        assert!(split_record("\r").is_none());
    }

    #[test]
    fn test_load_table_reads_rows_in_file_order() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("region.tbl"),
            "0|AFRICA|lar deposits|\n1|AMERICA|hs use ironic|\n\n2|ASIA|ges|\n",
        )
        .unwrap();

        let table = load_table(dir.path(), &REGION).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.view(2).unwrap().get("R_NAME"), Some("ASIA"));
    }

    #[test]
    fn test_load_table_missing_file_names_path() {
        let dir = TempDir::new().unwrap();
        let err = load_table(dir.path(), &ORDERS).unwrap_err();
        match err {
            Error::Io { path, .. } => assert!(path.ends_with("orders.tbl")),
            other => panic!("expected Io error, got {other:?}"),
        }
    }
}

//! In-memory row store
//!
//! Tables are loaded once and never mutated afterwards. Every cell is kept as
//! the raw text read from the `.tbl` file; typed extraction happens in the
//! join worker, only for the columns it needs.

use crate::error::{Error, Result};
use std::sync::Arc;

/// Static description of a TPC-H table: file stem and ordered column names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSchema {
    /// Table name, also the `.tbl` file stem
    pub name: &'static str,
    /// Column names in file order
    pub columns: &'static [&'static str],
}

/// `customer` table layout
pub const CUSTOMER: TableSchema = TableSchema {
    name: "customer",
    columns: &[
        "C_CUSTKEY",
        "C_NAME",
        "C_ADDRESS",
        "C_NATIONKEY",
        "C_PHONE",
        "C_ACCTBAL",
        "C_MKTSEGMENT",
        "C_COMMENT",
    ],
};

/// `orders` table layout
pub const ORDERS: TableSchema = TableSchema {
    name: "orders",
    columns: &[
        "O_ORDERKEY",
        "O_CUSTKEY",
        "O_ORDERSTATUS",
        "O_TOTALPRICE",
        "O_ORDERDATE",
        "O_ORDERPRIORITY",
        "O_CLERK",
        "O_SHIPPRIORITY",
        "O_COMMENT",
    ],
};

/// `lineitem` table layout
pub const LINEITEM: TableSchema = TableSchema {
    name: "lineitem",
    columns: &[
        "L_ORDERKEY",
        "L_PARTKEY",
        "L_SUPPKEY",
        "L_LINENUMBER",
        "L_QUANTITY",
        "L_EXTENDEDPRICE",
        "L_DISCOUNT",
        "L_TAX",
        "L_RETURNFLAG",
        "L_LINESTATUS",
        "L_SHIPDATE",
        "L_COMMITDATE",
        "L_RECEIPTDATE",
        "L_SHIPINSTRUCT",
        "L_SHIPMODE",
        "L_COMMENT",
    ],
};

/// `supplier` table layout
pub const SUPPLIER: TableSchema = TableSchema {
    name: "supplier",
    columns: &[
        "S_SUPPKEY",
        "S_NAME",
        "S_ADDRESS",
        "S_NATIONKEY",
        "S_PHONE",
        "S_ACCTBAL",
        "S_COMMENT",
    ],
};

/// `nation` table layout
pub const NATION: TableSchema = TableSchema {
    name: "nation",
    columns: &["N_NATIONKEY", "N_NAME", "N_REGIONKEY", "N_COMMENT"],
};

/// `region` table layout
pub const REGION: TableSchema = TableSchema {
    name: "region",
    columns: &["R_REGIONKEY", "R_NAME", "R_COMMENT"],
};

/// Every table the loader reads, in load order
pub const TPCH_TABLES: [TableSchema; 6] = [CUSTOMER, ORDERS, LINEITEM, SUPPLIER, NATION, REGION];

/// One row: cell values in column order
///
/// A row may hold fewer values than its table has columns when the source
/// line was short; the missing trailing cells read as absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    values: Vec<String>,
}

impl Row {
    /// Value at a column position, if present
    #[inline]
    pub fn value(&self, column: usize) -> Option<&str> {
        self.values.get(column).map(String::as_str)
    }

    /// Number of cells present
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when the row holds no cells
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Borrowed view of a row that resolves cells by column name
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    columns: &'a [String],
    row: &'a Row,
}

impl<'a> RowView<'a> {
    /// Cell by column name
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.row.value(idx)
    }

    /// `(column, value)` pairs in column order, present cells only
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.row.values.iter().map(String::as_str))
    }
}

/// An ordered, position-addressable sequence of rows
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    columns: Arc<[String]>,
    rows: Vec<Row>,
}

impl Table {
    /// Create an empty table with the given column names
    pub fn new<I, S>(name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Create an empty table laid out by a TPC-H schema
    pub fn with_schema(schema: &TableSchema) -> Self {
        Self::new(schema.name, schema.columns.iter().copied())
    }

    /// Build a table from literal rows
    pub fn from_rows<R, S>(schema: &TableSchema, rows: impl IntoIterator<Item = R>) -> Self
    where
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::with_schema(schema);
        for row in rows {
            table.push_row(row.into_iter().map(Into::into).collect());
        }
        table
    }

    /// Append a row; values past the last column are dropped
    pub fn push_row(&mut self, mut values: Vec<String>) {
        values.truncate(self.columns.len());
        self.rows.push(Row { values });
    }

    /// Table name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Column names in order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Position of a column
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Position of a column, or a data error naming the table
    pub fn require_column(&self, column: &str) -> Result<usize> {
        self.column_index(column).ok_or_else(|| Error::MissingColumn {
            table: self.name.clone(),
            column: column.to_string(),
        })
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Raw row by position
    #[inline]
    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    /// Named view of a row by position
    pub fn view(&self, index: usize) -> Option<RowView<'_>> {
        self.rows.get(index).map(|row| RowView {
            columns: &self.columns,
            row,
        })
    }

    /// All rows in insertion order
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Cell at `(row, column)` or a data error describing what is missing
    #[inline]
    pub fn cell(&self, row: usize, column: usize) -> Result<&str> {
        let record = self.rows.get(row).ok_or_else(|| {
            Error::data(&self.name, row, self.column_name(column), "row out of range")
        })?;
        record.value(column).ok_or_else(|| {
            Error::data(&self.name, row, self.column_name(column), "cell is missing")
        })
    }

    fn column_name(&self, column: usize) -> &str {
        self.columns.get(column).map(String::as_str).unwrap_or("?")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_row_truncates_surplus_fields() {
        let mut table = Table::with_schema(&REGION);
        table.push_row(vec![
            "0".into(),
            "AFRICA".into(),
            "comment".into(),
            "extra".into(),
        ]);
        assert_eq!(table.row(0).unwrap().len(), 3);
    }

    #[test]
    fn test_view_resolves_by_name() {
        let table = Table::from_rows(&NATION, [["7", "GERMANY", "3", "c"]]);
        let view = table.view(0).unwrap();
        assert_eq!(view.get("N_NAME"), Some("GERMANY"));
        assert_eq!(view.get("N_UNKNOWN"), None);

        let pairs: Vec<_> = view.iter().collect();
        assert_eq!(pairs[0], ("N_NATIONKEY", "7"));
        assert_eq!(pairs.len(), 4);
    }

    #[test]
    fn test_short_row_reads_missing_cell() {
        let table = Table::from_rows(&REGION, [vec!["1"]]);
        assert_eq!(table.row(0).unwrap().value(1), None);

        let err = table.cell(0, 1).unwrap_err();
        assert!(matches!(err, Error::Data { row: 0, .. }));
        assert!(err.to_string().contains("R_NAME"));
    }

    #[test]
    fn test_require_column() {
        let table = Table::with_schema(&ORDERS);
        assert_eq!(table.require_column("O_ORDERDATE").unwrap(), 4);
        assert!(matches!(
            table.require_column("L_DISCOUNT"),
            Err(Error::MissingColumn { .. })
        ));
    }
}

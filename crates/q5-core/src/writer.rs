//! Result file output
//!
//! One `region<TAB>revenue` line per map entry, in key order. The file is
//! staged next to its destination and renamed into place, so the path never
//! holds a half-written result.

use crate::aggregator::ResultMap;
use crate::error::{Error, Result};
use std::fmt::Write as _;
use std::io::Write as _;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::info;

/// Render the result map as `name\tvalue\n` lines
pub fn format_results(results: &ResultMap) -> String {
    let mut out = String::new();
    for (region, revenue) in results {
        // Writing into a String cannot fail.
        let _ = writeln!(out, "{region}\t{revenue}");
    }
    out
}

/// Atomically write the result map to `path`
pub fn write_results(path: &Path, results: &ResultMap) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut staged = NamedTempFile::new_in(dir).map_err(|e| Error::io(path, e))?;
    staged
        .write_all(format_results(results).as_bytes())
        .and_then(|()| staged.as_file().sync_all())
        .map_err(|e| Error::io(path, e))?;
    staged.persist(path).map_err(|e| Error::io(path, e.error))?;

    info!(path = %path.display(), entries = results.len(), "results written");
    Ok(())
}

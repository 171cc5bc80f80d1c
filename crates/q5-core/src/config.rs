//! Query configuration

use crate::error::{Error, Result};
use crate::join::{DateWindow, JoinStrategy};
use chrono::NaiveDate;
use tracing::warn;

/// Date layout the window comparison assumes
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Largest accepted worker count; each thread owns one orders partition
pub const MAX_THREADS: usize = 4096;

/// Parameters of one revenue query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryConfig {
    /// Label of the output bucket (`--r_name`)
    pub region_name: String,
    /// Inclusive lower order-date bound
    pub start_date: String,
    /// Inclusive upper order-date bound
    pub end_date: String,
    /// Number of orders partitions, one worker each
    pub threads: usize,
    /// Lineitem probe strategy
    pub join_strategy: JoinStrategy,
}

impl QueryConfig {
    /// Create a single-threaded config with the default join strategy
    pub fn new(
        region_name: impl Into<String>,
        start_date: impl Into<String>,
        end_date: impl Into<String>,
    ) -> Self {
        Self {
            region_name: region_name.into(),
            start_date: start_date.into(),
            end_date: end_date.into(),
            threads: 1,
            join_strategy: JoinStrategy::default(),
        }
    }

    /// Set the worker count
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Set the join strategy
    pub fn with_join_strategy(mut self, strategy: JoinStrategy) -> Self {
        self.join_strategy = strategy;
        self
    }

    /// Reject configurations the engine cannot run
    ///
    /// Dates that are not `YYYY-MM-DD` are accepted with a warning: the
    /// window still compares them as strings.
    pub fn validate(&self) -> Result<()> {
        if self.threads == 0 {
            return Err(Error::config("thread count must be a positive integer"));
        }
        if self.threads > MAX_THREADS {
            return Err(Error::config(format!(
                "thread count {} exceeds the limit of {MAX_THREADS}",
                self.threads
            )));
        }
        if self.region_name.is_empty() {
            return Err(Error::config("region name must not be empty"));
        }
        for (flag, value) in [("start date", &self.start_date), ("end date", &self.end_date)] {
            if value.is_empty() {
                return Err(Error::config(format!("{flag} must not be empty")));
            }
            if NaiveDate::parse_from_str(value, DATE_FORMAT).is_err() {
                warn!(
                    date = %value,
                    "{flag} is not in YYYY-MM-DD form; comparing as plain text"
                );
            }
        }
        if self.start_date > self.end_date {
            warn!(
                start = %self.start_date,
                end = %self.end_date,
                "date window is empty; revenue will be 0"
            );
        }
        Ok(())
    }

    /// The order-date window
    pub fn window(&self) -> DateWindow {
        DateWindow::new(self.start_date.clone(), self.end_date.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        let config = QueryConfig::new("ASIA", "1994-01-01", "1994-12-31").with_threads(4);
        assert!(config.validate().is_ok());
        assert_eq!(config.window(), DateWindow::new("1994-01-01", "1994-12-31"));
        assert_eq!(config.join_strategy, JoinStrategy::HashIndex);
    }

    #[test]
    fn test_zero_threads_rejected() {
        let config = QueryConfig::new("ASIA", "1994-01-01", "1994-12-31").with_threads(0);
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_thread_count_above_limit_rejected() {
        for threads in [MAX_THREADS + 1, 1 << 30, usize::MAX] {
            let config =
                QueryConfig::new("ASIA", "1994-01-01", "1994-12-31").with_threads(threads);
            match config.validate() {
                Err(Error::Config(msg)) => assert!(msg.contains("exceeds the limit"), "{msg}"),
                other => panic!("threads = {threads}: expected config error, got {other:?}"),
            }
        }
        let config =
            QueryConfig::new("ASIA", "1994-01-01", "1994-12-31").with_threads(MAX_THREADS);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_fields_rejected() {
        assert!(QueryConfig::new("", "1994-01-01", "1994-12-31").validate().is_err());
        assert!(QueryConfig::new("ASIA", "", "1994-12-31").validate().is_err());
        assert!(QueryConfig::new("ASIA", "1994-01-01", "").validate().is_err());
    }

    #[test]
    fn test_non_iso_dates_are_accepted() {
        let config = QueryConfig::new("ASIA", "19940101", "19941231");
        assert!(config.validate().is_ok());
    }
}

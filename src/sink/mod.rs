//! Persistence sinks for traffic reports
//!
//! "Do X": Store a fetched report somewhere durable.
//!
//! - **CsvSink**: appends rows to one CSV file per metric kind
//! - **DatabaseSink**: writes SQLite tables with per-row existence checks
//!
//! Both take a `RunContext` holding the run's start time, which stamps CSV
//! file names and dates overview rows.
//!
//! # Example
//!
//! ```no_run
//! use gts::sink::{CsvSink, RunContext, Sink};
//! use gts::traffic::{MetricKind, Report, TrafficReport};
//!
//! let context = RunContext::new("data");
//! let sink = CsvSink::new(&context);
//! let report = Report::Traffic(TrafficReport::new(MetricKind::Views, 0, 0));
//! sink.persist("hello-world", &report)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod csv;
pub mod database;

pub use self::csv::CsvSink;
pub use self::database::DatabaseSink;

use anyhow::Result;
use chrono::{DateTime, Local, NaiveDate};
use std::path::{Path, PathBuf};

use crate::traffic::Report;

/// Destination for reports.
pub trait Sink {
    /// Store one report for `repo`.
    fn persist(&self, repo: &str, report: &Report) -> Result<()>;
}

/// Values fixed for the duration of one run.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub started_at: DateTime<Local>,
    pub output_dir: PathBuf,
}

impl RunContext {
    /// Context starting now.
    pub fn new(output_dir: impl AsRef<Path>) -> Self {
        Self::at(Local::now(), output_dir)
    }

    pub fn at(started_at: DateTime<Local>, output_dir: impl AsRef<Path>) -> Self {
        Self {
            started_at,
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }

    /// File name prefix, e.g. `2023-01-01-09h-30m`
    pub fn stamp(&self) -> String {
        self.started_at.format("%Y-%m-%d-%Hh-%Mm").to_string()
    }

    /// Calendar day of the run
    pub fn day(&self) -> NaiveDate {
        self.started_at.date_naive()
    }
}

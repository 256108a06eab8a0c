//! CSV sink
//!
//! One file per metric kind, stamped with the run start:
//! `{stamp}-traffic-stats.csv`, `{stamp}-clone-stats.csv`,
//! `{stamp}-referrer-stats.csv`.
//!
//! Before every append the file is initialized: a missing file is created
//! with its header, an existing file (even an empty one) is appended to as is.
//! Appends are not idempotent.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ::csv::{Terminator, Writer, WriterBuilder};

use crate::traffic::{MetricKind, Report};

use super::{RunContext, Sink};

const UNIQUES_COLUMN: &str = "unique_visitors/cloners";

/// Appends report rows to per-kind CSV files.
#[derive(Debug, Clone)]
pub struct CsvSink {
    dir: PathBuf,
    stamp: String,
}

impl CsvSink {
    pub fn new(context: &RunContext) -> Self {
        Self {
            dir: context.output_dir.clone(),
            stamp: context.stamp(),
        }
    }

    /// File that rows of `kind` go to.
    pub fn path(&self, kind: MetricKind) -> PathBuf {
        let suffix = match kind {
            MetricKind::Views => "traffic-stats",
            MetricKind::Clones => "clone-stats",
            MetricKind::Referrers => "referrer-stats",
        };
        self.dir.join(format!("{}-{}.csv", self.stamp, suffix))
    }

    /// Open `path` for appending, writing `header` only if the file is new.
    fn prepare(&self, path: &Path, header: [&str; 4]) -> Result<Writer<File>> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;

        let is_new = !path.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;

        let mut writer = WriterBuilder::new()
            .terminator(Terminator::CRLF)
            .from_writer(file);

        if is_new {
            writer
                .write_record(header)
                .with_context(|| format!("Failed to write header to {}", path.display()))?;
            log::info!("Created {}", path.display());
        }

        Ok(writer)
    }
}

fn header(kind: MetricKind) -> [&'static str; 4] {
    match kind {
        MetricKind::Views | MetricKind::Clones => ["repository_name", "date", kind.key(), UNIQUES_COLUMN],
        MetricKind::Referrers => ["repository_name", "site", "views", UNIQUES_COLUMN],
    }
}

/// `(key, count, uniques)` rows of a report, in report order.
fn rows(report: &Report) -> Vec<(&str, i64, i64)> {
    match report {
        Report::Traffic(traffic) => traffic
            .daily
            .iter()
            .map(|d| (d.date.as_str(), d.count, d.uniques))
            .collect(),
        Report::Referrers(referrers) => referrers
            .sites
            .iter()
            .map(|s| (s.site.as_str(), s.count, s.uniques))
            .collect(),
    }
}

impl Sink for CsvSink {
    fn persist(&self, repo: &str, report: &Report) -> Result<()> {
        let kind = report.kind();
        let path = self.path(kind);
        let mut writer = self.prepare(&path, header(kind))?;

        let rows = rows(report);
        for &(key, count, uniques) in &rows {
            writer
                .write_record([repo.to_string(), key.to_string(), count.to_string(), uniques.to_string()])
                .with_context(|| format!("Failed to write row to {}", path.display()))?;
        }
        writer
            .flush()
            .with_context(|| format!("Failed to flush {}", path.display()))?;

        log::info!("{}: {} {} rows -> {}", repo, rows.len(), kind, path.display());
        Ok(())
    }
}

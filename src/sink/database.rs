//! SQLite sink
//!
//! Opens a fresh connection per report (autocommit, no transaction) and
//! checks each row before writing:
//!
//! - `repo_overview`: one row per repo, metric and run day; insert if absent
//! - `repo_visitors` / `repo_clones`: one row per repo and timestamp; insert if absent
//! - `repo_referrals`: one row per repo and site; insert, or update counts

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection};

use crate::traffic::{MetricKind, ReferrerReport, Report, TrafficReport};

use super::{RunContext, Sink};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS repo_overview (
        create_timestamp date,
        Repo_Name text,
        Result_Type text,
        Uniques int,
        Total int
    );
    CREATE TABLE IF NOT EXISTS repo_visitors (
        Repo_Name text,
        create_timestamp text,
        Uniques int,
        Total int
    );
    CREATE TABLE IF NOT EXISTS repo_clones (
        Repo_Name text,
        create_timestamp text,
        Uniques int,
        Total int
    );
    CREATE TABLE IF NOT EXISTS repo_referrals (
        Repo_Name text,
        Referral text,
        Uniques int,
        Total int
    );
";

/// Writes reports into a SQLite database file.
#[derive(Debug, Clone)]
pub struct DatabaseSink {
    path: PathBuf,
    day: NaiveDate,
}

impl DatabaseSink {
    pub fn new(path: impl AsRef<Path>, context: &RunContext) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            day: context.day(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path)
            .with_context(|| format!("Failed to open database {}", self.path.display()))?;
        conn.execute_batch(SCHEMA)
            .context("Failed to create traffic tables")?;
        Ok(conn)
    }
}

impl Sink for DatabaseSink {
    fn persist(&self, repo: &str, report: &Report) -> Result<()> {
        let conn = self.connect()?;

        match report {
            Report::Traffic(traffic) => {
                let table = daily_table(traffic.kind)
                    .with_context(|| format!("No daily table for {} reports", traffic.kind))?;
                let overview = insert_overview(&conn, self.day, repo, traffic)?;
                let daily = insert_daily(&conn, table, repo, traffic)?;
                log::info!(
                    "{}: {} overview, {} new {} rows",
                    repo,
                    if overview { "new" } else { "existing" },
                    daily,
                    traffic.kind
                );
            }
            Report::Referrers(referrers) => {
                let (inserted, updated) = upsert_referrals(&conn, repo, referrers)?;
                log::info!("{}: {} referrals inserted, {} updated", repo, inserted, updated);
            }
        }

        Ok(())
    }
}

/// Detail table for a date-series kind. Referrers have none.
fn daily_table(kind: MetricKind) -> Option<&'static str> {
    match kind {
        MetricKind::Views => Some("repo_visitors"),
        MetricKind::Clones => Some("repo_clones"),
        MetricKind::Referrers => None,
    }
}

/// Insert today's summary unless one exists. Returns whether a row was written.
fn insert_overview(conn: &Connection, day: NaiveDate, repo: &str, report: &TrafficReport) -> Result<bool> {
    let existing: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM repo_overview
             WHERE create_timestamp = ?1 AND Repo_Name = ?2 AND Result_Type = ?3",
            params![day, repo, report.kind.key()],
            |row| row.get(0),
        )
        .context("Failed to query repo_overview")?;

    if existing > 0 {
        return Ok(false);
    }

    conn.execute(
        "INSERT INTO repo_overview (create_timestamp, Repo_Name, Result_Type, Uniques, Total)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![day, repo, report.kind.key(), report.total_uniques, report.total_count],
    )
    .context("Failed to insert into repo_overview")?;

    Ok(true)
}

/// Insert each day not yet stored. Returns the number of rows written.
fn insert_daily(conn: &Connection, table: &str, repo: &str, report: &TrafficReport) -> Result<usize> {
    let exists_sql = format!(
        "SELECT COUNT(*) FROM {} WHERE Repo_Name = ?1 AND create_timestamp = ?2",
        table
    );
    let insert_sql = format!(
        "INSERT INTO {} (Repo_Name, create_timestamp, Uniques, Total) VALUES (?1, ?2, ?3, ?4)",
        table
    );

    let mut inserted = 0;
    for day in &report.daily {
        let existing: i64 = conn
            .query_row(&exists_sql, params![repo, day.timestamp], |row| row.get(0))
            .with_context(|| format!("Failed to query {}", table))?;
        if existing > 0 {
            continue;
        }

        conn.execute(&insert_sql, params![repo, day.timestamp, day.uniques, day.count])
            .with_context(|| format!("Failed to insert into {}", table))?;
        inserted += 1;
    }

    Ok(inserted)
}

/// Insert new sites and refresh counts of known ones. Returns (inserted, updated).
fn upsert_referrals(conn: &Connection, repo: &str, report: &ReferrerReport) -> Result<(usize, usize)> {
    let mut inserted = 0;
    let mut updated = 0;

    for site in &report.sites {
        let existing: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM repo_referrals WHERE Repo_Name = ?1 AND Referral = ?2",
                params![repo, site.site],
                |row| row.get(0),
            )
            .context("Failed to query repo_referrals")?;

        if existing > 0 {
            conn.execute(
                "UPDATE repo_referrals SET Uniques = ?1, Total = ?2
                 WHERE Repo_Name = ?3 AND Referral = ?4",
                params![site.uniques, site.count, repo, site.site],
            )
            .context("Failed to update repo_referrals")?;
            updated += 1;
        } else {
            conn.execute(
                "INSERT INTO repo_referrals (Repo_Name, Referral, Uniques, Total)
                 VALUES (?1, ?2, ?3, ?4)",
                params![repo, site.site, site.uniques, site.count],
            )
            .context("Failed to insert into repo_referrals")?;
            inserted += 1;
        }
    }

    Ok((inserted, updated))
}

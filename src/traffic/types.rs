//! Report types for repository traffic.
//!
//! Keyed tables keep first-seen order. A repeated key replaces the value in
//! place rather than moving the entry to the end.

use super::MetricKind;

/// One day of views or clones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyCount {
    /// Raw ISO-8601 timestamp as returned by the API
    pub timestamp: String,
    /// UTC calendar date, the first 10 characters of `timestamp`
    pub date: String,
    pub count: i64,
    pub uniques: i64,
}

/// Views or clones for one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrafficReport {
    pub kind: MetricKind,
    /// Server-supplied total
    pub total_count: i64,
    /// Server-supplied unique visitors/cloners
    pub total_uniques: i64,
    pub daily: Vec<DailyCount>,
}

impl TrafficReport {
    pub fn new(kind: MetricKind, total_count: i64, total_uniques: i64) -> Self {
        Self {
            kind,
            total_count,
            total_uniques,
            daily: Vec::new(),
        }
    }

    /// Record a day. A date already present keeps its position and takes the new values.
    pub fn insert_day(&mut self, timestamp: &str, count: i64, uniques: i64) {
        let date = utc_date(timestamp);
        let entry = DailyCount {
            timestamp: timestamp.to_string(),
            date,
            count,
            uniques,
        };

        match self.daily.iter_mut().find(|d| d.date == entry.date) {
            Some(existing) => *existing = entry,
            None => self.daily.push(entry),
        }
    }
}

/// Visits from one referring site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteCount {
    pub site: String,
    pub count: i64,
    pub uniques: i64,
}

/// Referring sites for one repository. Totals are summed client-side.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferrerReport {
    pub total_count: i64,
    pub total_uniques: i64,
    pub sites: Vec<SiteCount>,
}

impl ReferrerReport {
    /// Record a referrer row. Totals always accumulate, even when the site repeats.
    pub fn insert_site(&mut self, site: &str, count: i64, uniques: i64) {
        self.total_count += count;
        self.total_uniques += uniques;

        let entry = SiteCount {
            site: site.to_string(),
            count,
            uniques,
        };
        match self.sites.iter_mut().find(|s| s.site == site) {
            Some(existing) => *existing = entry,
            None => self.sites.push(entry),
        }
    }
}

/// A fetched report of any kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Report {
    Traffic(TrafficReport),
    Referrers(ReferrerReport),
}

impl Report {
    pub fn kind(&self) -> MetricKind {
        match self {
            Report::Traffic(report) => report.kind,
            Report::Referrers(_) => MetricKind::Referrers,
        }
    }

    pub fn total_count(&self) -> i64 {
        match self {
            Report::Traffic(report) => report.total_count,
            Report::Referrers(report) => report.total_count,
        }
    }

    pub fn total_uniques(&self) -> i64 {
        match self {
            Report::Traffic(report) => report.total_uniques,
            Report::Referrers(report) => report.total_uniques,
        }
    }
}

/// First 10 characters of an ISO-8601 timestamp (`YYYY-MM-DD`).
pub fn utc_date(timestamp: &str) -> String {
    timestamp.chars().take(10).collect()
}

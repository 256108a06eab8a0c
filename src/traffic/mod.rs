//! Traffic reports for GitHub repositories.
//!
//! "Do X": Turn traffic API payloads into ordered reports.
//!
//! Three metric kinds share one pipeline: views and clones are date-series
//! with server totals, referrers are a flat list with client-side totals.
//!
//! # Example
//!
//! ```
//! use gts::traffic::{parse_report, ApiResponse, MetricKind, Report};
//!
//! let body = serde_json::json!({
//!     "count": 5,
//!     "uniques": 3,
//!     "views": [{"timestamp": "2023-01-01T00:00:00Z", "count": 5, "uniques": 3}]
//! });
//! match parse_report(MetricKind::Views, body)? {
//!     ApiResponse::Data(Report::Traffic(report)) => assert_eq!(report.daily.len(), 1),
//!     _ => unreachable!(),
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```

mod types;

pub use types::{utc_date, DailyCount, ReferrerReport, Report, SiteCount, TrafficReport};

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;

/// Which traffic endpoint a report comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    Views,
    Clones,
    Referrers,
}

impl MetricKind {
    /// Fetch order within one repository.
    pub const ALL: [MetricKind; 3] = [MetricKind::Views, MetricKind::Clones, MetricKind::Referrers];

    /// Path below `/repos/{owner}/{repo}/`.
    pub fn endpoint(self) -> &'static str {
        match self {
            MetricKind::Views => "traffic/views",
            MetricKind::Clones => "traffic/clones",
            MetricKind::Referrers => "traffic/popular/referrers",
        }
    }

    /// Name used for the detail list in the payload, the CSV metric column and overview rows.
    pub fn key(self) -> &'static str {
        match self {
            MetricKind::Views => "views",
            MetricKind::Clones => "clones",
            MetricKind::Referrers => "referrers",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A payload, or the `{"message": ...}` body GitHub sends in its place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiResponse<T> {
    Data(T),
    Unavailable(String),
}

/// Extract the error message GitHub substitutes for the expected body.
pub fn api_message(body: &Value) -> Option<String> {
    let message = body.as_object()?.get("message")?;
    match message {
        Value::String(text) if text.is_empty() => None,
        Value::String(text) => Some(text.clone()),
        Value::Null | Value::Bool(false) => None,
        other => Some(other.to_string()),
    }
}

// ============================================================================
// Wire types (match API output format)
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawTotals {
    count: i64,
    uniques: i64,
}

#[derive(Debug, Deserialize)]
struct RawDay {
    timestamp: String,
    count: i64,
    uniques: i64,
}

#[derive(Debug, Deserialize)]
struct RawReferrer {
    referrer: String,
    count: i64,
    uniques: i64,
}

/// Parse a traffic payload for `kind`, detecting message bodies first.
pub fn parse_report(kind: MetricKind, mut body: Value) -> Result<ApiResponse<Report>> {
    if let Some(message) = api_message(&body) {
        return Ok(ApiResponse::Unavailable(message));
    }

    let report = match kind {
        MetricKind::Views | MetricKind::Clones => {
            let details = body
                .get_mut(kind.key())
                .map(Value::take)
                .with_context(|| format!("Traffic payload has no '{}' list", kind.key()))?;
            let totals: RawTotals = serde_json::from_value(body)
                .with_context(|| format!("Failed to parse {} totals", kind))?;
            let days: Vec<RawDay> = serde_json::from_value(details)
                .with_context(|| format!("Failed to parse {} entries", kind))?;

            let mut report = TrafficReport::new(kind, totals.count, totals.uniques);
            for day in &days {
                report.insert_day(&day.timestamp, day.count, day.uniques);
            }
            Report::Traffic(report)
        }
        MetricKind::Referrers => {
            let rows: Vec<RawReferrer> =
                serde_json::from_value(body).context("Failed to parse referrers")?;

            let mut report = ReferrerReport::default();
            for row in &rows {
                report.insert_site(&row.referrer, row.count, row.uniques);
            }
            Report::Referrers(report)
        }
    };

    Ok(ApiResponse::Data(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data(response: ApiResponse<Report>) -> Report {
        match response {
            ApiResponse::Data(report) => report,
            ApiResponse::Unavailable(message) => panic!("unexpected message: {}", message),
        }
    }

    #[test]
    fn test_parse_views() {
        let body = json!({
            "count": 14,
            "uniques": 6,
            "views": [
                {"timestamp": "2023-01-01T00:00:00Z", "count": 5, "uniques": 3},
                {"timestamp": "2023-01-02T00:00:00Z", "count": 9, "uniques": 4}
            ]
        });

        let Report::Traffic(report) = data(parse_report(MetricKind::Views, body).unwrap()) else {
            panic!("expected traffic report");
        };
        assert_eq!(report.kind, MetricKind::Views);
        assert_eq!(report.total_count, 14);
        assert_eq!(report.total_uniques, 6);
        assert_eq!(report.daily.len(), 2);
        assert_eq!(report.daily[1].date, "2023-01-02");
    }

    #[test]
    fn test_parse_clones_uses_clones_key() {
        let body = json!({
            "count": 2,
            "uniques": 1,
            "clones": [{"timestamp": "2023-03-04T00:00:00Z", "count": 2, "uniques": 1}]
        });
        let report = data(parse_report(MetricKind::Clones, body).unwrap());
        assert_eq!(report.kind(), MetricKind::Clones);

        let wrong = json!({"count": 2, "uniques": 1, "views": []});
        assert!(parse_report(MetricKind::Clones, wrong).is_err());
    }

    #[test]
    fn test_parse_empty_details() {
        let body = json!({"count": 0, "uniques": 0, "views": []});
        let Report::Traffic(report) = data(parse_report(MetricKind::Views, body).unwrap()) else {
            panic!("expected traffic report");
        };
        assert!(report.daily.is_empty());
    }

    #[test]
    fn test_parse_referrers_sums_totals() {
        let body = json!([
            {"referrer": "github.com", "count": 10, "uniques": 4},
            {"referrer": "news.ycombinator.com", "count": 7, "uniques": 5}
        ]);
        let report = data(parse_report(MetricKind::Referrers, body).unwrap());
        assert_eq!(report.total_count(), 17);
        assert_eq!(report.total_uniques(), 9);
    }

    #[test]
    fn test_message_body_is_unavailable() {
        let body = json!({"message": "Not Found", "documentation_url": "https://docs.github.com"});
        for kind in MetricKind::ALL {
            let response = parse_report(kind, body.clone()).unwrap();
            assert_eq!(response, ApiResponse::Unavailable("Not Found".to_string()));
        }
    }

    #[test]
    fn test_api_message_ignores_lists_and_empty() {
        assert_eq!(api_message(&json!([])), None);
        assert_eq!(api_message(&json!({"message": ""})), None);
        assert_eq!(api_message(&json!({"count": 1})), None);
        assert_eq!(api_message(&json!({"message": "Bad"})), Some("Bad".to_string()));
    }

    #[test]
    fn test_endpoints() {
        assert_eq!(MetricKind::Views.endpoint(), "traffic/views");
        assert_eq!(MetricKind::Clones.endpoint(), "traffic/clones");
        assert_eq!(MetricKind::Referrers.endpoint(), "traffic/popular/referrers");
    }
}

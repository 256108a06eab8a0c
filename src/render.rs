//! Terminal tables for traffic reports
//!
//! Tab-separated layout:
//!
//! ```text
//! > repo - Visitors
//! Date        Views   Unique visitors
//! Totals      #       #
//! date        #       #
//! ```
//!
//! Rows follow the report's first-seen order; nothing is sorted.

use crate::traffic::{MetricKind, ReferrerReport, Report, TrafficReport};

/// Site names this long or longer are cut to keep columns aligned.
const SITE_WIDTH: usize = 8;

/// Heading and column labels for a metric kind.
pub struct Labels {
    pub title: &'static str,
    pub metric: &'static str,
    pub uniques: &'static str,
}

pub fn labels(kind: MetricKind) -> Labels {
    match kind {
        MetricKind::Views => Labels {
            title: "Visitors",
            metric: "Views",
            uniques: "Unique visitors",
        },
        MetricKind::Clones => Labels {
            title: "Git clones",
            metric: "Clones",
            uniques: "Unique cloners",
        },
        MetricKind::Referrers => Labels {
            title: "Referring sites",
            metric: "Views",
            uniques: "Unique visitors",
        },
    }
}

/// Render any report as a table.
pub fn render_table(repo: &str, report: &Report) -> String {
    match report {
        Report::Traffic(traffic) => render_traffic(repo, traffic),
        Report::Referrers(referrers) => render_referrers(repo, referrers),
    }
}

fn header(repo: &str, kind: MetricKind, total_count: i64, total_uniques: i64) -> String {
    let labels = labels(kind);
    format!(
        "> {} - {}\nDate\t\t{}\t{}\nTotals\t\t{}\t{}\n",
        repo, labels.title, labels.metric, labels.uniques, total_count, total_uniques
    )
}

pub fn render_traffic(repo: &str, report: &TrafficReport) -> String {
    let mut table = header(repo, report.kind, report.total_count, report.total_uniques);
    for day in &report.daily {
        table.push_str(&format!("{}\t{}\t{}\n", day.date, day.count, day.uniques));
    }
    table
}

pub fn render_referrers(repo: &str, report: &ReferrerReport) -> String {
    let mut table = header(
        repo,
        MetricKind::Referrers,
        report.total_count,
        report.total_uniques,
    );
    for site in &report.sites {
        table.push_str(&format!(
            "{}\t{}\t{} \n",
            site_column(&site.site),
            site.count,
            site.uniques
        ));
    }
    table
}

/// Site name padded or truncated to fill the first column.
fn site_column(site: &str) -> String {
    if site.chars().count() >= SITE_WIDTH {
        let short: String = site.chars().take(SITE_WIDTH).collect();
        format!("{}...", short)
    } else {
        format!("{}\t", site)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn views(entries: &[(&str, i64, i64)], count: i64, uniques: i64) -> TrafficReport {
        let mut report = TrafficReport::new(MetricKind::Views, count, uniques);
        for (ts, c, u) in entries {
            report.insert_day(ts, *c, *u);
        }
        report
    }

    #[test]
    fn test_single_day_table() {
        let report = views(&[("2023-01-01T00:00:00Z", 5, 3)], 5, 3);
        let table = render_traffic("demo", &report);

        assert_eq!(
            table,
            "> demo - Visitors\n\
             Date\t\tViews\tUnique visitors\n\
             Totals\t\t5\t3\n\
             2023-01-01\t5\t3\n"
        );
    }

    #[test]
    fn test_totals_come_from_server() {
        // Server totals deliberately differ from the sum of days
        let report = views(
            &[
                ("2023-01-01T00:00:00Z", 1, 1),
                ("2023-01-02T00:00:00Z", 2, 1),
                ("2023-01-03T00:00:00Z", 3, 2),
            ],
            40,
            17,
        );
        let table = render_traffic("demo", &report);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[2], "Totals\t\t40\t17");
        assert_eq!(lines.len(), 6);
    }

    #[test]
    fn test_rows_keep_insertion_order() {
        let report = views(
            &[("2023-01-05T00:00:00Z", 1, 1), ("2023-01-02T00:00:00Z", 2, 2)],
            3,
            3,
        );
        let table = render_traffic("demo", &report);
        let lines: Vec<&str> = table.lines().collect();
        assert!(lines[3].starts_with("2023-01-05"));
        assert!(lines[4].starts_with("2023-01-02"));
    }

    #[test]
    fn test_clones_labels() {
        let report = TrafficReport::new(MetricKind::Clones, 0, 0);
        let table = render_traffic("demo", &report);
        assert!(table.starts_with("> demo - Git clones\nDate\t\tClones\tUnique cloners\n"));
    }

    #[test]
    fn test_referrer_rows() {
        let mut report = ReferrerReport::default();
        report.insert_site("news.ycombinator.com", 12, 9);
        report.insert_site("t.co", 2, 2);
        report.insert_site("google.c", 1, 1);

        let table = render_referrers("demo", &report);
        let lines: Vec<&str> = table.split('\n').collect();

        assert_eq!(lines[0], "> demo - Referring sites");
        assert_eq!(lines[1], "Date\t\tViews\tUnique visitors");
        assert_eq!(lines[2], "Totals\t\t15\t12");
        assert_eq!(lines[3], "news.yco...\t12\t9 ");
        assert_eq!(lines[4], "t.co\t\t2\t2 ");
        assert_eq!(lines[5], "google.c...\t1\t1 ");
    }

    #[test]
    fn test_render_table_dispatch() {
        let report = Report::Referrers(ReferrerReport::default());
        assert_eq!(
            render_table("demo", &report),
            "> demo - Referring sites\nDate\t\tViews\tUnique visitors\nTotals\t\t0\t0\n"
        );
    }
}

//! Traffic collection run
//!
//! "Do X": Fetch, print and store traffic for one repository or all of them.
//!
//! For each repository the three reports are fetched in order (views, clones,
//! referrers), then printed, then handed to every sink. Nothing is printed or
//! stored for a repository until all three fetches succeed.
//!
//! A message body from the API ends the run when a single repository was
//! requested, or when listing repositories. While iterating all repositories
//! it only skips the affected one.

use std::io::Write;

use anyhow::{Context, Result};

use crate::github::GitHubClient;
use crate::render::render_table;
use crate::sink::Sink;
use crate::traffic::{ApiResponse, MetricKind, Report};

/// Repository argument meaning "every repository of the owner".
pub const ALL_REPOS: &str = "ALL";

/// Which repositories a run covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    All,
    Repo(String),
}

impl Target {
    pub fn parse(arg: &str) -> Self {
        let arg = arg.trim();
        if arg == ALL_REPOS {
            Target::All
        } else {
            Target::Repo(arg.to_string())
        }
    }
}

/// Outcome of a run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Repositories fetched and stored
    pub processed: Vec<String>,
    /// Repositories skipped, with the API message
    pub skipped: Vec<(String, String)>,
    /// Message that ended the run early
    pub aborted: Option<String>,
}

/// Run a collection against `target`.
///
/// Tables go to `out` when `print` is set. API messages always go to `out`.
pub fn run(
    client: &GitHubClient,
    target: &Target,
    sinks: &[Box<dyn Sink>],
    print: bool,
    out: &mut dyn Write,
) -> Result<RunStats> {
    let mut stats = RunStats::default();

    let repos = match target {
        Target::Repo(name) => vec![name.clone()],
        Target::All => match client.list_repositories()? {
            ApiResponse::Data(names) => names,
            ApiResponse::Unavailable(message) => {
                writeln!(out, "{}", message)?;
                stats.aborted = Some(message);
                return Ok(stats);
            }
        },
    };

    for repo in &repos {
        let reports = match fetch_all(client, repo)? {
            ApiResponse::Data(reports) => reports,
            ApiResponse::Unavailable(message) => {
                if let Target::Repo(_) = target {
                    writeln!(out, "{}", message)?;
                    stats.aborted = Some(message);
                    return Ok(stats);
                }
                log::warn!("Skipping {}: {}", repo, message);
                writeln!(out, "{}: {}", repo, message)?;
                stats.skipped.push((repo.clone(), message));
                continue;
            }
        };

        if print {
            for report in &reports {
                writeln!(out, "{}", render_table(repo, report))?;
            }
        }

        for report in &reports {
            for sink in sinks {
                sink.persist(repo, report)
                    .with_context(|| format!("Failed to store {} for {}", report.kind(), repo))?;
            }
        }

        stats.processed.push(repo.clone());
    }

    Ok(stats)
}

/// Fetch views, clones and referrers, stopping at the first message body.
fn fetch_all(client: &GitHubClient, repo: &str) -> Result<ApiResponse<Vec<Report>>> {
    let mut reports = Vec::with_capacity(MetricKind::ALL.len());
    for kind in MetricKind::ALL {
        match client.fetch_report(repo, kind)? {
            ApiResponse::Data(report) => reports.push(report),
            ApiResponse::Unavailable(message) => return Ok(ApiResponse::Unavailable(message)),
        }
    }
    Ok(ApiResponse::Data(reports))
}

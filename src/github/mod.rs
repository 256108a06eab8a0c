//! GitHub REST client for repository traffic.
//!
//! "Do X": List an account's repositories and fetch their traffic.
//!
//! # Design
//!
//! - **Transport**: one authenticated GET, returning status, body and Link header
//! - **GitHubClient**: endpoints, pagination and message-body detection on top
//!
//! The transport is a trait so runs can be driven without a network.
//!
//! # Example
//!
//! ```ignore
//! use gts::github::GitHubClient;
//! use gts::traffic::MetricKind;
//!
//! let client = GitHubClient::connect(credentials, &config.github, "octocat")?;
//! let repos = client.list_repositories()?;
//! let views = client.fetch_report("hello-world", MetricKind::Views)?;
//! ```

mod internal;

pub use internal::HttpTransport;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serde_json::Value;

use crate::config::GithubSection;
use crate::credentials::Credentials;
use crate::traffic::{api_message, parse_report, ApiResponse, MetricKind, Report};

/// Repositories requested per listing page.
pub const PAGE_SIZE: u32 = 100;

/// Raw HTTP response as seen by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
    /// Value of the `Link` header, if any
    pub link: Option<String>,
}

/// Issues authenticated GET requests.
pub trait Transport {
    fn get(&self, url: &str) -> Result<RawResponse>;
}

#[derive(Debug, Deserialize)]
struct RawRepo {
    name: String,
}

/// Client bound to one owner (user or organization).
pub struct GitHubClient {
    transport: Box<dyn Transport>,
    api_url: String,
    owner: String,
}

impl GitHubClient {
    pub fn new(transport: Box<dyn Transport>, api_url: &str, owner: &str) -> Self {
        Self {
            transport,
            api_url: api_url.trim_end_matches('/').to_string(),
            owner: owner.to_string(),
        }
    }

    /// Client over HTTP with basic auth.
    pub fn connect(credentials: Credentials, settings: &GithubSection, owner: &str) -> Result<Self> {
        let transport = HttpTransport::new(credentials, settings)?;
        Ok(Self::new(Box::new(transport), &settings.api_url, owner))
    }

    /// List every repository name of the owner, following `next` links.
    ///
    /// A message body on any page ends the listing with `Unavailable`.
    pub fn list_repositories(&self) -> Result<ApiResponse<Vec<String>>> {
        let mut url = format!(
            "{}/users/{}/repos?per_page={}",
            self.api_url, self.owner, PAGE_SIZE
        );
        let mut names = Vec::new();
        let mut page = 1;

        loop {
            let (body, link) = self.get_json(&url)?;
            if let Some(message) = api_message(&body) {
                return Ok(ApiResponse::Unavailable(message));
            }

            let repos: Vec<RawRepo> = serde_json::from_value(body)
                .with_context(|| format!("Failed to parse repository list from {}", url))?;
            log::debug!("Page {}: {} repositories", page, repos.len());
            names.extend(repos.into_iter().map(|r| r.name));

            match link.as_deref().and_then(internal::next_link) {
                Some(next) => {
                    url = internal::with_page_size(&next, PAGE_SIZE);
                    page += 1;
                }
                None => break,
            }
        }

        log::info!("Found {} repositories for {}", names.len(), self.owner);
        Ok(ApiResponse::Data(names))
    }

    /// Fetch one traffic report for a repository.
    pub fn fetch_report(&self, repo: &str, kind: MetricKind) -> Result<ApiResponse<Report>> {
        let url = format!(
            "{}/repos/{}/{}/{}",
            self.api_url,
            self.owner,
            repo,
            kind.endpoint()
        );
        let (body, _) = self.get_json(&url)?;
        parse_report(kind, body).with_context(|| format!("Unexpected {} payload for {}", kind, repo))
    }

    /// GET a URL and decode its JSON body.
    ///
    /// 401 is fatal. Other error statuses pass through when they carry a JSON
    /// body, so the caller sees GitHub's message.
    fn get_json(&self, url: &str) -> Result<(Value, Option<String>)> {
        let response = self.transport.get(url)?;
        let parsed: Result<Value, _> = serde_json::from_str(&response.body);

        if response.status == 401 {
            let reason = parsed
                .ok()
                .and_then(|body| api_message(&body))
                .unwrap_or_else(|| "HTTP 401".to_string());
            bail!("Authentication failed for {}: {}", url, reason);
        }

        match parsed {
            Ok(body) => Ok((body, response.link)),
            Err(e) if (200..300).contains(&response.status) => {
                Err(e).with_context(|| format!("Failed to parse JSON from {}", url))
            }
            Err(_) => bail!("HTTP {} from {}", response.status, url),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    /// Transport answering from a fixed URL table and recording requests.
    #[derive(Default)]
    struct Scripted {
        responses: HashMap<String, RawResponse>,
        requested: Rc<RefCell<Vec<String>>>,
    }

    impl Scripted {
        fn with(mut self, url: &str, status: u16, body: String, link: Option<String>) -> Self {
            self.responses
                .insert(url.to_string(), RawResponse { status, body, link });
            self
        }
    }

    impl Transport for Scripted {
        fn get(&self, url: &str) -> Result<RawResponse> {
            self.requested.borrow_mut().push(url.to_string());
            match self.responses.get(url) {
                Some(response) => Ok(response.clone()),
                None => bail!("connection refused: {}", url),
            }
        }
    }

    fn repo_page(range: std::ops::Range<usize>) -> String {
        let repos: Vec<Value> = range
            .map(|i| serde_json::json!({"name": format!("repo-{:03}", i), "private": false}))
            .collect();
        Value::Array(repos).to_string()
    }

    const API: &str = "https://api.test";

    #[test]
    fn test_list_follows_pagination() {
        let first = format!("{}/users/acme/repos?per_page=100", API);
        let second = format!("{}/user/7/repos?per_page=100&page=2", API);
        let third = format!("{}/user/7/repos?per_page=100&page=3", API);

        let transport = Scripted::default()
            .with(&first, 200, repo_page(0..100), Some(format!(r#"<{}>; rel="next", <{}>; rel="last""#, second, third)))
            .with(&second, 200, repo_page(100..200), Some(format!(r#"<{}>; rel="prev", <{}>; rel="next""#, first, third)))
            .with(&third, 200, repo_page(200..250), Some(format!(r#"<{}>; rel="prev", <{}>; rel="first""#, second, first)));
        let requested = transport.requested.clone();

        let client = GitHubClient::new(Box::new(transport), API, "acme");
        let ApiResponse::Data(names) = client.list_repositories().unwrap() else {
            panic!("expected repository list");
        };

        assert_eq!(names.len(), 250);
        assert_eq!(names[0], "repo-000");
        assert_eq!(names[100], "repo-100");
        assert_eq!(names[249], "repo-249");
        let unique: std::collections::HashSet<_> = names.iter().collect();
        assert_eq!(unique.len(), 250);
        assert_eq!(*requested.borrow(), vec![first, second, third]);
    }

    #[test]
    fn test_list_without_link_is_single_page() {
        let first = format!("{}/users/solo/repos?per_page=100", API);
        let transport = Scripted::default().with(&first, 200, repo_page(0..3), None);
        let client = GitHubClient::new(Box::new(transport), "https://api.test/", "solo");

        let names = client.list_repositories().unwrap();
        assert_eq!(
            names,
            ApiResponse::Data(vec!["repo-000".into(), "repo-001".into(), "repo-002".into()])
        );
    }

    #[test]
    fn test_list_message_is_unavailable() {
        let first = format!("{}/users/ghost/repos?per_page=100", API);
        let transport = Scripted::default().with(
            &first,
            404,
            r#"{"message":"Not Found","documentation_url":"https://docs.github.com"}"#.into(),
            None,
        );
        let client = GitHubClient::new(Box::new(transport), API, "ghost");
        assert_eq!(
            client.list_repositories().unwrap(),
            ApiResponse::Unavailable("Not Found".into())
        );
    }

    #[test]
    fn test_list_message_on_later_page_drops_earlier_names() {
        let first = format!("{}/users/acme/repos?per_page=100", API);
        let second = format!("{}/user/7/repos?per_page=100&page=2", API);
        let transport = Scripted::default()
            .with(&first, 200, repo_page(0..100), Some(format!(r#"<{}>; rel="next""#, second)))
            .with(&second, 500, r#"{"message":"Server Error"}"#.into(), None);
        let requested = transport.requested.clone();

        let client = GitHubClient::new(Box::new(transport), API, "acme");
        assert_eq!(
            client.list_repositories().unwrap(),
            ApiResponse::Unavailable("Server Error".into())
        );
        assert_eq!(*requested.borrow(), vec![first, second]);
    }

    #[test]
    fn test_bad_credentials_is_error() {
        let first = format!("{}/users/acme/repos?per_page=100", API);
        let transport =
            Scripted::default().with(&first, 401, r#"{"message":"Bad credentials"}"#.into(), None);
        let client = GitHubClient::new(Box::new(transport), API, "acme");

        let err = client.list_repositories().unwrap_err();
        assert!(err.to_string().contains("Bad credentials"));
    }

    #[test]
    fn test_transport_failure_propagates() {
        let client = GitHubClient::new(Box::new(Scripted::default()), API, "acme");
        let err = client.fetch_report("demo", MetricKind::Views).unwrap_err();
        assert!(format!("{:#}", err).contains("connection refused"));
    }

    #[test]
    fn test_fetch_report_endpoints() {
        let views = format!("{}/repos/acme/demo/traffic/views", API);
        let refs = format!("{}/repos/acme/demo/traffic/popular/referrers", API);
        let transport = Scripted::default()
            .with(
                &views,
                200,
                r#"{"count":5,"uniques":3,"views":[{"timestamp":"2023-01-01T00:00:00Z","count":5,"uniques":3}]}"#.into(),
                None,
            )
            .with(&refs, 200, r#"[{"referrer":"github.com","count":4,"uniques":2}]"#.into(), None);
        let client = GitHubClient::new(Box::new(transport), API, "acme");

        let ApiResponse::Data(report) = client.fetch_report("demo", MetricKind::Views).unwrap() else {
            panic!("expected views");
        };
        assert_eq!(report.total_count(), 5);

        let ApiResponse::Data(report) = client.fetch_report("demo", MetricKind::Referrers).unwrap() else {
            panic!("expected referrers");
        };
        assert_eq!(report.total_count(), 4);
    }

    #[test]
    fn test_non_json_error_status() {
        let views = format!("{}/repos/acme/demo/traffic/views", API);
        let transport = Scripted::default().with(&views, 502, "<html>Bad Gateway</html>".into(), None);
        let client = GitHubClient::new(Box::new(transport), API, "acme");

        let err = client.fetch_report("demo", MetricKind::Views).unwrap_err();
        assert!(err.to_string().contains("HTTP 502"));
    }
}

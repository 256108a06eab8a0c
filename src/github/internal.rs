//! Internal implementation for the GitHub client.
//!
//! Contains the reqwest transport and Link header parsing.
//! Not exposed in public interface.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, LINK};

use crate::config::GithubSection;
use crate::credentials::Credentials;

use super::{RawResponse, Transport};

// ============================================================================
// HTTP transport
// ============================================================================

/// Blocking HTTP transport with basic auth.
pub struct HttpTransport {
    client: Client,
    credentials: Credentials,
    accept: String,
}

impl HttpTransport {
    pub fn new(credentials: Credentials, settings: &GithubSection) -> Result<Self> {
        let mut builder = Client::builder().user_agent(settings.user_agent.clone());
        if let Some(secs) = settings.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            credentials,
            accept: settings.accept.clone(),
        })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> Result<RawResponse> {
        log::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .basic_auth(&self.credentials.username, Some(&self.credentials.password))
            .header(ACCEPT, &self.accept)
            .send()
            .with_context(|| format!("Failed to connect to {}", url))?;

        let status = response.status().as_u16();
        let link = response
            .headers()
            .get(LINK)
            .and_then(|value| value.to_str().ok())
            .map(String::from);
        let body = response
            .text()
            .with_context(|| format!("Failed to read response body from {}", url))?;

        log::debug!("{} -> HTTP {} ({} bytes)", url, status, body.len());
        Ok(RawResponse { status, body, link })
    }
}

// ============================================================================
// Pagination
// ============================================================================

/// Find the `rel="next"` URL in a Link header.
///
/// GitHub Link headers look like:
/// `<https://api.github.com/user/1/repos?per_page=100&page=2>; rel="next", <...&page=3>; rel="last"`
pub(crate) fn next_link(link_header: &str) -> Option<String> {
    for part in link_header.split(',') {
        let mut url = None;
        let mut is_next = false;

        for segment in part.split(';') {
            let segment = segment.trim();
            if segment.starts_with('<') && segment.ends_with('>') {
                url = Some(&segment[1..segment.len() - 1]);
            } else if let Some(rel) = segment.strip_prefix("rel=") {
                is_next = rel.trim_matches('"').split_whitespace().any(|r| r == "next");
            }
        }

        if let (Some(url), true) = (url, is_next) {
            return Some(url.to_string());
        }
    }
    None
}

/// Make sure a page URL carries the page size.
pub(crate) fn with_page_size(url: &str, per_page: u32) -> String {
    if url.contains("per_page=") {
        return url.to_string();
    }
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{}{}per_page={}", url, separator, per_page)
}

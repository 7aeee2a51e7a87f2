//! Organization catalog: paginated listing with retry and backoff.
//!
//! [`CatalogClient`] walks `page = 1, 2, ...` until a page comes back empty
//! or shorter than [`PAGE_SIZE`].
//! Each page goes through [`RetryPolicy`]: transient failures are retried
//! with exponential backoff, a 404 stops the run immediately, and any other
//! rejection is surfaced without retrying. Pages are fetched strictly in
//! order; page N+1 is never requested before page N has settled.

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, Stream, TryStreamExt};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use regex::Regex;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::contract::PageFetcher;
use crate::error::{HarvestError, PageError};

/// Number of descriptors requested per page.
pub const PAGE_SIZE: u32 = 100;

/// One repository in an organization's listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryDescriptor {
    pub name: String,
    pub clone_url: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "stargazers_count")]
    pub star_count: u64,
}

/// True if `org` can be used as the `{org}` segment of the listing URL.
pub fn is_valid_org_name(org: &str) -> bool {
    static ORG_NAME: OnceLock<Regex> = OnceLock::new();
    ORG_NAME
        .get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").expect("static regex is valid"))
        .is_match(org)
}

/// Retry schedule for a single page fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Delay after the failed attempt numbered `attempt` (starting at 0).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt)
    }
}

/// Lists an organization's repositories through a [`PageFetcher`].
pub struct CatalogClient<F> {
    fetcher: F,
    retry: RetryPolicy,
}

impl<F: PageFetcher> CatalogClient<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            retry: RetryPolicy::default(),
        }
    }

    /// Replace the retry schedule. At least one attempt is always made.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = RetryPolicy {
            max_attempts: retry.max_attempts.max(1),
            ..retry
        };
        self
    }

    /// Lazily stream every repository of `org`, page by page.
    ///
    /// The stream is not restartable: calling this again starts over from page 1.
    pub fn list_repositories<'a>(
        &'a self,
        org: &'a str,
    ) -> impl Stream<Item = Result<RepositoryDescriptor, HarvestError>> + 'a {
        stream::try_unfold(Some(1u32), move |page| self.next_page(org, page))
            .map_ok(|repos| stream::iter(repos.into_iter().map(Ok::<_, HarvestError>)))
            .try_flatten()
    }

    /// Collect the full catalog. An organization without repositories yields an empty vector.
    pub async fn fetch_all(&self, org: &str) -> Result<Vec<RepositoryDescriptor>, HarvestError> {
        let repos: Vec<RepositoryDescriptor> = self.list_repositories(org).try_collect().await?;
        info!(org, count = repos.len(), "Catalog fetched");
        Ok(repos)
    }

    async fn next_page(
        &self,
        org: &str,
        page: Option<u32>,
    ) -> Result<Option<(Vec<RepositoryDescriptor>, Option<u32>)>, HarvestError> {
        let Some(page) = page else {
            return Ok(None);
        };
        if !is_valid_org_name(org) {
            error!(org, "Refusing invalid organization name");
            return Err(HarvestError::InvalidOrganization {
                org: org.to_string(),
            });
        }
        let repos = self.fetch_page_with_retry(org, page).await?;
        if repos.is_empty() {
            debug!(org, page, "Empty page, catalog exhausted");
            return Ok(None);
        }
        debug!(org, page, count = repos.len(), "Fetched catalog page");
        // A short page is the last one.
        let next = (repos.len() >= PAGE_SIZE as usize).then_some(page + 1);
        Ok(Some((repos, next)))
    }

    async fn fetch_page_with_retry(
        &self,
        org: &str,
        page: u32,
    ) -> Result<Vec<RepositoryDescriptor>, HarvestError> {
        let mut last_error = String::new();
        for attempt in 0..self.retry.max_attempts {
            match self.fetcher.fetch_page(org, page).await {
                Ok(repos) => return Ok(repos),
                Err(PageError::NotFound) => {
                    error!(org, page, "Organization not found or forbidden");
                    return Err(HarvestError::OrganizationNotFoundOrForbidden {
                        org: org.to_string(),
                    });
                }
                Err(PageError::InvalidOrganization) => {
                    error!(org, page, "Invalid organization name");
                    return Err(HarvestError::InvalidOrganization {
                        org: org.to_string(),
                    });
                }
                Err(PageError::Rejected { status }) => {
                    error!(org, page, status, "Catalog request rejected");
                    return Err(HarvestError::CatalogRejected { page, status });
                }
                Err(PageError::Transient(message)) => {
                    last_error = message;
                    if attempt + 1 < self.retry.max_attempts {
                        let delay = self.retry.delay_for(attempt);
                        warn!(
                            org,
                            page,
                            attempt,
                            delay_secs = delay.as_secs_f64(),
                            error = %last_error,
                            "Transient catalog failure, retrying"
                        );
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
        error!(org, page, error = %last_error, "Catalog fetch exhausted");
        Err(HarvestError::CatalogFetchExhausted {
            page,
            attempts: self.retry.max_attempts,
            last_error,
        })
    }
}

/// [`PageFetcher`] backed by the GitHub REST API (`GET /orgs/{org}/repos`).
pub struct GithubApi {
    client: Client,
    base_url: String,
}

impl GithubApi {
    /// Build a client for `base_url`. With a token every request carries
    /// `Authorization: token {token}`; without one the API's anonymous limits apply.
    pub fn new(
        base_url: &str,
        token: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, HarvestError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            let mut value = HeaderValue::from_str(&format!("token {token}"))
                .map_err(|_| HarvestError::HttpClient("token contains invalid characters".into()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("repo-harvester/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .map_err(|e| HarvestError::HttpClient(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl PageFetcher for GithubApi {
    async fn fetch_page(
        &self,
        org: &str,
        page: u32,
    ) -> Result<Vec<RepositoryDescriptor>, PageError> {
        if !is_valid_org_name(org) {
            return Err(PageError::InvalidOrganization);
        }
        let url = format!(
            "{}/orgs/{}/repos?page={}&per_page={}",
            self.base_url, org, page, PAGE_SIZE
        );
        debug!(url = %url, "Requesting catalog page");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| PageError::Transient(format!("request to {url} failed: {e}")))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(PageError::NotFound);
        }
        if status.is_server_error() || status == StatusCode::REQUEST_TIMEOUT {
            return Err(PageError::Transient(format!("{url} returned HTTP {status}")));
        }
        if !status.is_success() {
            return Err(PageError::Rejected {
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| PageError::Transient(format!("reading body of {url} failed: {e}")))?;
        serde_json::from_str(&body)
            .map_err(|e| PageError::Transient(format!("undecodable body from {url}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_from_one_second() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
    }

    #[test]
    fn org_names_are_single_segments() {
        assert!(is_valid_org_name("paradigmxyz"));
        assert!(is_valid_org_name("foundry-rs"));
        assert!(is_valid_org_name("a.b_c"));
        assert!(!is_valid_org_name(""));
        assert!(!is_valid_org_name(".."));
        assert!(!is_valid_org_name("../users/victim"));
        assert!(!is_valid_org_name("acme/repos"));
        assert!(!is_valid_org_name("acme?page=2"));
    }

    #[test]
    fn with_retry_keeps_at_least_one_attempt() {
        struct Never;
        #[async_trait]
        impl PageFetcher for Never {
            async fn fetch_page(
                &self,
                _org: &str,
                _page: u32,
            ) -> Result<Vec<RepositoryDescriptor>, PageError> {
                Ok(vec![])
            }
        }
        let client = CatalogClient::new(Never).with_retry(RetryPolicy {
            max_attempts: 0,
            base_delay: Duration::from_secs(1),
        });
        assert_eq!(client.retry.max_attempts, 1);
    }

    #[test]
    fn descriptor_reads_api_field_names() {
        let json = r#"{
            "name": "reth",
            "clone_url": "https://github.com/paradigmxyz/reth.git",
            "description": null,
            "stargazers_count": 42,
            "fork": false
        }"#;
        let repo: RepositoryDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(repo.name, "reth");
        assert_eq!(repo.description, None);
        assert_eq!(repo.star_count, 42);
    }
}

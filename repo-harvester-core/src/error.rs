//! Error taxonomy for a harvesting run.
//!
//! [`HarvestError`] covers every condition that stops a run: sandbox
//! violations, catalog failures, and selection errors. Per-repository
//! problems never reach it; they are captured as
//! [`RepositoryOperationFailure`] values inside the outcome records.

use std::path::PathBuf;

use thiserror::Error;

/// Fatal errors surfaced to the top level of a run.
#[derive(Debug, Error)]
pub enum HarvestError {
    /// A destination directory would resolve outside the working directory.
    #[error(
        "refusing to use {}: it lies outside the working directory {}",
        .path.display(),
        .working_dir.display()
    )]
    PathEscape {
        path: PathBuf,
        working_dir: PathBuf,
    },

    /// The hosting API answered 404 for the organization listing.
    #[error("organization '{org}' was not found or is not accessible with the current credentials")]
    OrganizationNotFoundOrForbidden { org: String },

    /// The organization name is not a single URL path segment.
    #[error("'{org}' is not a valid organization name")]
    InvalidOrganization { org: String },

    /// The hosting API rejected a page request with a non-retryable status.
    #[error("catalog request for page {page} was rejected with HTTP {status}")]
    CatalogRejected { page: u32, status: u16 },

    /// Every attempt for a page failed transiently.
    #[error("catalog fetch gave up on page {page} after {attempts} attempts: {last_error}")]
    CatalogFetchExhausted {
        page: u32,
        attempts: u32,
        last_error: String,
    },

    /// Operator selection input contained a token that is not an integer.
    #[error("could not interpret selection '{input}': '{token}' is not a number")]
    SelectionParse { input: String, token: String },

    #[error("failed to read reference file {}: {source}", .path.display())]
    ReferenceFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read operator input: {0}")]
    Prompt(#[source] std::io::Error),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),

    #[error("filesystem error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Outcome of a single page request, classified for the retry policy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageError {
    /// 404: the organization does not exist or is hidden from us. Never retried.
    #[error("organization not found or forbidden")]
    NotFound,
    /// The organization name cannot be used as a path segment. Never retried.
    #[error("invalid organization name")]
    InvalidOrganization,
    /// Any other non-retryable HTTP status.
    #[error("rejected with HTTP {status}")]
    Rejected { status: u16 },
    /// Network errors, timeouts, 5xx, undecodable bodies.
    #[error("{0}")]
    Transient(String),
}

/// Error returned by a [`crate::contract::Cloner`] when a clone does not produce a repository.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CloneError {
    pub message: String,
}

impl CloneError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Non-fatal, per-repository failure recorded in a harvest outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryOperationFailure {
    #[error("clone failed: {0}")]
    Clone(#[from] CloneError),
    #[error("repository name '{0}' is not a plain directory name")]
    UnsafeName(String),
    #[error("README copy failed: {0}")]
    ReadmeCopy(String),
}

//! # contract: capability traits injected into the harvesting pipeline
//!
//! The pipeline talks to three outside collaborators, each behind a trait so
//! production code and tests can plug in different implementations:
//!
//! - [`PageFetcher`]: one page of an organization's repository listing.
//! - [`Cloner`]: the version-control client that materialises a repository on disk.
//! - [`SelectionInput`]: the operator's answers when choosing what to clone.
//!
//! ## Mocking & Testing
//! - Every trait is annotated for `mockall`; the generated `Mock*` types are
//!   exported under the default `test-export-mocks` feature so integration
//!   tests in other crates can use them.

use std::path::Path;

use async_trait::async_trait;
#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::catalog::RepositoryDescriptor;
use crate::error::{CloneError, PageError};
use crate::selection::CloneTarget;

/// Fetches a single page of an organization's repository listing.
///
/// An empty vector means the listing is exhausted.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, org: &str, page: u32)
        -> Result<Vec<RepositoryDescriptor>, PageError>;
}

/// Materialises a repository at `dest`.
///
/// `dest` does not exist yet when this is called; its parent does.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Cloner: Send + Sync {
    async fn clone_repo(&self, target: &CloneTarget, dest: &Path) -> Result<(), CloneError>;
}

/// Operator choices for narrowing a catalog, abstracted away from the terminal.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait SelectionInput {
    /// Whether the operator wants to pick specific repositories instead of all of them.
    fn wants_subset(&mut self, catalog: &[RepositoryDescriptor]) -> std::io::Result<bool>;

    /// Comma-separated, 1-based indices into `catalog`.
    fn indices(&mut self, catalog: &[RepositoryDescriptor]) -> std::io::Result<String>;
}

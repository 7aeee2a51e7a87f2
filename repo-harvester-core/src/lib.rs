#![doc = "repo-harvester-core: core logic library for repo-harvester."]

//! This crate contains the harvesting pipeline and its data model:
//! sandboxed destination setup, paginated organization catalogs, selection
//! planning, and the clone-and-harvest batch. Terminal interaction and
//! configuration-file handling live in the `repo-harvester` CLI crate.
//!
//! # Usage
//! [`sandbox::establish`] → [`catalog::CatalogClient::fetch_all`] →
//! [`selection::plan`] → [`harvest::Harvester::execute`].

pub mod catalog;
pub mod clone;
pub mod config;
pub mod contract;
pub mod error;
pub mod harvest;
pub mod sandbox;
pub mod selection;

pub use error::HarvestError;

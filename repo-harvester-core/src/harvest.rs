//! Clone each planned repository and collect its README.
//!
//! The batch is a fold over the plan: every entry produces exactly one
//! [`HarvestOutcome`], entries run one at a time, and a failing entry never
//! stops the ones after it. The only early stop is the cancellation flag,
//! which is checked before each entry is started.
//!
//! # Navigation
//! - Entrypoint: [`Harvester::execute`]
//! - Results: [`HarvestReport`], [`HarvestSummary`]

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::{future, stream, StreamExt};
use tracing::{error, info, warn};
use walkdir::WalkDir;

use crate::contract::Cloner;
use crate::error::RepositoryOperationFailure;
use crate::sandbox::{is_plain_name, DestinationPath};
use crate::selection::{PlanEntry, SelectionPlan};

/// File name searched for, compared case-insensitively.
pub const README_FILE_NAME: &str = "README.md";
/// Suffix appended to the repository name for the harvested copy.
pub const README_SUFFIX: &str = "_README";

/// Result of processing one plan entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestOutcome {
    pub repo_name: String,
    pub clone_succeeded: bool,
    pub readme_found: bool,
    pub error_detail: Option<String>,
    /// Where the README copy was written.
    pub readme_path: Option<PathBuf>,
}

impl HarvestOutcome {
    fn failed(repo_name: &str, failure: RepositoryOperationFailure) -> Self {
        Self {
            repo_name: repo_name.to_string(),
            clone_succeeded: false,
            readme_found: false,
            error_detail: Some(failure.to_string()),
            readme_path: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HarvestSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub readme_found: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestReport {
    pub outcomes: Vec<HarvestOutcome>,
    /// The batch stopped early because cancellation was requested.
    pub interrupted: bool,
}

impl HarvestReport {
    pub fn summary(&self) -> HarvestSummary {
        self.outcomes
            .iter()
            .fold(HarvestSummary::default(), |acc, outcome| HarvestSummary {
                succeeded: acc.succeeded + usize::from(outcome.clone_succeeded),
                failed: acc.failed + usize::from(!outcome.clone_succeeded),
                readme_found: acc.readme_found + usize::from(outcome.readme_found),
            })
    }
}

/// Runs a [`SelectionPlan`] through a [`Cloner`] and harvests READMEs into `docs_dir`.
pub struct Harvester<C> {
    cloner: C,
    docs_dir: PathBuf,
    cancel: Arc<AtomicBool>,
}

impl<C: Cloner> Harvester<C> {
    pub fn new(cloner: C, docs_dir: impl Into<PathBuf>) -> Self {
        Self {
            cloner,
            docs_dir: docs_dir.into(),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Share an externally owned cancellation flag, e.g. one set from a Ctrl-C handler.
    pub fn with_cancellation(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Process every plan entry in order, reporting each outcome through
    /// `on_outcome` as soon as it is known.
    pub async fn execute<F>(
        &self,
        plan: &SelectionPlan,
        destination: &DestinationPath,
        mut on_outcome: F,
    ) -> HarvestReport
    where
        F: FnMut(&HarvestOutcome),
    {
        info!(
            entries = plan.len(),
            org_path = %destination.org_path.display(),
            docs_dir = %self.docs_dir.display(),
            "Starting harvest"
        );
        let docs_names = docs_file_names(&plan.entries);

        let outcomes: Vec<HarvestOutcome> = stream::iter(plan.entries.iter().zip(docs_names))
            .take_while(|_| future::ready(!self.cancel.load(Ordering::SeqCst)))
            .then(|(entry, docs_name)| self.harvest_one(entry, destination, docs_name))
            .inspect(|outcome| on_outcome(outcome))
            .collect()
            .await;

        let interrupted = outcomes.len() < plan.len();
        if interrupted {
            warn!(
                completed = outcomes.len(),
                planned = plan.len(),
                "Harvest interrupted before completing the plan"
            );
        }
        let report = HarvestReport {
            outcomes,
            interrupted,
        };
        let summary = report.summary();
        info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            readme_found = summary.readme_found,
            "Harvest finished"
        );
        report
    }

    async fn harvest_one(
        &self,
        entry: &PlanEntry,
        destination: &DestinationPath,
        docs_name: String,
    ) -> HarvestOutcome {
        if !is_plain_name(&entry.name) {
            error!(repo = %entry.name, "Refusing unsafe repository name");
            return HarvestOutcome::failed(
                &entry.name,
                RepositoryOperationFailure::UnsafeName(entry.name.clone()),
            );
        }

        let repo_path = destination.repo_path(&entry.name);
        info!(repo = %entry.name, path = %repo_path.display(), "Cloning repository");
        if let Err(e) = self.cloner.clone_repo(&entry.target, &repo_path).await {
            error!(repo = %entry.name, error = %e, "Clone failed");
            return HarvestOutcome::failed(&entry.name, e.into());
        }

        let Some(readme) = find_readme(&repo_path) else {
            warn!(repo = %entry.name, "No README found");
            return HarvestOutcome {
                repo_name: entry.name.clone(),
                clone_succeeded: true,
                readme_found: false,
                error_detail: None,
                readme_path: None,
            };
        };

        match copy_readme(&readme, &self.docs_dir, &docs_name) {
            Ok(dest) => {
                info!(repo = %entry.name, from = %readme.display(), to = %dest.display(), "README harvested");
                HarvestOutcome {
                    repo_name: entry.name.clone(),
                    clone_succeeded: true,
                    readme_found: true,
                    error_detail: None,
                    readme_path: Some(dest),
                }
            }
            Err(e) => {
                error!(repo = %entry.name, error = ?e, "README copy failed");
                HarvestOutcome {
                    repo_name: entry.name.clone(),
                    clone_succeeded: true,
                    readme_found: false,
                    error_detail: Some(
                        RepositoryOperationFailure::ReadmeCopy(e.to_string()).to_string(),
                    ),
                    readme_path: None,
                }
            }
        }
    }
}

/// Find the first file named `README.md` (any case) under `repo_path`.
///
/// Within each directory files are visited before subdirectories and both
/// are taken in name order, so a top-level README wins over nested ones and
/// the result is stable for a given tree.
pub fn find_readme(repo_path: &Path) -> Option<PathBuf> {
    WalkDir::new(repo_path)
        .sort_by(|a, b| {
            a.file_type()
                .is_dir()
                .cmp(&b.file_type().is_dir())
                .then_with(|| a.file_name().cmp(b.file_name()))
        })
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .find(|entry| {
            entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.eq_ignore_ascii_case(README_FILE_NAME))
        })
        .map(|entry| entry.into_path())
}

fn copy_readme(src: &Path, docs_dir: &Path, file_name: &str) -> std::io::Result<PathBuf> {
    fs::create_dir_all(docs_dir)?;
    let dest = docs_dir.join(file_name);
    fs::copy(src, &dest)?;
    Ok(dest)
}

/// Assign each entry a README file name unique within the plan:
/// `{name}_README.md`, then `{name}_README_2.md`, `{name}_README_3.md`, ...
fn docs_file_names(entries: &[PlanEntry]) -> Vec<String> {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    entries
        .iter()
        .map(|entry| {
            let count = seen.entry(entry.name.as_str()).or_insert(0);
            *count += 1;
            if *count == 1 {
                format!("{}{}.md", entry.name, README_SUFFIX)
            } else {
                format!("{}{}_{}.md", entry.name, README_SUFFIX, count)
            }
        })
        .collect()
}

//! Turning operator input into a concrete, ordered clone plan.

use std::fs;
use std::num::IntErrorKind;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tracing::{info, warn};

use crate::catalog::RepositoryDescriptor;
use crate::contract::SelectionInput;
use crate::error::HarvestError;

/// How the plan is derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionMode {
    /// The whole catalog, in fetch order.
    All,
    /// Comma-separated 1-based indices into the catalog.
    IndexSubset(String),
    /// Repository references read from a file; the catalog is not consulted.
    FromFile(PathBuf),
}

/// What the clone collaborator is asked to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloneTarget {
    /// A clone URL from the catalog.
    Url(String),
    /// An `owner/repo` reference resolved by the hosting CLI.
    Reference(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanEntry {
    /// Directory name for the clone and prefix of the harvested README.
    pub name: String,
    pub target: CloneTarget,
    /// Present when the entry came from the catalog.
    pub descriptor: Option<RepositoryDescriptor>,
}

impl PlanEntry {
    fn from_descriptor(repo: &RepositoryDescriptor) -> Self {
        Self {
            name: repo.name.clone(),
            target: CloneTarget::Url(repo.clone_url.clone()),
            descriptor: Some(repo.clone()),
        }
    }

    fn from_reference(reference: String) -> Self {
        let name = reference
            .rsplit('/')
            .next()
            .unwrap_or(reference.as_str())
            .to_string();
        Self {
            name,
            target: CloneTarget::Reference(reference),
            descriptor: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionPlan {
    pub entries: Vec<PlanEntry>,
    /// 1-based indices the operator gave that did not match any catalog entry.
    pub out_of_range: Vec<i64>,
}

impl SelectionPlan {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Ask the operator whether to clone everything or a subset.
pub fn resolve_mode<I: SelectionInput + ?Sized>(
    input: &mut I,
    catalog: &[RepositoryDescriptor],
) -> Result<SelectionMode, HarvestError> {
    if !input.wants_subset(catalog).map_err(HarvestError::Prompt)? {
        return Ok(SelectionMode::All);
    }
    let raw = input.indices(catalog).map_err(HarvestError::Prompt)?;
    Ok(SelectionMode::IndexSubset(raw))
}

/// Build the plan for `mode` against `catalog`.
///
/// `FromFile` ignores `catalog` entirely.
pub fn plan(
    catalog: &[RepositoryDescriptor],
    mode: &SelectionMode,
) -> Result<SelectionPlan, HarvestError> {
    let plan = match mode {
        SelectionMode::All => SelectionPlan {
            entries: catalog.iter().map(PlanEntry::from_descriptor).collect(),
            out_of_range: Vec::new(),
        },
        SelectionMode::IndexSubset(raw) => plan_indices(catalog, raw)?,
        SelectionMode::FromFile(path) => plan_from_file(path)?,
    };
    info!(
        entries = plan.entries.len(),
        out_of_range = plan.out_of_range.len(),
        "Selection plan built"
    );
    Ok(plan)
}

fn plan_indices(catalog: &[RepositoryDescriptor], raw: &str) -> Result<SelectionPlan, HarvestError> {
    let indices = parse_indices(raw)?;
    let mut plan = SelectionPlan::default();
    for index in indices {
        let position = index
            .checked_sub(1)
            .and_then(|i| usize::try_from(i).ok());
        match position.and_then(|i| catalog.get(i)) {
            Some(repo) => plan.entries.push(PlanEntry::from_descriptor(repo)),
            None => {
                warn!(index, catalog_len = catalog.len(), "Index out of range, skipping");
                plan.out_of_range.push(index);
            }
        }
    }
    Ok(plan)
}

/// Parse a comma-separated list of integers. Any non-integer token fails the whole list.
///
/// Integers too large for `i64` saturate, so they still end up out of range
/// instead of failing the parse.
pub fn parse_indices(raw: &str) -> Result<Vec<i64>, HarvestError> {
    raw.split(',')
        .map(str::trim)
        .map(|token| match token.parse::<i64>() {
            Ok(index) => Ok(index),
            Err(e) if *e.kind() == IntErrorKind::PosOverflow => Ok(i64::MAX),
            Err(e) if *e.kind() == IntErrorKind::NegOverflow => Ok(i64::MIN),
            Err(_) => Err(HarvestError::SelectionParse {
                input: raw.to_string(),
                token: token.to_string(),
            }),
        })
        .collect()
}

fn plan_from_file(path: &Path) -> Result<SelectionPlan, HarvestError> {
    let content = fs::read_to_string(path).map_err(|source| HarvestError::ReferenceFile {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), "Reading repository references from file");
    Ok(SelectionPlan {
        entries: parse_references(&content)
            .into_iter()
            .map(PlanEntry::from_reference)
            .collect(),
        out_of_range: Vec::new(),
    })
}

/// Extract one repository reference per non-empty line.
///
/// The last whitespace-separated token of a line is the reference, so lines
/// like `gh repo clone owner/repo` work as-is. Lines starting with `#` are skipped.
pub fn parse_references(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_whitespace().next_back())
        .map(normalize_reference)
        .filter(|reference| !reference.is_empty())
        .collect()
}

fn url_prefix() -> &'static Regex {
    static PREFIX: OnceLock<Regex> = OnceLock::new();
    PREFIX.get_or_init(|| {
        Regex::new(r"^(?:[A-Za-z][A-Za-z0-9+.-]*://[^/]+/|[^@/\s]+@[^:/\s]+:)")
            .expect("static regex is valid")
    })
}

/// Reduce a URL, SSH address, or `@owner/repo` form to `owner/repo`.
pub fn normalize_reference(raw: &str) -> String {
    let stripped = url_prefix().replace(raw, "");
    let trimmed = stripped.trim_end_matches('/');
    let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);
    trimmed.strip_prefix('@').unwrap_or(trimmed).to_string()
}

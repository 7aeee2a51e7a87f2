//! Operator-facing output: catalog listings, inline status markers, and the run summary.

use repo_harvester_core::catalog::RepositoryDescriptor;
use repo_harvester_core::harvest::{HarvestOutcome, HarvestReport};
use repo_harvester_core::sandbox::DestinationPath;

pub const MARK_OK: &str = "[OK]";
pub const MARK_WARN: &str = "[WARN]";
pub const MARK_FAIL: &str = "[FAIL]";

/// One status line for a finished repository.
pub fn outcome_line(outcome: &HarvestOutcome) -> String {
    match outcome {
        HarvestOutcome {
            clone_succeeded: false,
            error_detail,
            ..
        } => format!(
            "{MARK_FAIL} {}: {}",
            outcome.repo_name,
            error_detail.as_deref().unwrap_or("clone failed")
        ),
        HarvestOutcome {
            readme_found: true,
            readme_path: Some(path),
            ..
        } => format!(
            "{MARK_OK} {}: README copied to {}",
            outcome.repo_name,
            path.display()
        ),
        HarvestOutcome {
            error_detail: Some(detail),
            ..
        } => format!("{MARK_WARN} {}: cloned, {detail}", outcome.repo_name),
        _ => format!("{MARK_WARN} {}: cloned, no README found", outcome.repo_name),
    }
}

pub fn print_outcome(outcome: &HarvestOutcome) {
    println!("{}", outcome_line(outcome));
}

pub fn summary_lines(report: &HarvestReport, destination: &DestinationPath) -> Vec<String> {
    let summary = report.summary();
    let mut lines = Vec::new();
    if report.interrupted {
        lines.push(format!(
            "{MARK_WARN} Interrupted: stopped after {} repositories",
            report.outcomes.len()
        ));
    }
    lines.push(format!(
        "Cloned {} repositories into {} ({} failed, {} READMEs harvested)",
        summary.succeeded,
        destination.org_path.display(),
        summary.failed,
        summary.readme_found
    ));
    lines
}

pub fn print_summary(report: &HarvestReport, destination: &DestinationPath) {
    for line in summary_lines(report, destination) {
        println!("{line}");
    }
}

/// `index: name (★stars) - description`, 1-based as the selection prompt expects.
pub fn catalog_line(index: usize, repo: &RepositoryDescriptor) -> String {
    let mut line = format!("{}: {} (★{})", index + 1, repo.name, repo.star_count);
    if let Some(description) = repo.description.as_deref().filter(|d| !d.is_empty()) {
        line.push_str(" - ");
        line.push_str(description);
    }
    line
}

pub fn print_catalog(catalog: &[RepositoryDescriptor]) {
    for (index, repo) in catalog.iter().enumerate() {
        println!("{}", catalog_line(index, repo));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repo_harvester_core::harvest::HarvestReport;
    use std::path::PathBuf;

    fn outcome(name: &str, cloned: bool, readme: bool, detail: Option<&str>) -> HarvestOutcome {
        HarvestOutcome {
            repo_name: name.into(),
            clone_succeeded: cloned,
            readme_found: readme,
            error_detail: detail.map(str::to_string),
            readme_path: readme.then(|| PathBuf::from(format!("/w/docs/{name}_README.md"))),
        }
    }

    #[test]
    fn status_markers() {
        assert_eq!(
            outcome_line(&outcome("alpha", true, true, None)),
            "[OK] alpha: README copied to /w/docs/alpha_README.md"
        );
        assert_eq!(
            outcome_line(&outcome("beta", false, false, Some("clone failed: exit 128"))),
            "[FAIL] beta: clone failed: exit 128"
        );
        assert_eq!(
            outcome_line(&outcome("gamma", true, false, None)),
            "[WARN] gamma: cloned, no README found"
        );
    }

    #[test]
    fn summary_mentions_interruption() {
        let destination = DestinationPath {
            working_dir: "/w".into(),
            base_path: "/w/s".into(),
            org_path: "/w/s/o".into(),
            pre_existing: false,
        };
        let report = HarvestReport {
            outcomes: vec![outcome("alpha", true, true, None)],
            interrupted: true,
        };
        let lines = summary_lines(&report, &destination);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("[WARN] Interrupted"));
        assert_eq!(
            lines[1],
            "Cloned 1 repositories into /w/s/o (0 failed, 1 READMEs harvested)"
        );
    }

    #[test]
    fn catalog_line_is_one_based() {
        let repo = RepositoryDescriptor {
            name: "reth".into(),
            clone_url: String::new(),
            description: Some("Modular Ethereum client".into()),
            star_count: 7,
        };
        assert_eq!(catalog_line(0, &repo), "1: reth (★7) - Modular Ethereum client");
    }
}

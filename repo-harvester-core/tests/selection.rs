use std::fs::write;

use repo_harvester_core::catalog::RepositoryDescriptor;
use repo_harvester_core::contract::MockSelectionInput;
use repo_harvester_core::selection::{plan, resolve_mode, CloneTarget, SelectionMode};
use repo_harvester_core::HarvestError;
use tempfile::NamedTempFile;

fn catalog(names: &[&str]) -> Vec<RepositoryDescriptor> {
    names
        .iter()
        .map(|name| RepositoryDescriptor {
            name: name.to_string(),
            clone_url: format!("https://github.com/acme/{name}.git"),
            description: Some(format!("{name} description")),
            star_count: 3,
        })
        .collect()
}

fn names(plan: &repo_harvester_core::selection::SelectionPlan) -> Vec<&str> {
    plan.entries.iter().map(|e| e.name.as_str()).collect()
}

#[test]
fn test_all_keeps_fetch_order() {
    let repos = catalog(&["zeta", "alpha", "mid"]);
    let plan = plan(&repos, &SelectionMode::All).unwrap();

    assert_eq!(names(&plan), vec!["zeta", "alpha", "mid"]);
    assert!(plan.out_of_range.is_empty());
    assert_eq!(
        plan.entries[0].target,
        CloneTarget::Url("https://github.com/acme/zeta.git".into())
    );
    assert_eq!(plan.entries[0].descriptor.as_ref(), Some(&repos[0]));
}

#[test]
fn test_index_subset_skips_out_of_range() {
    let repos = catalog(&["a", "b", "c", "d", "e"]);
    let plan = plan(&repos, &SelectionMode::IndexSubset("1,3,99".into()))
        .expect("out-of-range indices must not fail the plan");

    assert_eq!(names(&plan), vec!["a", "c"]);
    assert_eq!(plan.out_of_range, vec![99]);
}

#[test]
fn test_index_subset_zero_and_negative_are_out_of_range() {
    let repos = catalog(&["a", "b"]);
    let plan = plan(&repos, &SelectionMode::IndexSubset("0, -1, 2".into())).unwrap();

    assert_eq!(names(&plan), vec!["b"]);
    assert_eq!(plan.out_of_range, vec![0, -1]);
}

#[test]
fn test_index_subset_huge_integers_are_out_of_range() {
    let repos = catalog(&["a", "b", "c"]);
    let plan = plan(
        &repos,
        &SelectionMode::IndexSubset("1,99999999999999999999,-99999999999999999999".into()),
    )
    .expect("integers beyond i64 are skipped like any other out-of-range index");

    assert_eq!(names(&plan), vec!["a"]);
    assert_eq!(plan.out_of_range, vec![i64::MAX, i64::MIN]);
}

#[test]
fn test_index_subset_with_non_integer_fails_whole_plan() {
    let repos = catalog(&["a", "b", "c", "d", "e"]);
    let cases = ["a,b", "1,two,3", "1.5", ""];

    for raw in cases {
        let result = plan(&repos, &SelectionMode::IndexSubset(raw.into()));
        assert!(
            matches!(result, Err(HarvestError::SelectionParse { .. })),
            "{raw:?}: expected SelectionParse, got {result:?}"
        );
    }
}

#[test]
fn test_from_file_normalizes_references() {
    let file = NamedTempFile::new().unwrap();
    write(
        file.path(),
        "\
gh repo clone paradigmxyz/reth
https://github.com/foundry-rs/foundry.git

   # curated extras
@alloy-rs/alloy
git@github.com:bluealloy/revm.git
",
    )
    .unwrap();

    // The catalog is ignored entirely in file mode.
    let plan = plan(
        &catalog(&["unrelated"]),
        &SelectionMode::FromFile(file.path().to_path_buf()),
    )
    .unwrap();

    let targets: Vec<_> = plan.entries.iter().map(|e| e.target.clone()).collect();
    assert_eq!(
        targets,
        vec![
            CloneTarget::Reference("paradigmxyz/reth".into()),
            CloneTarget::Reference("foundry-rs/foundry".into()),
            CloneTarget::Reference("alloy-rs/alloy".into()),
            CloneTarget::Reference("bluealloy/revm".into()),
        ]
    );
    assert_eq!(names(&plan), vec!["reth", "foundry", "alloy", "revm"]);
    assert!(plan.entries.iter().all(|e| e.descriptor.is_none()));
}

#[test]
fn test_from_missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = plan(
        &[],
        &SelectionMode::FromFile(dir.path().join("no-such-file.txt")),
    );
    assert!(matches!(result, Err(HarvestError::ReferenceFile { .. })));
}

#[test]
fn test_resolve_mode_declined_subset_selects_all() {
    let repos = catalog(&["a", "b"]);
    let mut input = MockSelectionInput::new();
    input.expect_wants_subset().times(1).returning(|_| Ok(false));
    input.expect_indices().never();

    assert_eq!(resolve_mode(&mut input, &repos).unwrap(), SelectionMode::All);
}

#[test]
fn test_resolve_mode_reads_indices_when_subset_wanted() {
    let repos = catalog(&["a", "b", "c"]);
    let mut input = MockSelectionInput::new();
    input.expect_wants_subset().times(1).returning(|_| Ok(true));
    input
        .expect_indices()
        .times(1)
        .returning(|catalog| {
            assert_eq!(catalog.len(), 3);
            Ok("2,3".to_string())
        });

    let mode = resolve_mode(&mut input, &repos).unwrap();
    assert_eq!(mode, SelectionMode::IndexSubset("2,3".into()));

    let plan = plan(&repos, &mode).unwrap();
    assert_eq!(names(&plan), vec!["b", "c"]);
}

#[test]
fn test_resolve_mode_surfaces_prompt_failure() {
    let mut input = MockSelectionInput::new();
    input
        .expect_wants_subset()
        .returning(|_| Err(std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "stdin closed")));

    let err = resolve_mode(&mut input, &catalog(&["a"])).unwrap_err();
    assert!(matches!(err, HarvestError::Prompt(_)));
}

// Scoring and ranking scenarios
//
// Small hand-checkable catalogs: every expected number below can be worked
// out on paper from the weights.

use super::*;
use crate::catalog::Package;
use crate::error::CoverageError;

/// `A` (weight 3) uses open+read, `B` (weight 1) uses open+mmap, total 4
fn two_package_fixture() -> (UsageCatalog, PopularityTable) {
    let catalog = UsageCatalog::from_packages(
        "fixture",
        vec![
            Package::with_syscalls("A", ["open", "read"]),
            Package::with_syscalls("B", ["open", "mmap"]),
        ],
    )
    .unwrap();
    let popularity = PopularityTable::from_weights([("A", 3.0), ("B", 1.0)], 4.0).unwrap();
    (catalog, popularity)
}

fn names(set: &indexmap::IndexSet<String>) -> Vec<&str> {
    set.iter().map(String::as_str).collect()
}

#[test]
fn test_missing_mmap_blocks_package_b() {
    let (catalog, popularity) = two_package_fixture();
    let support = SupportSet::new(["open", "read"]);

    let result = score(&support, &catalog, &popularity).unwrap();

    assert_eq!(result.weighted_completeness, 75.0);
    assert_eq!(names(&result.unsupported_syscalls), vec!["mmap"]);
    assert_eq!(names(&result.fully_supported_packages), vec!["A"]);
    assert_eq!(
        names(&result.total_syscalls_observed),
        vec!["open", "read", "mmap"]
    );
}

#[test]
fn test_noisy_or_importance_order() {
    let (catalog, popularity) = two_package_fixture();
    let ranking = rank(&catalog, &popularity, ["open", "read", "mmap"]);

    let order: Vec<&str> = ranking.iter().map(|e| e.syscall.as_str()).collect();
    assert_eq!(order, vec!["open", "read", "mmap"]);
    assert_eq!(ranking[0].importance, 0.8125);
    assert_eq!(ranking[1].importance, 0.75);
    assert_eq!(ranking[2].importance, 0.25);
}

#[test]
fn test_rank_reorders_universe() {
    let (catalog, popularity) = two_package_fixture();
    let ranking = rank(&catalog, &popularity, ["mmap", "read", "open"]);
    let order: Vec<&str> = ranking.iter().map(|e| e.syscall.as_str()).collect();
    assert_eq!(order, vec!["open", "read", "mmap"]);
}

#[test]
fn test_rank_ties_keep_universe_order() {
    let catalog = UsageCatalog::from_packages(
        "fixture",
        vec![Package::with_syscalls("A", ["write", "brk", "close"])],
    )
    .unwrap();
    let popularity = PopularityTable::from_weights([("A", 1.0)], 2.0).unwrap();

    let ranking = rank(&catalog, &popularity, ["close", "write", "brk"]);
    let order: Vec<&str> = ranking.iter().map(|e| e.syscall.as_str()).collect();
    assert_eq!(order, vec!["close", "write", "brk"]);
    assert!(ranking.iter().all(|e| e.importance == 0.5));
}

#[test]
fn test_syscall_without_weighted_users_scores_zero() {
    let (catalog, popularity) = two_package_fixture();
    let ranking = rank(&catalog, &popularity, ["open", "io_uring_setup"]);
    assert_eq!(ranking[1].syscall, "io_uring_setup");
    assert_eq!(ranking[1].importance, 0.0);
}

#[test]
fn test_full_support_is_complete() {
    let (catalog, popularity) = two_package_fixture();
    let support = SupportSet::new(["open", "read", "mmap"]);
    let result = score(&support, &catalog, &popularity).unwrap();
    assert_eq!(result.weighted_completeness, 100.0);
    assert!(result.unsupported_syscalls.is_empty());
}

#[test]
fn test_empty_support_scores_zero() {
    let (catalog, popularity) = two_package_fixture();
    let result = score(&SupportSet::default(), &catalog, &popularity).unwrap();
    assert_eq!(result.weighted_completeness, 0.0);
    assert_eq!(result.unsupported_syscalls, result.total_syscalls_observed);
    assert!(result.fully_supported_packages.is_empty());
}

#[test]
fn test_stubbed_syscalls_count_as_support() {
    let (catalog, popularity) = two_package_fixture();
    let support = SupportSet::new(["open", "read"]).with_stubbed(["mmap"]);
    let result = score(&support, &catalog, &popularity).unwrap();
    assert_eq!(result.weighted_completeness, 100.0);
}

#[test]
fn test_completeness_normalizes_by_matched_weight() {
    // Matched packages carry 4 of 10 total weight; completeness is relative
    // to those 4, not to the feed total.
    let (catalog, _) = two_package_fixture();
    let popularity =
        PopularityTable::from_weights([("A", 3.0), ("B", 1.0), ("C", 6.0)], 10.0).unwrap();
    let support = SupportSet::new(["open", "read"]);
    let result = score(&support, &catalog, &popularity).unwrap();
    assert!((result.weighted_completeness - 75.0).abs() < 1e-9);
}

#[test]
fn test_unweighted_package_still_reports_gaps() {
    let catalog = UsageCatalog::from_packages(
        "fixture",
        vec![
            Package::with_syscalls("A", ["open"]),
            Package::with_syscalls("niche", ["open", "userfaultfd"]),
        ],
    )
    .unwrap();
    let popularity = PopularityTable::from_weights([("A", 1.0)], 2.0).unwrap();
    let support = SupportSet::new(["open"]);

    let result = score(&support, &catalog, &popularity).unwrap();
    assert_eq!(result.weighted_completeness, 100.0);
    assert_eq!(names(&result.unsupported_syscalls), vec!["userfaultfd"]);
    assert!(!result.fully_supported_packages.contains("niche"));
}

#[test]
fn test_zero_overlap_is_empty_overlap() {
    let (catalog, _) = two_package_fixture();
    let popularity = PopularityTable::from_weights([("X", 1.0), ("Y", 2.0)], 3.0).unwrap();
    let err = score(&SupportSet::new(["open"]), &catalog, &popularity).unwrap_err();
    match err {
        CoverageError::EmptyOverlap {
            catalog_size,
            popularity_size,
        } => {
            assert_eq!(catalog_size, 2);
            assert_eq!(popularity_size, 2);
        }
        other => panic!("expected EmptyOverlap, got {other}"),
    }
}

#[test]
fn test_zero_weight_overlap_is_empty_overlap() {
    let (catalog, _) = two_package_fixture();
    let popularity = PopularityTable::from_weights([("A", 0.0), ("B", 0.0)], 5.0).unwrap();
    let err = score(&SupportSet::new(["open"]), &catalog, &popularity).unwrap_err();
    assert!(matches!(err, CoverageError::EmptyOverlap { .. }));
}

#[test]
fn test_analysis_shares_join_between_score_and_rank() {
    let (catalog, popularity) = two_package_fixture();
    let support = SupportSet::new(["open", "read"]);
    let analysis = CoverageAnalysis::run(&support, &catalog, &popularity).unwrap();

    assert_eq!(analysis.score.weighted_completeness, 75.0);
    assert_eq!(analysis.ranking.len(), 3);
    assert_eq!(analysis.ranking[0].syscall, "open");
    assert_eq!(analysis.dependents.required_count("open"), 2);
    assert_eq!(analysis.probabilities.get("A"), Some(0.75));
}

#[test]
fn test_analysis_propagates_empty_overlap() {
    let (catalog, _) = two_package_fixture();
    let popularity = PopularityTable::default();
    let result = CoverageAnalysis::run(&SupportSet::new(["open"]), &catalog, &popularity);
    assert!(matches!(result, Err(CoverageError::EmptyOverlap { .. })));
}

#[test]
fn test_uniform_workloads_single_workload_saturates() {
    let catalog = UsageCatalog::from_packages(
        "loupe",
        vec![Package::new("nginx-wrk", ["accept4", "epoll_wait"], ["epoll_wait"]).unwrap()],
    )
    .unwrap();
    let popularity = PopularityTable::from_weights([("nginx-wrk", 1.0)], 1.0).unwrap();
    let ranking = rank(&catalog, &popularity, ["accept4"]);
    assert_eq!(ranking[0].importance, 1.0);
}

// Weighted completeness: the share of popularity-weighted packages whose
// every syscall is supported

use crate::catalog::UsageCatalog;
use crate::coverage::probability::PackageProbabilities;
use crate::error::{CoverageError, Result};
use crate::popularity::PopularityTable;
use crate::support::SupportSet;
use indexmap::IndexSet;
use serde::Serialize;
use tracing::debug;

/// Outcome of scoring a support set against a usage catalog
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreResult {
    /// Percentage in [0, 100]
    pub weighted_completeness: f64,
    /// Every syscall seen in the catalog, in first-seen order
    pub total_syscalls_observed: IndexSet<String>,
    /// `total_syscalls_observed` minus the support set
    pub unsupported_syscalls: IndexSet<String>,
    /// Weighted packages whose syscalls are all supported
    pub fully_supported_packages: IndexSet<String>,
}

/// Score `support` against `catalog` weighted by `popularity`
///
/// # Errors
/// [`CoverageError::EmptyOverlap`] if no catalog entry is in the popularity table.
pub fn score(
    support: &SupportSet,
    catalog: &UsageCatalog,
    popularity: &PopularityTable,
) -> Result<ScoreResult> {
    let probabilities = PackageProbabilities::join(catalog, popularity);
    score_with(support, catalog, &probabilities)
}

/// Score with an already-joined probability mapping
///
/// A package counts as supported only if all of its syscalls are in
/// `support`; one gap forfeits its whole weight. The observed and
/// unsupported syscall sets cover every catalog entry, weighted or not.
pub fn score_with(
    support: &SupportSet,
    catalog: &UsageCatalog,
    probabilities: &PackageProbabilities,
) -> Result<ScoreResult> {
    let total_expect = probabilities.total_expect();
    if probabilities.is_empty() || total_expect <= 0.0 {
        return Err(CoverageError::EmptyOverlap {
            catalog_size: probabilities.catalog_size(),
            popularity_size: probabilities.popularity_size(),
        });
    }

    let mut total_syscalls_observed = IndexSet::new();
    let mut unsupported_syscalls = IndexSet::new();
    let mut fully_supported_packages = IndexSet::new();
    let mut supported_expect = 0.0;

    for pkg in catalog.iter() {
        let mut missing = 0usize;
        for syscall in pkg.syscalls() {
            total_syscalls_observed.insert(syscall.clone());
            if !support.contains(syscall) {
                missing += 1;
                unsupported_syscalls.insert(syscall.clone());
            }
        }

        if let Some(prob) = probabilities.get(pkg.id()) {
            if missing == 0 {
                supported_expect += prob;
                fully_supported_packages.insert(pkg.id().to_string());
            } else {
                debug!("{} blocked by {} unsupported syscalls", pkg.id(), missing);
            }
        }
    }

    Ok(ScoreResult {
        weighted_completeness: 100.0 * supported_expect / total_expect,
        total_syscalls_observed,
        unsupported_syscalls,
        fully_supported_packages,
    })
}

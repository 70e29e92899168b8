// Syscall importance via noisy-OR over popularity-weighted packages

use crate::catalog::UsageCatalog;
use crate::coverage::dependents::DependentsIndex;
use crate::coverage::probability::PackageProbabilities;
use crate::popularity::PopularityTable;
use serde::Serialize;

/// A syscall and the probability that a random weighted install needs it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportanceEntry {
    pub syscall: String,
    pub importance: f64,
}

/// Rank `universe` by importance, most important first
pub fn rank<I, S>(
    catalog: &UsageCatalog,
    popularity: &PopularityTable,
    universe: I,
) -> Vec<ImportanceEntry>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let probabilities = PackageProbabilities::join(catalog, popularity);
    let dependents = DependentsIndex::build(catalog, &probabilities);
    rank_with(universe, &dependents, &probabilities)
}

/// Rank with a prebuilt dependents index
///
/// `importance(s) = 1 - prod(1 - p)` over the weighted packages using `s`.
/// A syscall no weighted package uses scores 0. The sort is stable, so ties
/// keep `universe` order.
pub fn rank_with<I, S>(
    universe: I,
    dependents: &DependentsIndex,
    probabilities: &PackageProbabilities,
) -> Vec<ImportanceEntry>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut ranking: Vec<ImportanceEntry> = universe
        .into_iter()
        .map(|syscall| {
            let syscall = syscall.as_ref();
            let probability_not_used: f64 = dependents
                .required_by(syscall)
                .iter()
                .filter_map(|pkg| probabilities.get(pkg))
                .map(|p| 1.0 - p)
                .product();
            ImportanceEntry {
                syscall: syscall.to_string(),
                importance: 1.0 - probability_not_used,
            }
        })
        .collect();

    ranking.sort_by(|a, b| b.importance.total_cmp(&a.importance));
    ranking
}

// Weighted syscall coverage: completeness score and importance ranking
//
// Inputs are read-only snapshots: a usage catalog (package -> syscalls), a
// popularity table (package -> weight, plus the weight denominator) and the
// shim's support set. Everything here is a pure function of those inputs.
//
// - probability: joins catalog and popularity into per-package probabilities
// - dependents:  syscall -> weighted packages that need it (built once)
// - scorer:      all-or-nothing per package, weighted completeness percentage
// - ranker:      noisy-OR importance, 1 - prod(1 - p) over dependent packages
//
// The noisy-OR treats package usage as independent. Shared libraries make
// that untrue in practice; the model is kept as-is.

mod dependents;
mod probability;
mod ranker;
mod scorer;

pub use dependents::DependentsIndex;
pub use probability::PackageProbabilities;
pub use ranker::{rank, rank_with, ImportanceEntry};
pub use scorer::{score, score_with, ScoreResult};

use crate::catalog::UsageCatalog;
use crate::error::Result;
use crate::popularity::PopularityTable;
use crate::support::SupportSet;
use tracing::info;

/// One full scoring and ranking pass over a snapshot of the inputs
#[derive(Debug, Clone)]
pub struct CoverageAnalysis {
    pub probabilities: PackageProbabilities,
    pub dependents: DependentsIndex,
    pub score: ScoreResult,
    pub ranking: Vec<ImportanceEntry>,
}

impl CoverageAnalysis {
    /// Join once, then score and rank
    ///
    /// # Errors
    /// [`crate::error::CoverageError::EmptyOverlap`] if no catalog entry has a
    /// popularity weight.
    pub fn run(
        support: &SupportSet,
        catalog: &UsageCatalog,
        popularity: &PopularityTable,
    ) -> Result<Self> {
        let probabilities = PackageProbabilities::join(catalog, popularity);
        let score = score_with(support, catalog, &probabilities)?;
        let dependents = DependentsIndex::build(catalog, &probabilities);
        let ranking = rank_with(&score.total_syscalls_observed, &dependents, &probabilities);
        info!(
            "weighted completeness {:.3}% over {} weighted packages, {} syscalls observed",
            score.weighted_completeness,
            probabilities.len(),
            score.total_syscalls_observed.len()
        );
        Ok(Self {
            probabilities,
            dependents,
            score,
            ranking,
        })
    }
}

#[cfg(test)]
mod tests;

// Per-package probability join shared by the scorer and the ranker

use crate::catalog::UsageCatalog;
use crate::popularity::PopularityTable;
use indexmap::IndexMap;

/// Probability that a randomly drawn install is each weighted package
///
/// Only packages present in both the catalog and the popularity table get a
/// probability; the rest are unranked and weigh nothing. `total_expect` sums
/// the matched probabilities, so it is normally below 1.
#[derive(Debug, Clone, Default)]
pub struct PackageProbabilities {
    probs: IndexMap<String, f64>,
    total_expect: f64,
    catalog_size: usize,
    popularity_size: usize,
}

impl PackageProbabilities {
    /// `prob = weight / total_weight` for every package in both inputs, in
    /// catalog order
    pub fn join(catalog: &UsageCatalog, popularity: &PopularityTable) -> Self {
        let total_weight = popularity.total_weight();
        let mut probs = IndexMap::new();
        let mut total_expect = 0.0;
        for pkg in catalog.iter() {
            if let Some(weight) = popularity.weight(pkg.id()) {
                let prob = weight / total_weight;
                probs.insert(pkg.id().to_string(), prob);
                total_expect += prob;
            }
        }
        Self {
            probs,
            total_expect,
            catalog_size: catalog.len(),
            popularity_size: popularity.len(),
        }
    }

    pub fn get(&self, id: &str) -> Option<f64> {
        self.probs.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.probs.contains_key(id)
    }

    /// Sum of matched probabilities (completeness denominator)
    pub fn total_expect(&self) -> f64 {
        self.total_expect
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.probs.iter().map(|(id, p)| (id.as_str(), *p))
    }

    pub fn len(&self) -> usize {
        self.probs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probs.is_empty()
    }

    /// Catalog size at join time
    pub fn catalog_size(&self) -> usize {
        self.catalog_size
    }

    /// Popularity table size at join time
    pub fn popularity_size(&self) -> usize {
        self.popularity_size
    }
}

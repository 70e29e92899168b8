// Reverse index: syscall -> weighted packages that use it

use crate::catalog::UsageCatalog;
use crate::coverage::probability::PackageProbabilities;
use std::collections::HashMap;

/// Which weighted packages require (or tolerate faking) each syscall
///
/// Built once per run over the packages that carry a probability, and shared
/// by the ranker and the gap report. Package lists keep catalog order.
#[derive(Debug, Clone, Default)]
pub struct DependentsIndex {
    required_by: HashMap<String, Vec<String>>,
    faked_by: HashMap<String, Vec<String>>,
}

impl DependentsIndex {
    pub fn build(catalog: &UsageCatalog, probabilities: &PackageProbabilities) -> Self {
        let mut required_by: HashMap<String, Vec<String>> = HashMap::new();
        let mut faked_by: HashMap<String, Vec<String>> = HashMap::new();
        for pkg in catalog.iter().filter(|p| probabilities.contains(p.id())) {
            for syscall in pkg.syscalls() {
                required_by
                    .entry(syscall.clone())
                    .or_default()
                    .push(pkg.id().to_string());
            }
            for syscall in pkg.fakeable() {
                faked_by
                    .entry(syscall.clone())
                    .or_default()
                    .push(pkg.id().to_string());
            }
        }
        Self {
            required_by,
            faked_by,
        }
    }

    /// Weighted packages whose syscall set contains `syscall`
    pub fn required_by(&self, syscall: &str) -> &[String] {
        self.required_by
            .get(syscall)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Weighted packages that still work with `syscall` faked
    pub fn faked_by(&self, syscall: &str) -> &[String] {
        self.faked_by
            .get(syscall)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn required_count(&self, syscall: &str) -> usize {
        self.required_by(syscall).len()
    }

    pub fn faked_count(&self, syscall: &str) -> usize {
        self.faked_by(syscall).len()
    }

    /// Number of distinct syscalls used by weighted packages
    pub fn len(&self) -> usize {
        self.required_by.len()
    }

    pub fn is_empty(&self) -> bool {
        self.required_by.is_empty()
    }
}

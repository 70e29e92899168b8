//! Report layer: top-N gap report and syscall cross-queries
//!
//! Read-only views over a [`CoverageAnalysis`] and its inputs, plus the
//! plain-text rendering used by the default output format.

use crate::catalog::UsageCatalog;
use crate::cli::AnalysisMode;
use crate::coverage::CoverageAnalysis;
use crate::popularity::PopularityTable;
use crate::support::SupportSet;
use serde::Serialize;

/// An unsupported syscall worth implementing next
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GapEntry {
    pub syscall: String,
    pub importance: f64,
    /// Weighted packages/workloads that use the syscall
    pub required_by: usize,
    /// Workloads that still work with it faked (dynamic mode only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub works_faked: Option<usize>,
}

/// Walk the ranking and keep the first `top` syscalls not in `support`
///
/// Supported syscalls are skipped without counting against `top`.
pub fn gap_report(
    analysis: &CoverageAnalysis,
    support: &SupportSet,
    top: usize,
    mode: AnalysisMode,
) -> Vec<GapEntry> {
    analysis
        .ranking
        .iter()
        .filter(|entry| !support.contains(&entry.syscall))
        .take(top)
        .map(|entry| GapEntry {
            syscall: entry.syscall.clone(),
            importance: entry.importance,
            required_by: analysis.dependents.required_count(&entry.syscall),
            works_faked: match mode {
                AnalysisMode::Static => None,
                AnalysisMode::Dynamic => Some(analysis.dependents.faked_count(&entry.syscall)),
            },
        })
        .collect()
}

/// Packages using a syscall, in popularity rank order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageQuery {
    pub syscall: String,
    pub packages: Vec<String>,
    pub count: usize,
}

/// Static mode cross-query
///
/// Walks the popularity table in rank order, so any maintainer filter applied
/// to the table also applies here.
pub fn packages_using(
    syscall: &str,
    catalog: &UsageCatalog,
    popularity: &PopularityTable,
) -> PackageQuery {
    let packages: Vec<String> = popularity
        .entries()
        .filter(|entry| {
            catalog
                .get(&entry.name)
                .is_some_and(|pkg| pkg.uses(syscall))
        })
        .map(|entry| entry.name.clone())
        .collect();
    PackageQuery {
        syscall: syscall.to_string(),
        count: packages.len(),
        packages,
    }
}

/// Workloads using a syscall, split by whether faking it is enough
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkloadQuery {
    pub syscall: String,
    pub required: Vec<String>,
    pub faked: Vec<String>,
    pub total: usize,
}

/// Workload mode cross-query
pub fn workloads_using(syscall: &str, catalog: &UsageCatalog) -> WorkloadQuery {
    let mut required = Vec::new();
    let mut faked = Vec::new();
    for wrk in catalog.iter() {
        if wrk.works_faked(syscall) {
            faked.push(wrk.id().to_string());
        } else if wrk.uses(syscall) {
            required.push(wrk.id().to_string());
        }
    }
    WorkloadQuery {
        syscall: syscall.to_string(),
        total: required.len() + faked.len(),
        required,
        faked,
    }
}

/// Everything the coverage report prints
#[derive(Debug, Clone, PartialEq)]
pub struct CoverageReport {
    pub mode: AnalysisMode,
    pub implemented_syscalls: usize,
    pub stubbed_syscalls: usize,
    pub weighted_completeness: f64,
    pub total_syscalls_observed: usize,
    pub unsupported_syscalls: usize,
    pub fully_supported_packages: usize,
    pub top: usize,
    pub gaps: Vec<GapEntry>,
}

impl CoverageReport {
    pub fn new(
        analysis: &CoverageAnalysis,
        support: &SupportSet,
        top: usize,
        mode: AnalysisMode,
    ) -> Self {
        Self {
            mode,
            implemented_syscalls: support.implemented_count(),
            stubbed_syscalls: support.stubbed_count(),
            weighted_completeness: analysis.score.weighted_completeness,
            total_syscalls_observed: analysis.score.total_syscalls_observed.len(),
            unsupported_syscalls: analysis.score.unsupported_syscalls.len(),
            fully_supported_packages: analysis.score.fully_supported_packages.len(),
            top,
            gaps: gap_report(analysis, support, top, mode),
        }
    }

    /// Human-readable report
    pub fn to_text(&self) -> String {
        let unit = self.mode.unit();
        let mut out = String::new();
        out.push_str(&format!(
            "\nImplemented/Stubbed syscalls: {}/{}\n",
            self.implemented_syscalls, self.stubbed_syscalls
        ));
        out.push_str(&format!(
            "Weighted Completeness = {:.3} %\n",
            self.weighted_completeness
        ));
        out.push_str(&format!(
            "\nTop {} not yet supported syscalls ordered by (API Importance)\n",
            self.top
        ));
        for gap in &self.gaps {
            let faked = match gap.works_faked {
                Some(n) => format!(", works faked in {} {}", n, unit),
                None => String::new(),
            };
            out.push_str(&format!(
                "{:<18} used in {:>2} {}{}\n",
                gap.syscall, gap.required_by, unit, faked
            ));
        }
        out
    }
}

impl PackageQuery {
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for pkg in &self.packages {
            out.push_str(pkg);
            out.push('\n');
        }
        out.push_str(&format!(
            "Number of packages requiring {}: {}\n",
            self.syscall, self.count
        ));
        out
    }
}

impl WorkloadQuery {
    pub fn to_text(&self) -> String {
        let mut out = format!(
            "Number of application requiring '{}': {}\n",
            self.syscall, self.total
        );
        if !self.faked.is_empty() {
            out.push_str(&format!("Faked works in wrks:\n {}\n", self.faked.join(", ")));
        }
        if !self.required.is_empty() {
            out.push_str(&format!("Required by wrks:\n {}\n", self.required.join(", ")));
        }
        out
    }
}

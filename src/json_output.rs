//! JSON output format for coverage reports
//!
//! `--format json` emits one `shimcov-json-v1` document per run.

use crate::query::{CoverageReport, PackageQuery, WorkloadQuery};
use serde::{Deserialize, Serialize};

/// Headline numbers of a coverage run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonSummary {
    /// Distinct syscalls the shim implements
    pub implemented_syscalls: usize,
    /// Stubbed syscalls beyond the implemented ones
    pub stubbed_syscalls: usize,
    /// Weighted completeness percentage (0-100)
    pub weighted_completeness: f64,
    /// Distinct syscalls seen across the whole catalog
    pub total_syscalls_observed: usize,
    /// Observed syscalls missing from the support set
    pub unsupported_syscalls: usize,
    /// Weighted packages with every syscall supported
    pub fully_supported_packages: usize,
}

/// An unsupported syscall in importance order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonGap {
    /// Syscall name (e.g., "io_uring_setup")
    pub syscall: String,
    /// Noisy-OR importance in [0, 1]
    pub importance: f64,
    /// Number of packages/workloads using it
    pub required_by: usize,
    /// Number of workloads that work with it faked (dynamic mode)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub works_faked: Option<usize>,
}

/// Result of a `--syscall` cross-query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonQuery {
    pub syscall: String,
    /// Entries that need the syscall implemented
    pub required: Vec<String>,
    /// Workloads that only need it faked (dynamic mode)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub faked: Vec<String>,
    pub count: usize,
}

/// Root JSON output structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonOutput {
    /// Format version identifier
    pub version: String,
    /// Format name
    pub format: String,
    /// "static" or "dynamic"
    pub mode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<JsonSummary>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub gaps: Vec<JsonGap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<JsonQuery>,
}

impl JsonOutput {
    /// Create a new JSON output structure
    pub fn new(mode: &str) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            format: "shimcov-json-v1".to_string(),
            mode: mode.to_string(),
            summary: None,
            gaps: Vec::new(),
            query: None,
        }
    }

    /// Fill summary and gaps from a coverage report
    pub fn set_report(&mut self, report: &CoverageReport) {
        self.summary = Some(JsonSummary {
            implemented_syscalls: report.implemented_syscalls,
            stubbed_syscalls: report.stubbed_syscalls,
            weighted_completeness: report.weighted_completeness,
            total_syscalls_observed: report.total_syscalls_observed,
            unsupported_syscalls: report.unsupported_syscalls,
            fully_supported_packages: report.fully_supported_packages,
        });
        self.gaps = report
            .gaps
            .iter()
            .map(|g| JsonGap {
                syscall: g.syscall.clone(),
                importance: g.importance,
                required_by: g.required_by,
                works_faked: g.works_faked,
            })
            .collect();
    }

    pub fn set_package_query(&mut self, query: &PackageQuery) {
        self.query = Some(JsonQuery {
            syscall: query.syscall.clone(),
            required: query.packages.clone(),
            faked: Vec::new(),
            count: query.count,
        });
    }

    pub fn set_workload_query(&mut self, query: &WorkloadQuery) {
        self.query = Some(JsonQuery {
            syscall: query.syscall.clone(),
            required: query.required.clone(),
            faked: query.faked.clone(),
            count: query.total,
        });
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

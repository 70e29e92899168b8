//! CSV output format for coverage reports
//!
//! Gap rankings and cross-query results for spreadsheet analysis

use crate::query::{GapEntry, PackageQuery, WorkloadQuery};

/// Escape CSV field (handle commas, quotes, newlines)
fn escape_field(field: &str) -> String {
    // If field contains comma, quote, or newline, wrap in quotes and escape quotes
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// CSV formatter for the top-N gap list
#[derive(Debug)]
pub struct CsvGapOutput {
    gaps: Vec<GapEntry>,
    include_faked: bool,
}

impl CsvGapOutput {
    /// `include_faked` adds the works-faked column (dynamic mode)
    pub fn new(include_faked: bool) -> Self {
        Self {
            gaps: Vec::new(),
            include_faked,
        }
    }

    pub fn add_gap(&mut self, gap: GapEntry) {
        self.gaps.push(gap);
    }

    fn header(&self) -> String {
        let mut headers = vec!["syscall", "importance", "required_by"];
        if self.include_faked {
            headers.push("works_faked");
        }
        headers.join(",")
    }

    fn format_gap(&self, gap: &GapEntry) -> String {
        let mut fields = vec![
            escape_field(&gap.syscall),
            format!("{:.6}", gap.importance),
            gap.required_by.to_string(),
        ];
        if self.include_faked {
            fields.push(gap.works_faked.unwrap_or(0).to_string());
        }
        fields.join(",")
    }

    /// Generate CSV output as string
    pub fn to_csv(&self) -> String {
        let mut output = String::new();
        output.push_str(&self.header());
        output.push('\n');
        for gap in &self.gaps {
            output.push_str(&self.format_gap(gap));
            output.push('\n');
        }
        output
    }
}

/// One row per (syscall, package) pair with how the package needs it
pub fn package_query_csv(query: &PackageQuery) -> String {
    let mut output = String::from("syscall,package,need\n");
    for pkg in &query.packages {
        output.push_str(&format!(
            "{},{},required\n",
            escape_field(&query.syscall),
            escape_field(pkg)
        ));
    }
    output
}

pub fn workload_query_csv(query: &WorkloadQuery) -> String {
    let mut output = String::from("syscall,package,need\n");
    let rows = query
        .faked
        .iter()
        .map(|w| (w, "faked"))
        .chain(query.required.iter().map(|w| (w, "required")));
    for (wrk, need) in rows {
        output.push_str(&format!(
            "{},{},{}\n",
            escape_field(&query.syscall),
            escape_field(wrk),
            need
        ));
    }
    output
}

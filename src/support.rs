//! The shim's supported syscall set
//!
//! Support is the union of what the shim implements and what the operator
//! declares safe to leave stubbed. Only the union matters for scoring; the
//! two counts are kept for the report header.

use crate::error::{CoverageError, Result};
use crate::fetch::Fetcher;
use indexmap::IndexSet;
use regex::Regex;
use std::sync::OnceLock;
use tracing::info;

/// Default Gramine syscall table
pub const GRAMINE_LIBOS_TABLE_URL: &str = "https://raw.githubusercontent.com/gramineproject/gramine/refs/heads/master/libos/src/arch/x86_64/libos_table.c";

/// Syscalls implemented or safely stubbed by the shim
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SupportSet {
    syscalls: IndexSet<String>,
    implemented: usize,
}

impl SupportSet {
    pub fn new<I, S>(implemented: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let syscalls: IndexSet<String> = implemented.into_iter().map(Into::into).collect();
        let implemented = syscalls.len();
        Self {
            syscalls,
            implemented,
        }
    }

    /// Add syscalls that work well enough when stubbed
    pub fn with_stubbed<I, S>(mut self, stubbed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.syscalls.extend(stubbed.into_iter().map(Into::into));
        self
    }

    /// Copy with one more supported syscall
    pub fn with(&self, syscall: &str) -> Self {
        let mut next = self.clone();
        next.syscalls.insert(syscall.to_string());
        next
    }

    pub fn contains(&self, syscall: &str) -> bool {
        self.syscalls.contains(syscall)
    }

    /// Number of distinct implemented syscalls
    pub fn implemented_count(&self) -> usize {
        self.implemented
    }

    /// Stubbed syscalls not already implemented
    pub fn stubbed_count(&self) -> usize {
        self.syscalls.len() - self.implemented
    }

    pub fn len(&self) -> usize {
        self.syscalls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.syscalls.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.syscalls.iter().map(String::as_str)
    }
}

/// One syscall name per line; blank lines are ignored
pub fn parse_syscall_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn libos_entry() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\(libos_syscall_t\)libos_syscall_(.+)").expect("static pattern is valid")
    })
}

/// Extract implemented syscalls from Gramine's `libos_table.c`
///
/// Entries look like `[__NR_read] = (libos_syscall_t)libos_syscall_read,`.
pub fn parse_libos_table(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| libos_entry().captures(line))
        .map(|caps| caps[1].replace(',', "").trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

/// Load the implemented syscall list from `location`
///
/// A location naming `libos_table.c` is parsed as a Gramine table, anything
/// else as a plain list.
///
/// # Errors
/// [`CoverageError::NoSupportedSyscalls`] if nothing was found.
pub fn load_implemented(location: &str, fetcher: &Fetcher) -> Result<Vec<String>> {
    let text = fetcher.fetch_text(location)?;
    let syscalls = if location.contains("libos_table.c") {
        info!("analyzing Gramine from {}", location);
        parse_libos_table(&text)
    } else {
        info!("analyzing against file {}", location);
        parse_syscall_list(&text)
    };
    if syscalls.is_empty() {
        return Err(CoverageError::NoSupportedSyscalls(location.to_string()));
    }
    Ok(syscalls)
}

/// Load syscalls declared safe to leave stubbed
pub fn load_stubbed(location: &str, fetcher: &Fetcher) -> Result<Vec<String>> {
    Ok(parse_syscall_list(&fetcher.fetch_text(location)?))
}

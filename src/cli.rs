//! CLI argument parsing for shimcov

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for coverage reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    Text,
    /// JSON format for machine parsing
    Json,
    /// CSV format for spreadsheet analysis
    Csv,
}

/// Which usage catalog is analyzed
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AnalysisMode {
    /// Statically analyzed packages weighted by popularity
    Static,
    /// Dynamically traced workloads, each weighing the same
    Dynamic,
}

impl AnalysisMode {
    pub fn as_str(self) -> &'static str {
        match self {
            AnalysisMode::Static => "static",
            AnalysisMode::Dynamic => "dynamic",
        }
    }

    /// Noun used for catalog entries in reports
    pub fn unit(self) -> &'static str {
        match self {
            AnalysisMode::Static => "package",
            AnalysisMode::Dynamic => "wrks",
        }
    }
}

/// Where static-mode popularity weights come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PopularitySource {
    /// Debian popcon, installations
    Inst,
    /// Debian popcon, regular users
    Vote,
    /// Ubuntu popularity CSV
    #[value(name = "ubuntu_inst")]
    UbuntuInst,
}

#[derive(Parser, Debug)]
#[command(name = "shimcov")]
#[command(version)]
#[command(
    about = "Weighted syscall completeness and gap ranking for OS-compatibility shims",
    long_about = None
)]
pub struct Cli {
    /// File (or URL) listing implemented syscalls, one per line; defaults to Gramine's libos_table.c
    #[arg(short = 'i', long = "implement-syscalls", value_name = "PATH")]
    pub implement_syscalls: Option<String>,

    /// File listing stubbed syscalls that work fine as stubs
    #[arg(short = 's', long = "stub-syscalls", value_name = "PATH")]
    pub stub_syscalls: Option<String>,

    /// List only the top N unsupported syscalls
    #[arg(short = 't', long = "top", value_name = "N")]
    pub top: Option<usize>,

    /// List the packages (or workloads) using this syscall
    #[arg(short = 'c', long = "syscall", value_name = "NAME")]
    pub syscall: Option<String>,

    /// Popularity source for static analysis
    #[arg(long = "source", value_enum, default_value = "inst", hide = true)]
    pub source: PopularitySource,

    /// Keep only packages from these popcon maintainers
    #[arg(short = 'm', long = "maintainers", num_args = 0.., hide = true)]
    pub maintainers: Vec<String>,

    /// Analysis type: static packages or dynamic workloads
    #[arg(long = "type", value_enum, default_value = "static")]
    pub mode: AnalysisMode,

    /// Output format (text, json or csv)
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Configuration file (TOML)
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Usage catalog to analyze instead of the configured one
    #[arg(long = "api-usage", value_name = "PATH")]
    pub api_usage: Option<String>,

    /// Build the dynamic usage catalog from a Loupe database and exit
    #[arg(long = "ingest-loupe", value_name = "DIR")]
    pub ingest_loupe: Option<PathBuf>,

    /// Enable debug logging to stderr
    #[arg(long = "debug")]
    pub debug: bool,
}

//! Configuration file for shimcov
//!
//! All fields are optional; anything missing falls back to the defaults
//! below. Command-line flags override the file.
//!
//! ```toml
//! api_usage = "data/api_usage.json"
//! application_api_usage = "data/application_api_usage.json"
//! popcon_url = "https://popcon.debian.org/"
//! top = 20
//! http_timeout_secs = 30
//! ```

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// File name picked up from the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "shimcov.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Static (per-package) usage catalog
    pub api_usage: String,
    /// Dynamic (per-workload) usage catalog
    pub application_api_usage: String,
    /// Ubuntu popularity CSV used by `--source ubuntu_inst`
    pub ubuntu_popularity: String,
    /// Popcon base URL (`by_inst` / `by_vote` is appended) or a local feed file
    pub popcon_url: String,
    /// Kernel syscall table used to name Loupe syscall numbers
    pub syscall_table_url: String,
    /// Implemented-syscall source used when `-i` is not given
    pub libos_table_url: String,
    /// Number of unsupported syscalls to list
    pub top: usize,
    /// Timeout for each remote fetch
    pub http_timeout_secs: u64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            api_usage: "data/api_usage.json".to_string(),
            application_api_usage: "data/application_api_usage.json".to_string(),
            ubuntu_popularity: "data/ubuntu_package_popularity.csv".to_string(),
            popcon_url: "https://popcon.debian.org/".to_string(),
            syscall_table_url: "https://raw.githubusercontent.com/torvalds/linux/v6.7/arch/x86/entry/syscalls/syscall_64.tbl".to_string(),
            libos_table_url: crate::support::GRAMINE_LIBOS_TABLE_URL.to_string(),
            top: 20,
            http_timeout_secs: 30,
        }
    }
}

impl AnalyzerConfig {
    /// Load and validate a TOML configuration file
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if given, else `shimcov.toml` if present, else defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_toml(path),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::from_toml(DEFAULT_CONFIG_FILE),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.top == 0 {
            bail!("top must be at least 1");
        }
        if self.http_timeout_secs == 0 {
            bail!("http_timeout_secs must be positive");
        }
        Ok(())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

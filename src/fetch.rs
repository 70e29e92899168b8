//! Input acquisition: local files or blocking HTTP GET
//!
//! Every external table (popcon feed, kernel syscall table, Gramine libos
//! table, usage catalogs) is addressed by a location string. Locations that
//! start with `http://` or `https://` are downloaded; anything else is read
//! from disk. A failure aborts the run; nothing is retried.

use crate::error::{CoverageError, Result};
use std::time::Duration;
use tracing::{debug, info};

/// Default timeout for remote fetches
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Returns true if `location` should be fetched over HTTP
pub fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// Reads input tables from disk or the network
#[derive(Debug, Clone)]
pub struct Fetcher {
    timeout: Duration,
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl Fetcher {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetch the full text at `location`
    pub fn fetch_text(&self, location: &str) -> Result<String> {
        if is_remote(location) {
            self.fetch_remote(location)
        } else {
            debug!("reading {}", location);
            std::fs::read_to_string(location).map_err(|e| CoverageError::Ingestion {
                source_name: location.to_string(),
                reason: e.to_string(),
            })
        }
    }

    fn fetch_remote(&self, url: &str) -> Result<String> {
        info!("fetching {}", url);
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()?;
        let response = client.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(CoverageError::Ingestion {
                source_name: url.to_string(),
                reason: format!("HTTP status {}", status),
            });
        }
        Ok(response.text()?)
    }
}

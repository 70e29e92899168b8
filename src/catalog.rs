//! Usage catalog: which syscalls each package or workload invokes
//!
//! The on-disk format is the JSON usage table shared by the static
//! (per-package) and dynamic (per-workload) analyses:
//!
//! ```json
//! {
//!     "bash": { "system call": ["read", "write", "openat"] },
//!     "redis-get": { "system call": ["epoll_wait", "read"], "works faked": ["epoll_wait"] }
//! }
//! ```
//!
//! Identifiers must be unique. A repeated key in the JSON text is reported as
//! [`CoverageError::DuplicateIdentifier`]; the last value never wins.

use crate::error::{CoverageError, Result};
use crate::fetch::Fetcher;
use indexmap::{IndexMap, IndexSet};
use serde::de::{self, Deserializer as _, IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

/// A package (static mode) or workload (dynamic mode) and its syscall usage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    id: String,
    syscalls: IndexSet<String>,
    fakeable: IndexSet<String>,
}

impl Package {
    /// Package whose syscalls all need a real implementation
    pub fn with_syscalls<I, S>(id: impl Into<String>, syscalls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            syscalls: syscalls.into_iter().map(Into::into).collect(),
            fakeable: IndexSet::new(),
        }
    }

    /// Package with a works-faked subset
    ///
    /// # Errors
    /// [`CoverageError::FakeableNotUsed`] if a fakeable syscall is not in `syscalls`.
    pub fn new<I, S, F, T>(id: impl Into<String>, syscalls: I, fakeable: F) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let mut package = Self::with_syscalls(id, syscalls);
        for name in fakeable {
            let name = name.into();
            if !package.syscalls.contains(&name) {
                return Err(CoverageError::FakeableNotUsed {
                    id: package.id,
                    syscall: name,
                });
            }
            package.fakeable.insert(name);
        }
        Ok(package)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn syscalls(&self) -> &IndexSet<String> {
        &self.syscalls
    }

    pub fn fakeable(&self) -> &IndexSet<String> {
        &self.fakeable
    }

    pub fn uses(&self, syscall: &str) -> bool {
        self.syscalls.contains(syscall)
    }

    pub fn works_faked(&self, syscall: &str) -> bool {
        self.fakeable.contains(syscall)
    }
}

/// Accumulates packages, rejecting duplicate identifiers
#[derive(Debug)]
pub struct CatalogBuilder {
    source_name: String,
    packages: IndexMap<String, Package>,
}

impl CatalogBuilder {
    pub fn new(source_name: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            packages: IndexMap::new(),
        }
    }

    pub fn insert(&mut self, package: Package) -> Result<()> {
        if self.packages.contains_key(package.id()) {
            return Err(CoverageError::DuplicateIdentifier {
                id: package.id,
                source_name: self.source_name.clone(),
            });
        }
        self.packages.insert(package.id.clone(), package);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn build(self) -> UsageCatalog {
        UsageCatalog {
            packages: self.packages,
        }
    }
}

/// Immutable, insertion-ordered set of packages keyed by identifier
#[derive(Debug, Clone, Default)]
pub struct UsageCatalog {
    packages: IndexMap<String, Package>,
}

/// One entry of the JSON usage table
#[derive(Debug, Serialize, Deserialize)]
struct UsageRecord {
    #[serde(rename = "system call")]
    system_call: Vec<String>,
    #[serde(rename = "works faked", default, skip_serializing_if = "Vec::is_empty")]
    works_faked: Vec<String>,
}

impl UsageCatalog {
    /// Build a catalog from packages, failing on the first repeated identifier
    pub fn from_packages<I>(source_name: &str, packages: I) -> Result<Self>
    where
        I: IntoIterator<Item = Package>,
    {
        let mut builder = CatalogBuilder::new(source_name);
        for package in packages {
            builder.insert(package)?;
        }
        Ok(builder.build())
    }

    /// Parse a JSON usage table, keeping file order
    pub fn from_json_str(text: &str, source_name: &str) -> Result<Self> {
        let mut deserializer = serde_json::Deserializer::from_str(text);
        let catalog = (&mut deserializer).deserialize_map(CatalogVisitor { source_name })??;
        deserializer.end()?;
        Ok(catalog)
    }

    /// Serialize back to the JSON usage table format
    pub fn to_json_pretty(&self) -> Result<String> {
        let table: IndexMap<&str, UsageRecord> = self
            .packages
            .values()
            .map(|pkg| {
                let record = UsageRecord {
                    system_call: pkg.syscalls.iter().cloned().collect(),
                    works_faked: pkg.fakeable.iter().cloned().collect(),
                };
                (pkg.id(), record)
            })
            .collect();
        Ok(serde_json::to_string_pretty(&table)?)
    }

    pub fn get(&self, id: &str) -> Option<&Package> {
        self.packages.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.packages.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Package> {
        self.packages.values()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

struct CatalogVisitor<'a> {
    source_name: &'a str,
}

impl<'de> Visitor<'de> for CatalogVisitor<'_> {
    type Value = Result<UsageCatalog>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map from package identifier to its syscall usage")
    }

    fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut builder = CatalogBuilder::new(self.source_name);
        while let Some(id) = map.next_key::<String>()? {
            let record: UsageRecord = map.next_value()?;
            let inserted = Package::new(id, record.system_call, record.works_faked)
                .and_then(|package| builder.insert(package));
            if let Err(err) = inserted {
                // Consume the rest so the JSON reader can close the object cleanly
                while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
                return Ok(Err(err));
            }
        }
        Ok(Ok(builder.build()))
    }
}

impl<'de> Deserialize<'de> for UsageCatalog {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        deserializer
            .deserialize_map(CatalogVisitor {
                source_name: "usage table",
            })?
            .map_err(de::Error::custom)
    }
}

/// Source of a usage catalog
pub trait CatalogProvider {
    fn load(&self) -> Result<UsageCatalog>;
}

/// Usage catalog read from a JSON usage table (local path or URL)
#[derive(Debug, Clone)]
pub struct JsonCatalog {
    pub location: String,
    pub fetcher: Fetcher,
}

impl JsonCatalog {
    pub fn new(location: impl Into<String>, fetcher: Fetcher) -> Self {
        Self {
            location: location.into(),
            fetcher,
        }
    }
}

impl CatalogProvider for JsonCatalog {
    fn load(&self) -> Result<UsageCatalog> {
        let text = self.fetcher.fetch_text(&self.location)?;
        let catalog = UsageCatalog::from_json_str(&text, &self.location)?;
        info!(
            "loaded {} usage entries from {}",
            catalog.len(),
            self.location
        );
        Ok(catalog)
    }
}

//! Package popularity weights
//!
//! A [`PopularityTable`] maps package identifiers to non-negative install
//! weights and carries the denominator used to turn weights into
//! probabilities. The denominator is the feed's own total, so it can exceed
//! the sum of the kept entries once a maintainer filter drops some of them.
//!
//! Providers:
//! - [`PopconFeed`]: Debian popularity-contest `by_inst` / `by_vote` pages
//! - [`PopularityCsv`]: a `package_name,inst` CSV with a `Total` row (Ubuntu)
//! - [`UniformWeights`]: weight 1 for every catalog entry (dynamic workloads)

use crate::catalog::UsageCatalog;
use crate::error::{CoverageError, Result};
use crate::fetch::Fetcher;
use indexmap::IndexMap;
use regex::Regex;
use std::sync::OnceLock;
use tracing::{debug, info};

/// Name of the row carrying the feed total
const TOTAL_ROW: &str = "Total";

/// Popcon column used as the weight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopconField {
    /// Number of installations
    Inst,
    /// Number of regular users
    Vote,
}

impl PopconField {
    pub fn as_str(self) -> &'static str {
        match self {
            PopconField::Inst => "inst",
            PopconField::Vote => "vote",
        }
    }

    fn column(self) -> usize {
        match self {
            PopconField::Inst => 2,
            PopconField::Vote => 3,
        }
    }
}

/// A single ranked package
#[derive(Debug, Clone, PartialEq)]
pub struct PopularityEntry {
    pub name: String,
    pub weight: f64,
    pub rank: Option<u32>,
    pub maintainer: Option<String>,
}

impl PopularityEntry {
    pub fn new(name: impl Into<String>, weight: f64) -> Self {
        Self {
            name: name.into(),
            weight,
            rank: None,
            maintainer: None,
        }
    }
}

/// Popularity weights in rank order plus the weight denominator
#[derive(Debug, Clone, Default)]
pub struct PopularityTable {
    entries: IndexMap<String, PopularityEntry>,
    total_weight: f64,
}

impl PopularityTable {
    /// Build a table from ranked entries
    ///
    /// # Errors
    /// - [`CoverageError::DuplicateIdentifier`] if a name repeats
    /// - [`CoverageError::Ingestion`] for a negative weight, a weight above
    ///   the total, or a non-positive total when entries are present
    pub fn from_entries<I>(source_name: &str, entries: I, total_weight: f64) -> Result<Self>
    where
        I: IntoIterator<Item = PopularityEntry>,
    {
        let mut table = IndexMap::new();
        for entry in entries {
            if !(entry.weight >= 0.0 && entry.weight.is_finite()) {
                return Err(CoverageError::Ingestion {
                    source_name: source_name.to_string(),
                    reason: format!("weight of '{}' is {}", entry.name, entry.weight),
                });
            }
            if entry.weight > total_weight {
                return Err(CoverageError::Ingestion {
                    source_name: source_name.to_string(),
                    reason: format!(
                        "weight of '{}' ({}) exceeds the total weight {}",
                        entry.name, entry.weight, total_weight
                    ),
                });
            }
            if table.contains_key(&entry.name) {
                return Err(CoverageError::DuplicateIdentifier {
                    id: entry.name,
                    source_name: source_name.to_string(),
                });
            }
            table.insert(entry.name.clone(), entry);
        }

        if !table.is_empty() && !(total_weight > 0.0 && total_weight.is_finite()) {
            return Err(CoverageError::Ingestion {
                source_name: source_name.to_string(),
                reason: format!("total weight must be positive, got {}", total_weight),
            });
        }

        Ok(Self {
            entries: table,
            total_weight,
        })
    }

    /// Table from `(name, weight)` pairs, ranked in the given order
    pub fn from_weights<I, S>(pairs: I, total_weight: f64) -> Result<Self>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let entries = pairs.into_iter().enumerate().map(|(i, (name, weight))| {
            let mut entry = PopularityEntry::new(name, weight);
            entry.rank = Some(i as u32 + 1);
            entry
        });
        Self::from_entries("popularity table", entries, total_weight)
    }

    /// Keep only entries maintained by one of `maintainers`
    ///
    /// The total weight is left untouched. An empty list keeps everything.
    pub fn retain_maintainers(mut self, maintainers: &[String]) -> Self {
        if maintainers.is_empty() {
            return self;
        }
        let wanted: Vec<&str> = maintainers.iter().map(|m| normalize_maintainer(m)).collect();
        self.entries.retain(|_, entry| {
            entry
                .maintainer
                .as_deref()
                .is_some_and(|m| wanted.iter().any(|w| *w == normalize_maintainer(m)))
        });
        self
    }

    pub fn weight(&self, name: &str) -> Option<f64> {
        self.entries.get(name).map(|e| e.weight)
    }

    pub fn get(&self, name: &str) -> Option<&PopularityEntry> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    /// Sum of the kept entries' weights
    pub fn effective_weight(&self) -> f64 {
        self.entries.values().map(|e| e.weight).sum()
    }

    /// Entries in rank order
    pub fn entries(&self) -> impl Iterator<Item = &PopularityEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn normalize_maintainer(maintainer: &str) -> &str {
    maintainer
        .trim()
        .trim_start_matches('(')
        .trim_end_matches(')')
        .trim()
}

fn invalid_package_name() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^A-Za-z0-_+\-.]").expect("static pattern is valid"))
}

/// Split on runs of whitespace into at most `max` fields; the last field
/// keeps its inner whitespace
fn split_fields(line: &str, max: usize) -> Vec<&str> {
    let mut fields = Vec::new();
    let mut rest = line.trim();
    while !rest.is_empty() {
        if fields.len() + 1 == max {
            fields.push(rest);
            break;
        }
        match rest.find(char::is_whitespace) {
            Some(end) => {
                fields.push(&rest[..end]);
                rest = rest[end..].trim_start();
            }
            None => {
                fields.push(rest);
                break;
            }
        }
    }
    fields
}

fn parse_count(source_name: &str, line: usize, field: &str) -> Result<f64> {
    field
        .parse::<u64>()
        .map(|v| v as f64)
        .map_err(|_| CoverageError::MalformedRow {
            source_name: source_name.to_string(),
            line,
            reason: format!("expected a count, found '{}'", field),
        })
}

/// Parse a Debian popcon ranking page
///
/// Rows look like
/// `1     dpkg      201953 190398  9547     1     7 (Guillem Jover)`:
/// rank, name, inst, vote, old, recent, no-files, maintainer.
pub fn parse_popcon(text: &str, field: PopconField, source_name: &str) -> Result<PopularityTable> {
    let mut entries: Vec<PopularityEntry> = Vec::new();
    let mut total = None;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        if raw.starts_with('#') || raw.starts_with('-') {
            continue;
        }
        let fields = split_fields(raw, 8);
        if fields.len() < 4 {
            continue;
        }
        let name = fields[1];
        if invalid_package_name().is_match(name) {
            continue;
        }

        let weight = parse_count(source_name, line_no, fields[field.column()])?;
        if name == TOTAL_ROW {
            total = Some(weight);
            continue;
        }

        let rank = fields[0]
            .parse::<u32>()
            .map_err(|_| CoverageError::MalformedRow {
                source_name: source_name.to_string(),
                line: line_no,
                reason: format!("expected a rank, found '{}'", fields[0]),
            })?;
        entries.push(PopularityEntry {
            name: name.to_string(),
            weight,
            rank: Some(rank),
            maintainer: fields.get(7).map(|m| normalize_maintainer(m).to_string()),
        });
    }

    let total = total.ok_or_else(|| CoverageError::MissingTotal(source_name.to_string()))?;
    debug!(
        "parsed {} popcon entries (total {}) from {}",
        entries.len(),
        total,
        source_name
    );
    PopularityTable::from_entries(source_name, entries, total)
}

/// Parse a popularity CSV with `package_name` and `inst` columns
pub fn parse_popularity_csv(text: &str, source_name: &str) -> Result<PopularityTable> {
    let mut lines = text.lines().enumerate();
    let header = match lines.next() {
        Some((_, header)) => header,
        None => return Err(CoverageError::MissingTotal(source_name.to_string())),
    };
    let columns: Vec<&str> = header.split(',').map(str::trim).collect();
    let column = |name: &str| {
        columns
            .iter()
            .position(|c| *c == name)
            .ok_or_else(|| CoverageError::MalformedRow {
                source_name: source_name.to_string(),
                line: 1,
                reason: format!("missing '{}' column", name),
            })
    };
    let name_col = column("package_name")?;
    let inst_col = column("inst")?;

    let mut entries = Vec::new();
    let mut total = None;
    for (idx, line) in lines {
        if line.trim().is_empty() {
            continue;
        }
        let line_no = idx + 1;
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let (name, inst) = match (fields.get(name_col), fields.get(inst_col)) {
            (Some(name), Some(inst)) => (*name, *inst),
            _ => {
                return Err(CoverageError::MalformedRow {
                    source_name: source_name.to_string(),
                    line: line_no,
                    reason: format!("expected {} columns, found {}", columns.len(), fields.len()),
                })
            }
        };
        let weight = parse_count(source_name, line_no, inst)?;
        if name == TOTAL_ROW {
            total = Some(weight);
        } else {
            let mut entry = PopularityEntry::new(name, weight);
            entry.rank = Some(entries.len() as u32 + 1);
            entries.push(entry);
        }
    }

    let total = total.ok_or_else(|| CoverageError::MissingTotal(source_name.to_string()))?;
    PopularityTable::from_entries(source_name, entries, total)
}

/// Source of popularity weights for a usage catalog
pub trait PopularityProvider {
    fn popularity(&self, catalog: &UsageCatalog) -> Result<PopularityTable>;
}

/// Debian popcon ranking, optionally filtered by maintainer
#[derive(Debug, Clone)]
pub struct PopconFeed {
    pub location: String,
    pub field: PopconField,
    pub maintainers: Vec<String>,
    pub fetcher: Fetcher,
}

impl PopconFeed {
    /// Resolve the feed location: a base ending in `/` gets `by_<field>` appended
    pub fn location_for(base: &str, field: PopconField) -> String {
        if base.ends_with('/') {
            format!("{}by_{}", base, field.as_str())
        } else {
            base.to_string()
        }
    }
}

impl PopularityProvider for PopconFeed {
    fn popularity(&self, _catalog: &UsageCatalog) -> Result<PopularityTable> {
        let text = self.fetcher.fetch_text(&self.location)?;
        let table = parse_popcon(&text, self.field, &self.location)?
            .retain_maintainers(&self.maintainers);
        info!(
            "popcon {}: {} packages, total weight {}",
            self.field.as_str(),
            table.len(),
            table.total_weight()
        );
        Ok(table)
    }
}

/// Popularity CSV (e.g. the Ubuntu install table)
#[derive(Debug, Clone)]
pub struct PopularityCsv {
    pub location: String,
    pub fetcher: Fetcher,
}

impl PopularityProvider for PopularityCsv {
    fn popularity(&self, _catalog: &UsageCatalog) -> Result<PopularityTable> {
        let text = self.fetcher.fetch_text(&self.location)?;
        let table = parse_popularity_csv(&text, &self.location)?;
        info!(
            "popularity csv {}: {} packages, total weight {}",
            self.location,
            table.len(),
            table.total_weight()
        );
        Ok(table)
    }
}

/// Every catalog entry weighs 1; the total is the catalog size
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformWeights;

impl PopularityProvider for UniformWeights {
    fn popularity(&self, catalog: &UsageCatalog) -> Result<PopularityTable> {
        let entries = catalog.iter().map(|pkg| PopularityEntry::new(pkg.id(), 1.0));
        PopularityTable::from_entries("uniform weights", entries, catalog.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Package;

    const POPCON_SAMPLE: &str = "\
#Format
#
#<name> is the package name;
#
#rank name                            inst  vote   old recent no-files (maintainer)
#-----------------------------------------------------------------------------------
1     dpkg                           201953 190398  9547     1     7 (Guillem Jover)
2     libc6                          201870 185023 16670     6   171 (GNU Libc Maintainers)
3     bash                           201800 189000  12800    0     0 (Matthias Klose)
4     weird/name                       5000   4000   1000    0     0 (Nobody)
5     perl-base                      199000 150000  49000    0     0 (Niko Tyni)
-----------------------------------------------------------------------------------
99999 Total                          240588 205000  30000  5588     0
";

    #[test]
    fn test_parse_popcon_inst() {
        let table = parse_popcon(POPCON_SAMPLE, PopconField::Inst, "by_inst").unwrap();
        assert_eq!(table.len(), 4);
        assert_eq!(table.total_weight(), 240588.0);
        assert_eq!(table.weight("dpkg"), Some(201953.0));
        assert!(!table.contains("weird/name"));
        let dpkg = table.get("dpkg").unwrap();
        assert_eq!(dpkg.rank, Some(1));
        assert_eq!(dpkg.maintainer.as_deref(), Some("Guillem Jover"));
        let libc = table.get("libc6").unwrap();
        assert_eq!(libc.maintainer.as_deref(), Some("GNU Libc Maintainers"));
    }

    #[test]
    fn test_parse_popcon_vote() {
        let table = parse_popcon(POPCON_SAMPLE, PopconField::Vote, "by_vote").unwrap();
        assert_eq!(table.weight("bash"), Some(189000.0));
        assert_eq!(table.total_weight(), 205000.0);
    }

    #[test]
    fn test_popcon_rank_order_preserved() {
        let table = parse_popcon(POPCON_SAMPLE, PopconField::Inst, "by_inst").unwrap();
        let names: Vec<&str> = table.entries().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["dpkg", "libc6", "bash", "perl-base"]);
    }

    #[test]
    fn test_popcon_duplicate_package_is_fatal() {
        let text = "1 dpkg 10 5 0 0 0 (A)\n2 dpkg 9 4 0 0 0 (B)\n3 Total 100 50 0 0 0\n";
        let err = parse_popcon(text, PopconField::Inst, "by_inst").unwrap_err();
        assert!(matches!(err, CoverageError::DuplicateIdentifier { ref id, .. } if id == "dpkg"));
    }

    #[test]
    fn test_popcon_without_total() {
        let text = "1 dpkg 10 5 0 0 0 (A)\n";
        let err = parse_popcon(text, PopconField::Inst, "by_inst").unwrap_err();
        assert!(matches!(err, CoverageError::MissingTotal(_)));
    }

    #[test]
    fn test_popcon_bad_count() {
        let text = "1 dpkg many 5 0 0 0 (A)\n";
        let err = parse_popcon(text, PopconField::Inst, "by_inst").unwrap_err();
        assert!(matches!(err, CoverageError::MalformedRow { line: 1, .. }));
    }

    #[test]
    fn test_maintainer_filter_keeps_total() {
        let table = parse_popcon(POPCON_SAMPLE, PopconField::Inst, "by_inst")
            .unwrap()
            .retain_maintainers(&["(GNU Libc Maintainers)".to_string(), "Niko Tyni".to_string()]);
        assert_eq!(table.len(), 2);
        assert!(table.contains("libc6"));
        assert!(table.contains("perl-base"));
        assert_eq!(table.total_weight(), 240588.0);
        assert!(table.effective_weight() < table.total_weight());
    }

    #[test]
    fn test_parse_popularity_csv() {
        let text = "package_name,inst\nbash,900\ncoreutils,850\nTotal,1000\n";
        let table = parse_popularity_csv(text, "ubuntu.csv").unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.total_weight(), 1000.0);
        assert_eq!(table.get("coreutils").unwrap().rank, Some(2));
    }

    #[test]
    fn test_popularity_csv_missing_column() {
        let err = parse_popularity_csv("name,inst\nbash,1\n", "ubuntu.csv").unwrap_err();
        assert!(matches!(err, CoverageError::MalformedRow { line: 1, .. }));
    }

    #[test]
    fn test_uniform_weights() {
        let catalog = UsageCatalog::from_packages(
            "t",
            vec![
                Package::with_syscalls("a", ["read"]),
                Package::with_syscalls("b", ["write"]),
                Package::with_syscalls("c", ["mmap"]),
            ],
        )
        .unwrap();
        let table = UniformWeights.popularity(&catalog).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.total_weight(), 3.0);
        assert_eq!(table.weight("b"), Some(1.0));
    }

    #[test]
    fn test_negative_weight_rejected() {
        let err = PopularityTable::from_weights([("a", -1.0)], 10.0).unwrap_err();
        assert!(matches!(err, CoverageError::Ingestion { .. }));
    }

    #[test]
    fn test_weight_above_total_rejected() {
        let err = PopularityTable::from_weights([("a", 3.0), ("b", 1.0)], 2.0).unwrap_err();
        assert!(
            matches!(err, CoverageError::Ingestion { ref reason, .. } if reason.contains("'a'"))
        );
    }

    #[test]
    fn test_popularity_csv_weight_above_total_rejected() {
        let text = "package_name,inst\nA,3\nB,3\nTotal,2\n";
        let err = parse_popularity_csv(text, "ubuntu.csv").unwrap_err();
        assert!(matches!(err, CoverageError::Ingestion { .. }));
    }

    #[test]
    fn test_zero_total_rejected() {
        let err = PopularityTable::from_weights([("a", 0.0)], 0.0).unwrap_err();
        assert!(matches!(err, CoverageError::Ingestion { .. }));
    }

    #[test]
    fn test_location_for() {
        assert_eq!(
            PopconFeed::location_for("https://popcon.debian.org/", PopconField::Vote),
            "https://popcon.debian.org/by_vote"
        );
        assert_eq!(
            PopconFeed::location_for("fixtures/by_inst", PopconField::Inst),
            "fixtures/by_inst"
        );
    }

    #[test]
    fn test_split_fields_keeps_maintainer_spaces() {
        let fields = split_fields("2  libc6  1 2 3 4 5 (GNU Libc Maintainers)", 8);
        assert_eq!(fields.len(), 8);
        assert_eq!(fields[7], "(GNU Libc Maintainers)");
    }
}

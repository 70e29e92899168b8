//! Workload catalog from a Loupe database
//!
//! Loupe records, per traced workload, which syscalls the workload issued and
//! whether it still passed its tests with each syscall stubbed or faked. The
//! database keeps one `dyn.csv` per workload under
//! `<app>/<workload>/<run>/data/dyn.csv`, with rows of
//!
//! ```text
//! syscall,used,works stubbed,works faked,works both
//! 0,Y,N,N,N
//! 202,Y,N,Y,N
//! ```
//!
//! A syscall is required unless it was unused or works stubbed; a required
//! syscall that works faked is also recorded as fakeable.

use crate::catalog::{CatalogBuilder, CatalogProvider, Package, UsageCatalog};
use crate::error::{CoverageError, Result};
use crate::syscalls::SyscallTable;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

const DYN_CSV: &str = "dyn.csv";
const DATA_DIR: &str = "data";

/// Minimum columns in a full Loupe row
const ROW_COLUMNS: usize = 5;

/// Loupe database as a usage catalog provider
#[derive(Debug, Clone)]
pub struct LoupeCatalog {
    pub root: PathBuf,
    pub table: SyscallTable,
}

impl LoupeCatalog {
    pub fn new(root: impl Into<PathBuf>, table: SyscallTable) -> Self {
        Self {
            root: root.into(),
            table,
        }
    }
}

impl CatalogProvider for LoupeCatalog {
    fn load(&self) -> Result<UsageCatalog> {
        read_loupe_db(&self.root, &self.table)
    }
}

/// `<app>-<workload>` for a `.../<app>/<workload>/<run>/data` directory
pub fn workload_id(data_dir: &Path) -> Option<String> {
    let workload_dir = data_dir.parent()?.parent()?;
    let app_dir = workload_dir.parent()?;
    let app = app_dir.file_name()?.to_str()?;
    let workload = workload_dir.file_name()?.to_str()?;
    Some(format!("{}-{}", app, workload))
}

/// Parse one `dyn.csv` into a workload
pub fn parse_dyn_csv(
    id: &str,
    text: &str,
    source_name: &str,
    table: &SyscallTable,
) -> Result<Package> {
    let mut syscalls = Vec::new();
    let mut fakeable = Vec::new();

    // First line is the header
    for (idx, line) in text.lines().enumerate().skip(1) {
        if line.trim().is_empty() {
            continue;
        }
        let line_no = idx + 1;
        let row: Vec<&str> = line.split(',').map(str::trim).collect();
        if row.len() < ROW_COLUMNS {
            return Err(CoverageError::MalformedRow {
                source_name: source_name.to_string(),
                line: line_no,
                reason: format!("expected {} columns, found {}", ROW_COLUMNS, row.len()),
            });
        }
        if row[1] == "N" {
            continue;
        }
        if row[2] == "Y" || row[4] == "Y" {
            continue;
        }

        let num = row[0]
            .parse::<i64>()
            .map_err(|_| CoverageError::MalformedRow {
                source_name: source_name.to_string(),
                line: line_no,
                reason: format!("invalid syscall number '{}'", row[0]),
            })?;
        let name = table.resolve(num);
        if row[3] == "Y" {
            fakeable.push(name.clone());
        }
        syscalls.push(name);
    }

    Package::new(id, syscalls, fakeable)
}

/// Collect every workload under `root`
///
/// # Errors
/// Unreadable directories or files, malformed rows, and two runs that map
/// to the same workload id ([`CoverageError::DuplicateIdentifier`]).
pub fn read_loupe_db(root: &Path, table: &SyscallTable) -> Result<UsageCatalog> {
    let source_name = root.display().to_string();
    let mut builder = CatalogBuilder::new(source_name.clone());

    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(|e| CoverageError::Ingestion {
            source_name: source_name.clone(),
            reason: e.to_string(),
        })?;
        if !entry.file_type().is_file() || entry.file_name() != DYN_CSV {
            continue;
        }
        let data_dir = match entry.path().parent() {
            Some(dir) if dir.file_name().is_some_and(|n| n == DATA_DIR) => dir,
            _ => continue,
        };

        let path = entry.path().display().to_string();
        let id = workload_id(data_dir).ok_or_else(|| CoverageError::Ingestion {
            source_name: path.clone(),
            reason: "expected <app>/<workload>/<run>/data/dyn.csv".to_string(),
        })?;
        info!("reading file: {}", path);
        let text = std::fs::read_to_string(entry.path())?;
        let workload = parse_dyn_csv(&id, &text, &path, table)?;
        debug!("{}: {} required syscalls", id, workload.syscalls().len());
        builder.insert(workload)?;
    }

    info!("collected {} workloads from {}", builder.len(), source_name);
    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const HEADER: &str = "syscall,used,works stubbed,works faked,works both\n";

    fn write_workload(root: &Path, app: &str, workload: &str, run: &str, rows: &str) {
        let dir = root.join(app).join(workload).join(run).join(DATA_DIR);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(DYN_CSV), format!("{HEADER}{rows}")).unwrap();
    }

    #[test]
    fn test_workload_id_from_path() {
        let id = workload_id(Path::new("/db/redis/redis-benchmark/r1/data"));
        assert_eq!(id.as_deref(), Some("redis-redis-benchmark"));
        assert_eq!(workload_id(Path::new("data")), None);
    }

    #[test]
    fn test_parse_dyn_csv_row_semantics() {
        let rows = format!(
            "{HEADER}0,Y,N,N,N\n1,N,N,N,N\n9,Y,Y,N,N\n202,Y,N,Y,N\n12,Y,N,N,Y\n999,Y,N,N,N\n"
        );
        let wrk = parse_dyn_csv("w", &rows, "dyn.csv", &SyscallTable::builtin()).unwrap();
        let names: Vec<&str> = wrk.syscalls().iter().map(String::as_str).collect();
        assert_eq!(names, vec!["read", "futex", "unknown(999)"]);
        assert!(wrk.works_faked("futex"));
        assert!(!wrk.works_faked("read"));
    }

    #[test]
    fn test_parse_dyn_csv_bad_number() {
        let rows = format!("{HEADER}read,Y,N,N,N\n");
        let err = parse_dyn_csv("w", &rows, "dyn.csv", &SyscallTable::builtin()).unwrap_err();
        assert!(matches!(err, CoverageError::MalformedRow { line: 2, .. }));
    }

    #[test]
    fn test_parse_dyn_csv_short_row() {
        let rows = format!("{HEADER}0,Y,N\n");
        let err = parse_dyn_csv("w", &rows, "dyn.csv", &SyscallTable::builtin()).unwrap_err();
        assert!(matches!(err, CoverageError::MalformedRow { .. }));
    }

    #[test]
    fn test_parse_dyn_csv_single_column_row() {
        let rows = format!("{HEADER}0,Y,N,N,N\n5\n");
        let err = parse_dyn_csv("w", &rows, "dyn.csv", &SyscallTable::builtin()).unwrap_err();
        assert!(matches!(err, CoverageError::MalformedRow { line: 3, .. }));
    }

    #[test]
    fn test_read_loupe_db() {
        let root = tempfile::tempdir().unwrap();
        write_workload(root.path(), "nginx", "wrk", "run1", "0,Y,N,N,N\n288,Y,N,N,N\n");
        write_workload(root.path(), "redis", "get", "run1", "202,Y,N,Y,N\n");
        fs::write(root.path().join("README"), "not a workload").unwrap();

        let catalog = read_loupe_db(root.path(), &SyscallTable::builtin()).unwrap();
        assert_eq!(catalog.len(), 2);
        assert!(catalog.get("nginx-wrk").unwrap().uses("accept4"));
        assert!(catalog.get("redis-get").unwrap().works_faked("futex"));
    }

    #[test]
    fn test_read_loupe_db_duplicate_workload() {
        let root = tempfile::tempdir().unwrap();
        write_workload(root.path(), "nginx", "wrk", "run1", "0,Y,N,N,N\n");
        write_workload(root.path(), "nginx", "wrk", "run2", "1,Y,N,N,N\n");

        let err = read_loupe_db(root.path(), &SyscallTable::builtin()).unwrap_err();
        assert!(matches!(err, CoverageError::DuplicateIdentifier { ref id, .. } if id == "nginx-wrk"));
    }

    #[test]
    fn test_loupe_provider_round_trips_through_json() {
        let root = tempfile::tempdir().unwrap();
        write_workload(root.path(), "sqlite", "speedtest", "r", "74,Y,N,Y,N\n0,Y,N,N,N\n");
        let catalog = LoupeCatalog::new(root.path(), SyscallTable::builtin())
            .load()
            .unwrap();
        let json = catalog.to_json_pretty().unwrap();
        let reparsed = UsageCatalog::from_json_str(&json, "application_api_usage.json").unwrap();
        assert!(reparsed.get("sqlite-speedtest").unwrap().works_faked("fsync"));
    }
}

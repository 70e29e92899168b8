//! Error taxonomy for coverage analysis
//!
//! Every precondition violation is a hard failure with a named condition.
//! Nothing here is retried and no partial result is ever returned.

use thiserror::Error;

/// Errors raised while ingesting inputs or computing coverage
#[derive(Error, Debug)]
pub enum CoverageError {
    #[error("Failed to ingest {source_name}: {reason}")]
    Ingestion { source_name: String, reason: String },

    #[error("Malformed row in {source_name} at line {line}: {reason}")]
    MalformedRow {
        source_name: String,
        line: usize,
        reason: String,
    },

    #[error("Duplicate identifier '{id}' in {source_name}")]
    DuplicateIdentifier { id: String, source_name: String },

    #[error("Package '{id}' lists '{syscall}' as works-faked but never uses it")]
    FakeableNotUsed { id: String, syscall: String },

    #[error(
        "No overlap between usage catalog ({catalog_size} entries) and popularity table \
         ({popularity_size} entries): weighted completeness is undefined"
    )]
    EmptyOverlap {
        catalog_size: usize,
        popularity_size: usize,
    },

    #[error("No supported syscalls found in {0}")]
    NoSupportedSyscalls(String),

    #[error("Popularity feed {0} has no 'Total' row")]
    MissingTotal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, CoverageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_overlap_reports_both_sizes() {
        let err = CoverageError::EmptyOverlap {
            catalog_size: 12,
            popularity_size: 3400,
        };
        let msg = err.to_string();
        assert!(msg.contains("12 entries"));
        assert!(msg.contains("3400 entries"));
    }

    #[test]
    fn test_duplicate_identifier_names_source() {
        let err = CoverageError::DuplicateIdentifier {
            id: "bash".to_string(),
            source_name: "data/api_usage.json".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Duplicate identifier 'bash' in data/api_usage.json"
        );
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: CoverageError = io.into();
        assert!(matches!(err, CoverageError::Io(_)));
    }
}

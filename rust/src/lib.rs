pub mod analyzer;

// Re-export main types and functions
pub use analyzer::{scan_repo, write_json, Candidate, ScanConfig, ScanReport, SourceFile};

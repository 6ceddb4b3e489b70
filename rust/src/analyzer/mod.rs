pub mod discover;
pub mod error;
pub mod model;
pub mod render;
pub mod scanner;
pub mod source;
pub mod util;

pub use discover::{DeclShape, FnDecl};
pub use error::{ParseError, RenderError, ScanProblem};
pub use model::Candidate;
pub use render::{Body, BodySwap, RenderMode, PLACEHOLDER_MESSAGE};
pub use scanner::{
    collect_candidates, locate_sources, process_file, scan_repo, write_json, FileOutcome,
    ScanConfig, ScanReport,
};
pub use source::SourceFile;

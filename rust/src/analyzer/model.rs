use serde::{Deserialize, Serialize};

/// One function found during a scan, rendered three ways.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Path of the containing file, relative to the scanned root.
    pub file_path: String,
    /// The containing file with only this function's body replaced.
    pub file_src_code: String,
    pub func_name: String,
    /// Declaration header, no body and no braces.
    pub func_signature: String,
    /// Declaration header followed by the placeholder body.
    pub func_to_write: String,
    pub line_start: usize,
    pub line_end: usize,
}

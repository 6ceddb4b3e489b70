//! Error types for scanning, parsing and rendering.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// A source file that could not be turned into a syntax tree.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The file could not be read as UTF-8 text.
    #[error("{}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file is not valid Rust.
    #[error("{}:{line}:{column}: {message}", path.display())]
    Syntax {
        path: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },
}

impl ParseError {
    pub fn path(&self) -> &PathBuf {
        match self {
            ParseError::Read { path, .. } | ParseError::Syntax { path, .. } => path,
        }
    }
}

/// Failure to print one declaration or the file around it.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no function declaration at index {0}")]
    UnknownDecl(usize),

    #[error("body of `{name}` cannot be elided when rendering the whole file")]
    ElidedInFile { name: String },

    #[error("source range {start}..{end} is outside the file or splits a character")]
    OutOfBounds { start: usize, end: usize },

    #[error("function `{name}` overlaps a preceding declaration")]
    Overlap { name: String },
}

/// A recoverable problem met while scanning a repository.
#[derive(Debug, Error)]
pub enum ScanProblem {
    #[error(transparent)]
    Walk(#[from] walkdir::Error),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

use crate::analyzer::discover::{discover, FnDecl};
use crate::analyzer::error::ParseError;
use crate::analyzer::util::LineIndex;
use std::fs;
use std::path::{Path, PathBuf};

const BOM: char = '\u{feff}';

/// One parsed source file: its text plus every function declaration found at
/// file scope, in the order they are written.
///
/// The declarations carry the body slots the renderer swaps, so a
/// `SourceFile` is the single shared representation all renders of this file
/// go through.
#[derive(Debug)]
pub struct SourceFile {
    pub(crate) path: PathBuf,
    pub(crate) text: String,
    pub(crate) decls: Vec<FnDecl>,
}

impl SourceFile {
    pub fn read(path: &Path) -> Result<Self, ParseError> {
        let content = fs::read_to_string(path).map_err(|source| ParseError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, content)
    }

    pub fn parse(path: impl Into<PathBuf>, content: String) -> Result<Self, ParseError> {
        let path = path.into();
        let text = match content.strip_prefix(BOM) {
            Some(rest) => rest.to_string(),
            None => content,
        };
        let syntax = syn::parse_file(&text).map_err(|err| {
            let start = err.span().start();
            ParseError::Syntax {
                path: path.clone(),
                line: start.line,
                column: start.column + 1,
                message: err.to_string(),
            }
        })?;
        let index = LineIndex::new(&text);
        let decls = discover(&syntax, &text, &index);
        tracing::debug!(
            "parsed {}: {} function declarations",
            path.display(),
            decls.len()
        );
        Ok(Self { path, text, decls })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn decls(&self) -> &[FnDecl] {
        &self.decls
    }

    pub fn decl(&self, index: usize) -> Option<&FnDecl> {
        self.decls.get(index)
    }
}

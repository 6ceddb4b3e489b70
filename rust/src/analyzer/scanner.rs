use crate::analyzer::error::{ParseError, RenderError, ScanProblem};
use crate::analyzer::model::Candidate;
use crate::analyzer::source::SourceFile;
use crate::analyzer::util::rel_path;
use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::Serialize;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

pub const DEFAULT_EXTENSION: &str = "rs";
pub const DEFAULT_TEST_SUFFIX: &str = "_test.rs";
pub const DEFAULT_TEST_FILE_NAME: &str = "tests.rs";
pub const DEFAULT_TEST_DIR: &str = "tests";

// Build output and VCS metadata below the root are never scanned.
const SKIPPED_DIRS: &[&str] = &["target", ".git"];

#[derive(Clone, Debug)]
pub struct ScanConfig {
    pub root: PathBuf,
    /// Extension of source files, without the dot.
    pub extension: String,
    /// File name endings that mark a test file.
    pub test_suffixes: Vec<String>,
    /// Exact file names that mark a test file.
    pub test_file_names: Vec<String>,
    /// Directory names below the root whose contents are tests.
    pub test_dirs: Vec<String>,
    /// Worker threads for per-file processing; 1 keeps everything on the
    /// calling thread and 0 uses one worker per CPU.
    pub jobs: usize,
}

impl ScanConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extension: DEFAULT_EXTENSION.to_string(),
            test_suffixes: vec![DEFAULT_TEST_SUFFIX.to_string()],
            test_file_names: vec![DEFAULT_TEST_FILE_NAME.to_string()],
            test_dirs: vec![DEFAULT_TEST_DIR.to_string()],
            jobs: 1,
        }
    }

    fn is_source_file(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().map(|n| n.to_string_lossy()) else {
            return false;
        };
        path.extension().and_then(|e| e.to_str()) == Some(self.extension.as_str())
            && !self.test_suffixes.iter().any(|s| name.ends_with(s.as_str()))
            && !self.test_file_names.iter().any(|n| name == n.as_str())
    }

    // The root itself is always walked, whatever its name.
    fn is_pruned_dir(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            return false;
        }
        let Some(name) = entry.file_name().to_str() else {
            return false;
        };
        SKIPPED_DIRS.contains(&name) || self.test_dirs.iter().any(|d| d == name)
    }
}

#[derive(Debug, Default)]
pub struct ScanReport {
    pub candidates: Vec<Candidate>,
    pub problems: Vec<ScanProblem>,
    /// Declarations dropped because they could not be rendered.
    pub skipped_functions: usize,
}

/// Result of processing one file.
#[derive(Debug)]
pub enum FileOutcome {
    Parsed {
        candidates: Vec<Candidate>,
        skipped: usize,
    },
    Failed(ParseError),
}

/// Source files under the root in lexical order, directories excluded.
/// Entries that cannot be read come through as errors and the walk goes on.
pub fn locate_sources(cfg: &ScanConfig) -> impl Iterator<Item = walkdir::Result<PathBuf>> + '_ {
    WalkDir::new(&cfg.root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(move |e| !cfg.is_pruned_dir(e))
        .filter_map(move |entry| match entry {
            Ok(e) if e.file_type().is_dir() => None,
            Ok(e) if cfg.is_source_file(e.path()) => Some(Ok(e.into_path())),
            Ok(_) => None,
            Err(err) => Some(Err(err)),
        })
}

fn report_problem(root: &Path, cause: &dyn std::fmt::Display) {
    tracing::warn!("Problem processing repo directory: {:?}: {}", root, cause);
}

pub fn scan_repo(cfg: &ScanConfig) -> Result<ScanReport> {
    let mut report = ScanReport::default();
    let mut files = Vec::new();
    for entry in locate_sources(cfg) {
        match entry {
            Ok(path) => files.push(path),
            Err(err) => {
                report_problem(&cfg.root, &err);
                report.problems.push(err.into());
            }
        }
    }
    tracing::debug!("scanning {} source files under {}", files.len(), cfg.root.display());

    for outcome in process_files(cfg, &files)? {
        match outcome {
            FileOutcome::Parsed {
                mut candidates,
                skipped,
            } => {
                report.candidates.append(&mut candidates);
                report.skipped_functions += skipped;
            }
            FileOutcome::Failed(err) => report.problems.push(err.into()),
        }
    }
    tracing::debug!(
        "found {} candidates ({} skipped, {} problems)",
        report.candidates.len(),
        report.skipped_functions,
        report.problems.len()
    );
    Ok(report)
}

// Outcomes come back in the order of `files` whatever order workers finish in.
fn process_files(cfg: &ScanConfig, files: &[PathBuf]) -> Result<Vec<FileOutcome>> {
    if cfg.jobs == 1 {
        return Ok(files.iter().map(|f| process_file(cfg, f)).collect());
    }
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(cfg.jobs)
        .build()
        .context("Failed to start worker pool")?;
    Ok(pool.install(|| files.par_iter().map(|f| process_file(cfg, f)).collect()))
}

pub fn process_file(cfg: &ScanConfig, path: &Path) -> FileOutcome {
    let mut source = match SourceFile::read(path) {
        Ok(source) => source,
        Err(err) => {
            report_problem(&cfg.root, &err);
            return FileOutcome::Failed(err);
        }
    };
    let rel = rel_path(&cfg.root, path);
    let (candidates, skipped) = collect_candidates(&mut source, &rel);
    FileOutcome::Parsed {
        candidates,
        skipped,
    }
}

/// One candidate per declaration of `source`; declarations that fail to
/// render are logged and left out.
pub fn collect_candidates(source: &mut SourceFile, file_path: &str) -> (Vec<Candidate>, usize) {
    let mut out = Vec::with_capacity(source.decls().len());
    let mut skipped = 0;
    for index in 0..source.decls().len() {
        match build_candidate(source, index, file_path) {
            Ok(candidate) => out.push(candidate),
            Err(err) => {
                let name = source
                    .decl(index)
                    .map(|d| d.qualified_name())
                    .unwrap_or_default();
                tracing::warn!(
                    "Problem rendering `{}` in {}: {}",
                    name,
                    source.path().display(),
                    err
                );
                skipped += 1;
            }
        }
    }
    (out, skipped)
}

fn build_candidate(
    source: &mut SourceFile,
    index: usize,
    file_path: &str,
) -> Result<Candidate, RenderError> {
    let func_signature = source.signature(index)?;
    let func_to_write = source.placeholder_decl(index)?;
    let file_src_code = source.placeholder_file(index)?;
    let decl = source.decl(index).ok_or(RenderError::UnknownDecl(index))?;
    Ok(Candidate {
        file_path: file_path.to_string(),
        file_src_code,
        func_name: decl.name().to_string(),
        func_signature,
        func_to_write,
        line_start: decl.line_start(),
        line_end: decl.line_end(),
    })
}

pub fn write_json(records: &[Candidate], out: &mut dyn Write, pretty: bool) -> Result<()> {
    let mut buf = BufWriter::new(out);
    if pretty {
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"  ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        records.serialize(&mut ser)?;
    } else {
        serde_json::to_writer(&mut buf, records)?;
    }
    buf.write_all(b"\n")?;
    buf.flush()?;
    Ok(())
}

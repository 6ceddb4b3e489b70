use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{Parser, ValueEnum};
use rewrite_scout::analyzer::scanner::{
    DEFAULT_EXTENSION, DEFAULT_TEST_DIR, DEFAULT_TEST_FILE_NAME, DEFAULT_TEST_SUFFIX,
};
use rewrite_scout::{scan_repo, write_json, ScanConfig};
use std::fs::File;
use std::io::{self, BufWriter, IsTerminal};
use std::path::PathBuf;

const USAGE: &str = "rewrite-scout [strategy] [repo-directory]";

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Strategy {
    /// Every function, with its body swapped for a placeholder
    RewriteCandidates,
}

#[derive(Parser, Debug)]
#[command(
    name = "rewrite-scout",
    version,
    about = "Scan Rust sources and emit function rewrite candidates as JSON",
    override_usage = USAGE
)]
struct Cli {
    /// Extraction strategy
    #[arg(value_enum)]
    strategy: Strategy,

    /// Root directory of the repository to scan
    repo_dir: PathBuf,

    /// Extension of source files
    #[arg(long, value_name = "ext", default_value = DEFAULT_EXTENSION)]
    extension: String,

    /// File name suffix marking test files (repeatable)
    #[arg(long = "test-suffix", value_name = "suffix", default_value = DEFAULT_TEST_SUFFIX)]
    test_suffixes: Vec<String>,

    /// Exact file name marking a test file (repeatable)
    #[arg(long = "test-file-name", value_name = "name", default_value = DEFAULT_TEST_FILE_NAME)]
    test_file_names: Vec<String>,

    /// Directory below the root holding tests, skipped entirely (repeatable)
    #[arg(long = "test-dir", value_name = "dir", default_value = DEFAULT_TEST_DIR)]
    test_dirs: Vec<String>,

    /// Files processed in parallel (0 = one per CPU)
    #[arg(short, long, value_name = "n", default_value_t = 1)]
    jobs: usize,

    /// Output file for the JSON array (default stdout)
    #[arg(long, value_name = "file")]
    out: Option<PathBuf>,

    /// Indent the JSON output
    #[arg(long)]
    pretty: bool,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Log debug detail
    #[arg(short, long)]
    verbose: bool,
}

fn parse_cli() -> Cli {
    match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(err) => {
            let rendered = err.render().to_string();
            eprint!("{rendered}");
            if !rendered.contains(USAGE) {
                eprintln!("\nUsage: {USAGE}");
            }
            std::process::exit(2);
        }
    }
}

fn init_tracing(quiet: bool, verbose: bool) -> Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("REWRITE_SCOUT_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .without_time()
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}

fn main() -> Result<()> {
    let cli = parse_cli();
    init_tracing(cli.quiet, cli.verbose)?;

    if !cli.repo_dir.exists() {
        anyhow::bail!("Repo directory does not exist: {:?}", cli.repo_dir);
    }

    let report = match cli.strategy {
        Strategy::RewriteCandidates => scan_repo(&ScanConfig {
            root: cli.repo_dir.clone(),
            extension: cli.extension.clone(),
            test_suffixes: cli.test_suffixes.clone(),
            test_file_names: cli.test_file_names.clone(),
            test_dirs: cli.test_dirs.clone(),
            jobs: cli.jobs,
        })?,
    };

    match cli.out {
        Some(p) => {
            let f = File::create(&p).with_context(|| format!("Failed to create {}", p.display()))?;
            write_json(&report.candidates, &mut BufWriter::new(f), cli.pretty)?;
        }
        None => {
            let mut out = io::stdout().lock();
            write_json(&report.candidates, &mut out, cli.pretty)?;
        }
    }
    Ok(())
}

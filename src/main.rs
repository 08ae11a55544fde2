use anyhow::{Context, Result};
use clap::Parser;
use pdf2bib::config::{find_config_file, load_config};
use pdf2bib::output::{Destination, OutputSink};
use pdf2bib::pipeline::{Options, Pipeline};
use pdf2bib::sources::CrossRefSource;
use pdf2bib::tools::{ExifToolStore, PdftotextExtractor};
use pdf2bib::ui;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// pdf2bib - Recover BibTeX records for PDF papers by DOI
#[derive(Parser, Debug)]
#[command(name = "pdf2bib")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Find the DOI of PDF papers, fetch their BibTeX records, and optionally rename them", long_about = None)]
struct Cli {
    /// PDF files to process, in order
    #[arg(value_name = "PDF", required_unless_present = "print_config")]
    files: Vec<PathBuf>,

    /// Where to write BibTeX records ("-" for standard output)
    #[arg(long, value_name = "PATH", default_value = "-")]
    bibtex: String,

    /// Rename each file after its title and embed the record in its metadata
    #[arg(long)]
    rename: bool,

    /// Ignore records embedded in the files and always look up the DOI
    #[arg(long)]
    force: bool,

    /// Append to the --bibtex file instead of truncating it
    #[arg(long)]
    append: bool,

    /// Stop at the first file that fails
    #[arg(long)]
    fail_fast: bool,

    /// Contact address sent to CrossRef (polite pool)
    #[arg(long, value_name = "EMAIL")]
    mailto: Option<String>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Configuration file path
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable verbose logging (can be used multiple times: -v, -vv, -vvv)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress status output; failed files are still listed
    #[arg(long, short)]
    quiet: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

fn init_tracing(verbose: u8, quiet: bool) {
    let log_level = match verbose {
        0 => "error",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let env_filter = if quiet { "error" } else { log_level };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("pdf2bib={}", env_filter)),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    // Load configuration from file if specified or found in default locations
    let config_path = match &cli.config {
        Some(path) => Some(path.clone()),
        None => find_config_file(),
    };
    if let Some(path) = &config_path {
        tracing::info!("Using config file: {}", path.display());
    }
    let mut config = load_config(config_path.as_deref()).context("Failed to load configuration")?;

    if let Some(mailto) = cli.mailto {
        config.crossref.mailto = Some(mailto);
    }
    if let Some(timeout) = cli.timeout {
        config.crossref.timeout_secs = timeout;
    }

    if cli.print_config {
        print!("{}", config.to_toml().context("Failed to render configuration")?);
        return Ok(ExitCode::SUCCESS);
    }

    let source = CrossRefSource::new(&config.crossref).context("Failed to create HTTP client")?;
    let extractor = PdftotextExtractor::new(&config.tools.pdftotext);
    let metadata = ExifToolStore::new(&config.tools.exiftool, &config.metadata.tag);

    let options = Options {
        force: cli.force,
        rename: cli.rename,
        fail_fast: cli.fail_fast,
    };
    let pipeline = Pipeline::new(
        Arc::new(source),
        Arc::new(extractor),
        Arc::new(metadata),
        options,
    );

    let destination = Destination::parse(&cli.bibtex);
    let mut sink = OutputSink::open(&destination, cli.append)
        .with_context(|| format!("Failed to open output {}", cli.bibtex))?;

    let color = ui::is_terminal();
    let progress = ui::BatchProgress::new(cli.files.len(), color && !cli.quiet);

    let report = pipeline
        .run_with(&cli.files, &mut sink, |outcome| {
            if !cli.quiet {
                progress.record(&ui::outcome_line(outcome, color));
            }
        })
        .await
        .with_context(|| format!("Failed to write to {}", sink.label()))?;
    progress.finish();

    if cli.quiet {
        // Status lines were suppressed, but failures are always reported.
        for (path, err) in report.failures() {
            eprintln!("{}: [{}] {}", path.display(), err.kind(), err);
        }
    } else {
        for line in ui::skipped_lines(&report, color) {
            eprintln!("{}", line);
        }
        if cli.files.len() > 1 {
            eprintln!("{}", ui::summary_line(&report, color));
        }
    }

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

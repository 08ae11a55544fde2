//! Terminal status output.
//!
//! Everything here writes to stderr so that BibTeX on stdout can be piped.
//! Colors and the progress bar are only used when stderr is a terminal.

use owo_colors::OwoColorize;
use std::io::IsTerminal;

use crate::pipeline::{BatchReport, FileOutcome, RecordOrigin};

/// Check if stderr is a terminal.
pub fn is_terminal() -> bool {
    std::io::stderr().is_terminal()
}

/// Status icons for different operations.
pub fn status_icon(status: Status) -> &'static str {
    match status {
        Status::Success => "✓",
        Status::Error => "✗",
        Status::Skipped => "○",
    }
}

/// Status types for colored output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Error,
    Skipped,
}

/// One status line for a processed file.
pub fn outcome_line(outcome: &FileOutcome, color: bool) -> String {
    let name = outcome.path.display().to_string();
    match &outcome.result {
        Ok(processed) => {
            let via = match &processed.origin {
                RecordOrigin::Embedded => "embedded record".to_string(),
                RecordOrigin::Fetched(resolved) => {
                    format!("{} via {}", resolved.doi, resolved.origin)
                }
            };
            let mut line = format!("{} ({})", name, via);
            if let Some(target) = &processed.renamed_to {
                line.push_str(&format!(" → {}", target.display()));
            }
            styled(Status::Success, &line, color)
        }
        Err(err) => styled(Status::Error, &format!("[{}] {}", err.kind(), err), color),
    }
}

fn styled(status: Status, msg: &str, color: bool) -> String {
    let icon = status_icon(status);
    if !color {
        return format!("{} {}", icon, msg);
    }
    match status {
        Status::Success => format!("{} {}", icon.green().bold(), msg),
        Status::Error => format!("{} {}", icon.red().bold(), msg),
        Status::Skipped => format!("{} {}", icon.white().dimmed(), msg.dimmed()),
    }
}

/// Closing summary line.
pub fn summary_line(report: &BatchReport, color: bool) -> String {
    let mut line = format!(
        "{} processed, {} failed",
        report.succeeded(),
        report.failed()
    );
    if !report.skipped.is_empty() {
        line.push_str(&format!(", {} skipped", report.skipped.len()));
    }

    let status = if report.is_success() {
        Status::Success
    } else {
        Status::Error
    };
    styled(status, &line, color)
}

/// Lines for files skipped after a fail-fast stop.
pub fn skipped_lines(report: &BatchReport, color: bool) -> Vec<String> {
    report
        .skipped
        .iter()
        .map(|p| styled(Status::Skipped, &format!("{} (skipped)", p.display()), color))
        .collect()
}

/// Progress bar over the input files, hidden when not on a terminal.
pub struct BatchProgress {
    pb: indicatif::ProgressBar,
}

impl BatchProgress {
    pub fn new(total: usize, visible: bool) -> Self {
        let pb = if visible && total > 1 {
            indicatif::ProgressBar::new(total as u64)
        } else {
            indicatif::ProgressBar::hidden()
        };
        if let Ok(style) =
            indicatif::ProgressStyle::with_template("{spinner:.cyan} {wide_bar:.cyan/blue} {pos}/{len}")
        {
            pb.set_style(style.progress_chars("█▉ "));
        }
        Self { pb }
    }

    /// Print a line above the bar and advance it.
    pub fn record(&self, line: &str) {
        self.pb.suspend(|| eprintln!("{}", line));
        self.pb.inc(1);
    }

    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }
}

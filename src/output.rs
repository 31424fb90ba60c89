//! CLI output formatting for `imgpress compress`.
//!
//! Formatters return lines instead of printing so tests can check them.
//!
//! ```text
//! Target: 500 KB
//! 001 q90 1920x1080 800 KB
//! 002 q85 1728x972 612 KB
//! 003 q80 1555x874 497 KB
//! Result: 497 KB at q80, 1555x874 (target met)
//!     Output: compressed-photo.jpg
//! ```

use crate::compress::{Attempt, CompressionResult};
use crate::imaging::calculations::size_kb;
use std::path::Path;

fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn attempt_line(index: usize, attempt: &Attempt) -> String {
    format!(
        "{} q{} {}x{} {} KB",
        format_index(index),
        attempt.quality,
        attempt.width,
        attempt.height,
        size_kb(attempt.bytes)
    )
}

/// Format a compression run: one line per pass, then the outcome.
pub fn format_compression_report(
    result: &CompressionResult,
    target_kb: u64,
    output: &Path,
) -> Vec<String> {
    let mut lines = Vec::with_capacity(result.attempts.len() + 3);
    lines.push(format!("Target: {} KB", target_kb));

    for (i, attempt) in result.attempts.iter().enumerate() {
        lines.push(attempt_line(i + 1, attempt));
    }

    let status = if result.target_met {
        "target met"
    } else {
        "best effort, target not met"
    };
    lines.push(format!(
        "Result: {} KB at q{}, {}x{} ({})",
        result.size_kb, result.quality, result.width, result.height, status
    ));
    lines.push(format!("    Output: {}", output.display()));
    lines
}

/// Print the compression report to stdout.
pub fn print_compression_report(result: &CompressionResult, target_kb: u64, output: &Path) {
    for line in format_compression_report(result, target_kb, output) {
        println!("{}", line);
    }
}

//! Human-readable summaries.

use cairn_sync::{DeleteSummary, FileOutcome, FileReport, PullSummary, PushSummary};

/// Formats a byte count.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

fn print_failures(files: &[FileReport]) {
    for file in files {
        if let FileOutcome::Failed(message) = &file.outcome {
            println!("  ✗ {}: {message}", file.path);
        }
    }
}

/// Prints a push or upload summary.
pub fn push_summary(summary: &PushSummary, verbose: bool) {
    if verbose {
        for file in &summary.files {
            match &file.outcome {
                FileOutcome::Created => println!("  + {}", file.path),
                FileOutcome::Updated => println!("  ~ {}", file.path),
                FileOutcome::Skipped(reason) => println!("  = {} ({})", file.path, reason.describe()),
                _ => {}
            }
        }
    }
    print_failures(&summary.files);
    println!(
        "✓ {} uploaded ({} new, {} updated), {} skipped, {} failed, {}",
        summary.uploaded(),
        summary.created,
        summary.updated,
        summary.skipped,
        summary.failed,
        format_bytes(summary.bytes)
    );
    if summary.failed > 0 {
        println!("  Re-run the command to retry failed files.");
    }
}

/// Prints a pull or download summary.
pub fn pull_summary(summary: &PullSummary, verbose: bool) {
    if verbose {
        for file in &summary.files {
            match &file.outcome {
                FileOutcome::Downloaded => println!("  ↓ {}", file.path),
                FileOutcome::Skipped(reason) => println!("  = {} ({})", file.path, reason.describe()),
                _ => {}
            }
        }
    }
    print_failures(&summary.files);
    println!(
        "✓ {} downloaded, {} skipped, {} failed, {}",
        summary.downloaded,
        summary.skipped,
        summary.failed,
        format_bytes(summary.bytes)
    );
    if summary.failed > 0 {
        println!("  Re-run the command to retry failed files.");
    }
}

/// Prints a delete summary.
pub fn delete_summary(summary: &DeleteSummary) {
    print_failures(&summary.files);
    println!("✓ {} deleted, {} failed", summary.deleted, summary.failed);
}

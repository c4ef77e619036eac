//! Markdown summary generation
//!
//! This module generates human-readable markdown summaries of harvest runs.

use crate::output::traits::{HarvestSummary, OutputResult};
use crate::state::PageStatus;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes a markdown summary of a harvest run
///
/// # Arguments
///
/// * `summary` - The harvest summary data
/// * `output_path` - Path where the markdown file should be written
pub fn generate_markdown_summary(summary: &HarvestSummary, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_summary(summary);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a harvest summary as markdown
pub fn format_markdown_summary(summary: &HarvestSummary) -> String {
    let mut md = String::new();

    md.push_str("# SKU Harvest Summary\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Run ID**: {}\n", summary.run_id));
    md.push_str(&format!("- **Started**: {}\n", summary.started_at));
    if let Some(finished) = &summary.finished_at {
        md.push_str(&format!("- **Finished**: {}\n", finished));
    }
    if let Some(duration) = summary.duration_seconds {
        md.push_str(&format!(
            "- **Duration**: {} seconds ({:.2} minutes)\n",
            duration,
            duration as f64 / 60.0
        ));
    }
    md.push_str(&format!("- **Status**: {}\n", summary.status));
    md.push_str(&format!("- **Config Hash**: {}\n\n", summary.config_hash));

    // Result
    md.push_str("## Result\n\n");
    match summary.identifier_count {
        Some(count) => md.push_str(&format!("- **Unique Identifiers**: {}\n", count)),
        None => md.push_str("- **Unique Identifiers**: not compiled\n"),
    }
    match summary.repeat_page {
        Some(page) => md.push_str(&format!("- **Catalog End**: page {} repeated page 1\n", page)),
        None => md.push_str("- **Catalog End**: not detected before the page ceiling\n"),
    }
    md.push_str(&format!("- **Pages Processed**: {}\n", summary.total_pages()));
    md.push_str(&format!(
        "- **Failure Rate**: {:.2}%\n\n",
        summary.failure_rate()
    ));

    // Status breakdown
    md.push_str("## Page Status Breakdown\n\n");
    md.push_str("| Status | Count |\n");
    md.push_str("|--------|-------|\n");
    for status in PageStatus::all_statuses() {
        md.push_str(&format!("| {} | {} |\n", status, summary.pages(status)));
    }
    md.push('\n');

    if !summary.failed_pages.is_empty() {
        md.push_str("## Failed Pages\n\n");
        md.push_str("| Page | Error |\n");
        md.push_str("|------|-------|\n");

        for (page, error) in summary.failed_pages.iter().take(50) {
            md.push_str(&format!("| {} | {} |\n", page, error.replace('|', "\\|")));
        }
        if summary.failed_pages.len() > 50 {
            md.push_str(&format!(
                "\n... and {} more\n",
                summary.failed_pages.len() - 50
            ));
        }
        md.push('\n');
    }

    md
}

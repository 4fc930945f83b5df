//! `merge-ado`: join the flat list with the bulk-update sheet

use crate::merge::merge_files;
use crate::models::MergeConfig;
use crate::Result;
use colored::Colorize;
use std::path::PathBuf;

pub fn run(
    titles: Option<PathBuf>,
    attributes: Option<PathBuf>,
    output: Option<PathBuf>,
    config: &MergeConfig,
) -> Result<()> {
    let titles = titles.unwrap_or_else(|| config.titles.clone());
    let attributes = attributes.unwrap_or_else(|| config.attributes.clone());
    let output = output.unwrap_or_else(|| config.output.clone());

    println!(
        "{}",
        format!(
            "🔗 Merging {} with {}",
            titles.display(),
            attributes.display()
        )
        .cyan()
    );

    let summary = merge_files(&titles, &attributes, &output)?;

    if summary.matched < summary.rows {
        println!(
            "{}",
            format!(
                "⚠️  {} row(s) had no matching attributes",
                summary.rows - summary.matched
            )
            .yellow()
        );
    }

    println!(
        "{}",
        format!(
            "✅ Wrote {} row(s) ({} matched) to {}",
            summary.rows,
            summary.matched,
            output.display()
        )
        .green()
    );

    Ok(())
}

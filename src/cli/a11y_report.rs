//! `a11y-report`: categorized CSV reports from the accessibility export

use crate::models::ReportConfig;
use crate::parser::ExportParser;
use crate::report::{write_report, Categorizer, Report};
use crate::Result;
use anyhow::Context;
use colored::Colorize;
use std::path::PathBuf;
use tracing::info;

pub fn run(
    input: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    json: bool,
    config: &ReportConfig,
) -> Result<()> {
    let input = input.unwrap_or_else(|| config.input.clone());
    let output_dir = output_dir.unwrap_or_else(|| config.output_dir.clone());

    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }

    let content = std::fs::read_to_string(&input)
        .with_context(|| format!("Failed to read {}", input.display()))?;

    let parser = ExportParser::new()?;
    let items = parser.parse_export(&content);
    info!(items = items.len(), "Parsed {}", input.display());

    let categorizer = Categorizer::new(config.categories.clone());
    let report = Report::build(&items, &categorizer);
    let written = write_report(&report, &output_dir, &config.url_template)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report.pivot())?);
        return Ok(());
    }

    println!(
        "{}",
        format!(
            "📊 {} of {} items categorized",
            report.item_count(),
            items.len()
        )
        .cyan()
    );
    for category in categorizer.category_names() {
        let count = report
            .groups()
            .find(|(name, _)| *name == category)
            .map_or(0, |(_, group)| group.len());
        println!("   {}: {}", category, count);
    }
    if report.is_empty() {
        println!("{}", "⚠️  No items matched a category".yellow());
    }

    println!(
        "{}",
        format!("✅ Reports written to {}", output_dir.display()).green()
    );
    println!("   {}", written.master.display());
    println!("   {}", written.pivot.display());

    Ok(())
}

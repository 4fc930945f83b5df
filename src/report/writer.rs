//! Batch 1 report generation: per-category CSVs, a master CSV and a pivot
//! summary, all derived from the same grouped items.

use super::category::Categorizer;
use crate::models::{format_number, PriorityGroup, WorkItem};
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

/// Columns of the per-category and master CSVs
pub const ITEM_COLUMNS: [&str; 12] = [
    "Category",
    "Work Item ID",
    "Title",
    "Type",
    "Priority",
    "Priority Group (P1/P2 or P3/P4)",
    "Story Points",
    "Created By",
    "State",
    "URL",
    "Description",
    "Steps to Reproduce",
];

/// Columns of pivot-summary.csv
pub const PIVOT_COLUMNS: [&str; 5] = [
    "Category",
    "Item Count",
    "Total Story Points",
    "P1/P2 SP Total",
    "P3/P4 SP Total",
];

pub const GRAND_TOTAL: &str = "Grand Total";

/// Categorized items, keyed and ordered by category name
#[derive(Debug, Clone, Default)]
pub struct Report {
    groups: BTreeMap<String, Vec<WorkItem>>,
}

/// One line of the pivot summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotRow {
    pub category: String,
    pub item_count: usize,
    pub total_story_points: f64,
    pub urgent_story_points: f64,
    pub routine_story_points: f64,
}

impl PivotRow {
    fn from_items<'a>(category: &str, items: impl Iterator<Item = &'a WorkItem>) -> Self {
        let mut count = 0;
        let mut total = 0.0;
        let mut urgent = 0.0;

        for item in items {
            count += 1;
            total += item.story_points;
            if item.priority_group() == PriorityGroup::Urgent {
                urgent += item.story_points;
            }
        }

        Self {
            category: category.to_string(),
            item_count: count,
            total_story_points: total,
            urgent_story_points: urgent,
            routine_story_points: total - urgent,
        }
    }

    fn to_record(&self) -> [String; 5] {
        [
            self.category.clone(),
            self.item_count.to_string(),
            format_number(self.total_story_points),
            format_number(self.urgent_story_points),
            format_number(self.routine_story_points),
        ]
    }
}

/// Files produced by [`write_report`]
#[derive(Debug, Clone, Default)]
pub struct WrittenReport {
    pub category_files: Vec<PathBuf>,
    pub master: PathBuf,
    pub pivot: PathBuf,
}

impl Report {
    /// Group items by category, dropping uncategorized ones. Each group is
    /// ordered P1/P2 before P3/P4, then by id.
    pub fn build(items: &[WorkItem], categorizer: &Categorizer) -> Self {
        let mut groups: BTreeMap<String, Vec<WorkItem>> = BTreeMap::new();

        for item in items {
            if let Some(category) = categorizer.categorize(item) {
                groups
                    .entry(category.to_string())
                    .or_default()
                    .push(item.clone());
            }
        }

        for group in groups.values_mut() {
            group.sort_by_key(|item| (item.priority_group(), item.id));
        }

        Self { groups }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Categories with their ordered items, category-major
    pub fn groups(&self) -> impl Iterator<Item = (&str, &[WorkItem])> {
        self.groups
            .iter()
            .map(|(name, items)| (name.as_str(), items.as_slice()))
    }

    pub fn item_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    /// Per-category rows followed by the grand total
    pub fn pivot(&self) -> Vec<PivotRow> {
        let mut rows: Vec<PivotRow> = self
            .groups
            .iter()
            .map(|(name, items)| PivotRow::from_items(name, items.iter()))
            .collect();

        rows.push(PivotRow::from_items(
            GRAND_TOTAL,
            self.groups.values().flatten(),
        ));
        rows
    }
}

fn item_record(category: &str, item: &WorkItem, url_template: &str) -> [String; 12] {
    [
        category.to_string(),
        item.id.to_string(),
        item.title.clone(),
        item.work_item_type.clone(),
        item.priority.to_string(),
        item.priority_group().label().to_string(),
        format_number(item.story_points),
        item.created_by.clone(),
        item.state.clone(),
        item.url(url_template),
        String::new(),
        String::new(),
    ]
}

/// File name for a category's CSV
pub fn category_file_name(category: &str) -> String {
    format!("{}.csv", category.replace(['/', '\\'], "-"))
}

fn write_items<'a>(
    path: &Path,
    rows: impl Iterator<Item = (&'a str, &'a WorkItem)>,
    url_template: &str,
) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    writer.write_record(ITEM_COLUMNS)?;
    for (category, item) in rows {
        writer.write_record(item_record(category, item, url_template))?;
    }
    writer.flush()?;
    Ok(())
}

/// Write by-category/<name>.csv, master.csv and pivot-summary.csv under `out_dir`
pub fn write_report(report: &Report, out_dir: &Path, url_template: &str) -> Result<WrittenReport> {
    let by_category = out_dir.join("by-category");
    std::fs::create_dir_all(&by_category)
        .with_context(|| format!("Failed to create {}", by_category.display()))?;

    let mut written = WrittenReport::default();

    for (category, items) in report.groups() {
        let path = by_category.join(category_file_name(category));
        write_items(&path, items.iter().map(|item| (category, item)), url_template)?;
        info!(category, items = items.len(), "Wrote {}", path.display());
        written.category_files.push(path);
    }

    written.master = out_dir.join("master.csv");
    write_items(
        &written.master,
        report
            .groups()
            .flat_map(|(category, items)| items.iter().map(move |item| (category, item))),
        url_template,
    )?;

    written.pivot = out_dir.join("pivot-summary.csv");
    let mut writer = csv::Writer::from_path(&written.pivot)
        .with_context(|| format!("Failed to create {}", written.pivot.display()))?;
    writer.write_record(PIVOT_COLUMNS)?;
    for row in report.pivot() {
        writer.write_record(row.to_record())?;
    }
    writer.flush()?;

    Ok(written)
}

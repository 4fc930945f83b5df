//! Join the accessibility export with the bulk-update sheet into a CSV the
//! ADO import tool accepts.

use crate::models::{AttributeRecord, MergedRow, TitleRecord, MERGED_HEADER};
use anyhow::{Context, Result};
use csv::StringRecord;
use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::Path;
use tracing::{debug, warn};

const AREA_PATH: &[&str] = &["AreaPath", "System.AreaPath"];
const ITERATION_PATH: &[&str] = &["IterationPath", "System.IterationPath"];
const PRIORITY: &[&str] = &["Priority", "Microsoft.VSTS.Common.Priority"];
const STORY_POINTS: &[&str] = &["Microsoft.VSTS.Scheduling.StoryPoints", "StoryPoints"];

/// Outcome of a merge run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeSummary {
    pub rows: usize,
    pub matched: usize,
}

/// Trim, and treat the literal `nan` as empty
pub fn normalize_value(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("nan") {
        String::new()
    } else {
        trimmed.to_string()
    }
}

/// Whole numbers lose their fraction (`3.0` -> `3`); other numbers keep the
/// shortest decimal form; anything unparseable passes through
pub fn normalize_story_points(value: &str) -> String {
    let value = normalize_value(value);
    if value.is_empty() {
        return value;
    }

    match value.parse::<f64>() {
        Ok(number) if number.is_finite() => crate::models::format_number(number),
        _ => value,
    }
}

fn normalize_id(value: &str) -> String {
    normalize_value(value.trim().trim_matches('"'))
}

/// Header-aware view over one CSV record
struct Row<'a> {
    columns: &'a HashMap<String, usize>,
    record: &'a StringRecord,
}

impl Row<'_> {
    /// First non-empty value among the aliases
    fn get(&self, aliases: &[&str]) -> String {
        aliases
            .iter()
            .filter_map(|name| self.columns.get(*name))
            .filter_map(|index| self.record.get(*index))
            .map(normalize_value)
            .find(|value| !value.is_empty())
            .unwrap_or_default()
    }
}

fn header_index(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(index, name)| (name.trim_start_matches('\u{feff}').trim().to_string(), index))
        .collect()
}

fn reader<R: Read>(input: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new().flexible(true).from_reader(input)
}

/// Read the titles table. Each id appears once, at its first position,
/// carrying the values of its last occurrence.
pub fn read_titles<R: Read>(input: R) -> Result<Vec<TitleRecord>> {
    let mut reader = reader(input);
    let columns = header_index(reader.headers()?);

    let mut records: Vec<TitleRecord> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for (index, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("Invalid titles row {}", index + 2))?;
        let row = Row {
            columns: &columns,
            record: &record,
        };

        let id = normalize_id(&row.get(&["ID"]));
        if id.is_empty() {
            debug!(row = index + 2, "Skipping titles row without ID");
            continue;
        }

        let title = TitleRecord {
            id: id.clone(),
            title: row.get(&["Title"]),
            work_item_type: row.get(&["Work Item Type"]),
        };

        match positions.get(&id) {
            Some(&position) => {
                warn!(id = %id, "Duplicate ID in titles table, keeping last values");
                records[position] = title;
            }
            None => {
                positions.insert(id, records.len());
                records.push(title);
            }
        }
    }

    Ok(records)
}

/// Read the attributes table keyed by id; the last row for an id wins
pub fn read_attributes<R: Read>(input: R) -> Result<HashMap<String, AttributeRecord>> {
    let mut reader = reader(input);
    let columns = header_index(reader.headers()?);

    let mut records = HashMap::new();

    for (index, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("Invalid attributes row {}", index + 2))?;
        let row = Row {
            columns: &columns,
            record: &record,
        };

        let id = normalize_id(&row.get(&["ID"]));
        if id.is_empty() {
            continue;
        }

        records.insert(
            id,
            AttributeRecord {
                area_path: row.get(AREA_PATH),
                iteration_path: row.get(ITERATION_PATH),
                priority: row.get(PRIORITY),
                story_points: normalize_story_points(&row.get(STORY_POINTS)),
            },
        );
    }

    Ok(records)
}

/// Left outer join: one output row per titles row
pub fn merge(titles: &[TitleRecord], attributes: &HashMap<String, AttributeRecord>) -> Vec<MergedRow> {
    titles
        .iter()
        .map(|left| MergedRow::join(left, attributes.get(&left.id)))
        .collect()
}

pub fn write_merged<W: Write>(output: W, rows: &[MergedRow]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(output);

    writer.write_record(MERGED_HEADER)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Read both tables, join them and write the import CSV, creating the
/// output directory when needed
pub fn merge_files(titles_path: &Path, attributes_path: &Path, output_path: &Path) -> Result<MergeSummary> {
    for path in [titles_path, attributes_path] {
        if !path.exists() {
            anyhow::bail!("Input file not found: {}", path.display());
        }
    }

    let titles_file = std::fs::File::open(titles_path)
        .with_context(|| format!("Failed to open {}", titles_path.display()))?;
    let titles = read_titles(titles_file)?;

    let attributes_file = std::fs::File::open(attributes_path)
        .with_context(|| format!("Failed to open {}", attributes_path.display()))?;
    let attributes = read_attributes(attributes_file)?;

    let rows = merge(&titles, &attributes);
    let matched = titles
        .iter()
        .filter(|title| attributes.contains_key(&title.id))
        .count();

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    let output = std::fs::File::create(output_path)
        .with_context(|| format!("Failed to create {}", output_path.display()))?;
    write_merged(output, &rows)?;

    Ok(MergeSummary {
        rows: rows.len(),
        matched,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_value() {
        assert_eq!(normalize_value("  x "), "x");
        assert_eq!(normalize_value("NaN"), "");
        assert_eq!(normalize_value("nan"), "");
        assert_eq!(normalize_value("banana"), "banana");
    }

    #[test]
    fn test_normalize_story_points() {
        assert_eq!(normalize_story_points("3.0"), "3");
        assert_eq!(normalize_story_points("3"), "3");
        assert_eq!(normalize_story_points("2.50"), "2.5");
        assert_eq!(normalize_story_points("nan"), "");
        assert_eq!(normalize_story_points("tbd"), "tbd");
        assert_eq!(normalize_story_points(""), "");
    }

    #[test]
    fn test_read_titles_strips_quotes_and_dedupes() {
        let data = "ID,Title,Work Item Type\n\" 7 \",First,Bug\n8,Other,Task\n7,Second,Bug\n,No id,Bug\n";
        let titles = read_titles(data.as_bytes()).unwrap();

        assert_eq!(titles.len(), 2);
        assert_eq!(titles[0].id, "7");
        assert_eq!(titles[0].title, "Second");
        assert_eq!(titles[1].id, "8");
    }

    #[test]
    fn test_read_attributes_aliases() {
        let data = "ID,AreaPath,System.IterationPath,Priority,StoryPoints\n5,Tax\\A11y,Sprint 1,2,5.0\n6,nan,,nan,NaN\n";
        let attributes = read_attributes(data.as_bytes()).unwrap();

        let five = &attributes["5"];
        assert_eq!(five.area_path, "Tax\\A11y");
        assert_eq!(five.iteration_path, "Sprint 1");
        assert_eq!(five.priority, "2");
        assert_eq!(five.story_points, "5");

        assert_eq!(attributes["6"], AttributeRecord::default());
    }

    #[test]
    fn test_unmatched_row_has_blank_attributes() {
        let titles = vec![TitleRecord {
            id: "5".into(),
            title: "X".into(),
            work_item_type: "Bug".into(),
        }];
        let rows = merge(&titles, &HashMap::new());

        assert_eq!(
            rows,
            vec![MergedRow {
                id: "5".into(),
                title: "X".into(),
                work_item_type: "Bug".into(),
                area_path: String::new(),
                iteration_path: String::new(),
                priority: String::new(),
                story_points: String::new(),
            }]
        );
    }

    #[test]
    fn test_write_merged_header_even_when_empty() {
        let mut out = Vec::new();
        write_merged(&mut out, &[]).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "ID,Title,Work Item Type,System.AreaPath,System.IterationPath,Microsoft.VSTS.Common.Priority,Microsoft.VSTS.Scheduling.StoryPoints\n"
        );
    }
}

//! Parser for the flat accessibility export.
//!
//! Each line carries labelled fields in a fixed order:
//!
//! ```text
//! ID:<int>, Title:<text>, Work Item Type:<text>, State:<text>, Created By:<text>, Priority:<text>, Story Points:<number>, Parent:<int>
//! ```
//!
//! It looks like CSV but is not: titles may contain commas, and nothing is
//! quoted. A field runs from its label up to the next known label.

use crate::models::{WorkItem, DEFAULT_PRIORITY};
use anyhow::{Context, Result};
use regex::Regex;
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LineError {
    #[error("line does not match the export layout")]
    Malformed,

    #[error("{field} is not a valid identifier: {value}")]
    InvalidId { field: &'static str, value: String },
}

/// Compiled patterns for the export layout
pub struct ExportParser {
    line_re: Regex,
    tag_re: Regex,
}

impl ExportParser {
    pub fn new() -> Result<Self> {
        let line_re = Regex::new(
            r"^ID:(?P<id>\d+),\s+Title:(?P<title>.*?),\s+Work Item Type:(?P<type>.*?),\s+State:(?P<state>.*?),\s+Created By:(?P<created_by>.*?),\s+Priority:(?P<priority>.*?),\s+Story Points:(?P<sp>.*?),\s+Parent:(?P<parent>\d+)$",
        )
        .context("Failed to compile export line regex")?;
        let tag_re = Regex::new(r"\[P([1-4])\]").context("Failed to compile priority tag regex")?;

        Ok(Self { line_re, tag_re })
    }

    /// Parse a single trimmed line
    pub fn parse_line(&self, line: &str) -> std::result::Result<WorkItem, LineError> {
        let caps = self.line_re.captures(line).ok_or(LineError::Malformed)?;
        let field = |name: &str| caps.name(name).map_or("", |m| m.as_str()).trim().to_string();

        let id = parse_id("ID", &field("id"))?;
        let parent = parse_id("Parent", &field("parent"))?;
        let title = field("title");
        let raw_priority = field("priority");
        let priority = self.derive_priority(&title, &raw_priority);

        Ok(WorkItem {
            id,
            work_item_type: field("type"),
            state: field("state"),
            created_by: field("created_by"),
            story_points: parse_story_points(&field("sp")),
            parent,
            priority,
            raw_priority,
            title,
        })
    }

    /// A `[P1]`..`[P4]` tag in the title wins; otherwise the raw field if it
    /// is a number in 1-4; otherwise 3.
    pub fn derive_priority(&self, title: &str, raw_priority: &str) -> u8 {
        if let Some(caps) = self.tag_re.captures(title) {
            if let Ok(p) = caps[1].parse::<u8>() {
                return p;
            }
        }

        match raw_priority.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => {
                let truncated = value.trunc();
                if (1.0..=4.0).contains(&truncated) {
                    truncated as u8
                } else {
                    DEFAULT_PRIORITY
                }
            }
            _ => DEFAULT_PRIORITY,
        }
    }

    /// Parse a whole export. Blank lines are ignored; malformed lines are
    /// skipped with a warning.
    pub fn parse_export(&self, content: &str) -> Vec<WorkItem> {
        let mut items = Vec::new();

        for (index, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }

            match self.parse_line(line) {
                Ok(item) => items.push(item),
                Err(e) => warn!(line = index + 1, "Skipping export line: {}", e),
            }
        }

        debug!("Parsed {} work items", items.len());
        items
    }
}

fn parse_id(field: &'static str, value: &str) -> std::result::Result<u64, LineError> {
    value.parse::<u64>().map_err(|_| LineError::InvalidId {
        field,
        value: value.to_string(),
    })
}

fn parse_story_points(raw: &str) -> f64 {
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => value,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PriorityGroup;

    fn line(title: &str, priority: &str, sp: &str) -> String {
        format!(
            "ID:100, Title:{}, Work Item Type:Bug, State:Active, Created By:A, Priority:{}, Story Points:{}, Parent:3136758",
            title, priority, sp
        )
    }

    #[test]
    fn test_tag_overrides_raw_priority() {
        let parser = ExportParser::new().unwrap();
        let item = parser.parse_line(&line("Fix [P1] alt text", "3", "2")).unwrap();

        assert_eq!(item.id, 100);
        assert_eq!(item.title, "Fix [P1] alt text");
        assert_eq!(item.priority, 1);
        assert_eq!(item.priority_group(), PriorityGroup::Urgent);
        assert_eq!(item.story_points, 2.0);
        assert_eq!(item.parent, 3136758);
        assert_eq!(item.raw_priority, "3");
    }

    #[test]
    fn test_p2_tag_wins_over_conflicting_field() {
        let parser = ExportParser::new().unwrap();
        assert_eq!(parser.derive_priority("[P2] Contrast", "4"), 2);
    }

    #[test]
    fn test_raw_priority_fallbacks() {
        let parser = ExportParser::new().unwrap();
        assert_eq!(parser.derive_priority("No tag", "2"), 2);
        assert_eq!(parser.derive_priority("No tag", "4.0"), 4);
        assert_eq!(parser.derive_priority("No tag", "1.9"), 1);
        assert_eq!(parser.derive_priority("No tag", ""), 3);
        assert_eq!(parser.derive_priority("No tag", "high"), 3);
        assert_eq!(parser.derive_priority("No tag", "0"), 3);
        assert_eq!(parser.derive_priority("No tag", "7"), 3);
        assert_eq!(parser.derive_priority("No tag", "nan"), 3);
        assert_eq!(parser.derive_priority("[P5] Not a tag", "1"), 1);
    }

    #[test]
    fn test_title_with_commas() {
        let parser = ExportParser::new().unwrap();
        let item = parser
            .parse_line(&line("Labels, headings, and landmarks", "2", "3"))
            .unwrap();
        assert_eq!(item.title, "Labels, headings, and landmarks");
        assert_eq!(item.work_item_type, "Bug");
    }

    #[test]
    fn test_story_points_default_to_zero() {
        let parser = ExportParser::new().unwrap();
        assert_eq!(parser.parse_line(&line("T", "1", "")).unwrap().story_points, 0.0);
        assert_eq!(parser.parse_line(&line("T", "1", "abc")).unwrap().story_points, 0.0);
        assert_eq!(parser.parse_line(&line("T", "1", "-2")).unwrap().story_points, 0.0);
        assert_eq!(parser.parse_line(&line("T", "1", "1.5")).unwrap().story_points, 1.5);
    }

    #[test]
    fn test_reordered_line_is_malformed() {
        let parser = ExportParser::new().unwrap();
        let reordered = "Title:X, ID:1, Work Item Type:Bug, State:New, Created By:A, Priority:1, Story Points:1, Parent:2";
        assert_eq!(parser.parse_line(reordered), Err(LineError::Malformed));
    }

    #[test]
    fn test_parse_export_skips_blank_and_malformed() {
        let parser = ExportParser::new().unwrap();
        let content = format!("{}\n\n   \ngarbage line\n{}\n", line("A", "1", "1"), line("B", "4", "2"));
        let items = parser.parse_export(&content);
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].title, "B");
    }

    #[test]
    fn test_priority_always_in_range() {
        let parser = ExportParser::new().unwrap();
        for raw in ["", "0", "1", "2", "3", "4", "5", "-1", "x", "2.5", "inf", "1e9"] {
            let p = parser.derive_priority("title", raw);
            assert!((1..=4).contains(&p), "priority {} out of range for {:?}", p, raw);
        }
    }
}

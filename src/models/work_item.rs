use serde::{Deserialize, Serialize};
use std::fmt;

/// Priority assigned when neither the title tag nor the raw field yields 1-4.
pub const DEFAULT_PRIORITY: u8 = 3;

/// Coarse bucketing of priority 1-4
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PriorityGroup {
    /// Priorities 1 and 2
    #[serde(rename = "P1/P2")]
    Urgent,
    /// Priorities 3 and 4
    #[serde(rename = "P3/P4")]
    Routine,
}

impl PriorityGroup {
    pub fn from_priority(priority: u8) -> Self {
        match priority {
            1 | 2 => PriorityGroup::Urgent,
            _ => PriorityGroup::Routine,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PriorityGroup::Urgent => "P1/P2",
            PriorityGroup::Routine => "P3/P4",
        }
    }
}

impl fmt::Display for PriorityGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One record of the accessibility export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: u64,
    pub title: String,
    pub work_item_type: String,
    pub state: String,
    pub created_by: String,
    /// Raw priority field as exported, before tag resolution
    pub raw_priority: String,
    pub story_points: f64,
    pub parent: u64,
    /// Resolved priority, always 1-4
    pub priority: u8,
}

impl WorkItem {
    pub fn priority_group(&self) -> PriorityGroup {
        PriorityGroup::from_priority(self.priority)
    }

    /// Render the ADO edit link from a template containing `{id}`
    pub fn url(&self, template: &str) -> String {
        template.replace("{id}", &self.id.to_string())
    }
}

/// Format a number the way the ADO import tooling expects it:
/// integer text when whole, otherwise the shortest decimal form.
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

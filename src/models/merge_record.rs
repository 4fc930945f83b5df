use serde::Serialize;

/// Left side of the merge: identity fields from the export
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TitleRecord {
    pub id: String,
    pub title: String,
    pub work_item_type: String,
}

/// Right side of the merge: planning attributes from the bulk-update sheet
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AttributeRecord {
    pub area_path: String,
    pub iteration_path: String,
    pub priority: String,
    pub story_points: String,
}

/// One row of the import-ready CSV. Field order and header text are the
/// column contract of the ADO import tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergedRow {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Work Item Type")]
    pub work_item_type: String,
    #[serde(rename = "System.AreaPath")]
    pub area_path: String,
    #[serde(rename = "System.IterationPath")]
    pub iteration_path: String,
    #[serde(rename = "Microsoft.VSTS.Common.Priority")]
    pub priority: String,
    #[serde(rename = "Microsoft.VSTS.Scheduling.StoryPoints")]
    pub story_points: String,
}

impl MergedRow {
    pub fn join(left: &TitleRecord, right: Option<&AttributeRecord>) -> Self {
        let right = right.cloned().unwrap_or_default();
        Self {
            id: left.id.clone(),
            title: left.title.clone(),
            work_item_type: left.work_item_type.clone(),
            area_path: right.area_path,
            iteration_path: right.iteration_path,
            priority: right.priority,
            story_points: right.story_points,
        }
    }
}

/// Output header, in order
pub const MERGED_HEADER: [&str; 7] = [
    "ID",
    "Title",
    "Work Item Type",
    "System.AreaPath",
    "System.IterationPath",
    "Microsoft.VSTS.Common.Priority",
    "Microsoft.VSTS.Scheduling.StoryPoints",
];

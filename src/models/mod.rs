pub mod config;
pub mod merge_record;
pub mod work_item;

pub use config::{
    CategoryRule, MergeConfig, PrdConfig, PrototypeCategory, ReportConfig, ToolsConfig, CONFIG_FILE,
};
pub use merge_record::{AttributeRecord, MergedRow, TitleRecord, MERGED_HEADER};
pub use work_item::{format_number, PriorityGroup, WorkItem, DEFAULT_PRIORITY};

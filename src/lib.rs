// prdops - backlog and PRD maintenance tools
// Accessibility reports and ADO merges from work-item exports, and batch
// edits of Word PRDs

pub mod cli;
pub mod convert;
pub mod docx;
pub mod logging;
pub mod merge;
pub mod models;
pub mod parser;
pub mod pdf;
pub mod prd;
pub mod report;

pub use anyhow::{Context, Result};
pub use colored::Colorize;

// Re-export commonly used types
pub use models::{PriorityGroup, ToolsConfig, WorkItem};
pub use report::{Categorizer, Report};

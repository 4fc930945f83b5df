//! Accessibility reports for Batch 1 work items

pub mod category;
pub mod writer;

pub use category::Categorizer;
pub use writer::{write_report, PivotRow, Report, WrittenReport, GRAND_TOTAL, ITEM_COLUMNS, PIVOT_COLUMNS};

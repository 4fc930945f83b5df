pub mod a11y_report;
pub mod init_config;
pub mod merge_ado;
pub mod prd;

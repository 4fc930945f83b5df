use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file name, looked up in the working directory
pub const CONFIG_FILE: &str = "prdops.toml";

// =============================================================================
// Accessibility report
// =============================================================================

/// Maps a set of parent work items to a report category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub name: String,
    pub parents: Vec<u64>,
}

impl CategoryRule {
    pub fn new(name: impl Into<String>, parents: &[u64]) -> Self {
        Self {
            name: name.into(),
            parents: parents.to_vec(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Flat-text accessibility export
    #[serde(default = "default_report_input")]
    pub input: PathBuf,

    /// Directory receiving master.csv, pivot-summary.csv and by-category/
    #[serde(default = "default_report_output")]
    pub output_dir: PathBuf,

    /// Work item link, `{id}` is substituted
    #[serde(default = "default_work_item_url")]
    pub url_template: String,

    /// Batch 1 categories, first match wins
    #[serde(default = "default_categories")]
    pub categories: Vec<CategoryRule>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            input: default_report_input(),
            output_dir: default_report_output(),
            url_template: default_work_item_url(),
            categories: default_categories(),
        }
    }
}

fn default_report_input() -> PathBuf {
    PathBuf::from("data/Accessibility issues flat list.csv")
}

fn default_report_output() -> PathBuf {
    PathBuf::from("reports/em-a11y")
}

fn default_work_item_url() -> String {
    "https://dev.azure.com/tr-tax/taxProf/_workitems/edit/{id}".to_string()
}

fn default_categories() -> Vec<CategoryRule> {
    vec![
        CategoryRule::new("Client Communications", &[3136758, 3107305]),
        CategoryRule::new("Workpapers (incl. Workpaper Properties)", &[3680361]),
    ]
}

// =============================================================================
// ADO merge
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeConfig {
    #[serde(default = "default_titles")]
    pub titles: PathBuf,
    #[serde(default = "default_attributes")]
    pub attributes: PathBuf,
    #[serde(default = "default_merge_output")]
    pub output: PathBuf,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            titles: default_titles(),
            attributes: default_attributes(),
            output: default_merge_output(),
        }
    }
}

fn default_titles() -> PathBuf {
    PathBuf::from("Accessibility issues flat list.csv")
}

fn default_attributes() -> PathBuf {
    PathBuf::from("ado-bulk-update-with-sp.csv")
}

fn default_merge_output() -> PathBuf {
    PathBuf::from("merged/ado-merged.csv")
}

// =============================================================================
// PRD maintenance
// =============================================================================

/// A prototype category: which epics belong to it and which words route
/// PDF pages and PRD file names to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrototypeCategory {
    pub name: String,
    #[serde(default)]
    pub epics: Vec<String>,
    #[serde(default)]
    pub page_keywords: Vec<String>,
    #[serde(default)]
    pub filename_keywords: Vec<String>,
}

impl PrototypeCategory {
    fn new(name: &str, epics: &[&str], page_keywords: &[&str], filename_keywords: &[&str]) -> Self {
        let owned = |list: &[&str]| list.iter().map(|s| s.to_string()).collect();
        Self {
            name: name.to_string(),
            epics: owned(epics),
            page_keywords: owned(page_keywords),
            filename_keywords: owned(filename_keywords),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrdConfig {
    /// Folder of .docx PRDs
    #[serde(default = "default_prd_dir")]
    pub dir: PathBuf,

    /// Reference PDF with prototype screenshots
    #[serde(default = "default_pdf")]
    pub pdf: PathBuf,

    #[serde(default = "default_render_dpi")]
    pub render_dpi: u32,

    /// Epic link, `{id}` is substituted
    #[serde(default = "default_epic_url")]
    pub epic_url_template: String,

    #[serde(default = "default_prototype_categories")]
    pub categories: Vec<PrototypeCategory>,
}

impl Default for PrdConfig {
    fn default() -> Self {
        Self {
            dir: default_prd_dir(),
            pdf: default_pdf(),
            render_dpi: default_render_dpi(),
            epic_url_template: default_epic_url(),
            categories: default_prototype_categories(),
        }
    }
}

fn default_prd_dir() -> PathBuf {
    PathBuf::from("PRDs/2025-11")
}

fn default_pdf() -> PathBuf {
    PathBuf::from("Proposed enhancements for Anchin.pdf")
}

fn default_render_dpi() -> u32 {
    200
}

fn default_epic_url() -> String {
    "https://dev.azure.com/tr-tax/TaxProf/_workitems/edit/{id}".to_string()
}

fn default_prototype_categories() -> Vec<PrototypeCategory> {
    vec![
        PrototypeCategory::new(
            "DIVISION",
            &["4233645", "4233303", "4379342", "4233299", "4233646", "4233648", "4235716"],
            &["division"],
            &["division", "division set", "divisional", "tax product export"],
        ),
        PrototypeCategory::new(
            "NOTES",
            &["4205843", "4237582", "4237578"],
            &["note"],
            &["note", "notes", "dialog", "format"],
        ),
        PrototypeCategory::new(
            "DRILL",
            &["4204113"],
            &["drill", "formula", "excel", "word"],
            &["drill-down", "drilldown", "formula", "excel", "word"],
        ),
        PrototypeCategory::new(
            "CONSOLIDATION",
            &["4237546", "4233330", "4206592", "4233327", "4233310", "4379363", "4442269"],
            &[
                "consolidation",
                "child engagement",
                "roll forward",
                "finalize",
                "spreadsheet",
            ],
            &[
                "consolidation",
                "parent",
                "child",
                "roll forward",
                "finalize",
                "spreadsheet import",
            ],
        ),
    ]
}

// =============================================================================
// Root configuration
// =============================================================================

/// prdops configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default)]
    pub report: ReportConfig,

    #[serde(default)]
    pub merge: MergeConfig,

    #[serde(default)]
    pub prd: PrdConfig,
}

impl ToolsConfig {
    /// Load config from an explicit file, or from prdops.toml in
    /// `project_root` when present. A missing default file yields defaults;
    /// a missing explicit file is an error.
    pub fn load(explicit: Option<&Path>, project_root: &Path) -> anyhow::Result<Self> {
        let config_path = match explicit {
            Some(path) => {
                if !path.exists() {
                    anyhow::bail!("Config file not found: {}", path.display());
                }
                path.to_path_buf()
            }
            None => {
                let path = project_root.join(CONFIG_FILE);
                if !path.exists() {
                    return Ok(Self::default());
                }
                path
            }
        };

        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        let config: ToolsConfig = toml::from_str(&content)
            .with_context(|| format!("Invalid config in {}", config_path.display()))?;
        Ok(config)
    }

    /// Save config as pretty TOML
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

//! Route pages of the reference PDF to PRDs and append them as a
//! quick-prototype appendix.

use super::cleanup::CleanupRules;
use crate::docx::{Document, DocxPackage, Paragraph, EMU_PER_INCH};
use crate::models::PrototypeCategory;
use crate::pdf::PdfPage;
use anyhow::{Context, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Pictures are scaled to the 6.5in text width of a Letter page
pub const IMAGE_WIDTH_EMU: u64 = EMU_PER_INCH * 13 / 2;

pub const APPENDIX_HEADING: &str = "Appendix: Quick prototype";
pub const LINKS_HEADING: &str = "Appendix: Links";

/// Keyword routing between PDF pages, PRD file names and epic ids
pub struct PageMatcher {
    categories: Vec<PrototypeCategory>,
    epic_re: Regex,
}

impl PageMatcher {
    pub fn new(categories: Vec<PrototypeCategory>) -> Result<Self> {
        let epic_re = Regex::new(r"^(\d{7})\s-\s").context("Failed to compile epic id regex")?;
        Ok(Self {
            categories,
            epic_re,
        })
    }

    /// Every category with a page keyword contained in the text
    pub fn page_categories(&self, text: &str) -> Vec<&str> {
        let text = text.to_lowercase();
        self.categories
            .iter()
            .filter(|c| c.page_keywords.iter().any(|kw| text.contains(&kw.to_lowercase())))
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Seven-digit epic id prefixing a PRD file name (`4233645 - Title.docx`)
    pub fn epic_id(&self, file_name: &str) -> Option<String> {
        self.epic_re
            .captures(file_name)
            .map(|caps| caps[1].to_string())
    }

    /// The epic's category when the id is known; otherwise categories whose
    /// file-name keywords occur in the name; otherwise all of them
    pub fn document_categories(&self, file_name: &str) -> Vec<&str> {
        if let Some(epic) = self.epic_id(file_name) {
            if let Some(category) = self.categories.iter().find(|c| c.epics.contains(&epic)) {
                return vec![category.name.as_str()];
            }
        }

        let name = file_name.to_lowercase();
        let matched: Vec<&str> = self
            .categories
            .iter()
            .filter(|c| c.filename_keywords.iter().any(|kw| name.contains(&kw.to_lowercase())))
            .map(|c| c.name.as_str())
            .collect();

        if matched.is_empty() {
            self.categories.iter().map(|c| c.name.as_str()).collect()
        } else {
            matched
        }
    }

    /// Pages sharing a category with the document, in page order; the first
    /// page when nothing matches
    pub fn select_pages<'p>(&self, file_name: &str, pages: &'p [PdfPage]) -> Vec<&'p PdfPage> {
        let wanted = self.document_categories(file_name);

        let selected: Vec<&PdfPage> = pages
            .iter()
            .filter(|page| {
                self.page_categories(&page.text)
                    .iter()
                    .any(|category| wanted.contains(category))
            })
            .collect();

        if selected.is_empty() {
            pages.iter().take(1).collect()
        } else {
            selected
        }
    }
}

/// What was appended to one document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmbedStats {
    pub pages: Vec<usize>,
    pub embedded: usize,
    pub failed: usize,
}

/// Appends prototype pages to PRDs
pub struct PrototypeEmbedder {
    matcher: PageMatcher,
    rules: CleanupRules,
    pages: Vec<PdfPage>,
    assets_root: PathBuf,
    epic_url_template: String,
}

impl PrototypeEmbedder {
    pub fn new(
        matcher: PageMatcher,
        pages: Vec<PdfPage>,
        assets_root: impl Into<PathBuf>,
        epic_url_template: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            matcher,
            rules: CleanupRules::new()?,
            pages,
            assets_root: assets_root.into(),
            epic_url_template: epic_url_template.into(),
        })
    }

    pub fn has_appendix(&self, document: &Document) -> bool {
        document
            .paragraph_texts()
            .iter()
            .any(|text| self.rules.starts_appendix(text))
    }

    /// Copy the page image into the document's asset folder and embed it,
    /// or explain why it could not be embedded
    fn picture(&self, package: &mut DocxPackage, document: &Document, page: &PdfPage, asset_dir: &Path) -> Result<Paragraph> {
        let file_name = page
            .image
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| format!("page-{}.png", page.number));
        let target = asset_dir.join(&file_name);

        if !target.exists() {
            std::fs::create_dir_all(asset_dir)
                .with_context(|| format!("Failed to create {}", asset_dir.display()))?;
            std::fs::copy(&page.image, &target)
                .with_context(|| format!("Failed to copy {}", page.image.display()))?;
        }

        let data = std::fs::read(&target).with_context(|| format!("Failed to read {}", target.display()))?;
        let (rel_id, size) = package.add_png(data)?;
        Ok(Paragraph::image(
            &rel_id,
            document.next_drawing_id(),
            &file_name,
            size,
            IMAGE_WIDTH_EMU,
        ))
    }

    /// Append the appendix to a parsed document
    pub fn append(&self, package: &mut DocxPackage, document: &mut Document, file_name: &str) -> EmbedStats {
        let mut stats = EmbedStats::default();

        let epic = self.matcher.epic_id(file_name);
        let folder = epic.clone().unwrap_or_else(|| {
            Path::new(file_name)
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| file_name.to_string())
        });
        let asset_dir = self.assets_root.join(folder);

        document.push_paragraph(Paragraph::heading(APPENDIX_HEADING, 1));

        for page in self.matcher.select_pages(file_name, &self.pages) {
            stats.pages.push(page.number);
            document.push_paragraph(Paragraph::with_text(&format!("Figure: PDF page {}", page.number)));

            match self.picture(package, document, page, &asset_dir) {
                Ok(picture) => {
                    document.push_paragraph(picture);
                    stats.embedded += 1;
                }
                Err(e) => {
                    warn!(page = page.number, "Image insertion failed for {}: {:#}", file_name, e);
                    document.push_paragraph(Paragraph::with_text(&format!(
                        "[Image insertion failed: {:#}]",
                        e
                    )));
                    stats.failed += 1;
                }
            }
        }

        if let Some(epic) = epic {
            let url = self.epic_url_template.replace("{id}", &epic);
            document.push_paragraph(Paragraph::heading(LINKS_HEADING, 2));
            document.push_paragraph(Paragraph::with_text(&format!("ADO Epic Link: {}", url)));
        }

        stats
    }

    /// Embed prototypes into one PRD file. Documents that already carry a
    /// quick-prototype appendix are left alone.
    pub fn embed_file(&self, path: &Path) -> Result<bool> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        super::edit_document(path, |package, document| {
            if self.has_appendix(document) {
                info!("{} already has a prototype appendix, skipping", file_name);
                return Ok(());
            }

            let stats = self.append(package, document, &file_name);
            info!(
                pages = ?stats.pages,
                failed = stats.failed,
                "Appended {} image(s) to {}",
                stats.embedded,
                file_name
            );
            Ok(())
        })
    }
}

//! Batch edits over a folder of PRD documents

pub mod augment;
pub mod cleanup;
pub mod prototypes;

use crate::convert::DocumentConverter;
use crate::docx::{Document, DocxPackage};
use crate::models::PrdConfig;
use crate::pdf::PageSource;
use anyhow::{Context, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};
use walkdir::WalkDir;

pub use augment::{augment_document, wants_competitive_sentence, AugmentStats};
pub use cleanup::{clean_document, CleanupRules, CleanupStats};
pub use prototypes::{EmbedStats, PageMatcher, PrototypeEmbedder};

/// Where `prd embed` renders every page of the reference PDF
pub const ALL_PAGES_DIR: &str = "assets/_all_pages";

/// Counters for a batch run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: usize,
    pub changed: usize,
    pub failed: usize,
}

/// `.docx` files under `dir`, sorted. Word lock files (`~$...`) and the
/// generated assets folder are skipped.
pub fn find_documents(dir: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    find_files(dir, recursive, ".docx")
}

/// Top-level `.rtf` PRDs in `dir` that have no `.docx` next to them yet
pub fn find_rtf_sources(dir: &Path) -> Result<Vec<PathBuf>> {
    Ok(find_files(dir, false, ".rtf")?
        .into_iter()
        .filter(|path| !path.with_extension("docx").exists())
        .collect())
}

fn find_files(dir: &Path, recursive: bool, extension: &str) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        anyhow::bail!("PRD directory not found: {}", dir.display());
    }

    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut files = Vec::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(max_depth)
        .into_iter()
        .filter_entry(|e| e.file_name() != "assets")
    {
        let entry = entry.with_context(|| format!("Failed to walk {}", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        if name.starts_with("~$") {
            continue;
        }
        if name.to_lowercase().ends_with(extension) {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

/// Open a document, apply `edit`, and save it back when the body changed.
/// Returns whether the file was rewritten.
pub fn edit_document<F>(path: &Path, edit: F) -> Result<bool>
where
    F: FnOnce(&mut DocxPackage, &mut Document) -> Result<()>,
{
    let mut package =
        DocxPackage::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut document = package
        .document()
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    let before = document.to_xml();

    edit(&mut package, &mut document)?;

    if document.to_xml() == before {
        debug!("No changes for {}", path.display());
        return Ok(false);
    }

    package.set_document(&document);
    package
        .save(path)
        .with_context(|| format!("Failed to save {}", path.display()))?;
    Ok(true)
}

/// Run `process` on every file, reporting failures and moving on
pub fn run_batch<F>(files: &[PathBuf], verb: &str, mut process: F) -> BatchSummary
where
    F: FnMut(&Path) -> Result<bool>,
{
    let mut summary = BatchSummary::default();

    for path in files {
        println!("{}", format!("{} {}", verb, path.display()).cyan());
        summary.processed += 1;

        match process(path) {
            Ok(true) => summary.changed += 1,
            Ok(false) => {}
            Err(e) => {
                summary.failed += 1;
                error!("{}: {:#}", path.display(), e);
                eprintln!("{}", format!("⚠️  Failed: {}: {:#}", path.display(), e).yellow());
            }
        }
    }

    summary
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Strip prototype appendices, images and boilerplate from every PRD in `dir`
pub fn clean_directory(dir: &Path, recursive: bool) -> Result<BatchSummary> {
    let files = find_documents(dir, recursive)?;
    let rules = CleanupRules::new()?;

    Ok(run_batch(&files, "🧹 Cleaning", |path| {
        edit_document(path, |_, document| {
            let stats = clean_document(document, &rules);
            info!(
                sections = stats.sections_removed,
                images = stats.images_removed,
                scrubbed = stats.paragraphs_scrubbed,
                "Cleaned {}",
                path.display()
            );
            Ok(())
        })
    }))
}

/// Style section headers and add the research sentences to every PRD in `dir`
pub fn update_directory(dir: &Path, recursive: bool) -> Result<BatchSummary> {
    let files = find_documents(dir, recursive)?;

    Ok(run_batch(&files, "✏️  Updating", |path| {
        let include_competitive = wants_competitive_sentence(&file_name(path));
        edit_document(path, |_, document| {
            let stats = augment_document(document, include_competitive);
            info!(
                headers = stats.headers,
                blanks_inserted = stats.blanks_inserted,
                blanks_removed = stats.blanks_removed,
                sentences = stats.sentences_inserted,
                "Updated {}",
                path.display()
            );
            Ok(())
        })
    }))
}

/// Convert each `.rtf` PRD without a `.docx` sibling, then append matching
/// prototype pages to every PRD in `dir`
pub fn embed_directory(
    source: &dyn PageSource,
    converter: &dyn DocumentConverter,
    dir: &Path,
    config: &PrdConfig,
) -> Result<BatchSummary> {
    let sources = find_rtf_sources(dir)?;
    let converted = run_batch(&sources, "🔄 Converting", |path| {
        let target = path.with_extension("docx");
        converter
            .to_docx(path, &target)
            .with_context(|| format!("Failed to convert {}", path.display()))?;
        info!("Converted {} to {}", path.display(), target.display());
        Ok(true)
    });

    let files = find_documents(dir, false)?;

    let pages = source.pages().context("Failed to render the reference PDF")?;
    info!(pages = pages.len(), "Rendered reference PDF");

    let matcher = PageMatcher::new(config.categories.clone())?;
    let embedder = PrototypeEmbedder::new(
        matcher,
        pages,
        dir.join("assets"),
        config.epic_url_template.as_str(),
    )?;

    let mut summary = run_batch(&files, "🖼️  Embedding", |path| embedder.embed_file(path));
    summary.failed += converted.failed;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_find_documents_filters_and_sorts() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        std::fs::create_dir_all(root.join("nested")).unwrap();
        std::fs::create_dir_all(root.join("assets")).unwrap();
        for name in ["b.docx", "a.DOCX", "~$a.docx", "notes.txt", "nested/c.docx", "assets/d.docx"] {
            std::fs::write(root.join(name), b"").unwrap();
        }

        let flat = find_documents(root, false).unwrap();
        let names: Vec<String> = flat
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.DOCX", "b.docx"]);

        let deep = find_documents(root, true).unwrap();
        assert_eq!(deep.len(), 3);
    }

    #[test]
    fn test_find_rtf_sources_skips_converted() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        for name in ["a.rtf", "a.docx", "B.RTF", "~$c.rtf", "notes.txt"] {
            std::fs::write(root.join(name), b"").unwrap();
        }

        let sources = find_rtf_sources(root).unwrap();
        assert_eq!(sources, vec![root.join("B.RTF")]);
    }

    #[test]
    fn test_find_documents_missing_dir() {
        let temp_dir = TempDir::new().unwrap();
        assert!(find_documents(&temp_dir.path().join("missing"), false).is_err());
    }

    #[test]
    fn test_run_batch_continues_after_failure() {
        let files = vec![PathBuf::from("one"), PathBuf::from("two"), PathBuf::from("three")];
        let summary = run_batch(&files, "Testing", |path| {
            if path == Path::new("two") {
                anyhow::bail!("boom")
            }
            Ok(path == Path::new("one"))
        });

        assert_eq!(
            summary,
            BatchSummary {
                processed: 3,
                changed: 1,
                failed: 1
            }
        );
    }
}

//! PRD batch commands over real .docx files on disk
//!
//! Covers the cleanup, update and embed passes end to end, including
//! re-running them over already processed documents.

use prdops::convert::{ConvertError, DocumentConverter};
use prdops::docx::{DocxPackage, Paragraph};
use prdops::models::PrdConfig;
use prdops::pdf::{PageSource, PdfError, PdfPage};
use prdops::prd::augment::{COMPETITIVE_SENTENCE, ENTERPRISE_SENTENCE};
use prdops::prd::prototypes::{APPENDIX_HEADING, LINKS_HEADING};
use prdops::prd::{clean_directory, embed_directory, update_directory};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const PRD_NAME: &str = "4233645 - Division sets.docx";

/// Pages handed out without poppler
struct StaticPages(Vec<PdfPage>);

impl PageSource for StaticPages {
    fn pages(&self) -> Result<Vec<PdfPage>, PdfError> {
        Ok(self.0.clone())
    }
}

/// Writes a one-paragraph PRD titled after the source file, or fails for
/// sources whose name contains "corrupt"
struct TitleConverter;

impl DocumentConverter for TitleConverter {
    fn to_docx(&self, source: &Path, target: &Path) -> Result<(), ConvertError> {
        let name = source.file_stem().unwrap().to_string_lossy().to_string();
        if name.contains("corrupt") {
            return Err(ConvertError::ToolFailed {
                tool: "pandoc".to_string(),
                status: "exit status: 64".to_string(),
                stderr: "unreadable RTF".to_string(),
            });
        }
        write_prd(target, &[Paragraph::heading(&name, 1), Paragraph::with_text("Converted body")]);
        Ok(())
    }
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let mut data = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    data.extend_from_slice(&13u32.to_be_bytes());
    data.extend_from_slice(b"IHDR");
    data.extend_from_slice(&width.to_be_bytes());
    data.extend_from_slice(&height.to_be_bytes());
    data.extend_from_slice(&[8, 6, 0, 0, 0]);
    data
}

fn write_prd(path: &Path, paragraphs: &[Paragraph]) {
    let body: String = paragraphs.iter().map(|p| p.xml().to_string()).collect();
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}<w:sectPr><w:pgSz w:w="12240" w:h="15840"/></w:sectPr></w:body></w:document>"#,
        body
    );
    DocxPackage::from_document_xml(&xml).save(path).unwrap();
}

fn texts(path: &Path) -> Vec<String> {
    DocxPackage::open(path)
        .unwrap()
        .document()
        .unwrap()
        .paragraph_texts()
}

fn setup_prd_dir() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().join("PRDs");
    fs::create_dir_all(&dir).unwrap();

    write_prd(
        &dir.join(PRD_NAME),
        &[
            Paragraph::with_text("Intro from the epic."),
            Paragraph::with_text("1. Customer Problem"),
            Paragraph::with_text("Problem text"),
            Paragraph::with_text("2. Customer Research"),
            Paragraph::with_text("Interviews"),
            Paragraph::heading("Appendix: Quick prototype", 1),
            Paragraph::with_text("Figure: PDF page 3"),
            Paragraph::image("rId9", 1, "old.png", (10, 10), 100),
        ],
    );

    (temp_dir, dir)
}

#[test]
fn test_cleanup_removes_appendix_and_scrubs() {
    let (_temp_dir, dir) = setup_prd_dir();
    fs::write(dir.join("broken.docx"), b"not a zip").unwrap();

    let summary = clean_directory(&dir, false).unwrap();
    assert_eq!(summary.processed, 2);
    assert_eq!(summary.changed, 1);
    assert_eq!(summary.failed, 1);

    assert_eq!(
        texts(&dir.join(PRD_NAME)),
        vec![
            "Intro.",
            "1. Customer Problem",
            "Problem text",
            "2. Customer Research",
            "Interviews"
        ]
    );

    fs::remove_file(dir.join("broken.docx")).unwrap();
    let again = clean_directory(&dir, false).unwrap();
    assert_eq!(again.changed, 0);
}

#[test]
fn test_update_is_idempotent_on_saved_files() {
    let (_temp_dir, dir) = setup_prd_dir();
    clean_directory(&dir, false).unwrap();

    let first = update_directory(&dir, false).unwrap();
    assert_eq!(first.changed, 1);

    let expected = vec![
        "Intro.",
        "",
        "1. Customer Problem",
        "",
        "Problem text",
        "",
        "2. Customer Research",
        "",
        ENTERPRISE_SENTENCE,
        COMPETITIVE_SENTENCE,
        "Interviews",
    ];
    assert_eq!(texts(&dir.join(PRD_NAME)), expected);

    let second = update_directory(&dir, false).unwrap();
    assert_eq!(second.changed, 0);
    assert_eq!(texts(&dir.join(PRD_NAME)), expected);
}

#[test]
fn test_embed_appends_matching_pages_once() {
    let (temp_dir, dir) = setup_prd_dir();
    clean_directory(&dir, false).unwrap();

    let rendered = temp_dir.path().join("rendered");
    fs::create_dir_all(&rendered).unwrap();
    let mut pages = Vec::new();
    for (number, text) in [(1, "Cover"), (2, "Division set overview"), (3, "Notes dialog")] {
        let image = rendered.join(format!("page-{}.png", number));
        fs::write(&image, png(1600, 900)).unwrap();
        pages.push(PdfPage {
            number,
            text: text.to_string(),
            image,
        });
    }
    let source = StaticPages(pages);
    let config = PrdConfig::default();

    let summary = embed_directory(&source, &TitleConverter, &dir, &config).unwrap();
    assert_eq!(summary.changed, 1);
    assert_eq!(summary.failed, 0);

    let path = dir.join(PRD_NAME);
    let after = texts(&path);
    let appendix = after.iter().position(|t| t == APPENDIX_HEADING).unwrap();
    assert_eq!(
        after[appendix..].to_vec(),
        vec![
            APPENDIX_HEADING,
            "Figure: PDF page 2",
            "",
            LINKS_HEADING,
            "ADO Epic Link: https://dev.azure.com/tr-tax/TaxProf/_workitems/edit/4233645",
        ]
    );
    assert!(dir.join("assets/4233645/page-2.png").exists());

    let package = DocxPackage::open(&path).unwrap();
    assert!(package.part("word/media/prdops-image1.png").is_some());
    let rels = String::from_utf8(package.part("word/_rels/document.xml.rels").unwrap().to_vec()).unwrap();
    assert!(rels.contains("media/prdops-image1.png"));

    let again = embed_directory(&source, &TitleConverter, &dir, &config).unwrap();
    assert_eq!(again.changed, 0);

    // the appendix ends at the links heading
    clean_directory(&dir, false).unwrap();
    let cleaned = texts(&path);
    assert!(!cleaned.iter().any(|t| t == APPENDIX_HEADING));
    assert!(cleaned.iter().any(|t| t == LINKS_HEADING));
}

fn rendered_pages(root: &Path, texts: &[&str]) -> Vec<PdfPage> {
    let rendered = root.join("rendered");
    fs::create_dir_all(&rendered).unwrap();
    texts
        .iter()
        .enumerate()
        .map(|(i, text)| {
            let image = rendered.join(format!("page-{}.png", i + 1));
            fs::write(&image, png(800, 600)).unwrap();
            PdfPage {
                number: i + 1,
                text: text.to_string(),
                image,
            }
        })
        .collect()
}

#[test]
fn test_embed_converts_rtf_without_docx() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().join("PRDs");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("4205843 - Notes dialog.rtf"), b"{\\rtf1 Notes}").unwrap();
    fs::write(dir.join("corrupt.rtf"), b"{").unwrap();
    write_prd(&dir.join("Existing.docx"), &[Paragraph::with_text("Keep me")]);
    fs::write(dir.join("Existing.rtf"), b"{\\rtf1 Stale}").unwrap();

    let source = StaticPages(rendered_pages(temp_dir.path(), &["Cover", "Notes dialog"]));
    let summary = embed_directory(&source, &TitleConverter, &dir, &PrdConfig::default()).unwrap();

    assert_eq!(summary.processed, 2);
    assert_eq!(summary.changed, 2);
    assert_eq!(summary.failed, 1);
    assert!(!dir.join("corrupt.docx").exists());

    let converted = texts(&dir.join("4205843 - Notes dialog.docx"));
    assert_eq!(
        converted,
        vec![
            "4205843 - Notes dialog",
            "Converted body",
            APPENDIX_HEADING,
            "Figure: PDF page 2",
            "",
            LINKS_HEADING,
            "ADO Epic Link: https://dev.azure.com/tr-tax/TaxProf/_workitems/edit/4205843",
        ]
    );
    assert_eq!(texts(&dir.join("Existing.docx"))[0], "Keep me");
}

#[test]
fn test_missing_prd_dir_is_fatal() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("missing");
    assert!(clean_directory(&missing, false).is_err());
    assert!(update_directory(&missing, false).is_err());
    assert!(embed_directory(&StaticPages(Vec::new()), &TitleConverter, &missing, &PrdConfig::default()).is_err());
}

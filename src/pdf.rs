//! Page images and page text from the reference PDF, via poppler-utils
//! (`pdfinfo`, `pdftoppm`, `pdftotext`).

use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::LazyLock;
use tracing::{debug, warn};

static PAGE_COUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^Pages:\s+(\d+)\s*$").expect("Invalid regex pattern"));

/// One rendered PDF page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfPage {
    /// 1-based page number
    pub number: usize,
    pub text: String,
    pub image: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    #[error("PDF not found: {0}")]
    NotFound(PathBuf),

    #[error("Command '{0}' not found. Please install poppler-utils and ensure it is in your PATH.")]
    ToolMissing(String),

    #[error("{tool} failed ({status}): {stderr}")]
    ToolFailed {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("Could not determine the page count of {0}")]
    UnknownPageCount(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Anything that can hand out the pages of the reference PDF
pub trait PageSource {
    fn pages(&self) -> Result<Vec<PdfPage>, PdfError>;
}

/// Renders pages with poppler command-line tools
pub struct PopplerSource {
    pdf: PathBuf,
    out_dir: PathBuf,
    dpi: u32,
    show_progress: bool,
}

impl PopplerSource {
    pub fn new(pdf: impl Into<PathBuf>, out_dir: impl Into<PathBuf>, dpi: u32) -> Self {
        Self {
            pdf: pdf.into(),
            out_dir: out_dir.into(),
            dpi,
            show_progress: true,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Run a tool and return its stdout
    fn run_tool(&self, tool: &str, args: &[String]) -> Result<Vec<u8>, PdfError> {
        debug!("Running {} {:?}", tool, args);
        let output = Command::new(tool).args(args).output().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PdfError::ToolMissing(tool.to_string())
            } else {
                PdfError::Io(e)
            }
        })?;

        if !output.status.success() {
            return Err(PdfError::ToolFailed {
                tool: tool.to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output.stdout)
    }

    fn pdf_arg(&self) -> String {
        self.pdf.to_string_lossy().to_string()
    }

    pub fn page_count(&self) -> Result<usize, PdfError> {
        let info = self.run_tool("pdfinfo", &[self.pdf_arg()])?;
        parse_page_count(&String::from_utf8_lossy(&info))
            .ok_or_else(|| PdfError::UnknownPageCount(self.pdf.clone()))
    }

    /// Render one page to `<out_dir>/page-<n>.png`
    pub fn render_page(&self, number: usize) -> Result<PathBuf, PdfError> {
        let stem = self.out_dir.join(format!("page-{}", number));
        let page = number.to_string();
        self.run_tool(
            "pdftoppm",
            &[
                "-f".to_string(),
                page.clone(),
                "-l".to_string(),
                page,
                "-r".to_string(),
                self.dpi.to_string(),
                "-png".to_string(),
                "-singlefile".to_string(),
                self.pdf_arg(),
                stem.to_string_lossy().to_string(),
            ],
        )?;
        Ok(page_image_path(&self.out_dir, number))
    }

    /// Layout-preserving text of one page; empty when extraction fails
    pub fn page_text(&self, number: usize) -> String {
        let page = number.to_string();
        let args = [
            "-f".to_string(),
            page.clone(),
            "-l".to_string(),
            page,
            "-layout".to_string(),
            self.pdf_arg(),
            "-".to_string(),
        ];

        match self.run_tool("pdftotext", &args) {
            Ok(stdout) => String::from_utf8_lossy(&stdout).to_string(),
            Err(e) => {
                warn!(page = number, "Text extraction failed: {}", e);
                String::new()
            }
        }
    }
}

impl PageSource for PopplerSource {
    fn pages(&self) -> Result<Vec<PdfPage>, PdfError> {
        if !self.pdf.exists() {
            return Err(PdfError::NotFound(self.pdf.clone()));
        }
        std::fs::create_dir_all(&self.out_dir)?;

        let count = self.page_count()?;

        let progress = if self.show_progress {
            let pb = ProgressBar::new(count as u64);
            if let Ok(style) = ProgressStyle::default_bar().template("{spinner:.cyan} Rendering page {pos}/{len} {wide_bar:.cyan/blue}") {
                pb.set_style(style);
            }
            Some(pb)
        } else {
            None
        };

        let mut pages = Vec::with_capacity(count);
        for number in 1..=count {
            let image = self.render_page(number)?;
            let text = self.page_text(number);
            pages.push(PdfPage {
                number,
                text,
                image,
            });
            if let Some(ref pb) = progress {
                pb.inc(1);
            }
        }

        if let Some(pb) = progress {
            pb.finish_and_clear();
        }

        Ok(pages)
    }
}

/// `Pages:  12` line of pdfinfo output
pub fn parse_page_count(info: &str) -> Option<usize> {
    PAGE_COUNT.captures(info)?[1].parse().ok()
}

/// Path a page image is rendered to
pub fn page_image_path(out_dir: &Path, number: usize) -> PathBuf {
    out_dir.join(format!("page-{}.png", number))
}

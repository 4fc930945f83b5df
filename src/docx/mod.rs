//! Just enough OOXML to edit Word documents in place: open the package,
//! split the body into top-level elements, rewrite paragraphs, embed PNGs
//! and save.

pub mod document;
pub mod package;
pub mod paragraph;

pub use document::{BodyElement, Document};
pub use package::{png_size, DocxPackage, PackagePart};
pub use paragraph::{Paragraph, EMU_PER_INCH};

/// Result type for package operations
pub type DocxResult<T> = Result<T, DocxError>;

/// Errors that can occur when reading or writing a .docx package
#[derive(Debug, thiserror::Error)]
pub enum DocxError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid package archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Missing package part: {0}")]
    MissingPart(String),

    #[error("Malformed document XML: {0}")]
    Malformed(String),

    #[error("Unsupported image: {0}")]
    UnsupportedImage(String),
}

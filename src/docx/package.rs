use super::document::Document;
use super::{DocxError, DocxResult};
use crate::parser::xml::{escape_text, parse_xml_attributes};
use regex::Regex;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;

pub const DOCUMENT_PART: &str = "word/document.xml";
pub const DOCUMENT_RELS_PART: &str = "word/_rels/document.xml.rels";
pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

const IMAGE_REL_TYPE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

static PNG_DEFAULT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<Default\s[^>]*Extension="png""#).expect("Invalid regex pattern"));
static RELATIONSHIP_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<Relationship\s[^>]*>").expect("Invalid regex pattern"));

/// A file stored inside the package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagePart {
    pub name: String,
    pub data: Vec<u8>,
}

/// An OOXML package (`.docx`) held in memory, parts in archive order
#[derive(Debug, Clone, Default)]
pub struct DocxPackage {
    parts: Vec<PackagePart>,
}

impl DocxPackage {
    pub fn open(path: &Path) -> DocxResult<Self> {
        let file = std::fs::File::open(path)?;
        let mut archive = zip::ZipArchive::new(file)?;

        let mut parts = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let mut entry = archive.by_index(index)?;
            if entry.is_dir() {
                continue;
            }
            let mut data = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut data)?;
            parts.push(PackagePart {
                name: entry.name().to_string(),
                data,
            });
        }

        debug!("Opened {} with {} parts", path.display(), parts.len());
        Ok(Self { parts })
    }

    /// A minimal single-part package around the given document XML
    pub fn from_document_xml(document_xml: &str) -> Self {
        let content_types = concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
            r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
            r#"<Default Extension="xml" ContentType="application/xml"/>"#,
            r#"<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#,
            r#"</Types>"#
        );
        let root_rels = concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
            r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>"#,
            r#"</Relationships>"#
        );

        let mut package = Self::default();
        package.set_part(CONTENT_TYPES_PART, content_types.as_bytes().to_vec());
        package.set_part("_rels/.rels", root_rels.as_bytes().to_vec());
        package.set_part(DOCUMENT_PART, document_xml.as_bytes().to_vec());
        package.set_part(DOCUMENT_RELS_PART, empty_relationships().into_bytes());
        package
    }

    pub fn parts(&self) -> &[PackagePart] {
        &self.parts
    }

    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts
            .iter()
            .find(|part| part.name == name)
            .map(|part| part.data.as_slice())
    }

    /// Replace a part, or append it when new
    pub fn set_part(&mut self, name: &str, data: Vec<u8>) {
        match self.parts.iter_mut().find(|part| part.name == name) {
            Some(part) => part.data = data,
            None => self.parts.push(PackagePart {
                name: name.to_string(),
                data,
            }),
        }
    }

    fn part_text(&self, name: &str) -> DocxResult<String> {
        let data = self
            .part(name)
            .ok_or_else(|| DocxError::MissingPart(name.to_string()))?;
        String::from_utf8(data.to_vec()).map_err(|e| DocxError::Malformed(format!("{}: {}", name, e)))
    }

    pub fn document(&self) -> DocxResult<Document> {
        Document::parse(&self.part_text(DOCUMENT_PART)?)
    }

    pub fn set_document(&mut self, document: &Document) {
        self.set_part(DOCUMENT_PART, document.to_xml().into_bytes());
    }

    /// Store a PNG under word/media and relate it to the main document.
    /// Returns the relationship id and the pixel size.
    pub fn add_png(&mut self, data: Vec<u8>) -> DocxResult<(String, (u32, u32))> {
        let size = png_size(&data)?;

        let rels = match self.part(DOCUMENT_RELS_PART) {
            Some(_) => self.part_text(DOCUMENT_RELS_PART)?,
            None => empty_relationships(),
        };
        let rel_id = next_relationship_id(&rels);

        let media_name = self.unused_media_name();
        let relationship = format!(
            r#"<Relationship Id="{}" Type="{}" Target="{}"/>"#,
            rel_id,
            IMAGE_REL_TYPE,
            escape_text(media_name.trim_start_matches("word/"))
        );
        let rels = insert_before_close(&rels, "</Relationships>", &relationship)?;

        self.set_part(&media_name, data);
        self.set_part(DOCUMENT_RELS_PART, rels.into_bytes());
        self.ensure_png_content_type()?;

        Ok((rel_id, size))
    }

    fn unused_media_name(&self) -> String {
        (1..)
            .map(|n| format!("word/media/prdops-image{}.png", n))
            .find(|name| self.part(name).is_none())
            .unwrap_or_else(|| "word/media/prdops-image.png".to_string())
    }

    fn ensure_png_content_type(&mut self) -> DocxResult<()> {
        let types = self.part_text(CONTENT_TYPES_PART)?;
        if PNG_DEFAULT.is_match(&types) {
            return Ok(());
        }

        let types = insert_before_close(
            &types,
            "</Types>",
            r#"<Default Extension="png" ContentType="image/png"/>"#,
        )?;
        self.set_part(CONTENT_TYPES_PART, types.into_bytes());
        Ok(())
    }

    /// Write the package to `path`, replacing it only once fully written
    pub fn save(&self, path: &Path) -> DocxResult<()> {
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let result = self
            .write_zip(&tmp)
            .and_then(|()| std::fs::rename(&tmp, path).map_err(DocxError::from));

        if result.is_err() && tmp.exists() {
            if let Err(e) = std::fs::remove_file(&tmp) {
                debug!("Failed to remove {}: {}", tmp.display(), e);
            }
        }
        result
    }

    fn write_zip(&self, target: &Path) -> DocxResult<()> {
        let file = std::fs::File::create(target)?;
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);

        for part in &self.parts {
            writer.start_file(part.name.as_str(), options)?;
            writer.write_all(&part.data)?;
        }
        writer.finish()?;
        Ok(())
    }
}

fn empty_relationships() -> String {
    concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"></Relationships>"#
    )
    .to_string()
}

fn insert_before_close(xml: &str, close: &str, fragment: &str) -> DocxResult<String> {
    let at = xml
        .rfind(close)
        .ok_or_else(|| DocxError::Malformed(format!("missing {}", close)))?;
    Ok(format!("{}{}{}", &xml[..at], fragment, &xml[at..]))
}

/// `rId<n>` one past the highest numeric relationship id
fn next_relationship_id(rels: &str) -> String {
    let mut max = 0u32;
    for tag in RELATIONSHIP_TAG.find_iter(rels) {
        let attributes = parse_xml_attributes(tag.as_str());
        if let Some(n) = attributes
            .get("Id")
            .and_then(|id| id.strip_prefix("rId"))
            .and_then(|n| n.parse::<u32>().ok())
        {
            max = max.max(n);
        }
    }

    format!("rId{}", max + 1)
}

/// Pixel width and height from a PNG's IHDR chunk
pub fn png_size(data: &[u8]) -> DocxResult<(u32, u32)> {
    if data.len() < 24 || data[..8] != PNG_SIGNATURE || &data[12..16] != b"IHDR" {
        return Err(DocxError::UnsupportedImage("not a PNG file".to_string()));
    }

    let width = u32::from_be_bytes([data[16], data[17], data[18], data[19]]);
    let height = u32::from_be_bytes([data[20], data[21], data[22], data[23]]);
    if width == 0 || height == 0 {
        return Err(DocxError::UnsupportedImage("PNG has zero size".to_string()));
    }

    Ok((width, height))
}

#[cfg(test)]
pub(crate) fn tiny_png(width: u32, height: u32) -> Vec<u8> {
    let mut data = PNG_SIGNATURE.to_vec();
    data.extend_from_slice(&13u32.to_be_bytes());
    data.extend_from_slice(b"IHDR");
    data.extend_from_slice(&width.to_be_bytes());
    data.extend_from_slice(&height.to_be_bytes());
    data.extend_from_slice(&[8, 6, 0, 0, 0]);
    data
}

use super::paragraph::Paragraph;
use super::{DocxError, DocxResult};
use crate::parser::xml::{element_name, top_level_elements};
use regex::Regex;
use std::sync::LazyLock;

static BODY_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<w:body(?:\s[^>]*)?>").expect("Invalid regex pattern"));
static DRAWING_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<wp:docPr\s[^>]*?\bid="(\d+)""#).expect("Invalid regex pattern"));

/// One top-level child of `w:body`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyElement {
    Paragraph(Paragraph),
    /// Section properties; Word keeps the final one last in the body
    SectionProperties(String),
    /// Tables, content controls and anything else, kept verbatim
    Other(String),
}

impl BodyElement {
    fn from_xml(xml: &str) -> Self {
        match element_name(xml) {
            "w:p" => BodyElement::Paragraph(Paragraph::from_xml(xml)),
            "w:sectPr" => BodyElement::SectionProperties(xml.to_string()),
            _ => BodyElement::Other(xml.to_string()),
        }
    }

    pub fn xml(&self) -> &str {
        match self {
            BodyElement::Paragraph(p) => p.xml(),
            BodyElement::SectionProperties(xml) | BodyElement::Other(xml) => xml,
        }
    }

    pub fn as_paragraph(&self) -> Option<&Paragraph> {
        match self {
            BodyElement::Paragraph(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_paragraph_mut(&mut self) -> Option<&mut Paragraph> {
        match self {
            BodyElement::Paragraph(p) => Some(p),
            _ => None,
        }
    }

    /// Trimmed paragraph text; empty for non-paragraphs
    pub fn paragraph_text(&self) -> String {
        self.as_paragraph()
            .map(|p| p.text().trim().to_string())
            .unwrap_or_default()
    }
}

/// The main document part, split into the text around the body and the
/// body's top-level elements
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    head: String,
    elements: Vec<BodyElement>,
    tail: String,
}

impl Document {
    pub fn parse(xml: &str) -> DocxResult<Self> {
        let open = BODY_OPEN
            .find(xml)
            .ok_or_else(|| DocxError::Malformed("no <w:body> element".to_string()))?;
        let close = xml
            .rfind("</w:body>")
            .filter(|&close| close >= open.end())
            .ok_or_else(|| DocxError::Malformed("unterminated <w:body>".to_string()))?;

        let body = &xml[open.end()..close];
        let elements = top_level_elements(body)
            .into_iter()
            .map(|span| BodyElement::from_xml(&body[span]))
            .collect();

        Ok(Self {
            head: xml[..open.end()].to_string(),
            elements,
            tail: xml[close..].to_string(),
        })
    }

    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(
            self.head.len() + self.tail.len() + self.elements.iter().map(|e| e.xml().len()).sum::<usize>(),
        );
        xml.push_str(&self.head);
        for element in &self.elements {
            xml.push_str(element.xml());
        }
        xml.push_str(&self.tail);
        xml
    }

    pub fn elements(&self) -> &[BodyElement] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&BodyElement> {
        self.elements.get(index)
    }

    pub fn paragraph_mut(&mut self, index: usize) -> Option<&mut Paragraph> {
        self.elements.get_mut(index).and_then(BodyElement::as_paragraph_mut)
    }

    /// Paragraph texts in body order, for inspection and tests
    pub fn paragraph_texts(&self) -> Vec<String> {
        self.elements
            .iter()
            .filter_map(BodyElement::as_paragraph)
            .map(Paragraph::text)
            .collect()
    }

    pub fn insert(&mut self, index: usize, element: BodyElement) {
        self.elements.insert(index, element);
    }

    pub fn insert_paragraph(&mut self, index: usize, paragraph: Paragraph) {
        self.insert(index, BodyElement::Paragraph(paragraph));
    }

    pub fn remove(&mut self, index: usize) -> BodyElement {
        self.elements.remove(index)
    }

    /// Keep only the elements for which `keep` returns true
    pub fn retain(&mut self, keep: impl FnMut(&BodyElement) -> bool) {
        self.elements.retain(keep);
    }

    /// Index one past the last content element, i.e. where the trailing
    /// section properties start
    pub fn content_end(&self) -> usize {
        match self.elements.last() {
            Some(BodyElement::SectionProperties(_)) => self.elements.len() - 1,
            _ => self.elements.len(),
        }
    }

    /// Append a paragraph at the end of the content
    pub fn push_paragraph(&mut self, paragraph: Paragraph) {
        let at = self.content_end();
        self.insert_paragraph(at, paragraph);
    }

    /// Next free `wp:docPr` id
    pub fn next_drawing_id(&self) -> u32 {
        self.elements
            .iter()
            .flat_map(|e| DRAWING_ID.captures_iter(e.xml()).filter_map(|c| c[1].parse::<u32>().ok()).collect::<Vec<_>>())
            .max()
            .map_or(1, |max| max + 1)
    }
}

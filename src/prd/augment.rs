//! Normalize PRD section headers and add the customer-research boilerplate.
//!
//! Every step checks the document before changing it, so a second run over
//! the same file is a no-op.

use crate::docx::{BodyElement, Document, Paragraph};

pub const SECTION_HEADERS: [&str; 6] = [
    "1. Customer Problem",
    "2. Customer Research",
    "3. Our Solution",
    "4. Product Metrics",
    "Appendix: Additional Links",
    "Appendix: Quick prototype",
];

pub const RESEARCH_HEADER: &str = "2. Customer Research";

pub const ENTERPRISE_SENTENCE: &str = "This capability was requested as feedback from an enterprise-level accounting firm, reflecting needs observed in large multi-entity audit workflows.";

pub const COMPETITIVE_SENTENCE: &str = "We are also building this to achieve competitive parity with Wolters Kluwer ProSystem fx Engagement, which offers similar functionality.";

/// How many elements after the research header are searched for an
/// existing sentence
pub const SENTENCE_LOOKAHEAD: usize = 6;

/// Space before and after a section header, in twentieths of a point (6pt)
pub const HEADER_SPACING: u32 = 120;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AugmentStats {
    pub headers: usize,
    pub blanks_inserted: usize,
    pub blanks_removed: usize,
    pub sentences_inserted: usize,
}

/// Division and consolidation PRDs also get the competitive-parity sentence
pub fn wants_competitive_sentence(file_name: &str) -> bool {
    let lower = file_name.to_lowercase();
    lower.contains("division") || lower.contains("consolidation")
}

fn is_section_header(element: &BodyElement) -> bool {
    element.as_paragraph().is_some() && {
        let text = element.paragraph_text();
        SECTION_HEADERS.iter().any(|header| text.starts_with(header))
    }
}

fn is_spacer(element: Option<&BodyElement>) -> bool {
    matches!(element, Some(BodyElement::Paragraph(p)) if p.is_blank() && !p.has_image())
}

/// Insert the research sentences under the first research header
fn add_research_sentences(document: &mut Document, include_competitive: bool, stats: &mut AugmentStats) {
    let Some(header) = (0..document.content_end()).find(|&i| {
        document
            .get(i)
            .is_some_and(|e| e.as_paragraph().is_some() && e.paragraph_text().starts_with(RESEARCH_HEADER))
    }) else {
        return;
    };

    let mut sentences = vec![ENTERPRISE_SENTENCE];
    if include_competitive {
        sentences.push(COMPETITIVE_SENTENCE);
    }

    let mut cursor = if is_spacer(document.get(header + 1)) {
        header + 2
    } else {
        header + 1
    };

    for sentence in sentences {
        let window_end = (header + 1 + SENTENCE_LOOKAHEAD).min(document.content_end());
        let existing = (header + 1..window_end).find(|&i| {
            document
                .get(i)
                .and_then(BodyElement::as_paragraph)
                .is_some_and(|p| p.text().contains(sentence))
        });

        match existing {
            Some(index) => cursor = cursor.max(index + 1),
            None => {
                let at = cursor.min(document.content_end());
                document.insert_paragraph(at, Paragraph::with_text(sentence));
                stats.sentences_inserted += 1;
                cursor = at + 1;
            }
        }
    }
}

/// Bold each section header, give it 6pt spacing and leave exactly one
/// blank paragraph on either side of it
fn style_headers(document: &mut Document, stats: &mut AugmentStats) {
    let mut i = 0;
    while i < document.content_end() {
        if !document.get(i).is_some_and(is_section_header) {
            i += 1;
            continue;
        }
        stats.headers += 1;

        if let Some(paragraph) = document.paragraph_mut(i) {
            paragraph.set_bold();
            paragraph.set_spacing(HEADER_SPACING, HEADER_SPACING);
        }

        // before
        while i >= 2 && is_spacer(document.get(i - 1)) && is_spacer(document.get(i - 2)) {
            document.remove(i - 2);
            stats.blanks_removed += 1;
            i -= 1;
        }
        if i == 0 || !is_spacer(document.get(i - 1)) {
            document.insert_paragraph(i, Paragraph::blank());
            stats.blanks_inserted += 1;
            i += 1;
        }

        // after
        while is_spacer(document.get(i + 1)) && is_spacer(document.get(i + 2)) {
            document.remove(i + 2);
            stats.blanks_removed += 1;
        }
        if !is_spacer(document.get(i + 1)) {
            document.insert_paragraph(i + 1, Paragraph::blank());
            stats.blanks_inserted += 1;
        }

        i += 2;
    }
}

/// Apply all PRD updates to a parsed document
pub fn augment_document(document: &mut Document, include_competitive: bool) -> AugmentStats {
    let mut stats = AugmentStats::default();
    add_research_sentences(document, include_competitive, &mut stats);
    style_headers(document, &mut stats);
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(paragraphs: &[&str]) -> Document {
        let body: String = paragraphs
            .iter()
            .map(|text| {
                if text.is_empty() {
                    Paragraph::blank().xml().to_string()
                } else {
                    Paragraph::with_text(text).xml().to_string()
                }
            })
            .collect();
        Document::parse(&format!(
            "<w:document><w:body>{}<w:sectPr/></w:body></w:document>",
            body
        ))
        .unwrap()
    }

    #[test]
    fn test_competitive_sentence_by_file_name() {
        assert!(wants_competitive_sentence("4233645 - Division sets.docx"));
        assert!(wants_competitive_sentence("CONSOLIDATION import.docx"));
        assert!(!wants_competitive_sentence("4205843 - Notes dialog.docx"));
    }

    #[test]
    fn test_headers_get_blanks_and_bold() {
        let mut doc = document(&["Title", "1. Customer Problem", "Text", "3. Our Solution"]);
        augment_document(&mut doc, false);

        assert_eq!(
            doc.paragraph_texts(),
            vec!["Title", "", "1. Customer Problem", "", "Text", "", "3. Our Solution", ""]
        );
        assert!(doc.get(2).unwrap().as_paragraph().unwrap().is_bold());
        assert!(doc.get(6).unwrap().as_paragraph().unwrap().is_bold());
        assert!(!doc.get(0).unwrap().as_paragraph().unwrap().is_bold());
        assert!(doc.get(2).unwrap().xml().contains(r#"<w:spacing w:before="120" w:after="120"/>"#));
        assert!(!doc.get(4).unwrap().xml().contains("<w:spacing"));
        assert!(matches!(doc.get(8), Some(BodyElement::SectionProperties(_))));
    }

    #[test]
    fn test_header_at_start_gets_leading_blank() {
        let mut doc = document(&["4. Product Metrics", "", "x"]);
        let stats = augment_document(&mut doc, false);

        assert_eq!(doc.paragraph_texts(), vec!["", "4. Product Metrics", "", "x"]);
        assert_eq!(stats.blanks_inserted, 1);
    }

    #[test]
    fn test_extra_blanks_collapse_to_one() {
        let mut doc = document(&["a", "", "", "", "3. Our Solution", "", "", "b"]);
        augment_document(&mut doc, false);
        assert_eq!(doc.paragraph_texts(), vec!["a", "", "3. Our Solution", "", "b"]);
    }

    #[test]
    fn test_research_sentences_inserted_after_blank() {
        let mut doc = document(&["2. Customer Research", "Interviews", "3. Our Solution"]);
        let stats = augment_document(&mut doc, true);

        assert_eq!(stats.sentences_inserted, 2);
        assert_eq!(
            doc.paragraph_texts(),
            vec![
                "",
                "2. Customer Research",
                "",
                ENTERPRISE_SENTENCE,
                COMPETITIVE_SENTENCE,
                "Interviews",
                "",
                "3. Our Solution",
                "",
            ]
        );
    }

    #[test]
    fn test_only_enterprise_sentence_without_keyword() {
        let mut doc = document(&["", "2. Customer Research", "", "Interviews"]);
        augment_document(&mut doc, false);

        let texts = doc.paragraph_texts();
        assert_eq!(texts[3], ENTERPRISE_SENTENCE);
        assert!(!texts.iter().any(|t| t == COMPETITIVE_SENTENCE));
    }

    #[test]
    fn test_second_run_changes_nothing() {
        let mut doc = document(&[
            "Overview",
            "1. Customer Problem",
            "Problem",
            "2. Customer Research",
            "3. Our Solution",
            "Appendix: Additional Links",
        ]);
        augment_document(&mut doc, true);
        let once = doc.to_xml();
        assert_eq!(once.matches(r#"<w:spacing w:before="120" w:after="120"/>"#).count(), 4);

        let stats = augment_document(&mut doc, true);
        assert_eq!(stats.sentences_inserted, 0);
        assert_eq!(stats.blanks_inserted, 0);
        assert_eq!(stats.blanks_removed, 0);
        assert_eq!(doc.to_xml(), once);
    }

    #[test]
    fn test_header_spacing_replaces_existing() {
        let xml = r#"<w:document><w:body><w:p><w:pPr><w:spacing w:after="0"/></w:pPr><w:r><w:t>3. Our Solution</w:t></w:r></w:p><w:sectPr/></w:body></w:document>"#;
        let mut doc = Document::parse(xml).unwrap();
        augment_document(&mut doc, false);

        let header = doc.get(1).unwrap().xml().to_string();
        assert!(header.contains(r#"<w:pPr><w:spacing w:before="120" w:after="120"/></w:pPr>"#));
        assert_eq!(header.matches("<w:spacing").count(), 1);
    }

    #[test]
    fn test_existing_competitive_sentence_is_not_duplicated() {
        let mut doc = document(&["2. Customer Research", "", COMPETITIVE_SENTENCE]);
        augment_document(&mut doc, true);

        let texts = doc.paragraph_texts();
        assert_eq!(texts.iter().filter(|t| *t == COMPETITIVE_SENTENCE).count(), 1);
        assert_eq!(texts.iter().filter(|t| *t == ENTERPRISE_SENTENCE).count(), 1);
    }
}

//! Strip the quick-prototype appendix, embedded images and boilerplate
//! phrases from a PRD.

use crate::docx::{BodyElement, Document};
use anyhow::{Context, Result};
use regex::Regex;

const APPENDIX_START: &str = r"(?i)^appendix\s*[-:–—]\s*quick\s*prototype\s*$";

const TOP_LEVEL_HEADERS: [&str; 5] = [
    r"(?i)^1\.\s*customer\s*problem",
    r"(?i)^2\.\s*customer\s*research",
    r"(?i)^3\.\s*our\s*solution",
    r"(?i)^4\.\s*product\s*metrics",
    r"(?i)^appendix",
];

const BOILERPLATE_PHRASES: [&str; 2] = [r"(?i)\bfrom the epic\b", r"(?i)\bfrom the feature\b"];

/// Compiled matchers for the cleanup pass
pub struct CleanupRules {
    appendix_start: Regex,
    top_level: Vec<Regex>,
    phrases: Vec<Regex>,
    spaces: Regex,
    space_before_punct: Regex,
}

/// What a cleanup pass removed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupStats {
    pub sections_removed: usize,
    pub section_paragraphs_removed: usize,
    pub images_removed: usize,
    pub paragraphs_scrubbed: usize,
}

impl CleanupRules {
    pub fn new() -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).with_context(|| format!("Failed to compile pattern {}", pattern))
        };

        Ok(Self {
            appendix_start: compile(APPENDIX_START)?,
            top_level: TOP_LEVEL_HEADERS.iter().map(|p| compile(p)).collect::<Result<_>>()?,
            phrases: BOILERPLATE_PHRASES.iter().map(|p| compile(p)).collect::<Result<_>>()?,
            spaces: compile(r"\s{2,}")?,
            space_before_punct: compile(r"\s+([.,;:])")?,
        })
    }

    pub fn starts_appendix(&self, text: &str) -> bool {
        self.appendix_start.is_match(text.trim())
    }

    pub fn is_top_level_header(&self, text: &str) -> bool {
        let text = text.trim();
        self.top_level.iter().any(|re| re.is_match(text))
    }

    /// Remove boilerplate phrases and tidy the whitespace they leave. Text
    /// without a phrase comes back unchanged.
    pub fn scrub_text(&self, text: &str) -> String {
        let mut scrubbed = text.to_string();
        let mut matched = false;
        for phrase in &self.phrases {
            if phrase.is_match(&scrubbed) {
                matched = true;
                scrubbed = phrase.replace_all(&scrubbed, "").into_owned();
            }
        }
        if !matched {
            return scrubbed;
        }

        let scrubbed = self.spaces.replace_all(&scrubbed, " ");
        self.space_before_punct
            .replace_all(&scrubbed, "$1")
            .into_owned()
    }
}

fn starts_appendix(rules: &CleanupRules, element: &BodyElement) -> bool {
    element.as_paragraph().is_some() && rules.starts_appendix(&element.paragraph_text())
}

fn is_section_boundary(rules: &CleanupRules, element: &BodyElement) -> bool {
    element.as_paragraph().is_some() && rules.is_top_level_header(&element.paragraph_text())
}

/// Delete each quick-prototype appendix: its heading and the paragraphs up
/// to the next top-level header or the end of the document. Tables inside
/// the range are kept.
fn remove_appendix_sections(document: &mut Document, rules: &CleanupRules, stats: &mut CleanupStats) {
    let mut i = 0;
    while i < document.content_end() {
        let Some(element) = document.get(i) else {
            break;
        };
        if !starts_appendix(rules, element) {
            i += 1;
            continue;
        }

        stats.sections_removed += 1;
        document.remove(i);
        stats.section_paragraphs_removed += 1;

        while i < document.content_end() {
            let Some(element) = document.get(i) else {
                break;
            };
            if is_section_boundary(rules, element) {
                break;
            }
            if element.as_paragraph().is_some() {
                document.remove(i);
                stats.section_paragraphs_removed += 1;
            } else {
                i += 1;
            }
        }
    }
}

/// Run the full cleanup on a parsed document
pub fn clean_document(document: &mut Document, rules: &CleanupRules) -> CleanupStats {
    let mut stats = CleanupStats::default();

    remove_appendix_sections(document, rules, &mut stats);

    let before = document.len();
    document.retain(|element| !element.as_paragraph().is_some_and(|p| p.has_image()));
    stats.images_removed = before - document.len();

    for index in 0..document.len() {
        let Some(paragraph) = document.paragraph_mut(index) else {
            continue;
        };
        let text = paragraph.text();
        if text.is_empty() {
            continue;
        }

        let scrubbed = rules.scrub_text(&text);
        if scrubbed != text {
            paragraph.set_text(&scrubbed);
            stats.paragraphs_scrubbed += 1;
        }
    }

    stats
}

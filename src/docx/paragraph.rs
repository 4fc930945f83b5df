use crate::parser::xml::{element_name, escape_text, inner_span, parse_xml_attributes, top_level_elements, unescape_text};
use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

/// English Metric Units per inch, the DrawingML length unit
pub const EMU_PER_INCH: u64 = 914_400;

static TEXT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<w:t(?:\s[^>]*)?>([^<]*)</w:t>|<w:tab\s*/>|<w:(?:br|cr)(?:\s[^>]*)?/>").expect("Invalid regex pattern")
});
static OPEN_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*<w:p(\s[^>]*?)?\s*(/?)>").expect("Invalid regex pattern"));
static SPACING_ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\s+w:(?:before|after)(?:Lines|Autospacing)?=["'][^"']*["']"#).expect("Invalid regex pattern")
});

/// `w:pPr` children that must follow `w:spacing`
const AFTER_SPACING: &[&str] = &[
    "w:ind",
    "w:contextualSpacing",
    "w:mirrorIndents",
    "w:suppressOverlap",
    "w:jc",
    "w:textDirection",
    "w:textAlignment",
    "w:textboxTightWrap",
    "w:outlineLvl",
    "w:divId",
    "w:cnfStyle",
    "w:rPr",
    "w:sectPr",
    "w:pPrChange",
];

/// A top-level `w:p` element, kept as its XML text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paragraph {
    xml: String,
}

impl Paragraph {
    pub fn from_xml(xml: impl Into<String>) -> Self {
        Self { xml: xml.into() }
    }

    pub fn xml(&self) -> &str {
        &self.xml
    }

    /// An empty paragraph
    pub fn blank() -> Self {
        Self::from_xml("<w:p/>")
    }

    /// A single-run paragraph
    pub fn with_text(text: &str) -> Self {
        Self::from_xml(format!("<w:p>{}</w:p>", text_run(text, "")))
    }

    /// A paragraph using the built-in `Heading<level>` style
    pub fn heading(text: &str, level: u8) -> Self {
        Self::from_xml(format!(
            r#"<w:p><w:pPr><w:pStyle w:val="Heading{}"/></w:pPr>{}</w:p>"#,
            level,
            text_run(text, "")
        ))
    }

    /// An inline picture scaled to `width_emu`, keeping the aspect ratio
    pub fn image(rel_id: &str, drawing_id: u32, name: &str, size: (u32, u32), width_emu: u64) -> Self {
        let (width_px, height_px) = size;
        let cx = width_emu;
        let cy = if width_px == 0 {
            width_emu
        } else {
            width_emu * u64::from(height_px) / u64::from(width_px)
        };
        let name = escape_text(name);

        Self::from_xml(format!(
            concat!(
                "<w:p><w:r><w:drawing>",
                r#"<wp:inline xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" distT="0" distB="0" distL="0" distR="0">"#,
                r#"<wp:extent cx="{cx}" cy="{cy}"/>"#,
                r#"<wp:docPr id="{id}" name="Picture {id}"/>"#,
                r#"<a:graphic xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main">"#,
                r#"<a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
                r#"<pic:pic xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
                r#"<pic:nvPicPr><pic:cNvPr id="0" name="{name}"/><pic:cNvPicPr/></pic:nvPicPr>"#,
                r#"<pic:blipFill><a:blip xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" r:embed="{rid}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>"#,
                r#"<pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr>"#,
                "</pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing></w:r></w:p>"
            ),
            cx = cx,
            cy = cy,
            id = drawing_id,
            name = name,
            rid = rel_id,
        ))
    }

    /// Visible text, with tabs and line breaks as `\t` and `\n`
    pub fn text(&self) -> String {
        let mut text = String::new();
        for caps in TEXT_PATTERN.captures_iter(&self.xml) {
            match caps.get(1) {
                Some(content) => text.push_str(&unescape_text(content.as_str())),
                None if caps[0].starts_with("<w:tab") => text.push('\t'),
                None => text.push('\n'),
            }
        }
        text
    }

    pub fn is_blank(&self) -> bool {
        self.text().trim().is_empty()
    }

    /// Whether the paragraph embeds a picture (DrawingML or VML)
    pub fn has_image(&self) -> bool {
        self.xml.contains("<w:drawing") || self.xml.contains("<w:pict")
    }

    /// Replace all runs with one run holding `text`. Paragraph properties
    /// and the first run's formatting survive.
    pub fn set_text(&mut self, text: &str) {
        let ppr = child_span(&self.xml, "w:pPr").map_or("", |span| &self.xml[span]);
        let rpr = self
            .runs()
            .first()
            .and_then(|run| {
                let run = &self.xml[run.clone()];
                child_span(run, "w:rPr").map(|span| &run[span])
            })
            .unwrap_or("");

        self.xml = format!("{}{}{}</w:p>", self.open_tag(), ppr, text_run(text, rpr));
    }

    /// Make every run bold; a paragraph without runs gets an empty bold run
    pub fn set_bold(&mut self) {
        let runs = self.runs();
        if runs.is_empty() {
            self.append_content("<w:r><w:rPr><w:b/></w:rPr></w:r>");
            return;
        }

        let mut xml = String::with_capacity(self.xml.len() + runs.len() * 20);
        let mut last = 0;
        for span in runs {
            xml.push_str(&self.xml[last..span.start]);
            xml.push_str(&bold_run(&self.xml[span.clone()]));
            last = span.end;
        }
        xml.push_str(&self.xml[last..]);
        self.xml = xml;
    }

    /// Whether every run carries an enabled `w:b`
    pub fn is_bold(&self) -> bool {
        let runs = self.runs();
        !runs.is_empty()
            && runs.iter().all(|span| {
                let run = &self.xml[span.clone()];
                child_span(run, "w:rPr").is_some_and(|rpr| enables_bold(&run[rpr]))
            })
    }

    /// Space before and after in twentieths of a point. Any existing
    /// before/after spacing is replaced; line spacing is kept.
    pub fn set_spacing(&mut self, before: u32, after: u32) {
        match child_span(&self.xml, "w:pPr") {
            Some(span) => {
                let ppr = with_spacing(&self.xml[span.clone()], before, after);
                self.xml.replace_range(span, &ppr);
            }
            None => {
                let ppr = format!("<w:pPr>{}</w:pPr>", spacing_tag(None, before, after));
                self.xml = match inner_span(&self.xml) {
                    Some(inner) => format!("{}{}{}", &self.xml[..inner.start], ppr, &self.xml[inner.start..]),
                    None => format!("{}{}</w:p>", self.open_tag(), ppr),
                };
            }
        }
    }

    /// Opening tag with attributes, never self-closing
    fn open_tag(&self) -> String {
        match OPEN_TAG.captures(&self.xml) {
            Some(caps) => format!("<w:p{}>", caps.get(1).map_or("", |m| m.as_str())),
            None => "<w:p>".to_string(),
        }
    }

    fn append_content(&mut self, fragment: &str) {
        self.xml = match inner_span(&self.xml) {
            Some(inner) => format!("{}{}{}", &self.xml[..inner.end], fragment, &self.xml[inner.end..]),
            None => format!("{}{}</w:p>", self.open_tag(), fragment),
        };
    }

    /// Spans of every run, including runs inside hyperlinks and tracked
    /// insertions
    fn runs(&self) -> Vec<Range<usize>> {
        let mut spans = Vec::new();
        if let Some(inner) = inner_span(&self.xml) {
            collect_runs(&self.xml[inner.clone()], inner.start, &mut spans);
        }
        spans
    }
}

fn collect_runs(content: &str, offset: usize, spans: &mut Vec<Range<usize>>) {
    for span in top_level_elements(content) {
        let element = &content[span.clone()];
        match element_name(element) {
            "w:r" => spans.push(offset + span.start..offset + span.end),
            "w:pPr" => {}
            _ => {
                if let Some(inner) = inner_span(element) {
                    collect_runs(&element[inner.clone()], offset + span.start + inner.start, spans);
                }
            }
        }
    }
}

/// Child elements of `element`, in document order
fn child_elements(element: &str) -> Vec<&str> {
    let Some(inner) = inner_span(element) else {
        return Vec::new();
    };
    let content = &element[inner];
    top_level_elements(content)
        .into_iter()
        .map(|span| &content[span])
        .collect()
}

/// Span of the first child element called `name`
fn child_span(element: &str, name: &str) -> Option<Range<usize>> {
    let inner = inner_span(element)?;
    top_level_elements(&element[inner.clone()])
        .into_iter()
        .map(|span| inner.start + span.start..inner.start + span.end)
        .find(|span| element_name(&element[span.clone()]) == name)
}

fn bold_run(run: &str) -> String {
    if let Some(span) = child_span(run, "w:rPr") {
        return format!("{}{}{}", &run[..span.start], with_bold(&run[span.clone()]), &run[span.end..]);
    }

    match inner_span(run) {
        Some(inner) => format!(
            "{}<w:rPr><w:b/></w:rPr>{}",
            &run[..inner.start],
            &run[inner.start..]
        ),
        None => format!(
            "{}><w:rPr><w:b/></w:rPr></w:r>",
            run.trim_end_matches("/>").trim_end()
        ),
    }
}

/// Run properties with any existing `w:b` replaced by an enabled one, placed
/// after the style and font elements that must precede it
fn with_bold(rpr: &str) -> String {
    let mut children: Vec<&str> = child_elements(rpr)
        .into_iter()
        .filter(|child| element_name(child) != "w:b")
        .collect();
    let at = children
        .iter()
        .take_while(|child| matches!(element_name(child), "w:rStyle" | "w:rFonts"))
        .count();
    children.insert(at, "<w:b/>");
    format!("<w:rPr>{}</w:rPr>", children.concat())
}

fn enables_bold(rpr: &str) -> bool {
    child_elements(rpr).into_iter().any(|child| {
        element_name(child) == "w:b"
            && !matches!(
                parse_xml_attributes(child).get("w:val").map(String::as_str),
                Some("0" | "false" | "off")
            )
    })
}

fn spacing_tag(existing: Option<&str>, before: u32, after: u32) -> String {
    let kept = existing
        .map(|tag| {
            let attributes = tag
                .trim_start_matches("<w:spacing")
                .trim_end_matches('>')
                .trim_end_matches('/');
            SPACING_ATTRIBUTE.replace_all(attributes, "").trim_end().to_string()
        })
        .unwrap_or_default();
    format!(r#"<w:spacing w:before="{}" w:after="{}"{}/>"#, before, after, kept)
}

/// Paragraph properties with `w:spacing` set, in schema order
fn with_spacing(ppr: &str, before: u32, after: u32) -> String {
    let children = child_elements(ppr);
    let existing = children.iter().position(|child| element_name(child) == "w:spacing");
    let tag = spacing_tag(existing.map(|i| children[i]), before, after);
    let at = existing.unwrap_or_else(|| {
        children
            .iter()
            .position(|child| AFTER_SPACING.contains(&element_name(child)))
            .unwrap_or(children.len())
    });

    let mut xml = String::from("<w:pPr>");
    for (i, child) in children.iter().enumerate() {
        if i == at {
            xml.push_str(&tag);
        }
        if Some(i) != existing {
            xml.push_str(child);
        }
    }
    if at == children.len() {
        xml.push_str(&tag);
    }
    xml.push_str("</w:pPr>");
    xml
}

fn text_run(text: &str, rpr: &str) -> String {
    format!(
        r#"<w:r>{}<w:t xml:space="preserve">{}</w:t></w:r>"#,
        rpr,
        escape_text(text)
    )
}

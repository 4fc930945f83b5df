//! Regex-level helpers for WordprocessingML fragments.
//!
//! Word writes `document.xml` in a very regular shape, so body editing works
//! on string spans instead of a full DOM: split the body into top-level
//! elements, pull text out of `w:t` runs, and splice new fragments back in.

use regex::Regex;
use std::collections::HashMap;
use std::ops::Range;
use std::sync::LazyLock;

static ATTRIBUTE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"([\w:.-]+)=["']([^"']*)["']"#).expect("Invalid regex pattern"));
static TAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("Invalid regex pattern"));

/// Parse XML attributes from an opening tag
///
/// Supports namespaced keys and both quote styles: `w:val="1"` or `w:val='1'`
pub fn parse_xml_attributes(tag_line: &str) -> HashMap<String, String> {
    ATTRIBUTE_PATTERN
        .captures_iter(tag_line)
        .map(|cap| (cap[1].to_string(), cap[2].to_string()))
        .collect()
}

/// Byte spans of the top-level elements in `content`
///
/// Text between elements is ignored, as are comments and processing
/// instructions. Unbalanced trailing content is dropped.
pub fn top_level_elements(content: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;

    for tag in TAG_PATTERN.find_iter(content) {
        let text = tag.as_str();
        if text.starts_with("<?") || text.starts_with("<!") {
            continue;
        }

        if text.starts_with("</") {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                spans.push(start..tag.end());
            }
        } else if text.ends_with("/>") {
            if depth == 0 {
                spans.push(tag.start()..tag.end());
            }
        } else {
            if depth == 0 {
                start = tag.start();
            }
            depth += 1;
        }
    }

    spans
}

/// Span of an element's content between its opening and closing tags, or
/// `None` for a self-closing element
pub fn inner_span(element: &str) -> Option<Range<usize>> {
    let open_end = element.find('>')? + 1;
    if element[..open_end].ends_with("/>") {
        return None;
    }
    let close = element.rfind("</").filter(|&close| close >= open_end)?;
    Some(open_end..close)
}

/// Name of the first element in a fragment, e.g. `w:p` for `<w:p w14:paraId="..">`
pub fn element_name(fragment: &str) -> &str {
    let trimmed = fragment.trim_start();
    let Some(rest) = trimmed.strip_prefix('<') else {
        return "";
    };
    let end = rest
        .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
        .unwrap_or(rest.len());
    &rest[..end]
}

/// Escape character data for element content
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Reverse of [`escape_text`], plus numeric character references
pub fn unescape_text(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];

        let Some(semi) = tail.find(';') else {
            out.push_str(tail);
            return out;
        };

        let entity = &tail[1..semi];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => entity
                .strip_prefix("#x")
                .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                .and_then(char::from_u32),
        };

        match decoded {
            Some(c) => {
                out.push(c);
                rest = &tail[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_attributes_namespaced() {
        let attrs = parse_xml_attributes(r#" w:val="Heading1" w14:paraId='1A2B' "#);
        assert_eq!(attrs.get("w:val"), Some(&"Heading1".to_string()));
        assert_eq!(attrs.get("w14:paraId"), Some(&"1A2B".to_string()));
    }

    #[test]
    fn test_top_level_elements_handles_nesting() {
        let body = r#"<w:p><w:r><w:t>A</w:t></w:r></w:p>
<w:tbl><w:tr><w:tc><w:p><w:r><w:t>cell</w:t></w:r></w:p></w:tc></w:tr></w:tbl>
<w:p/>
<w:sectPr><w:pgSz w:w="12240"/></w:sectPr>"#;

        let spans = top_level_elements(body);
        let names: Vec<&str> = spans.iter().map(|s| element_name(&body[s.clone()])).collect();
        assert_eq!(names, vec!["w:p", "w:tbl", "w:p", "w:sectPr"]);
        assert_eq!(&body[spans[2].clone()], "<w:p/>");
    }

    #[test]
    fn test_inner_span() {
        let element = r#"<w:pPr><w:jc w:val="left"/></w:pPr>"#;
        let inner = inner_span(element).unwrap();
        assert_eq!(&element[inner], r#"<w:jc w:val="left"/>"#);
        assert_eq!(inner_span("<w:rPr/>"), None);
        assert_eq!(inner_span("<w:r></w:r>"), Some(5..5));
    }

    #[test]
    fn test_element_name() {
        assert_eq!(element_name(r#"<w:p w14:paraId="1">"#), "w:p");
        assert_eq!(element_name("<w:p/>"), "w:p");
        assert_eq!(element_name("text"), "");
    }

    #[test]
    fn test_escape_roundtrip_special_chars() {
        let raw = r#"Q&A <draft> "v2""#;
        assert_eq!(escape_text(raw), "Q&amp;A &lt;draft&gt; &quot;v2&quot;");
        assert_eq!(unescape_text(&escape_text(raw)), raw);
    }

    #[test]
    fn test_unescape_numeric_and_unknown() {
        assert_eq!(unescape_text("caf&#233; &#x2014; x"), "café — x");
        assert_eq!(unescape_text("a & b"), "a & b");
        assert_eq!(unescape_text("&bogus; ok"), "&bogus; ok");
    }
}

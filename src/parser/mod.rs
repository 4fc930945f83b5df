pub mod export_line;
pub mod xml;

pub use export_line::{ExportParser, LineError};
pub use xml::{element_name, escape_text, inner_span, parse_xml_attributes, top_level_elements, unescape_text};

//! HTML Serialization (outerHTML)
//!
//! The `style` attribute is written from the element's inline declarations,
//! so inline writes made by the theming pipeline show up in the output.

use retro_dom::{Document, DomTree, NodeData, NodeId};

/// Void elements (no end tag)
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Raw text elements (content written unescaped)
const RAW_TEXT_ELEMENTS: &[&str] = &[
    "script", "style", "xmp", "iframe", "noembed", "noframes", "plaintext",
];

/// HTML serializer
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlSerializer;

impl HtmlSerializer {
    pub fn new() -> Self {
        Self
    }

    pub fn serialize_document(&self, document: &Document) -> String {
        self.serialize_inner(&document.tree, NodeId::ROOT)
    }

    /// Serialize innerHTML of a node (children only)
    pub fn serialize_inner(&self, tree: &DomTree, node: NodeId) -> String {
        let mut output = String::new();
        for child in tree.children(node) {
            self.serialize_node(tree, child, &mut output);
        }
        output
    }

    /// Serialize outerHTML of a node
    pub fn serialize_outer(&self, tree: &DomTree, node: NodeId) -> String {
        let mut output = String::new();
        self.serialize_node(tree, node, &mut output);
        output
    }

    fn serialize_node(&self, tree: &DomTree, node_id: NodeId, output: &mut String) {
        let Some(node) = tree.get(node_id) else {
            return;
        };

        match &node.data {
            NodeData::Document => {
                for child in tree.children(node_id) {
                    self.serialize_node(tree, child, output);
                }
            }
            NodeData::Element(elem) => {
                let tag = elem.tag.as_str();
                output.push('<');
                output.push_str(tag);
                for (name, value) in elem.attrs() {
                    write_attribute(name, value, output);
                }
                if !elem.inline_style.is_empty() {
                    write_attribute("style", &elem.inline_style.css_text(), output);
                }
                output.push('>');

                if VOID_ELEMENTS.iter().any(|v| *v == tag) {
                    return;
                }
                let raw = RAW_TEXT_ELEMENTS.iter().any(|r| *r == tag);
                for child in tree.children(node_id) {
                    match tree.get(child).and_then(|n| n.as_text()) {
                        Some(text) if raw => output.push_str(text),
                        _ => self.serialize_node(tree, child, output),
                    }
                }
                output.push_str("</");
                output.push_str(tag);
                output.push('>');
            }
            NodeData::Text(text) => escape_text(text, output),
            NodeData::Comment(text) => {
                output.push_str("<!--");
                output.push_str(text);
                output.push_str("-->");
            }
            NodeData::Doctype { name } => {
                output.push_str("<!DOCTYPE ");
                output.push_str(name);
                output.push('>');
            }
        }
    }
}

fn write_attribute(name: &str, value: &str, output: &mut String) {
    output.push(' ');
    output.push_str(name);
    if !value.is_empty() {
        output.push_str("=\"");
        escape_attribute(value, output);
        output.push('"');
    }
}

fn escape_text(text: &str, output: &mut String) {
    for c in text.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '\u{a0}' => output.push_str("&nbsp;"),
            _ => output.push(c),
        }
    }
}

fn escape_attribute(value: &str, output: &mut String) {
    for c in value.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '"' => output.push_str("&quot;"),
            '\u{a0}' => output.push_str("&nbsp;"),
            _ => output.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HtmlParser;

    #[test]
    fn test_serialize_round_trip() {
        let html = "<!DOCTYPE html><html><head><title>T</title></head><body><p class=\"a\">x &amp; y</p><br></body></html>";
        let doc = HtmlParser::new().parse(html);
        assert_eq!(HtmlSerializer::new().serialize_document(&doc), html);
    }

    #[test]
    fn test_inline_style_reflected() {
        let mut doc = HtmlParser::new().parse("<p>x</p>");
        let body = doc.body().unwrap();
        let p = doc.tree.children(body).next().unwrap();
        doc.tree.set_style_property(p, "color", "rgb(1, 2, 3)", true);
        assert_eq!(
            HtmlSerializer::new().serialize_outer(&doc.tree, p),
            "<p style=\"color: rgb(1, 2, 3) !important;\">x</p>"
        );
    }

    #[test]
    fn test_raw_text_and_escaping() {
        let doc = HtmlParser::new().parse("<script>if (a < b) {}</script><div title='say \"hi\"'></div>");
        let out = HtmlSerializer::new().serialize_document(&doc);
        assert!(out.contains("<script>if (a < b) {}</script>"));
        assert!(out.contains("title=\"say &quot;hi&quot;\""));
    }
}

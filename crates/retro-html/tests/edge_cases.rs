//! Edge case tests for retro-html
//!
//! Malformed input, inline style handling, and serializer round trips.

use retro_dom::NodeId;
use retro_html::{parse, serialize, HtmlParser, HtmlSerializer};

#[test]
fn test_parse_empty_input() {
    let doc = parse("");
    // html5ever always synthesizes html/head/body
    assert!(doc.document_element().is_some());
    assert!(doc.body().is_some());
}

#[test]
fn test_malformed_markup_recovers() {
    let doc = parse("<div><p>Unclosed paragraph<span>Unclosed span</div>");
    let body = doc.body().unwrap();
    let div = doc.tree.first_child(body).unwrap();
    assert_eq!(doc.tree.tag_name(div), Some("div"));
    assert!(doc.tree.text_content(div).contains("Unclosed span"));
}

#[test]
fn test_inline_style_is_parsed_with_priority() {
    let doc = parse(r#"<p id="x" style="color: red !important; background-color: #fff">t</p>"#);
    let p = doc.tree.get_element_by_id("x").unwrap();
    let style = doc.tree.inline_style(p).unwrap();
    assert_eq!(style.get_property_value("color"), Some("red"));
    assert!(style.get_property_priority("color"));
    assert_eq!(style.get_property_value("background-color"), Some("#fff"));
}

#[test]
fn test_emptied_style_attribute_is_dropped() {
    let mut doc = parse(r#"<p id="x" style="color: red">t</p>"#);
    let p = doc.tree.get_element_by_id("x").unwrap();
    doc.tree.remove_style_property(p, "color");
    let html = HtmlSerializer::new().serialize_outer(&doc.tree, p);
    assert_eq!(html, r#"<p id="x">t</p>"#);
}

#[test]
fn test_script_and_style_text_not_escaped() {
    let html = "<html><head><style>a > b { color: red }</style></head><body><script>if (a < b && c) {}</script></body></html>";
    let out = serialize(&parse(html));
    assert!(out.contains("a > b { color: red }"));
    assert!(out.contains("if (a < b && c) {}"));
}

#[test]
fn test_attribute_values_escaped() {
    let doc = parse(r#"<a title="say &quot;hi&quot; &amp; go">x</a>"#);
    let out = serialize(&doc);
    assert!(out.contains(r#"title="say &quot;hi&quot; &amp; go""#));
}

#[test]
fn test_url_is_kept() {
    let doc = HtmlParser::new().parse_with_url("<p>x</p>", "https://example.com/page");
    assert_eq!(doc.url(), "https://example.com/page");
    assert!(doc.tree.len() > 1);
    assert!(doc.tree.get(NodeId::ROOT).is_some());
}

#[test]
fn test_missing_file_is_an_error() {
    let err = HtmlParser::new()
        .parse_file("/definitely/not/here.html")
        .unwrap_err();
    assert!(err.to_string().contains("not/here.html"));
}

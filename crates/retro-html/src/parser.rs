//! HTML5 Parser implementation
//!
//! Parses with html5ever into an `RcDom`, then copies the result into the
//! arena tree.

use std::path::Path;

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData as RcNodeData, RcDom};
use retro_dom::{Document, DomTree, NodeId};

use crate::HtmlError;

/// HTML5 parser
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlParser;

impl HtmlParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse HTML string into a Document
    pub fn parse(&self, html: &str) -> Document {
        self.parse_with_url(html, "about:blank")
    }

    /// Parse HTML with a document URL
    pub fn parse_with_url(&self, html: &str, url: &str) -> Document {
        tracing::debug!(url, bytes = html.len(), "parsing HTML document");

        let dom = parse_document(RcDom::default(), Default::default()).one(html);

        let mut document = Document::empty(url);
        convert(&dom.document, &mut document.tree);

        tracing::debug!(nodes = document.tree.len(), "parsed HTML document");
        document
    }

    /// Read and parse a file; the URL becomes `file://<path>`
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<Document, HtmlError> {
        let path = path.as_ref();
        let html = std::fs::read_to_string(path).map_err(|source| HtmlError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(self.parse_with_url(&html, &format!("file://{}", path.display())))
    }
}

/// Copy the RcDom under `document` into `tree`, depth-first without recursion
fn convert(document: &Handle, tree: &mut DomTree) {
    let mut stack: Vec<(Handle, NodeId)> = document
        .children
        .borrow()
        .iter()
        .rev()
        .map(|child| (child.clone(), NodeId::ROOT))
        .collect();

    while let Some((handle, parent)) = stack.pop() {
        let id = match &handle.data {
            RcNodeData::Document | RcNodeData::ProcessingInstruction { .. } => continue,
            RcNodeData::Doctype { name, .. } => tree.create_doctype(name),
            RcNodeData::Text { contents } => tree.create_text(&contents.borrow()),
            RcNodeData::Comment { contents } => tree.create_comment(contents),
            RcNodeData::Element { name, attrs, .. } => {
                let id = tree.create_element(&name.local);
                for attr in attrs.borrow().iter() {
                    tree.set_attribute(id, &attr.name.local, &attr.value);
                }
                id
            }
        };

        if let Err(err) = tree.append_child(parent, id) {
            tracing::warn!(%err, "dropping node the tree refused");
            continue;
        }

        for child in handle.children.borrow().iter().rev() {
            stack.push((child.clone(), id));
        }
    }
}

//! Document - High-level document API

use crate::tree::DomTree;
use crate::NodeId;

/// HTML Document
#[derive(Debug, Default)]
pub struct Document {
    /// The DOM tree
    pub tree: DomTree,
    url: String,
}

impl Document {
    /// Create a document with an empty `html > (head, body)` skeleton
    pub fn new(url: &str) -> Self {
        let mut doc = Self::empty(url);
        let tree = &mut doc.tree;
        let html = tree.create_element("html");
        let head = tree.create_element("head");
        let body = tree.create_element("body");
        // Fresh nodes under a container; these cannot fail.
        let _ = tree.append_child(NodeId::ROOT, html);
        let _ = tree.append_child(html, head);
        let _ = tree.append_child(html, body);
        doc
    }

    /// Create a document with no nodes besides the document node
    pub fn empty(url: &str) -> Self {
        Self {
            tree: DomTree::new(),
            url: url.to_string(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn set_url(&mut self, url: &str) {
        self.url = url.to_string();
    }

    /// The root `<html>` element
    pub fn document_element(&self) -> Option<NodeId> {
        self.tree.children(NodeId::ROOT).find(|&id| self.tree.is_element(id))
    }

    pub fn head(&self) -> Option<NodeId> {
        self.child_of_root_element("head")
    }

    pub fn body(&self) -> Option<NodeId> {
        self.child_of_root_element("body")
    }

    fn child_of_root_element(&self, tag: &str) -> Option<NodeId> {
        let html = self.document_element()?;
        self.tree
            .children(html)
            .find(|&id| self.tree.tag_name(id) == Some(tag))
    }

    /// Text of the first `<title>` in `<head>`
    pub fn title(&self) -> String {
        self.head()
            .and_then(|head| {
                self.tree
                    .children(head)
                    .find(|&id| self.tree.tag_name(id) == Some("title"))
            })
            .map(|title| self.tree.text_content(title).trim().to_string())
            .unwrap_or_default()
    }
}

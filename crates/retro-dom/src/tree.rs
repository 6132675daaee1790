//! DOM Tree (arena-based allocation)
//!
//! Nodes are never freed: a removed node keeps its `NodeId` and becomes
//! detached, so stale ids held by callers stay safe to use.

use std::borrow::Cow;

use crate::node::{ElementData, LayoutBox, Node, NodeData};
use crate::observer::{MutationObserverInit, MutationRecord, ObserverId, ObserverRegistry};
use crate::style::StyleDeclaration;
use crate::{DomError, DomResult, NodeId};

/// Arena-based DOM tree
#[derive(Debug)]
pub struct DomTree {
    nodes: Vec<Node>,
    observers: ObserverRegistry,
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DomTree {
    /// Create a tree holding only the document node
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(NodeData::Document)],
            observers: ObserverRegistry::default(),
        }
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    /// Number of nodes ever created, detached ones included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::new(data));
        id
    }

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeData::Element(ElementData::new(tag)))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeData::Text(text.to_string()))
    }

    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.push(NodeData::Comment(text.to_string()))
    }

    pub fn create_doctype(&mut self, name: &str) -> NodeId {
        self.push(NodeData::Doctype { name: name.to_string() })
    }

    // ---- navigation ----

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).map(|n| n.parent).filter(|p| p.is_valid())
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).map(|n| n.first_child).filter(|c| c.is_valid())
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).map(|n| n.next_sibling).filter(|s| s.is_valid())
    }

    /// Direct children in order
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children { tree: self, next: self.first_child(id) }
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        self.get(id).and_then(Node::as_element)
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        self.get_mut(id).and_then(Node::as_element_mut)
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|el| el.tag.as_str())
    }

    /// Whether `ancestor` is `node` or one of its ancestors
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Whether the node is reachable from the document root
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.get(id).is_some() && self.is_inclusive_ancestor(NodeId::ROOT, id)
    }

    /// Next node in document order within `scope`. With `descend` false the
    /// children of `id` are skipped.
    pub fn next_in_preorder(&self, id: NodeId, scope: NodeId, descend: bool) -> Option<NodeId> {
        if descend {
            if let Some(child) = self.first_child(id) {
                return Some(child);
            }
        }
        let mut current = id;
        loop {
            if current == scope {
                return None;
            }
            if let Some(sibling) = self.next_sibling(current) {
                return Some(sibling);
            }
            current = self.parent(current)?;
        }
    }

    /// Strict descendants of `scope` in document order
    pub fn descendants(&self, scope: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut next = self.first_child(scope);
        std::iter::from_fn(move || {
            let current = next?;
            next = self.next_in_preorder(current, scope, true);
            Some(current)
        })
    }

    /// Connected elements carrying `name`, in document order
    pub fn elements_with_attribute(&self, name: &str) -> Vec<NodeId> {
        self.descendants(NodeId::ROOT)
            .filter(|&id| self.has_attribute(id, name))
            .collect()
    }

    pub fn get_element_by_id(&self, element_id: &str) -> Option<NodeId> {
        self.descendants(NodeId::ROOT)
            .find(|&id| self.element(id).and_then(ElementData::id) == Some(element_id))
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let Some(text) = self.get(id).and_then(Node::as_text) {
            out.push_str(text);
        }
        for node in self.descendants(id) {
            if let Some(text) = self.get(node).and_then(Node::as_text) {
                out.push_str(text);
            }
        }
        out
    }

    // ---- structure ----

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` before `reference` (or at the end), detaching it from
    /// its current parent first
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) -> DomResult<()> {
        let parent_node = self.get(parent).ok_or(DomError::NotFound(parent))?;
        if !parent_node.is_container() {
            return Err(DomError::NotAParent(parent));
        }
        if self.get(child).is_none() {
            return Err(DomError::NotFound(child));
        }
        let has_children = self.first_child(child).is_some();
        if child == NodeId::ROOT || child == parent || (has_children && self.is_inclusive_ancestor(child, parent)) {
            return Err(DomError::HierarchyRequest { parent, child });
        }
        if let Some(reference) = reference {
            if reference == child {
                return Ok(());
            }
            if self.parent(reference) != Some(parent) {
                return Err(DomError::NotAChild { parent, reference });
            }
        }

        self.detach(child);

        let (prev, next) = match reference {
            Some(reference) => (self.nodes[reference.index()].prev_sibling, reference),
            None => (self.nodes[parent.index()].last_child, NodeId::NONE),
        };
        {
            let node = &mut self.nodes[child.index()];
            node.parent = parent;
            node.prev_sibling = prev;
            node.next_sibling = next;
        }
        if prev.is_valid() {
            self.nodes[prev.index()].next_sibling = child;
        } else {
            self.nodes[parent.index()].first_child = child;
        }
        if next.is_valid() {
            self.nodes[next.index()].prev_sibling = child;
        } else {
            self.nodes[parent.index()].last_child = child;
        }

        self.queue_mutation(MutationRecord::child_list(parent, vec![child], Vec::new()));
        Ok(())
    }

    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        if self.parent(child) != Some(parent) {
            return Err(DomError::NotAChild { parent, reference: child });
        }
        self.detach(child);
        Ok(())
    }

    /// Unlink a node from its parent. No-op when already detached.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        let (prev, next) = {
            let node = &self.nodes[id.index()];
            (node.prev_sibling, node.next_sibling)
        };
        if prev.is_valid() {
            self.nodes[prev.index()].next_sibling = next;
        } else {
            self.nodes[parent.index()].first_child = next;
        }
        if next.is_valid() {
            self.nodes[next.index()].prev_sibling = prev;
        } else {
            self.nodes[parent.index()].last_child = prev;
        }
        let node = &mut self.nodes[id.index()];
        node.parent = NodeId::NONE;
        node.prev_sibling = NodeId::NONE;
        node.next_sibling = NodeId::NONE;

        self.queue_mutation(MutationRecord::child_list(parent, Vec::new(), vec![id]));
    }

    // ---- attributes ----

    /// Attribute value; `style` is serialized from the inline declarations
    pub fn get_attribute(&self, id: NodeId, name: &str) -> Option<Cow<'_, str>> {
        let el = self.element(id)?;
        if name.eq_ignore_ascii_case("style") {
            return (!el.inline_style.is_empty()).then(|| Cow::Owned(el.inline_style.css_text()));
        }
        el.attr(name).map(Cow::Borrowed)
    }

    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.get_attribute(id, name).is_some()
    }

    /// Set an attribute. Returns false for non-elements.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> bool {
        let Some(el) = self.element_mut(id) else {
            return false;
        };
        let old = if name.eq_ignore_ascii_case("style") {
            let old = (!el.inline_style.is_empty()).then(|| el.inline_style.css_text());
            el.inline_style = StyleDeclaration::parse(value);
            old
        } else {
            el.set_attr(name, value)
        };
        self.queue_mutation(MutationRecord::attribute(id, name, old));
        true
    }

    /// Remove an attribute, returning its previous value
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Option<String> {
        let el = self.element_mut(id)?;
        let old = if name.eq_ignore_ascii_case("style") {
            let old = (!el.inline_style.is_empty()).then(|| el.inline_style.css_text());
            el.inline_style = StyleDeclaration::new();
            old
        } else {
            el.remove_attr(name)
        };
        let old = old?;
        self.queue_mutation(MutationRecord::attribute(id, name, Some(old.clone())));
        Some(old)
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) {
        let Some(el) = self.element(id) else {
            return;
        };
        if el.has_class(class) {
            return;
        }
        let list = match el.attr("class") {
            Some(existing) if !existing.trim().is_empty() => format!("{} {}", existing.trim(), class),
            _ => class.to_string(),
        };
        self.set_attribute(id, "class", &list);
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) {
        let Some(el) = self.element(id) else {
            return;
        };
        if !el.has_class(class) {
            return;
        }
        let list: Vec<&str> = el
            .attr("class")
            .unwrap_or_default()
            .split_ascii_whitespace()
            .filter(|c| *c != class)
            .collect();
        if list.is_empty() {
            self.remove_attribute(id, "class");
        } else {
            let list = list.join(" ");
            self.set_attribute(id, "class", &list);
        }
    }

    // ---- style ----

    pub fn inline_style(&self, id: NodeId) -> Option<&StyleDeclaration> {
        self.element(id).map(|el| &el.inline_style)
    }

    /// Write an inline declaration; recorded as a `style` attribute change
    pub fn set_style_property(&mut self, id: NodeId, property: &str, value: &str, important: bool) -> bool {
        let Some(el) = self.element_mut(id) else {
            return false;
        };
        let old = (!el.inline_style.is_empty()).then(|| el.inline_style.css_text());
        el.inline_style.set_property(property, value, important);
        self.queue_mutation(MutationRecord::attribute(id, "style", old));
        true
    }

    /// Remove an inline declaration, returning its previous value
    pub fn remove_style_property(&mut self, id: NodeId, property: &str) -> Option<String> {
        let el = self.element_mut(id)?;
        let old = el.inline_style.css_text();
        let removed = el.inline_style.remove_property(property)?;
        self.queue_mutation(MutationRecord::attribute(id, "style", Some(old)));
        Some(removed)
    }

    /// Host-supplied stylesheet declaration; not observable as a mutation
    pub fn set_author_property(&mut self, id: NodeId, property: &str, value: &str, important: bool) {
        if let Some(el) = self.element_mut(id) {
            el.author_style.set_property(property, value, important);
        }
    }

    pub fn set_layout(&mut self, id: NodeId, layout: Option<LayoutBox>) {
        if let Some(el) = self.element_mut(id) {
            el.layout = layout;
        }
    }

    // ---- observers ----

    pub fn create_observer(&mut self) -> ObserverId {
        self.observers.create()
    }

    /// Start (or update) observation of `target`
    pub fn observe(&mut self, observer: ObserverId, target: NodeId, init: MutationObserverInit) -> bool {
        self.observers.observe(observer, target, init)
    }

    /// Stop observing and drop queued records
    pub fn disconnect(&mut self, observer: ObserverId) {
        self.observers.disconnect(observer);
    }

    pub fn remove_observer(&mut self, observer: ObserverId) {
        self.observers.remove(observer);
    }

    pub fn take_records(&mut self, observer: ObserverId) -> Vec<MutationRecord> {
        self.observers.take_records(observer)
    }

    fn queue_mutation(&mut self, record: MutationRecord) {
        if self.observers.is_empty() {
            return;
        }
        let targets = self
            .observers
            .interested(&record, |ancestor, node| self.is_inclusive_ancestor(ancestor, node));
        if !targets.is_empty() {
            self.observers.deliver(&targets, &record);
        }
    }
}

/// Iterator over a node's children
pub struct Children<'a> {
    tree: &'a DomTree,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.next_sibling(current);
        Some(current)
    }
}

//! TreeWalker
//!
//! Resumable, filtered pre-order traversal over elements.

use crate::tree::DomTree;
use crate::NodeId;

/// Node filter result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterResult {
    /// Yield the node and continue into its children
    Accept,
    /// Drop the node and its whole subtree
    Reject,
    /// Drop the node but continue into its children
    Skip,
}

/// Node filter trait for custom filtering
pub trait NodeFilter {
    fn accept_node(&self, tree: &DomTree, node: NodeId) -> FilterResult;
}

impl<F: Fn(&DomTree, NodeId) -> FilterResult> NodeFilter for F {
    fn accept_node(&self, tree: &DomTree, node: NodeId) -> FilterResult {
        self(tree, node)
    }
}

/// Walks the elements under `root` in document order.
///
/// The position survives between calls, so a walk can be spread over several
/// frames while the tree changes underneath it. If the current node is
/// detached from `root` in the meantime the walk ends.
#[derive(Debug, Clone)]
pub struct TreeWalker {
    root: NodeId,
    current: NodeId,
    finished: bool,
}

impl TreeWalker {
    pub fn new(root: NodeId) -> Self {
        Self { root, current: root, finished: false }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Last node returned, or the root before the first call
    pub fn current(&self) -> NodeId {
        self.current
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Next accepted element, or `None` once the subtree is exhausted
    pub fn next_node<F: NodeFilter + ?Sized>(&mut self, tree: &DomTree, filter: &F) -> Option<NodeId> {
        if self.finished {
            return None;
        }
        if !tree.is_inclusive_ancestor(self.root, self.current) {
            tracing::debug!(current = ?self.current, "walker position detached; ending walk");
            self.finished = true;
            return None;
        }

        let mut node = self.current;
        let mut descend = true;
        loop {
            let Some(next) = tree.next_in_preorder(node, self.root, descend) else {
                self.finished = true;
                return None;
            };
            node = next;
            if !tree.is_element(next) {
                descend = false;
                continue;
            }
            match filter.accept_node(tree, next) {
                FilterResult::Accept => {
                    self.current = next;
                    return Some(next);
                }
                FilterResult::Skip => descend = true,
                FilterResult::Reject => descend = false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build() -> (DomTree, Vec<NodeId>) {
        // body > [div > [span], svg > [g], p]
        let mut tree = DomTree::new();
        let body = tree.create_element("body");
        let div = tree.create_element("div");
        let span = tree.create_element("span");
        let svg = tree.create_element("svg");
        let g = tree.create_element("g");
        let p = tree.create_element("p");
        let text = tree.create_text("hi");
        tree.append_child(NodeId::ROOT, body).unwrap();
        tree.append_child(body, div).unwrap();
        tree.append_child(div, text).unwrap();
        tree.append_child(div, span).unwrap();
        tree.append_child(body, svg).unwrap();
        tree.append_child(svg, g).unwrap();
        tree.append_child(body, p).unwrap();
        (tree, vec![body, div, span, svg, g, p])
    }

    fn by_tag(tags_rejected: &'static [&'static str], tags_skipped: &'static [&'static str]) -> impl Fn(&DomTree, NodeId) -> FilterResult {
        move |tree, node| {
            let tag = tree.tag_name(node).unwrap_or_default();
            if tags_rejected.iter().any(|t| *t == tag) {
                FilterResult::Reject
            } else if tags_skipped.iter().any(|t| *t == tag) {
                FilterResult::Skip
            } else {
                FilterResult::Accept
            }
        }
    }

    fn collect(tree: &DomTree, filter: &dyn NodeFilter) -> Vec<NodeId> {
        let mut walker = TreeWalker::new(NodeId::ROOT);
        std::iter::from_fn(|| walker.next_node(tree, filter)).collect()
    }

    #[test]
    fn test_accept_all_document_order() {
        let (tree, ids) = build();
        assert_eq!(collect(&tree, &by_tag(&[], &[])), ids);
    }

    #[test]
    fn test_reject_prunes_subtree() {
        let (tree, ids) = build();
        let [body, div, span, _svg, _g, p] = ids[..] else { unreachable!() };
        assert_eq!(collect(&tree, &by_tag(&["svg"], &[])), vec![body, div, span, p]);
    }

    #[test]
    fn test_skip_keeps_children() {
        let (tree, ids) = build();
        let [body, _div, span, svg, g, p] = ids[..] else { unreachable!() };
        assert_eq!(collect(&tree, &by_tag(&[], &["div"])), vec![body, span, svg, g, p]);
    }

    #[test]
    fn test_resume_across_calls() {
        let (tree, ids) = build();
        let filter = by_tag(&[], &[]);
        let mut walker = TreeWalker::new(NodeId::ROOT);
        assert_eq!(walker.next_node(&tree, &filter), Some(ids[0]));
        assert_eq!(walker.next_node(&tree, &filter), Some(ids[1]));
        let rest: Vec<_> = std::iter::from_fn(|| walker.next_node(&tree, &filter)).collect();
        assert_eq!(rest, ids[2..].to_vec());
        assert!(walker.is_finished());
        assert_eq!(walker.next_node(&tree, &filter), None);
    }

    #[test]
    fn test_detached_position_ends_walk() {
        let (mut tree, ids) = build();
        let filter = by_tag(&[], &[]);
        let mut walker = TreeWalker::new(NodeId::ROOT);
        walker.next_node(&tree, &filter);
        walker.next_node(&tree, &filter);
        tree.detach(ids[1]);
        assert_eq!(walker.next_node(&tree, &filter), None);
    }
}

//! Retroshade DOM
//!
//! Arena-allocated document tree the theming pipeline runs against.
//! Elements carry attributes, an inline style declaration block, host-provided
//! author style and an optional layout box; the tree resolves computed values
//! for the properties the pipeline reads and records mutations for observers.

mod computed;
mod document;
mod node;
mod observer;
mod style;
mod tree;
mod walker;

pub use computed::{is_inherited, initial_value};
pub use document::Document;
pub use node::{ElementData, LayoutBox, Node, NodeData};
pub use observer::{MutationObserverInit, MutationRecord, MutationType, ObserverId};
pub use style::{Declaration, StyleDeclaration};
pub use tree::{Children, DomTree};
pub use walker::{FilterResult, NodeFilter, TreeWalker};

use thiserror::Error;

/// Node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Root (document) node ID
    pub const ROOT: NodeId = NodeId(0);
    /// Sentinel for "no node"
    pub const NONE: NodeId = NodeId(u32::MAX);

    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::NONE
    }

    /// Arena index
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Tree manipulation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DomError {
    #[error("node {0:?} does not exist")]
    NotFound(NodeId),
    #[error("node {0:?} cannot have children")]
    NotAParent(NodeId),
    #[error("inserting {child:?} under {parent:?} would create a cycle")]
    HierarchyRequest { parent: NodeId, child: NodeId },
    #[error("{reference:?} is not a child of {parent:?}")]
    NotAChild { parent: NodeId, reference: NodeId },
}

pub type DomResult<T> = Result<T, DomError>;

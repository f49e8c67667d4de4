//! Folio DOM - Host Document Model
//!
//! The document tree the accessibility runtime operates on.
//!
//! Features:
//! - Arena-allocated tree; node ids are never reused, so a stale id
//!   behaves as a weak reference
//! - Interned tag and attribute names
//! - Layout-box visibility (`display`, `hidden`, detached subtrees)
//! - Document focus state with programmatic focus
//! - Bubbling keyboard event dispatch with removable listeners
//! - Deterministic one-shot timers

mod interner;
mod generation;
mod node;
mod tree;
mod document;
pub mod events;
pub mod timers;

pub use interner::{InternedString, StringInterner};
pub use generation::Generation;
pub use node::{Node, NodeData, ElementData, Attribute, Display};
pub use tree::{DomTree, Descendants};
pub use document::Document;
pub use events::{Key, KeyboardEvent, KeyListener, ListenerId};
pub use timers::{TimerId, TimerQueue};

use std::fmt;

/// Node identifier (index into the arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// The document node
    pub const ROOT: NodeId = NodeId(0);
    /// Sentinel for "no node" in tree links
    pub const NONE: NodeId = NodeId(u32::MAX);

    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::NONE
    }

    /// Raw arena index
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Result type for DOM operations
pub type DomResult<T> = Result<T, DomError>;

/// DOM operation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    #[error("node {0} not found")]
    NotFound(NodeId),

    #[error("hierarchy request error: cannot insert {child} into {parent}")]
    HierarchyRequest { parent: NodeId, child: NodeId },

    #[error("node {0} is not an element")]
    NotAnElement(NodeId),
}

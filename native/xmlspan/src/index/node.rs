//! Tree node records
//!
//! Compact records stored in the node arena. Keys and values are spans,
//! parent/child relations are indices.

use super::span::{span_flags, ByteSpan};

/// Compact node identifier (index into arena)
pub type NodeId = u32;

/// Sentinel value for "no node"
pub const NO_NODE: NodeId = u32::MAX;

/// Type of tree node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Element with children (or an attribute container with inline text)
    Object,
    /// Element whose children repeat the same name
    Array,
    /// Leaf element holding text
    String,
    /// Name/value pair on an element
    Attribute,
}

/// A node in the arena
///
/// Size: ~44 bytes
#[derive(Debug, Clone, Copy)]
pub struct Node {
    pub kind: NodeKind,
    /// Element or attribute name
    pub key: ByteSpan,
    /// Text, attribute value, or alias of the first child's key for arrays
    pub value: ByteSpan,
    /// Parent node (NO_NODE for the document root)
    pub parent: NodeId,
    /// First committed child
    pub first_child: NodeId,
    /// Last committed child (for O(1) append)
    pub last_child: NodeId,
    /// Next committed sibling
    pub next_sibling: NodeId,
    /// Depth in the tree (0 = document root)
    pub depth: u16,
}

impl Node {
    #[inline]
    pub fn new(kind: NodeKind, parent: NodeId, depth: u16) -> Self {
        Self {
            kind,
            key: ByteSpan::empty(),
            value: ByteSpan::empty(),
            parent,
            first_child: NO_NODE,
            last_child: NO_NODE,
            next_sibling: NO_NODE,
            depth,
        }
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.parent == NO_NODE
    }

    #[inline]
    pub fn has_children(&self) -> bool {
        self.first_child != NO_NODE
    }

    #[inline]
    pub fn has_attributes(&self) -> bool {
        self.key.has(span_flags::HAS_ATTRIBUTES)
    }

    #[inline]
    pub fn is_attribute(&self) -> bool {
        self.kind == NodeKind::Attribute
    }

    /// Value describes another node's key, not text
    #[inline]
    pub fn is_alias(&self) -> bool {
        self.value.has(span_flags::ALIAS)
    }

    /// Value may hold entity references not yet decoded
    #[inline]
    pub fn needs_decode(&self) -> bool {
        self.value.has(span_flags::ESCAPE)
    }
}

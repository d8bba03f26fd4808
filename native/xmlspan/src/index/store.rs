//! Node Store - arena and buffers backing a parsed tree
//!
//! Nodes live in a flat arena and reference each other by index. A node is
//! allocated first, populated, then committed to its parent, which appends
//! it to the parent's intrusive child list. Committing in parse order keeps
//! siblings in document order.
//!
//! Besides the arena the store owns two buffers:
//! - `owned`: private copy of the source when parsing with copy semantics
//! - `scratch`: append-only buffer for synthesized keys and for values
//!   decoded out of a borrowed source

use super::node::{Node, NodeId, NodeKind, NO_NODE};
use super::span::{span_flags, ByteSpan};
use std::ops::{Index, IndexMut};

/// Arena of tree nodes
#[derive(Debug, Default)]
pub struct NodeArena {
    nodes: Vec<Node>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Reserve room for a document of `input_len` bytes.
    ///
    /// Typical documents produce about one node per 24 bytes of markup.
    pub fn reserve_for(&mut self, input_len: usize) {
        let estimated = (input_len / 24).max(16);
        self.nodes.reserve(estimated.saturating_sub(self.nodes.len()));
    }

    /// Allocate a node and return its index. The node is not linked to its
    /// parent until `commit` is called.
    #[inline]
    pub fn alloc(&mut self, kind: NodeKind, parent: NodeId, depth: u16) -> NodeId {
        let id = self.nodes.len() as NodeId;
        self.nodes.push(Node::new(kind, parent, depth));
        id
    }

    /// Append a populated node to its parent's children
    pub fn commit(&mut self, id: NodeId) {
        let parent = match self.get(id) {
            Some(node) => node.parent,
            None => return,
        };
        let last = match self.get(parent) {
            Some(p) if p.last_child == id => return,
            Some(p) => p.last_child,
            None => return,
        };
        if last == NO_NODE {
            self.nodes[parent as usize].first_child = id;
        } else {
            self.nodes[last as usize].next_sibling = id;
        }
        self.nodes[parent as usize].last_child = id;
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id as usize)
    }

    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id as usize)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate over committed children of a node
    pub fn children(&self, id: NodeId) -> ChildIter<'_> {
        ChildIter {
            arena: self,
            next: self.get(id).map(|n| n.first_child).unwrap_or(NO_NODE),
        }
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }
}

/// Ids handed out by `alloc` are always in bounds
impl Index<NodeId> for NodeArena {
    type Output = Node;

    #[inline]
    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id as usize]
    }
}

impl IndexMut<NodeId> for NodeArena {
    #[inline]
    fn index_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id as usize]
    }
}

/// Iterator over the children of a node, in document order
pub struct ChildIter<'a> {
    arena: &'a NodeArena,
    next: NodeId,
}

impl Iterator for ChildIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.next;
        let node = self.arena.get(id)?;
        self.next = node.next_sibling;
        Some(id)
    }
}

/// Arena plus the buffers spans point into
#[derive(Debug, Default)]
pub struct NodeStore {
    pub(crate) arena: NodeArena,
    pub(crate) owned: Vec<u8>,
    pub(crate) scratch: Vec<u8>,
    err_offset: usize,
}

impl NodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn arena(&self) -> &NodeArena {
        &self.arena
    }

    /// Replace the owned source with a copy of `src`
    pub(crate) fn install_copy(&mut self, src: &[u8]) {
        self.owned.clear();
        self.owned.extend_from_slice(src);
    }

    #[inline]
    pub fn owned_source(&self) -> &[u8] {
        &self.owned
    }

    #[inline]
    pub fn scratch(&self) -> &[u8] {
        &self.scratch
    }

    #[inline]
    pub fn error_offset(&self) -> usize {
        self.err_offset
    }

    #[inline]
    pub(crate) fn set_error_offset(&mut self, offset: usize) {
        self.err_offset = offset;
    }

    /// Drop all nodes and buffer contents, keeping allocations for reuse
    pub fn reset(&mut self) {
        self.arena.clear();
        self.owned.clear();
        self.scratch.clear();
        self.err_offset = 0;
    }
}

/// Append `bytes` to a scratch buffer and return an indirect span over them
pub(crate) fn synthesize(scratch: &mut Vec<u8>, bytes: &[u8]) -> ByteSpan {
    let start = scratch.len();
    scratch.extend_from_slice(bytes);
    ByteSpan::from_range(start, scratch.len()).with(span_flags::INDIRECT)
}

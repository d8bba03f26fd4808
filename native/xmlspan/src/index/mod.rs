//! Node Store Module
//!
//! Index-based storage for parsed documents. Nothing here copies strings:
//!
//! - **Spans**: keys and values are (offset, length, flags) triples into the
//!   source or the scratch buffer.
//! - **Arena**: nodes are records in one `Vec`, linked by `u32` indices
//!   (first child, last child, next sibling, parent).
//!
//! ## Architecture
//!
//! ```text
//! NodeStore
//! ├── arena: NodeArena      # Vec<Node>, ~44 bytes each
//! ├── owned: Vec<u8>        # private source copy (copy semantics only)
//! ├── scratch: Vec<u8>      # synthesized keys, decoded values
//! └── err_offset            # offset of the last parse error
//! ```

pub mod node;
pub mod span;
pub mod store;

pub use node::{Node, NodeId, NodeKind, NO_NODE};
pub use span::{span_flags, ByteSpan};
pub use store::{ChildIter, NodeArena, NodeStore};

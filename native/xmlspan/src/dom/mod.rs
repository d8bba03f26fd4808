//! DOM Module - read access to parsed trees
//!
//! A `Document` borrows a parser's node store and exposes:
//! - NodeId (u32) based traversal (children, attributes, elements)
//! - Raw and lazily decoded values
//! - Dotted path lookup

pub mod document;

pub use document::{Document, ROOT};

//! Core XML scanning primitives
//!
//! Stateless building blocks used by the parser:
//! - Scanner: formatting/comment/CDATA/name/close-tag skipping using memchr
//! - Entities: escape detection, in-place decoding, output escaping
//! - Attributes: `name="value"` pair and tag terminator scanning

pub mod attributes;
pub mod entities;
pub mod scanner;

//! Recursive-descent tree parser
//!
//! One forward pass over the input builds the node tree directly, with no
//! intermediate token stream. Keys and values are spans into the source (or
//! into the parser's private copy of it).
//!
//! ## Flow
//!
//! ```text
//! trim → install source → root node
//!      → prolog → header (DOCTYPE, PIs, comments)
//!      → element (recursive) → tail check
//! ```
//!
//! A `Parser` is reusable: every parse resets the previous tree, so
//! documents borrowed from it must be dropped first (enforced by `&mut`).

mod element;
mod prolog;

use crate::core::scanner::{skip_comment, skip_format, trim_format};
use crate::dom::Document;
use crate::error::{Error, ErrorKind, ParseError};
use crate::index::{NodeArena, NodeKind, NodeStore, NO_NODE};
use log::{debug, trace};
use std::io::Read;

/// Maximum element nesting depth
pub const MAX_DEPTH: usize = 256;

/// What the store currently holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Loaded {
    Nothing,
    Borrowed,
    Owned,
}

/// Reusable parser instance owning a node store
#[derive(Debug)]
pub struct Parser {
    store: NodeStore,
    loaded: Loaded,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    pub fn new() -> Self {
        Self {
            store: NodeStore::new(),
            loaded: Loaded::Nothing,
        }
    }

    /// Parse a borrowed buffer. Spans point into `input`, which must outlive
    /// the returned document.
    pub fn parse<'a>(&'a mut self, input: &'a [u8]) -> Result<Document<'a>, ParseError> {
        let src = trim_format(input);
        self.run(src, false)?;
        self.loaded = Loaded::Borrowed;
        Ok(Document::borrowed(src, &mut self.store))
    }

    /// Parse a private copy of `input`; the caller's buffer is not retained
    pub fn parse_copy(&mut self, input: &[u8]) -> Result<Document<'_>, ParseError> {
        self.run(trim_format(input), true)?;
        self.loaded = Loaded::Owned;
        Ok(Document::owned(&mut self.store))
    }

    pub fn parse_str<'a>(&'a mut self, input: &'a str) -> Result<Document<'a>, ParseError> {
        self.parse(input.as_bytes())
    }

    pub fn parse_copy_str(&mut self, input: &str) -> Result<Document<'_>, ParseError> {
        self.parse_copy(input.as_bytes())
    }

    /// Read the whole stream, then parse it with copy semantics
    pub fn parse_reader<R: Read>(&mut self, mut reader: R) -> Result<Document<'_>, Error> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        Ok(self.parse_copy(&buf)?)
    }

    /// Re-open the tree of the last successful copy parse
    pub fn document(&mut self) -> Option<Document<'_>> {
        match self.loaded {
            Loaded::Owned => Some(Document::owned(&mut self.store)),
            _ => None,
        }
    }

    /// Offset of the last parse error (0 after a successful parse)
    #[inline]
    pub fn error_offset(&self) -> usize {
        self.store.error_offset()
    }

    /// Number of nodes in the current tree, root included
    #[inline]
    pub fn node_count(&self) -> usize {
        self.store.arena().len()
    }

    /// Drop the current tree, keeping allocations
    pub fn reset(&mut self) {
        self.store.reset();
        self.loaded = Loaded::Nothing;
    }

    fn run(&mut self, src: &[u8], copy: bool) -> Result<(), ParseError> {
        self.reset();
        if src.len() > u32::MAX as usize {
            return Err(self.fail(ParseError::new(ErrorKind::LimitExceeded, 0), src.len()));
        }
        if copy {
            self.store.install_copy(src);
        }

        let NodeStore {
            arena,
            owned,
            scratch,
            ..
        } = &mut self.store;
        let src: &[u8] = if copy { owned.as_slice() } else { src };
        arena.reserve_for(src.len());

        let len = src.len();
        let result = Scan {
            src,
            arena,
            scratch,
        }
        .parse_generic();

        match result {
            Ok(_) => {
                trace!("parsed {} nodes from {} bytes", self.store.arena().len(), len);
                Ok(())
            }
            Err(e) => Err(self.fail(e, len)),
        }
    }

    fn fail(&mut self, e: ParseError, len: usize) -> ParseError {
        debug!("parse failed on {} byte input: {}", len, e);
        self.store.set_error_offset(e.offset);
        e
    }
}

/// Cursor-free parse state: the source and the buffers nodes are written to.
/// Offsets are threaded through the parse functions explicitly.
struct Scan<'s> {
    src: &'s [u8],
    arena: &'s mut NodeArena,
    scratch: &'s mut Vec<u8>,
}

impl Scan<'_> {
    /// Root node, prolog, header, document element, tail check.
    /// Returns the final offset.
    fn parse_generic(&mut self) -> Result<usize, ParseError> {
        if self.src.is_empty() {
            return Err(ParseError::new(ErrorKind::NoRoot, 0));
        }
        let root = self.arena.alloc(NodeKind::Object, NO_NODE, 0);

        let offset = self.parse_prolog(root, 0)?;
        let offset = self.skip_header(offset)?;
        let (element, offset) = self.parse_element(1, offset, root)?;
        self.arena.commit(element);

        let offset = self.skip_trailer(offset)?;
        if offset < self.src.len() {
            return Err(ParseError::new(ErrorKind::UnparsedTail, offset));
        }
        Ok(offset)
    }

    /// Skip comments and formatting after the document element
    fn skip_trailer(&self, mut offset: usize) -> Result<usize, ParseError> {
        loop {
            let (start, _) = skip_format(self.src, offset);
            let (next, unterminated) = skip_comment(self.src, start);
            if unterminated {
                return Err(ParseError::new(ErrorKind::UnparsedTail, start));
            }
            if next == start {
                return Ok(start);
            }
            offset = next;
        }
    }
}

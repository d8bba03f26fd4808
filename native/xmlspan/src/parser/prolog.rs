//! Prolog and header handling
//!
//! `<?xml version=".." encoding=".."?>` attributes become attribute children
//! of the synthetic root. Without a prolog a `version="1.0"` attribute is
//! synthesized. DOCTYPE declarations, processing instructions and comments
//! before the document element are skipped.

use super::Scan;
use crate::core::attributes::{scan_attribute, scan_tag_end, TagEnd};
use crate::core::scanner::{is_format, skip_comment_and_format};
use crate::error::{ErrorKind, ParseError};
use crate::index::store::synthesize;
use crate::index::{span_flags, NodeId, NodeKind};
use memchr::{memchr2, memmem};

const PROLOG_OPEN: &[u8] = b"<?xml";
const PI_OPEN: &[u8] = b"<?";
const PI_CLOSE: &[u8] = b"?>";
const DOCTYPE_OPEN: &[u8] = b"<!DOCTYPE";
const SUBSET_CLOSE: &[u8] = b"]>";

impl Scan<'_> {
    /// Parse the prolog at `offset`, or synthesize the default version.
    /// Returns the offset past the prolog and any following comments.
    pub(super) fn parse_prolog(&mut self, root: NodeId, offset: usize) -> Result<usize, ParseError> {
        let src = self.src;
        let is_prolog = src[offset..].starts_with(PROLOG_OPEN)
            && src
                .get(offset + PROLOG_OPEN.len())
                .is_some_and(|&b| is_format(b) || b == b'?');
        if !is_prolog {
            self.default_version(root);
            return Ok(offset);
        }

        match self.parse_attributes(root, 1, offset + PROLOG_OPEN.len()) {
            Ok((TagEnd::PiClosed, next)) => Ok(skip_comment_and_format(src, next).0),
            Ok(_) => Err(ParseError::new(ErrorKind::UnclosedProlog, offset)),
            Err(e) if e.kind == ErrorKind::UnexpectedEndOfInput => {
                Err(ParseError::new(ErrorKind::UnclosedProlog, offset))
            }
            Err(e) => Err(e),
        }
    }

    /// Attach `version="1.0"` to the root, with both spans in scratch
    fn default_version(&mut self, root: NodeId) {
        let key = synthesize(self.scratch, b"version");
        let value = synthesize(self.scratch, b"1.0");
        let attr = self.arena.alloc(NodeKind::Attribute, root, 1);
        self.arena[attr].key = key;
        self.arena[attr].value = value;
        self.arena.commit(attr);
        self.arena[root].key.set(span_flags::HAS_ATTRIBUTES, true);
    }

    /// Parse attributes onto `owner` until a tag terminator
    pub(super) fn parse_attributes(
        &mut self,
        owner: NodeId,
        depth: u16,
        mut offset: usize,
    ) -> Result<(TagEnd, usize), ParseError> {
        loop {
            let (end, next) = scan_tag_end(self.src, offset)?;
            if let Some(end) = end {
                return Ok((end, next));
            }
            let (raw, next) = scan_attribute(self.src, next)?;
            let attr = self.arena.alloc(NodeKind::Attribute, owner, depth);
            self.arena[attr].key = raw.name;
            self.arena[attr].value = raw.value;
            self.arena.commit(attr);
            self.arena[owner].key.set(span_flags::HAS_ATTRIBUTES, true);
            offset = next;
        }
    }

    /// Skip DOCTYPE declarations, processing instructions, comments and
    /// formatting until none applies. Running out of input here is left to
    /// the element parser, which reports a missing root.
    pub(super) fn skip_header(&self, mut offset: usize) -> Result<usize, ParseError> {
        let src = self.src;
        loop {
            let (next, eof) = skip_comment_and_format(src, offset);
            if eof {
                return Ok(next);
            }
            let rest = &src[next..];
            offset = if rest.starts_with(DOCTYPE_OPEN) {
                next + skip_doctype(rest).ok_or_else(|| unexpected_eof(src))?
            } else if rest.starts_with(PI_OPEN) {
                memmem::find(&rest[PI_OPEN.len()..], PI_CLOSE)
                    .map(|p| next + PI_OPEN.len() + p + PI_CLOSE.len())
                    .ok_or_else(|| unexpected_eof(src))?
            } else {
                return Ok(next);
            };
        }
    }
}

/// Length of the `<!DOCTYPE ...>` declaration at the start of `rest`.
///
/// An internal subset (`[` before the first `>`) runs to `]>`, which also
/// covers `<!DOCTYPE n [<!ELEMENT n (#PCDATA)>]>`; otherwise the declaration
/// is an external reference ending at the next `>`.
fn skip_doctype(rest: &[u8]) -> Option<usize> {
    let body = DOCTYPE_OPEN.len();
    let p = body + memchr2(b'[', b'>', &rest[body..])?;
    if rest[p] == b'>' {
        return Some(p + 1);
    }
    memmem::find(&rest[p..], SUBSET_CLOSE).map(|q| p + q + SUBSET_CLOSE.len())
}

#[inline]
fn unexpected_eof(src: &[u8]) -> ParseError {
    ParseError::new(ErrorKind::UnexpectedEndOfInput, src.len())
}

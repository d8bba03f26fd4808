//! XML Attribute Scanning
//!
//! Scans `name="value"` / `name='value'` pairs and tag terminators in place,
//! producing spans into the source. Node creation is left to the parser.

use super::entities::check_escape;
use super::scanner::{is_format, skip_format};
use crate::error::{ErrorKind, ParseError};
use crate::index::{span_flags, ByteSpan};
use memchr::memchr;

/// How a start tag (or prolog) was terminated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagEnd {
    /// `>`: content and a close tag follow
    Open,
    /// `/>`
    SelfClosed,
    /// `?>`
    PiClosed,
}

impl TagEnd {
    /// No content or close tag follows
    #[inline]
    pub fn is_closed(self) -> bool {
        !matches!(self, TagEnd::Open)
    }
}

/// A scanned attribute, spans relative to the scanned buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawAttribute {
    pub name: ByteSpan,
    /// Carries `ESCAPE` when the value may hold entity references
    pub value: ByteSpan,
}

/// Check for a tag terminator at `offset` (after skipping formatting).
///
/// Returns the terminator and the offset past it, or `None` with the
/// offset of the next attribute.
pub fn scan_tag_end(src: &[u8], offset: usize) -> Result<(Option<TagEnd>, usize), ParseError> {
    let (offset, eof) = skip_format(src, offset);
    if eof {
        return Err(ParseError::new(ErrorKind::UnexpectedEndOfInput, offset));
    }
    let end = match src[offset] {
        b'>' => return Ok((Some(TagEnd::Open), offset + 1)),
        b'/' => TagEnd::SelfClosed,
        b'?' => TagEnd::PiClosed,
        _ => return Ok((None, offset)),
    };
    match src.get(offset + 1) {
        Some(b'>') => Ok((Some(end), offset + 2)),
        Some(_) => Err(ParseError::new(ErrorKind::UnexpectedToken, offset + 1)),
        None => Err(ParseError::new(ErrorKind::UnexpectedEndOfInput, src.len())),
    }
}

#[inline]
fn ends_name(b: u8) -> bool {
    is_format(b) || matches!(b, b'=' | b'>' | b'/' | b'?')
}

/// Scan one `name = "value"` pair starting at `offset`.
///
/// Whitespace is allowed around `=`. Returns the pair and the offset past
/// the closing quote.
pub fn scan_attribute(src: &[u8], offset: usize) -> Result<(RawAttribute, usize), ParseError> {
    let n = src.len();
    let name_end = src[offset..]
        .iter()
        .position(|&b| ends_name(b))
        .map_or(n, |p| offset + p);
    if name_end == offset {
        return Err(ParseError::new(ErrorKind::BadAttribute, offset));
    }
    let name = ByteSpan::from_range(offset, name_end);

    let (pos, eof) = skip_format(src, name_end);
    if eof || src[pos] != b'=' {
        return Err(ParseError::new(ErrorKind::BadAttribute, pos));
    }
    let (pos, eof) = skip_format(src, pos + 1);
    if eof {
        return Err(ParseError::new(ErrorKind::BadAttribute, pos));
    }
    let quote = src[pos];
    if quote != b'"' && quote != b'\'' {
        return Err(ParseError::new(ErrorKind::BadAttribute, pos));
    }

    let start = pos + 1;
    let end = match memchr(quote, &src[start..]) {
        Some(p) => start + p,
        None => return Err(ParseError::new(ErrorKind::BadAttribute, pos)),
    };
    let mut value = ByteSpan::from_range(start, end);
    value.set(span_flags::ESCAPE, check_escape(&src[start..end]));

    Ok((RawAttribute { name, value }, end + 1))
}

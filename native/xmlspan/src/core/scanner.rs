//! Scanner primitives
//!
//! Stateless skip functions over `(buffer, offset)` pairs. Each returns the
//! new offset, which never moves backwards, and most also report whether the
//! scan ran off the end of the buffer.
//!
//! Byte searching goes through memchr (SSE2/AVX2/NEON when available).

use crate::error::{ErrorKind, ParseError};
use memchr::memmem;

pub const COMMENT_OPEN: &[u8] = b"<!--";
pub const COMMENT_CLOSE: &[u8] = b"-->";
pub const CDATA_OPEN: &[u8] = b"<![CDATA[";
pub const CDATA_CLOSE: &[u8] = b"]]>";
pub const CLOSE_TAG_OPEN: &[u8] = b"</";

/// Formatting bytes: space, tab, newline, carriage return
static FORMAT: [bool; 256] = {
    let mut table = [false; 256];
    table[b' ' as usize] = true;
    table[b'\t' as usize] = true;
    table[b'\n' as usize] = true;
    table[b'\r' as usize] = true;
    table
};

/// Remaining length above which the word-at-a-time path is tried
const WORD_SKIP_THRESHOLD: usize = 512;

/// A newline followed by seven spaces, the usual start of an indented line
const NL_SPACE7: u64 = u64::from_ne_bytes(*b"\n       ");
const SPACE8: u64 = u64::from_ne_bytes(*b"        ");

#[inline]
pub fn is_format(b: u8) -> bool {
    FORMAT[b as usize]
}

#[inline]
fn word_at(src: &[u8], offset: usize) -> Option<u64> {
    let bytes = src.get(offset..offset + 8)?;
    let mut word = [0u8; 8];
    word.copy_from_slice(bytes);
    Some(u64::from_ne_bytes(word))
}

/// Trim leading and trailing formatting bytes
pub fn trim_format(src: &[u8]) -> &[u8] {
    let start = src.iter().position(|&b| !is_format(b)).unwrap_or(src.len());
    let end = src.iter().rposition(|&b| !is_format(b)).map_or(start, |p| p + 1);
    &src[start..end]
}

/// Skip formatting bytes. Returns `(offset, eof)`.
#[inline]
pub fn skip_format(src: &[u8], mut offset: usize) -> (usize, bool) {
    let n = src.len();
    if offset >= n {
        return (n, true);
    }
    if n - offset > WORD_SKIP_THRESHOLD && word_at(src, offset) == Some(NL_SPACE7) {
        offset += 8;
        while word_at(src, offset) == Some(SPACE8) {
            offset += 8;
        }
    }
    while offset < n && is_format(src[offset]) {
        offset += 1;
    }
    (offset, offset == n)
}

/// Skip one or more consecutive comments. Returns `(offset, eof)`;
/// `eof` is set when a comment is not terminated.
pub fn skip_comment(src: &[u8], mut offset: usize) -> (usize, bool) {
    while src.get(offset..).is_some_and(|rest| rest.starts_with(COMMENT_OPEN)) {
        offset += COMMENT_OPEN.len();
        match memmem::find(&src[offset..], COMMENT_CLOSE) {
            Some(p) => offset += p + COMMENT_CLOSE.len(),
            None => return (src.len(), true),
        }
    }
    (offset, false)
}

/// Skip interleaved formatting bytes and comments until neither applies
pub fn skip_comment_and_format(src: &[u8], mut offset: usize) -> (usize, bool) {
    if offset >= src.len() {
        return (src.len(), true);
    }
    let mut prev = usize::MAX;
    while prev != offset {
        prev = offset;
        let (next, eof) = skip_format(src, offset);
        if eof {
            return (next, true);
        }
        let (next, eof) = skip_comment(src, next);
        if eof {
            return (next, true);
        }
        offset = next;
    }
    (offset, offset == src.len())
}

/// Detect `<![CDATA[` and step over it. Returns `(offset, is_cdata)`.
/// The closing `]]>` is left for the content parser.
#[inline]
pub fn skip_cdata(src: &[u8], offset: usize) -> (usize, bool) {
    match src.get(offset..) {
        Some(rest) if rest.starts_with(CDATA_OPEN) => (offset + CDATA_OPEN.len(), true),
        _ => (offset, false),
    }
}

/// Advance to the first formatting byte before `limit`
#[inline]
pub fn skip_name(src: &[u8], mut offset: usize, limit: usize) -> usize {
    let limit = limit.min(src.len());
    while offset < limit && !is_format(src[offset]) {
        offset += 1;
    }
    offset
}

/// Require `</tag>` at `offset` and return the offset past it.
///
/// Tag names must match byte for byte.
pub fn skip_close_tag(src: &[u8], offset: usize, tag: &[u8]) -> Result<usize, ParseError> {
    let n = src.len();
    if offset >= n {
        return Err(ParseError::new(ErrorKind::UnexpectedEndOfInput, n));
    }
    let rest = &src[offset..];
    let name_end = CLOSE_TAG_OPEN.len() + tag.len();
    if !rest.starts_with(CLOSE_TAG_OPEN)
        || rest.get(CLOSE_TAG_OPEN.len()..name_end) != Some(tag)
        || rest.get(name_end) != Some(&b'>')
    {
        return Err(ParseError::new(ErrorKind::UnclosedTag, offset));
    }
    Ok(offset + name_end + 1)
}

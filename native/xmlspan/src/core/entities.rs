//! XML Entity Codec
//!
//! Handles:
//! - Escape detection: a cheap heuristic deciding whether a span may hold
//!   entity references, used to defer decoding until the value is read
//! - In-place decoding of `&lt; &gt; &amp; &apos; &quot;` and numeric
//!   character references `&#123;` / `&#x7B;`
//! - Escaping of text and attribute values for output
//!
//! Malformed references are never errors: they are left in the text as is.

use memchr::{memchr, memchr3};
use std::borrow::Cow;
use std::io::{self, Write};

/// Largest `;` - `&` distance that still looks like a reference.
/// Covers `&apos;` (5) up to `&#1114111;` and `&#x10FFFF;` (9).
const MAX_ENTITY_GAP: usize = 9;

/// Check whether `input` may contain entity references.
///
/// False positives only cost a wasted decode attempt; free text such as
/// `a & b; c` is accepted when the `;` is close enough to the `&`.
pub fn check_escape(input: &[u8]) -> bool {
    let mut from = 0;
    while let Some(amp) = memchr(b'&', &input[from..]).map(|p| from + p) {
        match memchr(b';', &input[amp..]) {
            None => return false,
            Some(gap) if (2..=MAX_ENTITY_GAP).contains(&gap) => return true,
            Some(_) => from = amp + 1,
        }
    }
    false
}

/// Decode entity references in place, single pass, left to right.
///
/// Returns the new length; bytes past it are garbage. Replacements never
/// rescan their own output, so `&amp;lt;` decodes to `&lt;`.
pub fn unescape(buf: &mut [u8]) -> usize {
    let mut len = buf.len();
    let mut from = 0;
    let mut utf8 = [0u8; 4];

    while let Some(amp) = memchr(b'&', &buf[from..len]).map(|p| from + p) {
        let semi = match memchr(b';', &buf[amp + 1..len]) {
            Some(p) => amp + 1 + p,
            None => break,
        };
        from = amp + 1;

        let entity = &buf[amp..=semi];
        if entity.len() < 4 {
            from = semi + 1;
            continue;
        }
        let replacement: &[u8] = match entity {
            b"&lt;" => b"<",
            b"&gt;" => b">",
            b"&amp;" => b"&",
            b"&apos;" => b"'",
            b"&quot;" => b"\"",
            _ if entity[1] == b'#' => match decode_numeric(&entity[2..entity.len() - 1]) {
                Some(c) => c.encode_utf8(&mut utf8).as_bytes(),
                None => continue,
            },
            _ => continue,
        };

        let rlen = replacement.len();
        buf[amp..amp + rlen].copy_from_slice(replacement);
        buf.copy_within(semi + 1..len, amp + rlen);
        len -= semi + 1 - (amp + rlen);
        from = amp + rlen;
    }

    len
}

/// Decode in place and shrink the vector to the decoded length
pub fn unescape_vec(buf: &mut Vec<u8>) {
    let len = unescape(buf);
    buf.truncate(len);
}

/// Decode text content, copying only when it contains an `&`
#[inline]
pub fn decode_text(input: &[u8]) -> Cow<'_, [u8]> {
    if memchr(b'&', input).is_none() {
        return Cow::Borrowed(input);
    }
    let mut owned = input.to_vec();
    unescape_vec(&mut owned);
    Cow::Owned(owned)
}

/// Decode the digits of `&#...;`. Hex requires a lower-case `x`.
fn decode_numeric(digits: &[u8]) -> Option<char> {
    let (radix, digits) = match digits.split_first() {
        Some((b'x', hex)) => (16, hex),
        _ => (10, digits),
    };
    let valid: fn(&u8) -> bool = match radix {
        16 => u8::is_ascii_hexdigit,
        _ => u8::is_ascii_digit,
    };
    if digits.is_empty() || !digits.iter().all(valid) {
        return None;
    }
    let codepoint = u32::from_str_radix(std::str::from_utf8(digits).ok()?, radix).ok()?;
    char::from_u32(codepoint)
}

/// Write text escaped for element content
pub fn write_escaped_text<W: Write>(w: &mut W, input: &[u8]) -> io::Result<()> {
    write_escaped(w, input, false)
}

/// Write text escaped for a double-quoted attribute value
pub fn write_escaped_attribute<W: Write>(w: &mut W, input: &[u8]) -> io::Result<()> {
    write_escaped(w, input, true)
}

fn write_escaped<W: Write>(w: &mut W, input: &[u8], quote: bool) -> io::Result<()> {
    let mut pos = 0;
    while pos < input.len() {
        let rest = &input[pos..];
        let hit = if quote {
            match (memchr3(b'<', b'&', b'"', rest), memchr(b'>', rest)) {
                (Some(a), Some(b)) => Some(a.min(b)),
                (a, b) => a.or(b),
            }
        } else {
            memchr3(b'<', b'&', b'>', rest)
        };
        let Some(p) = hit else {
            return w.write_all(rest);
        };
        w.write_all(&rest[..p])?;
        w.write_all(match rest[p] {
            b'<' => b"&lt;",
            b'>' => b"&gt;",
            b'&' => b"&amp;",
            _ => b"&quot;",
        })?;
        pos += p + 1;
    }
    Ok(())
}

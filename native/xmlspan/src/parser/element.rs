//! Element and content parsing
//!
//! Each element becomes a node classified by what its content turns out to
//! be:
//!
//! - `String`: a leaf holding text (or CDATA payload)
//! - `Object`: nested elements, or text on an element that has attributes
//! - `Array`: nested elements where a later sibling repeats the first
//!   sibling's name; the value aliases that shared name
//!
//! The kind is settled once the element's content has been fully parsed.

use super::{Scan, MAX_DEPTH};
use crate::core::attributes::TagEnd;
use crate::core::entities::check_escape;
use crate::core::scanner::{
    skip_cdata, skip_close_tag, skip_comment_and_format, skip_format, skip_name, CDATA_CLOSE,
    CLOSE_TAG_OPEN,
};
use crate::error::{ErrorKind, ParseError};
use crate::index::{span_flags, ByteSpan, NodeId, NodeKind};
use log::trace;
use memchr::{memchr, memchr3, memmem};

impl Scan<'_> {
    /// Parse the element starting at `offset` as a child of `parent`.
    ///
    /// The node is allocated but not committed; the caller links it.
    pub(super) fn parse_element(
        &mut self,
        depth: u16,
        offset: usize,
        parent: NodeId,
    ) -> Result<(NodeId, usize), ParseError> {
        let src = self.src;
        let n = src.len();
        if src.get(offset) != Some(&b'<') {
            let kind = if depth == 1 {
                ErrorKind::NoRoot
            } else {
                ErrorKind::UnclosedTag
            };
            return Err(ParseError::new(kind, offset));
        }
        if depth as usize > MAX_DEPTH {
            return Err(ParseError::new(ErrorKind::LimitExceeded, offset));
        }

        let (name_start, eof) = skip_comment_and_format(src, offset + 1);
        if eof {
            return Err(ParseError::new(ErrorKind::UnexpectedEndOfInput, n));
        }
        let limit = memchr3(b' ', b'/', b'>', &src[name_start..])
            .map(|p| name_start + p)
            .ok_or(ParseError::new(ErrorKind::UnclosedTag, offset))?;
        let name_end = skip_name(src, name_start, limit);
        if name_end == name_start {
            return Err(ParseError::new(ErrorKind::UnexpectedToken, name_start));
        }

        let node = self.arena.alloc(NodeKind::Object, parent, depth);
        self.arena[node].key = ByteSpan::from_range(name_start, name_end);
        let tag = &src[name_start..name_end];

        let (pos, eof) = skip_format(src, name_end);
        if eof {
            return Err(ParseError::new(ErrorKind::UnexpectedEndOfInput, n));
        }
        let content = match src[pos] {
            b'/' if src.get(pos + 1) == Some(&b'>') => return Ok((node, pos + 2)),
            b'/' => return Err(ParseError::new(ErrorKind::UnclosedTag, pos)),
            b'>' => pos + 1,
            _ => match self.parse_attributes(node, depth + 1, pos)? {
                (TagEnd::Open, next) => next,
                (_, next) => return Ok((node, next)),
            },
        };

        let offset = self.parse_content(depth, content, node)?;
        let (offset, _) = skip_format(src, offset);
        let offset = skip_close_tag(src, offset, tag)?;
        Ok((node, offset))
    }

    /// Parse what follows a start tag up to (not including) its close tag
    fn parse_content(&mut self, depth: u16, offset: usize, node: NodeId) -> Result<usize, ParseError> {
        let src = self.src;
        let n = src.len();
        let (pos, eof) = skip_comment_and_format(src, offset);
        if eof {
            return Err(ParseError::new(ErrorKind::UnexpectedEndOfInput, n));
        }

        let (text_start, is_cdata) = skip_cdata(src, pos);
        if !is_cdata {
            if src[pos..].starts_with(CLOSE_TAG_OPEN) {
                return Ok(pos);
            }
            if src[pos] == b'<' {
                return self.parse_children(depth, pos, node);
            }
        }

        let (text_end, next) = if is_cdata {
            match memmem::find(&src[text_start..], CDATA_CLOSE) {
                Some(p) => (text_start + p, text_start + p + CDATA_CLOSE.len()),
                None => return Err(ParseError::new(ErrorKind::UnexpectedEndOfInput, n)),
            }
        } else {
            match memchr(b'<', &src[text_start..]) {
                Some(p) => (text_start + p, text_start + p),
                None => return Err(ParseError::new(ErrorKind::UnclosedTag, n)),
            }
        };

        let mut value = ByteSpan::from_range(text_start, text_end);
        if !is_cdata {
            value.set(span_flags::ESCAPE, check_escape(&src[text_start..text_end]));
        }
        let element = &mut self.arena[node];
        element.value = value;
        if !element.has_attributes() {
            element.kind = NodeKind::String;
        }
        Ok(next)
    }

    /// Parse nested elements until the parent's close tag
    fn parse_children(&mut self, depth: u16, mut offset: usize, node: NodeId) -> Result<usize, ParseError> {
        let src = self.src;
        let mut first: Option<ByteSpan> = None;
        let mut repeated = false;

        loop {
            let (child, next) = self.parse_element(depth + 1, offset, node)?;
            self.arena.commit(child);

            let key = self.arena[child].key;
            match first {
                None => first = Some(key),
                Some(f) => repeated = repeated || key.slice(src) == f.slice(src),
            }

            let (pos, eof) = skip_comment_and_format(src, next);
            if eof {
                return Err(ParseError::new(ErrorKind::UnexpectedEndOfInput, src.len()));
            }
            offset = pos;
            if src[pos..].starts_with(CLOSE_TAG_OPEN) {
                break;
            }
        }

        if let (true, Some(first)) = (repeated, first) {
            let element = &mut self.arena[node];
            element.kind = NodeKind::Array;
            element.value = ByteSpan::new(first.offset, first.len).with(span_flags::ALIAS);
            trace!(
                "collapsed <{}> children into an array at depth {}",
                String::from_utf8_lossy(first.slice(src)),
                depth
            );
        }
        Ok(offset)
    }
}

#[cfg(test)]
mod tests {
    use crate::error::{ErrorKind, ParseError};
    use crate::index::NodeKind;
    use crate::parser::Parser;

    fn kinds(input: &str) -> Vec<(String, NodeKind)> {
        let mut parser = Parser::new();
        let doc = parser.parse_str(input).unwrap();
        let mut out = Vec::new();
        let mut stack = vec![doc.root_element().unwrap()];
        while let Some(id) = stack.pop() {
            out.push((doc.key_str(id).unwrap().to_string(), doc.kind(id).unwrap()));
            let mut elements: Vec<_> = doc.elements(id).collect();
            elements.reverse();
            stack.extend(elements);
        }
        out
    }

    #[test]
    fn test_array_collapse() {
        let mut parser = Parser::new();
        let doc = parser.parse(b"<root><a>1</a><a>2</a><a>3</a></root>").unwrap();
        let root = doc.root_element().unwrap();
        assert_eq!(doc.kind(root), Some(NodeKind::Array));
        assert_eq!(doc.raw_value(root), b"a");
        assert!(doc.node(root).unwrap().is_alias());

        let children: Vec<_> = doc.elements(root).collect();
        assert_eq!(children.len(), 3);
        for (id, expect) in children.iter().zip(["1", "2", "3"]) {
            assert_eq!(doc.kind(*id), Some(NodeKind::String));
            assert_eq!(doc.raw_value(*id), expect.as_bytes());
        }
    }

    #[test]
    fn test_distinct_children_stay_object() {
        let tree = kinds("<root><a>1</a><b>2</b></root>");
        assert_eq!(tree[0], ("root".to_string(), NodeKind::Object));
        assert_eq!(tree[1].1, NodeKind::String);
    }

    #[test]
    fn test_repeat_of_first_key_collapses() {
        let tree = kinds("<r><a/><b/><a/></r>");
        assert_eq!(tree[0].1, NodeKind::Array);
        let tree = kinds("<r><a/><b/><b/></r>");
        assert_eq!(tree[0].1, NodeKind::Object);
    }

    #[test]
    fn test_self_closed_with_attributes() {
        let mut parser = Parser::new();
        let doc = parser.parse(b"<root title=\"Foo\" descr=\"Bar\"/>").unwrap();
        let root = doc.root_element().unwrap();
        assert_eq!(doc.kind(root), Some(NodeKind::Object));
        assert!(doc.node(root).unwrap().has_attributes());
        assert_eq!(doc.attributes(root).count(), 2);
        assert_eq!(doc.elements(root).count(), 0);
        assert!(doc.raw_value(root).is_empty());
        assert_eq!(doc.attribute(root, "descr"), Some(&b"Bar"[..]));
    }

    #[test]
    fn test_text_with_attributes_stays_object() {
        let mut parser = Parser::new();
        let doc = parser.parse(b"<price currency=\"EUR\">12.50</price>").unwrap();
        let root = doc.root_element().unwrap();
        assert_eq!(doc.kind(root), Some(NodeKind::Object));
        assert_eq!(doc.raw_value(root), b"12.50");
    }

    #[test]
    fn test_cdata() {
        let mut parser = Parser::new();
        let doc = parser.parse(b"<a><![CDATA[x < y &amp; <b>]]></a>").unwrap();
        let root = doc.root_element().unwrap();
        assert_eq!(doc.kind(root), Some(NodeKind::String));
        assert_eq!(doc.raw_value(root), b"x < y &amp; <b>");
        assert!(!doc.node(root).unwrap().needs_decode());
    }

    #[test]
    fn test_escape_flag_on_text() {
        let mut parser = Parser::new();
        let doc = parser.parse(b"<r><a>x &lt; y</a><b>plain</b></r>").unwrap();
        let a = doc.find("r.a").unwrap();
        let b = doc.find("r.b").unwrap();
        assert!(doc.node(a).unwrap().needs_decode());
        assert!(!doc.node(b).unwrap().needs_decode());
    }

    #[test]
    fn test_empty_and_blank_content() {
        assert_eq!(kinds("<a></a>")[0].1, NodeKind::Object);
        assert_eq!(kinds("<a>\n\t </a>")[0].1, NodeKind::Object);
        assert_eq!(kinds("<a><!-- nothing --></a>")[0].1, NodeKind::Object);
    }

    #[test]
    fn test_comment_equivalence() {
        let with = kinds("<a><!-- c --><b>x</b></a>");
        let without = kinds("<a><b>x</b></a>");
        assert_eq!(with, without);

        let with = kinds("<a>\n  <!-- c1 --> <!-- c2 -->\n  <b>x</b>\n  <!-- c3 -->\n</a>");
        assert_eq!(with, without);
    }

    #[test]
    fn test_close_tag_must_match_exactly() {
        let mut parser = Parser::new();
        let err = parser.parse(b"<Item>x</item>").err().unwrap();
        assert_eq!(err, ParseError::new(ErrorKind::UnclosedTag, 7));
    }

    #[test]
    fn test_mixed_content_rejected() {
        let mut parser = Parser::new();
        let err = parser.parse(b"<a><b/>tail</a>").err().unwrap();
        assert_eq!(err, ParseError::new(ErrorKind::UnclosedTag, 7));
    }

    #[test]
    fn test_empty_tag_name() {
        let mut parser = Parser::new();
        let err = parser.parse(b"<a><>x</></a>").err().unwrap();
        assert_eq!(err.kind, ErrorKind::UnexpectedToken);
    }

    #[test]
    fn test_unterminated_cdata() {
        let mut parser = Parser::new();
        let err = parser.parse(b"<a><![CDATA[x</a>").err().unwrap();
        assert_eq!(err, ParseError::new(ErrorKind::UnexpectedEndOfInput, 17));
    }

    #[test]
    fn test_nested_depths() {
        let mut parser = Parser::new();
        let doc = parser.parse(b"<a id=\"1\"><b><c>x</c></b></a>").unwrap();
        let c = doc.find("a.b.c").unwrap();
        assert_eq!(doc.node(c).unwrap().depth, 3);
        let a = doc.root_element().unwrap();
        let id = doc.attributes(a).next().unwrap();
        assert_eq!(doc.node(id).unwrap().depth, 2);
    }
}

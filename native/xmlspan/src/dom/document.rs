//! Document - read access to a parsed tree
//!
//! A `Document` pairs the node store with the buffer its spans address:
//! either the caller's input (borrow semantics) or the store's private copy
//! (copy semantics). Spans flagged `INDIRECT` address the scratch buffer.
//!
//! Values flagged `ESCAPE` are decoded on first read through `value`, and
//! the decoded span replaces the raw one:
//! - private copy: the bytes are decoded in place
//! - borrowed input: the decoded bytes are appended to scratch, the input
//!   is never written

use crate::core::entities::{unescape, unescape_vec};
use crate::index::{span_flags, ByteSpan, ChildIter, Node, NodeId, NodeKind, NodeStore};
use std::borrow::Cow;

/// Root node id
pub const ROOT: NodeId = 0;

/// Buffer the non-indirect spans of a document point into
#[derive(Debug, Clone, Copy)]
pub(crate) enum Source<'a> {
    Borrowed(&'a [u8]),
    Owned,
}

/// A parsed XML document
#[derive(Debug)]
pub struct Document<'a> {
    source: Source<'a>,
    store: &'a mut NodeStore,
}

impl<'a> Document<'a> {
    pub(crate) fn borrowed(src: &'a [u8], store: &'a mut NodeStore) -> Self {
        Document {
            source: Source::Borrowed(src),
            store,
        }
    }

    pub(crate) fn owned(store: &'a mut NodeStore) -> Self {
        Document {
            source: Source::Owned,
            store,
        }
    }

    /// The (trimmed) source text
    pub fn source(&self) -> &[u8] {
        match self.source {
            Source::Borrowed(src) => src,
            Source::Owned => &self.store.owned,
        }
    }

    /// Resolve a span against the buffer it addresses
    #[inline]
    fn bytes(&self, span: ByteSpan) -> &[u8] {
        if span.has(span_flags::INDIRECT) {
            span.slice(&self.store.scratch)
        } else {
            span.slice(self.source())
        }
    }

    /// Synthetic root: holds prolog attributes and the document element
    #[inline]
    pub fn root(&self) -> NodeId {
        ROOT
    }

    /// The document element
    pub fn root_element(&self) -> Option<NodeId> {
        self.elements(ROOT).next()
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.store.arena.get(id)
    }

    #[inline]
    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.node(id).map(|n| n.kind)
    }

    /// Number of nodes, root and attributes included
    #[inline]
    pub fn node_count(&self) -> usize {
        self.store.arena.len()
    }

    /// Element or attribute name (empty for the root or an unknown id)
    pub fn key(&self, id: NodeId) -> &[u8] {
        self.node(id).map_or(&[][..], |n| self.bytes(n.key))
    }

    pub fn key_str(&self, id: NodeId) -> Option<&str> {
        std::str::from_utf8(self.key(id)).ok()
    }

    /// Value bytes as stored, without entity decoding.
    ///
    /// For an `Array` node this is the shared name of its items.
    pub fn raw_value(&self, id: NodeId) -> &[u8] {
        self.node(id).map_or(&[][..], |n| self.bytes(n.value))
    }

    /// Decoded value without caching the result
    pub fn decoded_value(&self, id: NodeId) -> Cow<'_, [u8]> {
        let raw = self.raw_value(id);
        match self.node(id) {
            Some(node) if node.needs_decode() => {
                let mut decoded = raw.to_vec();
                unescape_vec(&mut decoded);
                Cow::Owned(decoded)
            }
            _ => Cow::Borrowed(raw),
        }
    }

    /// Decoded value; decoding happens once and is cached in the store
    pub fn value(&mut self, id: NodeId) -> &[u8] {
        self.decode(id);
        self.raw_value(id)
    }

    pub fn value_str(&mut self, id: NodeId) -> Option<&str> {
        std::str::from_utf8(self.value(id)).ok()
    }

    /// Decode the value of `id` if it is still escape-pending
    fn decode(&mut self, id: NodeId) {
        let span = match self.store.arena.get(id) {
            Some(node) if node.needs_decode() => node.value,
            _ => return,
        };
        let source = self.source;
        let store = &mut *self.store;

        let decoded = match source {
            Source::Owned if !span.has(span_flags::INDIRECT) => {
                let Some(buf) = store.owned.get_mut(span.start()..span.end()) else {
                    return;
                };
                let len = unescape(buf);
                ByteSpan::new(span.offset, len as u32)
            }
            _ => {
                let start = store.scratch.len();
                if span.has(span_flags::INDIRECT) {
                    if span.end() > start {
                        return;
                    }
                    store.scratch.extend_from_within(span.start()..span.end());
                } else if let Source::Borrowed(src) = source {
                    store.scratch.extend_from_slice(span.slice(src));
                }
                let len = unescape(&mut store.scratch[start..]);
                store.scratch.truncate(start + len);
                ByteSpan::from_range(start, start + len).with(span_flags::INDIRECT)
            }
        };

        let mut value = decoded.with(span.flags);
        value.set(span_flags::ESCAPE, false);
        store.arena[id].value = value;
    }

    /// All children (attributes and elements) in document order
    #[inline]
    pub fn children(&self, id: NodeId) -> ChildIter<'_> {
        self.store.arena.children(id)
    }

    /// Attribute children
    pub fn attributes(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let arena = &self.store.arena;
        arena.children(id).filter(move |&c| arena[c].is_attribute())
    }

    /// Element children
    pub fn elements(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let arena = &self.store.arena;
        arena.children(id).filter(move |&c| !arena[c].is_attribute())
    }

    /// Raw value of the attribute `name` on `id`
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&[u8]> {
        self.attributes(id)
            .find(|&a| self.key(a) == name.as_bytes())
            .map(|a| self.raw_value(a))
    }

    /// Find a node by dotted path from the root.
    ///
    /// Segments name elements (first match), index elements by position
    /// (`items.item.2`), or name an attribute with a leading `@`:
    /// `catalog.book.0.@id`.
    pub fn find(&self, path: &str) -> Option<NodeId> {
        let mut current = ROOT;
        for segment in path.split('.') {
            current = if let Some(name) = segment.strip_prefix('@') {
                self.attributes(current)
                    .find(|&a| self.key(a) == name.as_bytes())?
            } else if let Ok(index) = segment.parse::<usize>() {
                self.elements(current).nth(index)?
            } else {
                self.elements(current)
                    .find(|&e| self.key(e) == segment.as_bytes())?
            };
        }
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;

    #[test]
    fn test_prolog_attributes() {
        let mut parser = Parser::new();
        let doc = parser
            .parse(b"<?xml version=\"1.1\" encoding=\"UTF-8\"?><root/>")
            .unwrap();
        let attrs: Vec<_> = doc
            .attributes(doc.root())
            .map(|a| (doc.key(a).to_vec(), doc.raw_value(a).to_vec()))
            .collect();
        assert_eq!(
            attrs,
            vec![
                (b"version".to_vec(), b"1.1".to_vec()),
                (b"encoding".to_vec(), b"UTF-8".to_vec())
            ]
        );
    }

    #[test]
    fn test_default_version() {
        let mut parser = Parser::new();
        let doc = parser.parse(b"<root/>").unwrap();
        let attrs: Vec<_> = doc.attributes(doc.root()).collect();
        assert_eq!(attrs.len(), 1);
        assert_eq!(doc.key(attrs[0]), b"version");
        assert_eq!(doc.raw_value(attrs[0]), b"1.0");
        assert!(doc.node(attrs[0]).unwrap().value.has(span_flags::INDIRECT));
        assert!(doc.node(doc.root()).unwrap().has_attributes());
    }

    #[test]
    fn test_header_skipping() {
        let input = b"<?xml version=\"1.0\"?>\n\
            <!-- header -->\n\
            <?xml-stylesheet type=\"text/css\" href=\"style.css\"?>\n\
            <!DOCTYPE note [\n<!ELEMENT note (#PCDATA)>\n]>\n\
            <!DOCTYPE other SYSTEM \"other.dtd\">\n\
            <note>hi</note>";
        let mut parser = Parser::new();
        let doc = parser.parse(input).unwrap();
        let root = doc.root_element().unwrap();
        assert_eq!(doc.key(root), b"note");
        assert_eq!(doc.raw_value(root), b"hi");
    }

    #[test]
    fn test_unterminated_header() {
        use crate::error::ErrorKind;
        let mut parser = Parser::new();
        let err = parser.parse(b"<!DOCTYPE note [<!ELEMENT note (#PCDATA)>").err();
        assert_eq!(err.map(|e| e.kind), Some(ErrorKind::UnexpectedEndOfInput));
        let err = parser.parse(b"<?xml-stylesheet href=\"a\"").err();
        assert_eq!(err.map(|e| e.kind), Some(ErrorKind::UnexpectedEndOfInput));
    }

    #[test]
    fn test_xml_prefixed_name_is_not_prolog() {
        let mut parser = Parser::new();
        let doc = parser.parse(b"<?xml-model href=\"m\"?><r/>").unwrap();
        assert_eq!(doc.raw_value(doc.attributes(doc.root()).next().unwrap()), b"1.0");
    }

    #[test]
    fn test_lazy_decode_borrowed() {
        let input = b"<r><a>ten &lt; twenty</a><b>x</b></r>".to_vec();
        let mut parser = Parser::new();
        let mut doc = parser.parse(&input).unwrap();
        let a = doc.find("r.a").unwrap();
        assert_eq!(doc.raw_value(a), b"ten &lt; twenty");
        assert_eq!(doc.decoded_value(a).as_ref(), b"ten < twenty");
        assert_eq!(doc.value(a), b"ten < twenty");
        assert!(!doc.node(a).unwrap().needs_decode());
        assert!(doc.node(a).unwrap().value.has(span_flags::INDIRECT));
        // cached: second read does not grow scratch
        let scratch = doc.store.scratch.len();
        assert_eq!(doc.value_str(a), Some("ten < twenty"));
        assert_eq!(doc.store.scratch.len(), scratch);
        // the caller's buffer is untouched
        assert_eq!(doc.source(), &input[..]);
    }

    #[test]
    fn test_lazy_decode_owned_in_place() {
        let mut parser = Parser::new();
        let mut doc = parser
            .parse_copy(b"<r a=\"I&apos;d\">&#169; &amp; &#x2122;</r>")
            .unwrap();
        let r = doc.root_element().unwrap();
        assert_eq!(doc.value_str(r), Some("© & ™"));
        assert!(!doc.node(r).unwrap().value.has(span_flags::INDIRECT));
        let a = doc.attributes(r).next().unwrap();
        assert_eq!(doc.value(a), b"I'd");
        assert!(doc.store.scratch.len() <= b"version1.0".len());
    }

    #[test]
    fn test_decode_leaves_other_spans_intact() {
        let mut parser = Parser::new();
        let mut doc = parser
            .parse_copy(b"<r><a>&lt;x&gt;</a><a>y</a></r>")
            .unwrap();
        let first = doc.find("r.0").unwrap();
        let second = doc.find("r.1").unwrap();
        assert_eq!(doc.value(first), b"<x>");
        assert_eq!(doc.value(second), b"y");
        assert_eq!(doc.key(second), b"a");
        assert_eq!(doc.raw_value(doc.root_element().unwrap()), b"a");
    }

    #[test]
    fn test_find() {
        let mut parser = Parser::new();
        let doc = parser
            .parse(b"<catalog><book id=\"b1\"><title>A</title></book><book id=\"b2\"><title>B</title></book></catalog>")
            .unwrap();
        let title = doc.find("catalog.1.title").unwrap();
        assert_eq!(doc.raw_value(title), b"B");
        let id = doc.find("catalog.book.@id").unwrap();
        assert_eq!(doc.raw_value(id), b"b1");
        assert_eq!(doc.find("catalog.2"), None);
        assert_eq!(doc.find("nothing"), None);
        assert_eq!(doc.attribute(doc.find("catalog.1").unwrap(), "id"), Some(&b"b2"[..]));
    }

    #[test]
    fn test_children_interleave_kinds() {
        let mut parser = Parser::new();
        let doc = parser.parse(b"<a x=\"1\"><b/><c/></a>").unwrap();
        let a = doc.root_element().unwrap();
        let kinds: Vec<_> = doc.children(a).map(|c| doc.kind(c).unwrap()).collect();
        assert_eq!(
            kinds,
            vec![NodeKind::Attribute, NodeKind::Object, NodeKind::Object]
        );
        assert_eq!(doc.key(doc.root()), b"");
        assert_eq!(doc.key(9999), b"");
    }
}

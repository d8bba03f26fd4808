//! XML serialization of parsed trees
//!
//! Writes a tree back out as XML, indented with tabs (`Beautified`) or on
//! a single line (`Compact`). Values are decoded and re-escaped, so output
//! parses back to an equal tree.

use crate::core::entities::{write_escaped_attribute, write_escaped_text};
use crate::dom::Document;
use crate::index::{NodeId, NodeKind};
use std::io::{self, Write};

const PROLOG_OPEN: &[u8] = b"<?xml";
const PROLOG_CLOSE: &[u8] = b"?>";
const EMPTY_CDATA: &[u8] = b"<![CDATA[]]>";

/// Output layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// One element per line, indented with one tab per level
    #[default]
    Beautified,
    /// No added whitespace
    Compact,
}

impl Mode {
    #[inline]
    fn indent(self) -> bool {
        self == Mode::Beautified
    }
}

impl Document<'_> {
    /// Write the document, prolog first
    pub fn serialize<W: Write>(&self, mut w: W, mode: Mode) -> io::Result<()> {
        let indent = mode.indent();
        let root = self.root();

        w.write_all(PROLOG_OPEN)?;
        self.write_attributes(&mut w, root)?;
        w.write_all(PROLOG_CLOSE)?;
        if indent {
            w.write_all(b"\n")?;
        }
        for child in self.elements(root) {
            self.write_element(&mut w, child, 1, indent)?;
        }
        Ok(())
    }

    /// Serialize into a new buffer
    pub fn to_xml(&self, mode: Mode) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.source().len() + 64);
        self.serialize(&mut out, mode).ok();
        out
    }

    fn write_element<W: Write>(&self, w: &mut W, id: NodeId, depth: usize, indent: bool) -> io::Result<()> {
        let Some(node) = self.node(id) else {
            return Ok(());
        };
        let key = self.key(id);
        if indent {
            write_pad(w, depth - 1)?;
        }
        w.write_all(b"<")?;
        w.write_all(key)?;
        self.write_attributes(w, id)?;

        let inline = !node.is_alias() && !node.value.is_empty();
        let nested = node.kind != NodeKind::String && self.elements(id).next().is_some();
        if !inline && !nested && node.kind != NodeKind::String {
            w.write_all(b"/>")?;
        } else {
            w.write_all(b">")?;
            if inline {
                write_escaped_text(w, &self.decoded_value(id))?;
            } else if node.kind == NodeKind::String {
                w.write_all(EMPTY_CDATA)?;
            } else {
                if indent {
                    w.write_all(b"\n")?;
                }
                for child in self.elements(id) {
                    self.write_element(w, child, depth + 1, indent)?;
                }
                if indent {
                    write_pad(w, depth - 1)?;
                }
            }
            w.write_all(b"</")?;
            w.write_all(key)?;
            w.write_all(b">")?;
        }
        if indent {
            w.write_all(b"\n")?;
        }
        Ok(())
    }

    fn write_attributes<W: Write>(&self, w: &mut W, id: NodeId) -> io::Result<()> {
        for attr in self.attributes(id) {
            w.write_all(b" ")?;
            w.write_all(self.key(attr))?;
            w.write_all(b"=\"")?;
            write_escaped_attribute(w, &self.decoded_value(attr))?;
            w.write_all(b"\"")?;
        }
        Ok(())
    }
}

#[inline]
fn write_pad<W: Write>(w: &mut W, depth: usize) -> io::Result<()> {
    for _ in 0..depth {
        w.write_all(b"\t")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;

    const CATALOG: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
        <catalog>\n\
          <book id=\"1\">\n\
            <title>A &amp; B</title>\n\
            <price currency=\"EUR\">10</price>\n\
          </book>\n\
          <!-- second -->\n\
          <book id=\"2\"><title><![CDATA[x < y]]></title><price currency=\"USD\">20</price></book>\n\
          <empty/>\n\
        </catalog>\n";

    const CATALOG_BEAUTIFIED: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
        <catalog>\n\
        \t<book id=\"1\">\n\
        \t\t<title>A &amp; B</title>\n\
        \t\t<price currency=\"EUR\">10</price>\n\
        \t</book>\n\
        \t<book id=\"2\">\n\
        \t\t<title>x &lt; y</title>\n\
        \t\t<price currency=\"USD\">20</price>\n\
        \t</book>\n\
        \t<empty/>\n\
        </catalog>\n";

    const CATALOG_COMPACT: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
        <catalog><book id=\"1\"><title>A &amp; B</title><price currency=\"EUR\">10</price></book>\
        <book id=\"2\"><title>x &lt; y</title><price currency=\"USD\">20</price></book>\
        <empty/></catalog>";

    /// (depth, kind, key, decoded value) for every node, in document order
    type Shape = Vec<(u16, NodeKind, Vec<u8>, Vec<u8>)>;

    fn shape(input: &[u8]) -> Shape {
        let mut parser = Parser::new();
        let doc = parser.parse(input).unwrap();
        let mut out = Vec::new();
        let mut stack = vec![doc.root()];
        while let Some(id) = stack.pop() {
            let node = doc.node(id).unwrap();
            out.push((
                node.depth,
                node.kind,
                doc.key(id).to_vec(),
                doc.decoded_value(id).into_owned(),
            ));
            let mut children: Vec<_> = doc.children(id).collect();
            children.reverse();
            stack.extend(children);
        }
        out
    }

    #[test]
    fn test_beautified() {
        let mut parser = Parser::new();
        let doc = parser.parse_str(CATALOG).unwrap();
        let out = doc.to_xml(Mode::Beautified);
        assert_eq!(String::from_utf8(out).unwrap(), CATALOG_BEAUTIFIED);
    }

    #[test]
    fn test_compact() {
        let mut parser = Parser::new();
        let doc = parser.parse_str(CATALOG).unwrap();
        let out = doc.to_xml(Mode::Compact);
        assert_eq!(String::from_utf8(out).unwrap(), CATALOG_COMPACT);
    }

    #[test]
    fn test_default_prolog_written() {
        let mut parser = Parser::new();
        let doc = parser.parse(b"<a>1</a>").unwrap();
        assert_eq!(doc.to_xml(Mode::Compact), b"<?xml version=\"1.0\"?><a>1</a>");
    }

    #[test]
    fn test_array_output() {
        let mut parser = Parser::new();
        let doc = parser.parse(b"<list><i>1</i><i>2</i></list>").unwrap();
        assert_eq!(
            String::from_utf8(doc.to_xml(Mode::Beautified)).unwrap(),
            "<?xml version=\"1.0\"?>\n<list>\n\t<i>1</i>\n\t<i>2</i>\n</list>\n"
        );
    }

    #[test]
    fn test_attribute_values_escaped() {
        let mut parser = Parser::new();
        let doc = parser.parse(b"<a t='say \"hi\" &amp; go'/>").unwrap();
        assert_eq!(
            doc.to_xml(Mode::Compact),
            b"<?xml version=\"1.0\"?><a t=\"say &quot;hi&quot; &amp; go\"/>"
        );
    }

    #[test]
    fn test_round_trip_compact() {
        for input in [
            CATALOG.as_bytes(),
            b"<r><a>1</a><a>2</a><a>3</a></r>",
            b"<root title=\"Foo\" descr=\"Bar\"/>",
            b"<?xml version=\"1.1\" encoding=\"UTF-8\"?><r><x>ten &lt; twenty</x><y>&#169;</y></r>",
            b"<a><!-- c --><b>x</b></a>",
            b"<r><a><![CDATA[]]></a><b/></r>",
        ] {
            let first = shape(input);
            let mut parser = Parser::new();
            let compact = parser.parse(input).unwrap().to_xml(Mode::Compact);
            assert_eq!(shape(&compact), first);

            let mut parser = Parser::new();
            let pretty = parser.parse(input).unwrap().to_xml(Mode::Beautified);
            assert_eq!(shape(&pretty), first);
        }
    }

    #[test]
    fn test_empty_cdata_kept() {
        let mut parser = Parser::new();
        let doc = parser.parse(b"<r><a><![CDATA[]]></a></r>").unwrap();
        assert_eq!(
            doc.to_xml(Mode::Compact),
            b"<?xml version=\"1.0\"?><r><a><![CDATA[]]></a></r>"
        );
    }

    #[test]
    fn test_serialize_to_writer() {
        let mut parser = Parser::new();
        let doc = parser.parse(b"<a/>").unwrap();
        let mut out = Vec::new();
        doc.serialize(&mut out, Mode::default()).unwrap();
        assert_eq!(out, b"<?xml version=\"1.0\"?>\n<a/>\n");
    }
}

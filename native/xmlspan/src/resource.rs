//! ResourceArc Wrappers
//!
//! Parsed documents held on the BEAM side. A resource owns a pooled parser
//! whose store holds a private copy of the input; the parser goes back to
//! the default pool when the resource is garbage collected.

use crate::dom::Document;
use crate::error::ParseError;
use crate::parser::Parser;
use crate::pool::default_pool;
use rustler::ResourceArc;
use std::sync::Mutex;

/// Wrapper for a parsed document that can be stored in a ResourceArc
pub struct DocumentResource {
    parser: Mutex<Option<Parser>>,
}

impl DocumentResource {
    /// Copy-parse `input` with a parser from the default pool
    pub fn parse(input: &[u8]) -> Result<Self, ParseError> {
        let pool = default_pool();
        let mut parser = pool.acquire();
        let parsed = parser.parse_copy(input).map(|_| ());
        match parsed {
            Ok(()) => Ok(DocumentResource {
                parser: Mutex::new(Some(parser)),
            }),
            Err(e) => {
                pool.release(parser);
                Err(e)
            }
        }
    }

    /// Run `f` against the document.
    ///
    /// # Errors
    ///
    /// Returns `"mutex_poisoned"` if the document mutex is poisoned,
    /// or `"no_document"` if no document is present.
    pub fn with_document<F, R>(&self, f: F) -> Result<R, &'static str>
    where
        F: FnOnce(&mut Document<'_>) -> R,
    {
        let mut guard = self.parser.lock().map_err(|_| "mutex_poisoned")?;
        let parser = guard.as_mut().ok_or("no_document")?;
        let mut doc = parser.document().ok_or("no_document")?;
        Ok(f(&mut doc))
    }
}

impl Drop for DocumentResource {
    fn drop(&mut self) {
        let parser = match self.parser.get_mut() {
            Ok(slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(parser) = parser {
            default_pool().release(parser);
        }
    }
}

#[rustler::resource_impl]
impl rustler::Resource for DocumentResource {}

/// Type alias for document ResourceArc
pub type DocumentRef = ResourceArc<DocumentResource>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_parse_and_read() {
        let resource = DocumentResource::parse(b"<a><b>x &amp; y</b></a>").unwrap();
        let value = resource
            .with_document(|doc| {
                let b = doc.find("a.b").unwrap();
                doc.value(b).to_vec()
            })
            .unwrap();
        assert_eq!(value, b"x & y");

        // decoded value is cached in the store between calls
        let raw = resource
            .with_document(|doc| {
                let b = doc.find("a.b").unwrap();
                doc.raw_value(b).to_vec()
            })
            .unwrap();
        assert_eq!(raw, b"x & y");
    }

    #[test]
    fn test_parse_error() {
        let err = DocumentResource::parse(b"<a>").err().unwrap();
        assert_eq!(err.kind, ErrorKind::UnexpectedEndOfInput);
    }

    #[test]
    fn test_input_not_retained() {
        let input = b"<a>1</a>".to_vec();
        let resource = DocumentResource::parse(&input).unwrap();
        drop(input);
        let key = resource.with_document(|doc| doc.key(doc.root_element().unwrap()).to_vec());
        assert_eq!(key, Ok(b"a".to_vec()));
    }
}

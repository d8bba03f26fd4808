//! Elixir Term Conversion Utilities
//!
//! Converts parsed trees and parse errors to Elixir terms.
//!
//! ```text
//! {:document, [{"version", "1.0"}], root}
//! root/element = {:object | :array | :string, name, attrs, content}
//! ```
//!
//! `content` is a binary for text-bearing elements and a list of elements
//! otherwise. Values are entity-decoded.

use crate::dom::Document;
use crate::error::ParseError;
use crate::index::{NodeId, NodeKind};
use rustler::types::atom::Atom;
use rustler::{Encoder, Env, NewBinary, NifResult, Term};

rustler::atoms! {
    ok,
    error,
    document,
    object,
    array,
    string,
}

/// Convert a whole document, prolog attributes included
pub fn document_to_term<'a>(env: Env<'a>, doc: &Document<'_>) -> Term<'a> {
    let prolog = attributes_to_term(env, doc, doc.root());
    let root = match doc.root_element() {
        Some(id) => element_to_term(env, doc, id),
        None => rustler::types::atom::nil().encode(env),
    };
    (document(), prolog, root).encode(env)
}

/// Convert an element and its subtree
pub fn element_to_term<'a>(env: Env<'a>, doc: &Document<'_>, id: NodeId) -> Term<'a> {
    let Some(node) = doc.node(id) else {
        return rustler::types::atom::nil().encode(env);
    };
    let kind = match node.kind {
        NodeKind::Array => array(),
        NodeKind::String => string(),
        NodeKind::Object | NodeKind::Attribute => object(),
    };
    let name = bytes_to_binary(env, doc.key(id));
    let attrs = attributes_to_term(env, doc, id);

    let has_text = node.kind == NodeKind::String || (!node.is_alias() && !node.value.is_empty());
    let content = if has_text {
        bytes_to_binary(env, &doc.decoded_value(id))
    } else {
        // Build in reverse so each prepend is O(1)
        let children: Vec<NodeId> = doc.elements(id).collect();
        let mut list = Term::list_new_empty(env);
        for &child in children.iter().rev() {
            list = list.list_prepend(element_to_term(env, doc, child));
        }
        list
    };

    (kind, name, attrs, content).encode(env)
}

/// `[{name, value}]` for the attribute children of `id`
fn attributes_to_term<'a>(env: Env<'a>, doc: &Document<'_>, id: NodeId) -> Term<'a> {
    let attrs: Vec<NodeId> = doc.attributes(id).collect();
    let mut list = Term::list_new_empty(env);
    for &attr in attrs.iter().rev() {
        let tuple = (
            bytes_to_binary(env, doc.key(attr)),
            bytes_to_binary(env, &doc.decoded_value(attr)),
        );
        list = list.list_prepend(tuple.encode(env));
    }
    list
}

/// `{:error, {kind, offset}}`
pub fn parse_error_to_term<'a>(env: Env<'a>, e: &ParseError) -> NifResult<Term<'a>> {
    let kind = Atom::from_str(env, e.kind.as_atom_name())?;
    Ok((error(), (kind, e.offset)).encode(env))
}

/// Create a binary from bytes
pub fn bytes_to_binary<'a>(env: Env<'a>, bytes: &[u8]) -> Term<'a> {
    let mut binary = NewBinary::new(env, bytes.len());
    binary.as_mut_slice().copy_from_slice(bytes);
    binary.into()
}

//! xmlspan - zero-copy XML-to-tree parsing
//!
//! One forward pass over the input builds an index-based tree whose keys
//! and values are byte spans into the input. Entity references are decoded
//! lazily, on first read. Trees serialize back to indented or compact XML.
//!
//! ```text
//! Parser::parse / parse_copy  →  Document  →  value / find / to_xml
//! Pool::acquire / release       strategy::format_parallel (rayon)
//! ```
//!
//! The crate is also an Erlang NIF library (`Elixir.XmlSpan.Native`).

pub mod core;
pub mod dom;
pub mod error;
pub mod index;
pub mod memory;
pub mod parser;
pub mod pool;
mod resource;
pub mod serialize;
pub mod strategy;
mod term;

pub use crate::core::entities::{decode_text, unescape, unescape_vec};
pub use dom::Document;
pub use error::{Error, ErrorKind, ParseError};
pub use index::{NodeId, NodeKind};
pub use parser::{Parser, MAX_DEPTH};
pub use pool::{default_pool, Pool};
pub use serialize::Mode;

use resource::{DocumentRef, DocumentResource};
use rustler::{Binary, Encoder, Env, NifResult, ResourceArc, Term};
use term::{bytes_to_binary, document_to_term, parse_error_to_term};

// ============================================================================
// Memory NIFs
// ============================================================================

/// Live heap bytes; zero unless built with `memory_tracking`
#[rustler::nif]
fn get_rust_memory() -> usize {
    memory::usage().current
}

#[rustler::nif]
fn get_rust_memory_peak() -> usize {
    memory::usage().peak
}

/// `{current, peak_before_reset}`
#[rustler::nif]
fn reset_rust_memory_stats() -> (usize, usize) {
    let before = memory::reset_peak();
    (before.current, before.peak)
}

// ============================================================================
// Documents
// ============================================================================

fn mode_for(beautify: bool) -> Mode {
    if beautify {
        Mode::Beautified
    } else {
        Mode::Compact
    }
}

/// Parse XML into a document resource: `{:ok, doc}` or `{:error, {kind, offset}}`
#[rustler::nif]
fn parse<'a>(env: Env<'a>, input: Binary<'a>) -> NifResult<Term<'a>> {
    match DocumentResource::parse(input.as_slice()) {
        Ok(resource) => Ok((term::ok(), ResourceArc::new(resource)).encode(env)),
        Err(e) => parse_error_to_term(env, &e),
    }
}

/// Convert a document to `{:document, prolog_attrs, root}`
#[rustler::nif]
fn to_term<'a>(env: Env<'a>, doc_ref: DocumentRef) -> NifResult<Term<'a>> {
    match doc_ref.with_document(|doc| document_to_term(env, doc)) {
        Ok(converted) => Ok(converted),
        Err(reason) => Ok((term::error(), reason).encode(env)),
    }
}

/// Serialize a document, indented when `beautify` is true
#[rustler::nif(name = "serialize")]
fn serialize_document<'a>(env: Env<'a>, doc_ref: DocumentRef, beautify: bool) -> NifResult<Term<'a>> {
    match doc_ref.with_document(|doc| doc.to_xml(mode_for(beautify))) {
        Ok(xml) => Ok(bytes_to_binary(env, &xml)),
        Err(reason) => Ok((term::error(), reason).encode(env)),
    }
}

// ============================================================================
// Utilities
// ============================================================================

/// Decode entity references in a binary
#[rustler::nif(name = "unescape")]
fn unescape_binary<'a>(env: Env<'a>, input: Binary<'a>) -> Term<'a> {
    bytes_to_binary(env, &decode_text(input.as_slice()))
}

/// Reformat many documents in parallel: `[{:ok, xml} | {:error, {kind, offset}}]`
#[rustler::nif(schedule = "DirtyCpu")]
fn format_many<'a>(env: Env<'a>, inputs: Vec<Binary<'a>>, beautify: bool) -> NifResult<Term<'a>> {
    let slices: Vec<&[u8]> = inputs.iter().map(|b| b.as_slice()).collect();
    let results = strategy::format_parallel(&slices, mode_for(beautify));

    let mut list = Term::list_new_empty(env);
    for result in results.iter().rev() {
        let item = match result {
            Ok(xml) => (term::ok(), bytes_to_binary(env, xml)).encode(env),
            Err(e) => parse_error_to_term(env, e)?,
        };
        list = list.list_prepend(item);
    }
    Ok(list)
}

// ============================================================================
// NIF Initialization
// ============================================================================

rustler::init!("Elixir.XmlSpan.Native");

//! Parse errors
//!
//! Every error carries the byte offset (into the trimmed input) at which it
//! was detected. Errors are fatal to the parse call that produced them.

use std::fmt;
use std::io;

/// Kind of parse failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Document has no top-level element
    NoRoot,
    /// Start tag without terminator, or close tag not matching its open tag
    UnclosedTag,
    /// `<?xml` without a terminating `?>`
    UnclosedProlog,
    /// Malformed `name="value"` pair
    BadAttribute,
    /// `/` or `?` not immediately followed by `>`
    UnexpectedToken,
    /// A scan ran past the end of the buffer while expecting more data
    UnexpectedEndOfInput,
    /// Trailing bytes after a complete document
    UnparsedTail,
    /// Input too long for 32-bit spans, or nesting deeper than `MAX_DEPTH`
    LimitExceeded,
}

impl ErrorKind {
    /// Short human-readable description
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NoRoot => "no root tag",
            ErrorKind::UnclosedTag => "unclosed tag",
            ErrorKind::UnclosedProlog => "unclosed prolog",
            ErrorKind::BadAttribute => "bad attribute",
            ErrorKind::UnexpectedToken => "unexpected token",
            ErrorKind::UnexpectedEndOfInput => "unexpected end of input",
            ErrorKind::UnparsedTail => "unparsed tail",
            ErrorKind::LimitExceeded => "limit exceeded",
        }
    }

    /// Atom name used at the NIF boundary
    pub const fn as_atom_name(&self) -> &'static str {
        match self {
            ErrorKind::NoRoot => "no_root",
            ErrorKind::UnclosedTag => "unclosed_tag",
            ErrorKind::UnclosedProlog => "unclosed_prolog",
            ErrorKind::BadAttribute => "bad_attribute",
            ErrorKind::UnexpectedToken => "unexpected_token",
            ErrorKind::UnexpectedEndOfInput => "unexpected_eof",
            ErrorKind::UnparsedTail => "unparsed_tail",
            ErrorKind::LimitExceeded => "limit_exceeded",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parse failure and the offset where it was detected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseError {
    pub kind: ErrorKind,
    pub offset: usize,
}

impl ParseError {
    #[inline]
    pub const fn new(kind: ErrorKind, offset: usize) -> Self {
        ParseError { kind, offset }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at offset {}", self.kind, self.offset)
    }
}

impl std::error::Error for ParseError {}

/// Error returned by entry points that also perform I/O
#[derive(Debug)]
pub enum Error {
    Parse(ParseError),
    Io(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Parse(e) => write!(f, "parse error: {}", e),
            Error::Io(e) => write!(f, "read error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Parse(e) => Some(e),
            Error::Io(e) => Some(e),
        }
    }
}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Error::Parse(e)
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

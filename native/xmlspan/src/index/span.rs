//! ByteSpan - offset, length and flags into a buffer
//!
//! Zero-copy reference to a portion of the source document, or of the
//! store's scratch buffer when the `INDIRECT` flag is set.

/// Per-span bit flags
pub mod span_flags {
    /// Value may contain entity references, decoding is deferred until read
    pub const ESCAPE: u8 = 0x01;
    /// Set on an element's key when at least one attribute child exists
    pub const HAS_ATTRIBUTES: u8 = 0x02;
    /// Value points at another node's key instead of raw text (arrays only)
    pub const ALIAS: u8 = 0x04;
    /// Span addresses the scratch buffer, not the source
    pub const INDIRECT: u8 = 0x08;
}

/// A span referencing a portion of a buffer.
///
/// Size: 12 bytes (offset: 4, len: 4, flags: 1 + padding)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ByteSpan {
    /// Byte offset into the addressed buffer
    pub offset: u32,
    /// Length in bytes
    pub len: u32,
    /// Bit flags (see span_flags)
    pub flags: u8,
}

impl ByteSpan {
    /// Create a new span without flags
    #[inline]
    pub const fn new(offset: u32, len: u32) -> Self {
        Self {
            offset,
            len,
            flags: 0,
        }
    }

    /// Create a span from usize bounds. Callers guarantee the buffer fits in u32.
    #[inline]
    pub(crate) const fn from_range(start: usize, end: usize) -> Self {
        Self::new(start as u32, (end - start) as u32)
    }

    /// Create an empty span (used for "no value")
    #[inline]
    pub const fn empty() -> Self {
        Self::new(0, 0)
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Get the start offset as usize
    #[inline]
    pub const fn start(&self) -> usize {
        self.offset as usize
    }

    /// Get the end offset (exclusive)
    #[inline]
    pub const fn end(&self) -> usize {
        self.offset as usize + self.len as usize
    }

    #[inline]
    pub const fn has(&self, flag: u8) -> bool {
        self.flags & flag != 0
    }

    #[inline]
    pub fn set(&mut self, flag: u8, on: bool) {
        if on {
            self.flags |= flag;
        } else {
            self.flags &= !flag;
        }
    }

    /// Builder-style flag setter
    #[inline]
    pub const fn with(mut self, flag: u8) -> Self {
        self.flags |= flag;
        self
    }

    /// Extract the byte slice from a buffer; out-of-range spans yield an empty slice
    #[inline]
    pub fn slice<'a>(&self, input: &'a [u8]) -> &'a [u8] {
        input.get(self.start()..self.end()).unwrap_or(&[])
    }

    /// Extract as UTF-8 string from a buffer
    #[inline]
    pub fn as_str<'a>(&self, input: &'a [u8]) -> Option<&'a str> {
        std::str::from_utf8(self.slice(input)).ok()
    }
}

//! HPACK: Header Compression for HTTP/2 (RFC 7541)
//!
//! One [`HpackEncoder`] and one [`HpackDecoder`] per connection direction.
//! Each owns a dynamic table that must stay in step with the peer's, so blocks
//! are encoded and decoded strictly in wire order.

mod decoder;
mod encoder;
pub mod huffman;
pub mod integer;
pub mod table;

pub use decoder::HpackDecoder;
pub use encoder::HpackEncoder;

/// A single HTTP/2 header field
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct H2Header {
    pub name: String,
    pub value: String,
}

impl H2Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Size as counted against table capacity and header list limits.
    pub fn size(&self) -> usize {
        table::entry_size(&self.name, &self.value)
    }

    pub fn is_pseudo(&self) -> bool {
        self.name.starts_with(':')
    }
}

// ============================================================================
// Tests
// ============================================================================

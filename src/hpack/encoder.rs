use std::borrow::Cow;

use bytes::{BufMut, BytesMut};
use tracing::trace;

use super::table::{self, DynamicTable, Match, DEFAULT_TABLE_SIZE};
use super::{huffman, integer, H2Header};
use crate::error::HpackError;

/// How a literal field is allowed to touch the dynamic table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Indexing {
    Incremental,
    Without,
    Never,
}

fn indexing_for(name: &str) -> Indexing {
    const NEVER: [&str; 3] = ["authorization", "proxy-authorization", "set-cookie"];
    const WITHOUT: [&str; 14] = [
        ":path",
        "content-length",
        "content-range",
        "date",
        "etag",
        "if-match",
        "if-modified-since",
        "if-none-match",
        "if-range",
        "if-unmodified-since",
        "last-modified",
        "location",
        "range",
        "retry-after",
    ];

    if NEVER.iter().any(|n| n.eq_ignore_ascii_case(name)) {
        Indexing::Never
    } else if WITHOUT.iter().any(|n| n.eq_ignore_ascii_case(name)) {
        Indexing::Without
    } else {
        Indexing::Incremental
    }
}

/// Credentials are sent as raw octets so their length is all that leaks.
fn huffman_allowed(name: &str) -> bool {
    !name.eq_ignore_ascii_case("authorization") && !name.eq_ignore_ascii_case("proxy-authorization")
}

/// HPACK encoder for one direction of a connection.
///
/// Owns the encoder-side dynamic table. Calls must happen in the same order
/// the resulting blocks are written to the wire, because every block may
/// change the table the peer's decoder mirrors.
#[derive(Debug, Clone)]
pub struct HpackEncoder {
    table: DynamicTable,
    /// Smallest and final capacity set since the last block; announced at the
    /// start of the next one.
    pending_size_update: Option<(usize, usize)>,
    max_header_list_size: usize,
    huffman: bool,
}

impl Default for HpackEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl HpackEncoder {
    pub fn new() -> Self {
        Self {
            table: DynamicTable::new(DEFAULT_TABLE_SIZE),
            pending_size_update: None,
            max_header_list_size: 0,
            huffman: true,
        }
    }

    /// Encoder whose table capacity is `capacity`; a capacity other than the
    /// protocol default is announced in the first block.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut encoder = Self::new();
        encoder.set_capacity(capacity);
        encoder
    }

    /// Resize the dynamic table now and announce the new size at the start of
    /// the next encoded block.
    pub fn set_capacity(&mut self, capacity: usize) {
        if capacity == self.table.max_size() && self.pending_size_update.is_none() {
            return;
        }
        let min = self
            .pending_size_update
            .map_or(capacity, |(min, _)| min.min(capacity));
        self.pending_size_update = Some((min, capacity));
        self.table.set_max_size(capacity);
    }

    pub fn capacity(&self) -> usize {
        self.table.max_size()
    }

    /// Limit on the uncompressed size of one header list (0 = unlimited).
    pub fn set_max_header_list_size(&mut self, max: usize) {
        self.max_header_list_size = max;
    }

    pub fn set_huffman(&mut self, enabled: bool) {
        self.huffman = enabled;
    }

    pub fn table(&self) -> &DynamicTable {
        &self.table
    }

    /// Encode a header list into a fresh buffer.
    pub fn encode(&mut self, headers: &[H2Header]) -> Result<Vec<u8>, HpackError> {
        let mut dst = BytesMut::new();
        self.encode_into(headers, &mut dst)?;
        Ok(dst.to_vec())
    }

    /// Append the header block for `headers` to `dst`.
    ///
    /// The list size is checked before anything is written, so a rejected list
    /// leaves both `dst` and the dynamic table untouched.
    pub fn encode_into(&mut self, headers: &[H2Header], dst: &mut BytesMut) -> Result<(), HpackError> {
        if self.max_header_list_size > 0 {
            let size: usize = headers.iter().map(H2Header::size).sum();
            if size > self.max_header_list_size {
                return Err(HpackError::HeaderListTooLarge {
                    size,
                    max: self.max_header_list_size,
                });
            }
        }

        if let Some((min, capacity)) = self.pending_size_update.take() {
            if min < capacity {
                integer::encode(min, 5, 0x20, dst);
            }
            integer::encode(capacity, 5, 0x20, dst);
            trace!(capacity, "announced dynamic table size update");
        }

        for header in headers {
            self.encode_field(header, dst);
        }
        Ok(())
    }

    fn encode_field(&mut self, header: &H2Header, dst: &mut BytesMut) {
        // HTTP/2 field names are lowercase on the wire.
        let lowered: Cow<'_, str> = if header.name.bytes().any(|b| b.is_ascii_uppercase()) {
            Cow::Owned(header.name.to_ascii_lowercase())
        } else {
            Cow::Borrowed(header.name.as_str())
        };
        let name: &str = &lowered;
        let value = header.value.as_str();

        let name_index = match table::lookup(&self.table, name, value) {
            Match::Full(index) => {
                integer::encode(index, 7, 0x80, dst);
                return;
            }
            Match::Name(index) => index,
            Match::None => 0,
        };

        let indexing = indexing_for(name);
        match indexing {
            Indexing::Incremental => integer::encode(name_index, 6, 0x40, dst),
            Indexing::Without => integer::encode(name_index, 4, 0x00, dst),
            Indexing::Never => integer::encode(name_index, 4, 0x10, dst),
        }
        if name_index == 0 {
            self.write_string(name.as_bytes(), true, dst);
        }
        self.write_string(value.as_bytes(), huffman_allowed(name), dst);

        if indexing == Indexing::Incremental {
            self.table.insert(H2Header::new(name, value));
        }
    }

    fn write_string(&self, src: &[u8], huffman_ok: bool, dst: &mut BytesMut) {
        if self.huffman && huffman_ok {
            let coded_len = huffman::encoded_len(src);
            if coded_len < src.len() {
                integer::encode(coded_len, 7, 0x80, dst);
                huffman::encode(src, dst);
                return;
            }
        }
        integer::encode(src.len(), 7, 0x00, dst);
        dst.put_slice(src);
    }
}

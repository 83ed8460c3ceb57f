use tracing::trace;

use super::table::{self, DynamicTable, DEFAULT_TABLE_SIZE};
use super::{huffman, integer, H2Header};
use crate::error::HpackError;

/// HPACK decoder for one direction of a connection.
///
/// Blocks must be decoded in wire order; the dynamic table mirrors the peer
/// encoder's.
#[derive(Debug, Clone)]
pub struct HpackDecoder {
    table: DynamicTable,
    /// Largest table size the peer may switch to.
    capacity: usize,
    max_header_list_size: usize,
}

impl Default for HpackDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl HpackDecoder {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_TABLE_SIZE)
    }

    /// Decoder that accepts size updates up to `capacity`.
    ///
    /// The table itself starts at the protocol default (or `capacity` if that
    /// is smaller) until the peer announces a change.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            table: DynamicTable::new(DEFAULT_TABLE_SIZE.min(capacity)),
            capacity,
            max_header_list_size: 0,
        }
    }

    /// Change the largest size update the peer is allowed to announce.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Limit on the uncompressed size of one decoded list (0 = unlimited).
    pub fn set_max_header_list_size(&mut self, max: usize) {
        self.max_header_list_size = max;
    }

    pub fn table(&self) -> &DynamicTable {
        &self.table
    }

    /// Decode one complete header block.
    pub fn decode(&mut self, block: &[u8]) -> Result<Vec<H2Header>, HpackError> {
        let mut headers = Vec::new();
        let mut list_size = 0usize;
        let mut pos = 0;

        while pos < block.len() {
            let first = block[pos];
            let header = if first & 0x80 != 0 {
                let (index, n) = integer::decode(&block[pos..], 7)?;
                pos += n;
                let (name, value) =
                    table::resolve(&self.table, index).ok_or(HpackError::InvalidIndex(index))?;
                H2Header::new(name, value)
            } else if first & 0x40 != 0 {
                let header = self.read_literal(block, &mut pos, 6)?;
                self.table.insert(header.clone());
                header
            } else if first & 0x20 != 0 {
                if !headers.is_empty() {
                    return Err(HpackError::SizeUpdateMidBlock);
                }
                let (size, n) = integer::decode(&block[pos..], 5)?;
                pos += n;
                if size > self.capacity {
                    return Err(HpackError::SizeUpdateTooLarge {
                        requested: size,
                        max: self.capacity,
                    });
                }
                trace!(size, "dynamic table size update");
                self.table.set_max_size(size);
                continue;
            } else {
                // 0000xxxx without indexing, 0001xxxx never indexed
                self.read_literal(block, &mut pos, 4)?
            };

            list_size += header.size();
            if self.max_header_list_size > 0 && list_size > self.max_header_list_size {
                return Err(HpackError::HeaderListTooLarge {
                    size: list_size,
                    max: self.max_header_list_size,
                });
            }
            headers.push(header);
        }

        Ok(headers)
    }

    fn read_literal(&self, block: &[u8], pos: &mut usize, prefix_bits: u8) -> Result<H2Header, HpackError> {
        let (name_index, n) = integer::decode(&block[*pos..], prefix_bits)?;
        *pos += n;
        let name = if name_index == 0 {
            let name = read_string(block, pos)?;
            if name.bytes().any(|b| b.is_ascii_uppercase()) {
                return Err(HpackError::UppercaseName(name));
            }
            name
        } else {
            let (name, _) = table::resolve(&self.table, name_index)
                .ok_or(HpackError::InvalidIndex(name_index))?;
            name.to_owned()
        };
        let value = read_string(block, pos)?;
        Ok(H2Header { name, value })
    }
}

fn read_string(block: &[u8], pos: &mut usize) -> Result<String, HpackError> {
    let first = *block.get(*pos).ok_or(HpackError::Truncated)?;
    let (len, n) = integer::decode(&block[*pos..], 7)?;
    *pos += n;
    let end = pos
        .checked_add(len)
        .filter(|&end| end <= block.len())
        .ok_or(HpackError::Truncated)?;
    let raw = &block[*pos..end];
    *pos = end;

    let bytes = if first & 0x80 != 0 {
        huffman::decode(raw)?
    } else {
        raw.to_vec()
    };
    String::from_utf8(bytes).map_err(|_| HpackError::InvalidUtf8)
}

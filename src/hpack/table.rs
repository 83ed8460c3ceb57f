//! Static and dynamic header tables (RFC 7541 Section 2.3).
//!
//! Both tables share one index space: 1..=61 is the static table, 62 and up
//! address the dynamic table, newest entry first.

use std::collections::VecDeque;

use super::H2Header;

/// Per-entry overhead added to `name.len() + value.len()`.
pub const ENTRY_OVERHEAD: usize = 32;

/// Initial dynamic table capacity on both sides of a connection.
pub const DEFAULT_TABLE_SIZE: usize = 4096;

/// RFC 7541 Appendix A.
pub const STATIC_TABLE: [(&str, &str); 61] = [
    (":authority", ""),
    (":method", "GET"),
    (":method", "POST"),
    (":path", "/"),
    (":path", "/index.html"),
    (":scheme", "http"),
    (":scheme", "https"),
    (":status", "200"),
    (":status", "204"),
    (":status", "206"),
    (":status", "304"),
    (":status", "400"),
    (":status", "404"),
    (":status", "500"),
    ("accept-charset", ""),
    ("accept-encoding", "gzip, deflate"),
    ("accept-language", ""),
    ("accept-ranges", ""),
    ("accept", ""),
    ("access-control-allow-origin", ""),
    ("age", ""),
    ("allow", ""),
    ("authorization", ""),
    ("cache-control", ""),
    ("content-disposition", ""),
    ("content-encoding", ""),
    ("content-language", ""),
    ("content-length", ""),
    ("content-location", ""),
    ("content-range", ""),
    ("content-type", ""),
    ("cookie", ""),
    ("date", ""),
    ("etag", ""),
    ("expect", ""),
    ("expires", ""),
    ("from", ""),
    ("host", ""),
    ("if-match", ""),
    ("if-modified-since", ""),
    ("if-none-match", ""),
    ("if-range", ""),
    ("if-unmodified-since", ""),
    ("last-modified", ""),
    ("link", ""),
    ("location", ""),
    ("max-forwards", ""),
    ("proxy-authenticate", ""),
    ("proxy-authorization", ""),
    ("range", ""),
    ("referer", ""),
    ("refresh", ""),
    ("retry-after", ""),
    ("server", ""),
    ("set-cookie", ""),
    ("strict-transport-security", ""),
    ("transfer-encoding", ""),
    ("user-agent", ""),
    ("vary", ""),
    ("via", ""),
    ("www-authenticate", ""),
];

/// Size an entry occupies in the dynamic table.
pub fn entry_size(name: &str, value: &str) -> usize {
    name.len() + value.len() + ENTRY_OVERHEAD
}

/// FIFO of recently indexed header fields, bounded by a byte budget.
#[derive(Debug, Clone)]
pub struct DynamicTable {
    entries: VecDeque<H2Header>,
    size: usize,
    max_size: usize,
}

impl DynamicTable {
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            size: 0,
            max_size,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of entry sizes currently held.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Entry at `index` counting from the newest (0-based).
    pub fn get(&self, index: usize) -> Option<&H2Header> {
        self.entries.get(index)
    }

    /// Entries newest first.
    pub fn iter(&self) -> impl Iterator<Item = &H2Header> {
        self.entries.iter()
    }

    /// Add an entry, evicting the oldest until it fits.
    ///
    /// An entry larger than the whole table empties it and is not stored.
    pub fn insert(&mut self, header: H2Header) {
        let size = header.size();
        if size > self.max_size {
            self.entries.clear();
            self.size = 0;
            return;
        }
        while self.size + size > self.max_size {
            self.evict_oldest();
        }
        self.size += size;
        self.entries.push_front(header);
    }

    /// Change the byte budget, evicting as needed.
    pub fn set_max_size(&mut self, max_size: usize) {
        self.max_size = max_size;
        while self.size > self.max_size {
            self.evict_oldest();
        }
    }

    fn evict_oldest(&mut self) {
        if let Some(old) = self.entries.pop_back() {
            self.size -= old.size();
        }
    }
}

/// Result of looking a field up in the combined index space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Match {
    /// Name and value both match the entry at this index.
    Full(usize),
    /// Only the name matches.
    Name(usize),
    None,
}

/// Find the best index for `name: value`, preferring a full match and then
/// the lowest index.
pub fn lookup(dynamic: &DynamicTable, name: &str, value: &str) -> Match {
    let mut name_match = None;

    for (i, &(n, v)) in STATIC_TABLE.iter().enumerate() {
        if n == name {
            if v == value {
                return Match::Full(i + 1);
            }
            name_match.get_or_insert(i + 1);
        }
    }

    let base = STATIC_TABLE.len() + 1;
    for (i, entry) in dynamic.iter().enumerate() {
        if entry.name == name {
            if entry.value == value {
                return Match::Full(base + i);
            }
            name_match.get_or_insert(base + i);
        }
    }

    match name_match {
        Some(index) => Match::Name(index),
        None => Match::None,
    }
}

/// Resolve a 1-based index across both tables.
pub fn resolve(dynamic: &DynamicTable, index: usize) -> Option<(&str, &str)> {
    match index {
        0 => None,
        i if i <= STATIC_TABLE.len() => Some(STATIC_TABLE[i - 1]),
        i => dynamic
            .get(i - STATIC_TABLE.len() - 1)
            .map(|h| (h.name.as_str(), h.value.as_str())),
    }
}

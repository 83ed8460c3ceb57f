//! Connection parameters for the parser and the generator.
//!
//! Both sides start from RFC 7540 defaults and can be updated from a peer's
//! SETTINGS list with `apply_settings`.

use crate::error::{H2Error, Result};
use crate::frame::{settings_id, DEFAULT_MAX_FRAME_SIZE, MAX_FRAME_SIZE_LIMIT};
use crate::hpack::table::DEFAULT_TABLE_SIZE;

/// Default bound on the uncompressed header list a parser accepts.
pub const DEFAULT_MAX_HEADER_LIST_SIZE: usize = 8_192;

/// Maximum accumulated header block size (256 KB).
/// Bounds memory spent on HEADERS + CONTINUATION floods.
pub const MAX_HEADER_BLOCK_SIZE: usize = 256 * 1024;

fn check_max_frame_size(value: u32) -> Result<u32> {
    if !(DEFAULT_MAX_FRAME_SIZE..=MAX_FRAME_SIZE_LIMIT).contains(&value) {
        return Err(H2Error::protocol(format!(
            "SETTINGS_MAX_FRAME_SIZE {} outside {}..={}",
            value, DEFAULT_MAX_FRAME_SIZE, MAX_FRAME_SIZE_LIMIT
        )));
    }
    Ok(value)
}

/// Receive-side limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserConfig {
    /// Largest frame payload accepted; bigger frames are a frame-size error.
    pub max_frame_size: u32,
    /// Largest dynamic table size the peer's encoder may announce.
    pub header_table_size: usize,
    /// Bound on one decoded header list (0 = unlimited).
    pub max_header_list_size: usize,
    /// Bound on the compressed bytes of one header block.
    pub max_header_block_size: usize,
    /// Treat a set reserved stream-id bit as a protocol error.
    pub strict: bool,
    /// Require the 24-byte client preface before the first frame.
    pub expect_preface: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            header_table_size: DEFAULT_TABLE_SIZE,
            max_header_list_size: DEFAULT_MAX_HEADER_LIST_SIZE,
            max_header_block_size: MAX_HEADER_BLOCK_SIZE,
            strict: false,
            expect_preface: false,
        }
    }
}

impl ParserConfig {
    pub fn with_max_frame_size(mut self, max_frame_size: u32) -> Self {
        self.max_frame_size = max_frame_size;
        self
    }

    pub fn with_header_table_size(mut self, size: usize) -> Self {
        self.header_table_size = size;
        self
    }

    pub fn with_max_header_list_size(mut self, size: usize) -> Self {
        self.max_header_list_size = size;
        self
    }

    pub fn with_max_header_block_size(mut self, size: usize) -> Self {
        self.max_header_block_size = size;
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_expect_preface(mut self, expect_preface: bool) -> Self {
        self.expect_preface = expect_preface;
        self
    }

    /// Apply the SETTINGS we advertised (and the peer acknowledged).
    pub fn apply_settings(&mut self, settings: &[(u16, u32)]) -> Result<()> {
        for &(id, value) in settings {
            match id {
                settings_id::HEADER_TABLE_SIZE => self.header_table_size = value as usize,
                settings_id::MAX_FRAME_SIZE => self.max_frame_size = check_max_frame_size(value)?,
                settings_id::MAX_HEADER_LIST_SIZE => self.max_header_list_size = value as usize,
                _ => {}
            }
        }
        Ok(())
    }
}

/// Send-side parameters, usually taken from the peer's SETTINGS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Largest payload put in one frame.
    pub max_frame_size: u32,
    /// Encoder dynamic table capacity.
    pub header_table_size: usize,
    /// Bound on one encoded header list (0 = unlimited).
    pub max_header_list_size: usize,
    pub huffman: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            header_table_size: DEFAULT_TABLE_SIZE,
            max_header_list_size: 0,
            huffman: true,
        }
    }
}

impl GeneratorConfig {
    pub fn with_max_frame_size(mut self, max_frame_size: u32) -> Self {
        self.max_frame_size = max_frame_size;
        self
    }

    pub fn with_header_table_size(mut self, size: usize) -> Self {
        self.header_table_size = size;
        self
    }

    pub fn with_max_header_list_size(mut self, size: usize) -> Self {
        self.max_header_list_size = size;
        self
    }

    pub fn with_huffman(mut self, huffman: bool) -> Self {
        self.huffman = huffman;
        self
    }

    /// Apply a SETTINGS list received from the peer.
    pub fn apply_settings(&mut self, settings: &[(u16, u32)]) -> Result<()> {
        for &(id, value) in settings {
            match id {
                settings_id::HEADER_TABLE_SIZE => self.header_table_size = value as usize,
                settings_id::MAX_FRAME_SIZE => self.max_frame_size = check_max_frame_size(value)?,
                settings_id::MAX_HEADER_LIST_SIZE => self.max_header_list_size = value as usize,
                _ => {}
            }
        }
        Ok(())
    }
}

//! HTTP/2 wire vocabulary (RFC 7540 Section 4 and 6).
//!
//! Frame type, flag, settings and error-code constants, the fixed 9-byte
//! frame header, the 5-byte priority descriptor, and the logical events the
//! parser delivers.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{H2Error, Result};
use crate::hpack::H2Header;

/// HTTP/2 frame types (RFC 7540 Section 6)
pub mod frame_type {
    pub const DATA: u8 = 0x0;
    pub const HEADERS: u8 = 0x1;
    pub const PRIORITY: u8 = 0x2;
    pub const RST_STREAM: u8 = 0x3;
    pub const SETTINGS: u8 = 0x4;
    pub const PUSH_PROMISE: u8 = 0x5;
    pub const PING: u8 = 0x6;
    pub const GOAWAY: u8 = 0x7;
    pub const WINDOW_UPDATE: u8 = 0x8;
    pub const CONTINUATION: u8 = 0x9;

    /// Human-readable name for logs.
    pub fn name(frame_type: u8) -> &'static str {
        match frame_type {
            DATA => "DATA",
            HEADERS => "HEADERS",
            PRIORITY => "PRIORITY",
            RST_STREAM => "RST_STREAM",
            SETTINGS => "SETTINGS",
            PUSH_PROMISE => "PUSH_PROMISE",
            PING => "PING",
            GOAWAY => "GOAWAY",
            WINDOW_UPDATE => "WINDOW_UPDATE",
            CONTINUATION => "CONTINUATION",
            _ => "UNKNOWN",
        }
    }
}

/// HTTP/2 frame flags
pub mod flags {
    pub const END_STREAM: u8 = 0x1;
    /// Same bit as END_STREAM, on SETTINGS and PING.
    pub const ACK: u8 = 0x1;
    pub const END_HEADERS: u8 = 0x4;
    pub const PADDED: u8 = 0x8;
    pub const PRIORITY: u8 = 0x20;
}

/// HTTP/2 SETTINGS identifiers (RFC 7540 Section 6.5.2)
pub mod settings_id {
    pub const HEADER_TABLE_SIZE: u16 = 0x1;
    pub const ENABLE_PUSH: u16 = 0x2;
    pub const MAX_CONCURRENT_STREAMS: u16 = 0x3;
    pub const INITIAL_WINDOW_SIZE: u16 = 0x4;
    pub const MAX_FRAME_SIZE: u16 = 0x5;
    pub const MAX_HEADER_LIST_SIZE: u16 = 0x6;
}

/// HTTP/2 error codes (RFC 7540 Section 7)
pub mod error_code {
    pub const NO_ERROR: u32 = 0x0;
    pub const PROTOCOL_ERROR: u32 = 0x1;
    pub const INTERNAL_ERROR: u32 = 0x2;
    pub const FLOW_CONTROL_ERROR: u32 = 0x3;
    pub const SETTINGS_TIMEOUT: u32 = 0x4;
    pub const STREAM_CLOSED: u32 = 0x5;
    pub const FRAME_SIZE_ERROR: u32 = 0x6;
    pub const REFUSED_STREAM: u32 = 0x7;
    pub const CANCEL: u32 = 0x8;
    pub const COMPRESSION_ERROR: u32 = 0x9;
    pub const CONNECT_ERROR: u32 = 0xa;
    pub const ENHANCE_YOUR_CALM: u32 = 0xb;
    pub const INADEQUATE_SECURITY: u32 = 0xc;
    pub const HTTP_1_1_REQUIRED: u32 = 0xd;
}

/// Size of the fixed frame header.
pub const FRAME_HEADER_SIZE: usize = 9;

/// Initial SETTINGS_MAX_FRAME_SIZE, also the smallest value a peer may announce.
pub const DEFAULT_MAX_FRAME_SIZE: u32 = 16_384;

/// Largest frame payload the 24-bit length field can describe.
pub const MAX_FRAME_SIZE_LIMIT: u32 = 16_777_215;

/// Largest valid stream identifier.
pub const MAX_STREAM_ID: u32 = 0x7FFF_FFFF;

/// The HTTP/2 connection preface (24 bytes)
pub const CONNECTION_PREFACE: &[u8] = b"PRI * HTTP/2.0\r\n\r\nSM\r\n\r\n";

/// Check if data starts with HTTP/2 connection preface (h2c detection)
pub fn is_h2c_preface(data: &[u8]) -> bool {
    data.starts_with(CONNECTION_PREFACE)
}

/// A parsed HTTP/2 frame header (9 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub length: u32, // 24 bits
    pub frame_type: u8,
    pub flags: u8,
    pub stream_id: u32, // 31 bits
    /// The reserved high bit of the stream id field, as received.
    pub reserved: bool,
}

impl FrameHeader {
    pub fn new(length: u32, frame_type: u8, flags: u8, stream_id: u32) -> Self {
        Self {
            length,
            frame_type,
            flags,
            stream_id: stream_id & MAX_STREAM_ID,
            reserved: false,
        }
    }

    /// Parse a 9-byte frame header
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < FRAME_HEADER_SIZE {
            return None;
        }

        let length = ((data[0] as u32) << 16) | ((data[1] as u32) << 8) | (data[2] as u32);
        let raw_stream_id = u32::from_be_bytes([data[5], data[6], data[7], data[8]]);

        Some(Self {
            length,
            frame_type: data[3],
            flags: data[4],
            stream_id: raw_stream_id & MAX_STREAM_ID,
            reserved: raw_stream_id & !MAX_STREAM_ID != 0,
        })
    }

    /// Serialize into the 9-byte wire form. The reserved bit is always sent as 0.
    pub fn to_bytes(&self) -> [u8; FRAME_HEADER_SIZE] {
        let len = self.length.to_be_bytes();
        let sid = (self.stream_id & MAX_STREAM_ID).to_be_bytes();
        [len[1], len[2], len[3], self.frame_type, self.flags, sid[0], sid[1], sid[2], sid[3]]
    }

    pub fn write(&self, dst: &mut BytesMut) {
        dst.put_slice(&self.to_bytes());
    }

    /// Total frame size including header
    pub fn total_size(&self) -> usize {
        FRAME_HEADER_SIZE + self.length as usize
    }

    pub fn has_flag(&self, flag: u8) -> bool {
        self.flags & flag != 0
    }

    /// Check if END_STREAM flag is set
    pub fn is_end_stream(&self) -> bool {
        self.has_flag(flags::END_STREAM)
    }

    /// Check if END_HEADERS flag is set
    pub fn is_end_headers(&self) -> bool {
        self.has_flag(flags::END_HEADERS)
    }
}

/// Stream dependency descriptor, carried by PRIORITY frames and optionally as
/// the prefix of a HEADERS payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriorityFrame {
    pub stream_id: u32,
    pub parent_stream_id: u32,
    /// Actual weight, 1..=256. Sent on the wire as `weight - 1`.
    pub weight: u16,
    pub exclusive: bool,
}

impl PriorityFrame {
    /// Length of the priority payload.
    pub const LENGTH: usize = 5;

    pub fn new(stream_id: u32, parent_stream_id: u32, weight: u16, exclusive: bool) -> Self {
        Self {
            stream_id,
            parent_stream_id,
            weight,
            exclusive,
        }
    }

    /// Reject descriptors that cannot be put on the wire.
    pub fn validate(&self) -> Result<()> {
        if !(1..=256).contains(&self.weight) {
            return Err(H2Error::protocol(format!(
                "priority weight {} outside 1..=256",
                self.weight
            )));
        }
        if self.parent_stream_id > MAX_STREAM_ID {
            return Err(H2Error::protocol(format!(
                "parent stream id {} exceeds 31 bits",
                self.parent_stream_id
            )));
        }
        if self.stream_id != 0 && self.stream_id == self.parent_stream_id {
            return Err(H2Error::protocol(format!(
                "stream {} cannot depend on itself",
                self.stream_id
            )));
        }
        Ok(())
    }

    /// Append the 5-byte payload: `E | parent:31 | weight-1`.
    pub fn write_payload(&self, dst: &mut BytesMut) {
        let mut dependency = self.parent_stream_id & MAX_STREAM_ID;
        if self.exclusive {
            dependency |= 0x8000_0000;
        }
        dst.put_u32(dependency);
        dst.put_u8((self.weight.clamp(1, 256) - 1) as u8);
    }

    /// Parse a priority payload for `stream_id`.
    pub fn parse_payload(stream_id: u32, payload: &[u8]) -> Result<Self> {
        if payload.len() < Self::LENGTH {
            return Err(H2Error::frame_size(format!(
                "priority payload of {} bytes, need {}",
                payload.len(),
                Self::LENGTH
            )));
        }
        let dependency = u32::from_be_bytes([payload[0], payload[1], payload[2], payload[3]]);
        let priority = Self {
            stream_id,
            parent_stream_id: dependency & MAX_STREAM_ID,
            weight: payload[4] as u16 + 1,
            exclusive: dependency & 0x8000_0000 != 0,
        };
        if priority.parent_stream_id == stream_id {
            return Err(H2Error::protocol(format!(
                "stream {} cannot depend on itself",
                stream_id
            )));
        }
        Ok(priority)
    }
}

/// One logical HEADERS event, independent of how many frames carry it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadersFrame {
    pub stream_id: u32,
    pub headers: Vec<H2Header>,
    pub priority: Option<PriorityFrame>,
    pub end_stream: bool,
}

impl HeadersFrame {
    pub fn new(stream_id: u32, headers: Vec<H2Header>) -> Self {
        Self {
            stream_id,
            headers,
            priority: None,
            end_stream: false,
        }
    }

    pub fn with_priority(mut self, priority: PriorityFrame) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_end_stream(mut self, end_stream: bool) -> Self {
        self.end_stream = end_stream;
        self
    }
}

/// Events emitted by the parser, in wire order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum H2Event {
    /// A complete, decompressed header block (HEADERS plus any CONTINUATION).
    Headers(HeadersFrame),
    /// Data for a stream, padding removed
    Data {
        stream_id: u32,
        data: Bytes,
        end_stream: bool,
    },
    /// Standalone PRIORITY frame
    Priority(PriorityFrame),
    /// Stream was reset (RST_STREAM)
    StreamReset { stream_id: u32, error_code: u32 },
    /// Settings frame (connection-level)
    Settings {
        ack: bool,
        /// (identifier, value) pairs in wire order. Empty for ACK frames.
        settings: Vec<(u16, u32)>,
    },
    /// A complete PUSH_PROMISE header block
    PushPromise {
        stream_id: u32,
        promised_stream_id: u32,
        headers: Vec<H2Header>,
    },
    /// Ping (connection-level)
    Ping { ack: bool, data: [u8; 8] },
    /// Connection-level GOAWAY
    GoAway {
        last_stream_id: u32,
        error_code: u32,
        debug_data: Bytes,
    },
    /// Window update
    WindowUpdate { stream_id: u32, increment: u32 },
}

impl H2Event {
    /// Stream the event belongs to; 0 for connection-level events.
    pub fn stream_id(&self) -> u32 {
        match self {
            H2Event::Headers(frame) => frame.stream_id,
            H2Event::Data { stream_id, .. }
            | H2Event::StreamReset { stream_id, .. }
            | H2Event::PushPromise { stream_id, .. }
            | H2Event::WindowUpdate { stream_id, .. } => *stream_id,
            H2Event::Priority(priority) => priority.stream_id,
            H2Event::Settings { .. } | H2Event::Ping { .. } | H2Event::GoAway { .. } => 0,
        }
    }
}

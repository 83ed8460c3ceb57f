//! h2-framing: a sans-I/O HTTP/2 framing layer
//!
//! Turns logical HTTP/2 events into wire frames and back, with the
//! per-connection HPACK compression context both directions depend on.
//!
//! # Features
//!
//! - **Sans-I/O Design**: No runtime, no sockets; you move the bytes
//! - **HPACK (RFC 7541)**: Static and dynamic tables, Huffman coding,
//!   table size updates, sensitive fields never indexed
//! - **Resumable Parser**: Feed chunks of any size, down to one byte;
//!   the delivered events never depend on the chunking
//! - **CONTINUATION**: Oversized header blocks are split on send and
//!   reassembled on receive
//! - **All RFC 7540 frame types**: DATA, HEADERS, PRIORITY, RST_STREAM,
//!   SETTINGS, PUSH_PROMISE, PING, GOAWAY, WINDOW_UPDATE, CONTINUATION
//! - **Pooled Output**: Generated frames land in buffers leased from a
//!   shared pool and are returned when the lease is dropped
//!
//! # Quick Start
//!
//! ```rust
//! use h2_framing::{BufferPool, Generator, H2Event, H2Header, HeadersFrame, Parser, PriorityFrame};
//!
//! let mut generator = Generator::new(BufferPool::new());
//! let request = HeadersFrame::new(13, vec![
//!     H2Header::new(":method", "GET"),
//!     H2Header::new(":path", "/path"),
//! ])
//! .with_priority(PriorityFrame::new(13, 39, 200, true))
//! .with_end_stream(true);
//!
//! let lease = generator.headers(&request).unwrap();
//! let wire = lease.to_vec();
//! lease.release();
//!
//! let mut parser = Parser::new(Vec::<H2Event>::new());
//! for byte in &wire {
//!     parser.feed(std::slice::from_ref(byte)).unwrap();
//! }
//!
//! match &parser.listener()[0] {
//!     H2Event::Headers(frame) => assert_eq!(frame, &request),
//!     _ => unreachable!(),
//! }
//! ```
//!
//! # Errors
//!
//! Frame-size, protocol and compression errors are fatal to the connection;
//! [`H2Error::error_code`] gives the GOAWAY code to send. Pool exhaustion is a
//! recoverable [`H2Error::Resource`].
//!
//! # Architecture
//!
//! This crate only frames. It does NOT provide:
//! - TCP transport or TLS (you provide the bytes)
//! - Stream state machines or flow-control accounting
//! - Stream scheduling

pub mod config;
pub mod error;
pub mod frame;
pub mod generator;
pub mod hpack;
pub mod metadata;
pub mod parser;
pub mod pool;

pub use config::{GeneratorConfig, ParserConfig, DEFAULT_MAX_HEADER_LIST_SIZE, MAX_HEADER_BLOCK_SIZE};
pub use error::{H2Error, HpackError, Result};
pub use frame::{
    error_code, flags, frame_type, is_h2c_preface, settings_id, FrameHeader, H2Event, HeadersFrame, PriorityFrame,
    CONNECTION_PREFACE, DEFAULT_MAX_FRAME_SIZE, FRAME_HEADER_SIZE, MAX_FRAME_SIZE_LIMIT,
};
pub use generator::Generator;
pub use hpack::{H2Header, HpackDecoder, HpackEncoder};
pub use metadata::MetaData;
pub use parser::{Listener, Parser, ParserState};
pub use pool::{BufferPool, Lease};

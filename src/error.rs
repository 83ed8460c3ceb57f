//! Error taxonomy for the framing layer.
//!
//! Three classes are fatal to the whole connection: [`H2Error::FrameSize`],
//! [`H2Error::Protocol`] and [`H2Error::Compression`]. Once one of them is
//! raised, the compression tables or the pending header block may already be
//! out of step with the peer, so nothing is retried in place. The caller picks
//! the GOAWAY code from [`H2Error::error_code`].
//!
//! [`H2Error::Resource`] is the only recoverable class: the buffer pool had
//! nothing to hand out, and no compression state was touched.

use thiserror::Error;

use crate::frame::error_code;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, H2Error>;

/// Failures raised by the HPACK compression context.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HpackError {
    #[error("header index {0} is out of range")]
    InvalidIndex(usize),

    #[error("integer representation overflows")]
    IntegerOverflow,

    #[error("header block truncated")]
    Truncated,

    #[error("invalid Huffman-coded string")]
    InvalidHuffman,

    #[error("dynamic table size update to {requested} exceeds allowed {max}")]
    SizeUpdateTooLarge { requested: usize, max: usize },

    #[error("dynamic table size update after the first header field")]
    SizeUpdateMidBlock,

    #[error("header list size {size} exceeds limit {max}")]
    HeaderListTooLarge { size: usize, max: usize },

    #[error("header field is not valid UTF-8")]
    InvalidUtf8,

    #[error("header name {0:?} contains uppercase characters")]
    UppercaseName(String),
}

/// Errors surfaced by the parser, the generator and the buffer pool.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum H2Error {
    /// A frame is larger than the negotiated maximum, or a fixed-size frame has
    /// the wrong length.
    #[error("frame size error: {0}")]
    FrameSize(String),

    /// Structural violation: bad padding, interleaved header blocks,
    /// self-dependent priority, illegal stream id.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Header compression failed; the tables can no longer be trusted.
    #[error("compression error: {0}")]
    Compression(#[from] HpackError),

    /// The buffer pool could not supply a buffer.
    #[error("resource error: {0}")]
    Resource(String),
}

impl H2Error {
    /// Wire error code to put in the GOAWAY (or RST_STREAM) that follows.
    pub fn error_code(&self) -> u32 {
        match self {
            H2Error::FrameSize(_) => error_code::FRAME_SIZE_ERROR,
            H2Error::Protocol(_) => error_code::PROTOCOL_ERROR,
            H2Error::Compression(_) => error_code::COMPRESSION_ERROR,
            H2Error::Resource(_) => error_code::INTERNAL_ERROR,
        }
    }

    /// Whether the connection must be torn down.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, H2Error::Resource(_))
    }

    pub(crate) fn frame_size(msg: impl Into<String>) -> Self {
        H2Error::FrameSize(msg.into())
    }

    pub(crate) fn protocol(msg: impl Into<String>) -> Self {
        H2Error::Protocol(msg.into())
    }
}

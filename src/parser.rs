//! Resumable HTTP/2 frame parser.
//!
//! Sans-I/O: the transport feeds whatever bytes it read, in chunks of any
//! size down to a single byte, and the parser delivers logical events to its
//! [`Listener`] as soon as they are complete. The events delivered never
//! depend on how the stream was chunked.
//!
//! Partial frame headers and payloads are carried across calls; a payload
//! that arrives whole inside one chunk is processed in place without copying.
//! Header blocks split over HEADERS/PUSH_PROMISE + CONTINUATION frames are
//! accumulated and decompressed in one call once END_HEADERS is seen.
//!
//! Every error is fatal. The parser then refuses further input, because the
//! compression table may already disagree with the peer's.

use bytes::{Bytes, BytesMut};
use tracing::{debug, trace, warn};

use crate::config::ParserConfig;
use crate::error::{H2Error, Result};
use crate::frame::{
    flags, frame_type, FrameHeader, H2Event, HeadersFrame, PriorityFrame, CONNECTION_PREFACE, FRAME_HEADER_SIZE,
    MAX_STREAM_ID,
};
use crate::hpack::HpackDecoder;

/// Receives parsed events synchronously from inside [`Parser::feed`].
pub trait Listener {
    /// One completed frame or header block, in wire order.
    fn on_event(&mut self, event: H2Event);

    /// Called once when the connection fails, before `feed` returns the error.
    fn on_connection_failure(&mut self, _error: &H2Error) {}
}

impl Listener for Vec<H2Event> {
    fn on_event(&mut self, event: H2Event) {
        self.push(event);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    AwaitingFrameHeader,
    AwaitingFrameBody,
    /// A header block is open; only CONTINUATION for its stream is allowed.
    AwaitingMoreContinuation,
    /// A fatal error was raised; all further input is refused.
    Failed,
}

#[derive(Debug)]
enum BlockKind {
    Headers {
        priority: Option<PriorityFrame>,
        end_stream: bool,
    },
    PushPromise {
        promised_stream_id: u32,
    },
}

/// Compressed fragments of a header block still waiting for END_HEADERS.
#[derive(Debug)]
struct PendingBlock {
    stream_id: u32,
    kind: BlockKind,
    fragments: BytesMut,
}

fn read_u32(payload: &[u8]) -> u32 {
    u32::from_be_bytes([payload[0], payload[1], payload[2], payload[3]])
}

/// Strip the Pad Length byte and trailing padding of a PADDED frame.
fn strip_padding<'a>(header: &FrameHeader, payload: &'a [u8]) -> Result<&'a [u8]> {
    if !header.has_flag(flags::PADDED) {
        return Ok(payload);
    }
    let (&pad_length, rest) = payload.split_first().ok_or_else(|| {
        H2Error::protocol(format!(
            "PADDED {} frame with no payload",
            frame_type::name(header.frame_type)
        ))
    })?;
    let pad_length = pad_length as usize;
    if pad_length > rest.len() {
        return Err(H2Error::protocol(format!(
            "padding length {} exceeds {} frame payload of {}",
            pad_length,
            frame_type::name(header.frame_type),
            payload.len()
        )));
    }
    Ok(&rest[..rest.len() - pad_length])
}

/// Receive side of one connection: turns bytes into events for `L`.
#[derive(Debug)]
pub struct Parser<L: Listener> {
    config: ParserConfig,
    decoder: HpackDecoder,
    listener: L,
    /// Bytes of the client preface matched so far.
    preface_matched: usize,
    header_buf: [u8; FRAME_HEADER_SIZE],
    header_len: usize,
    /// Header of the frame whose payload is being read.
    current: Option<FrameHeader>,
    /// Partial payload of `current`, reused across frames.
    body: BytesMut,
    pending: Option<PendingBlock>,
    failed: Option<H2Error>,
}

impl<L: Listener + Default> Default for Parser<L> {
    fn default() -> Self {
        Self::new(L::default())
    }
}

impl<L: Listener> Parser<L> {
    /// Parser with default settings delivering to `listener`.
    pub fn new(listener: L) -> Self {
        Self::with_config(ParserConfig::default(), listener)
    }

    /// Parser whose decoder starts at `config.header_table_size`.
    pub fn with_config(config: ParserConfig, listener: L) -> Self {
        let decoder = Self::decoder_for(&config);
        Self {
            config,
            decoder,
            listener,
            preface_matched: 0,
            header_buf: [0; FRAME_HEADER_SIZE],
            header_len: 0,
            current: None,
            body: BytesMut::new(),
            pending: None,
            failed: None,
        }
    }

    fn decoder_for(config: &ParserConfig) -> HpackDecoder {
        let mut decoder = HpackDecoder::with_capacity(config.header_table_size);
        decoder.set_max_header_list_size(config.max_header_list_size);
        decoder
    }

    /// Current receive-side settings.
    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Receive-side compression context.
    pub fn decoder(&self) -> &HpackDecoder {
        &self.decoder
    }

    /// The listener; it keeps events delivered before a failure.
    pub fn listener(&self) -> &L {
        &self.listener
    }

    /// Mutable access, e.g. to drain collected events.
    pub fn listener_mut(&mut self) -> &mut L {
        &mut self.listener
    }

    /// Consume the parser, returning its listener.
    pub fn into_listener(self) -> L {
        self.listener
    }

    /// Where the parser stands between two calls to `feed`.
    pub fn state(&self) -> ParserState {
        if self.failed.is_some() {
            ParserState::Failed
        } else if self.current.is_some() {
            ParserState::AwaitingFrameBody
        } else if self.pending.is_some() {
            ParserState::AwaitingMoreContinuation
        } else {
            ParserState::AwaitingFrameHeader
        }
    }

    /// The error that failed the connection, if any.
    pub fn error(&self) -> Option<&H2Error> {
        self.failed.as_ref()
    }

    /// Largest dynamic table size the peer's encoder may switch to.
    pub fn set_header_table_size(&mut self, size: usize) {
        debug!(size, "parser header table size changed");
        self.config.header_table_size = size;
        self.decoder.set_capacity(size);
    }

    /// Largest payload accepted from the peer.
    pub fn set_max_frame_size(&mut self, max_frame_size: u32) {
        self.config.max_frame_size = max_frame_size;
    }

    /// Apply the SETTINGS this endpoint advertised, once acknowledged.
    pub fn apply_settings(&mut self, settings: &[(u16, u32)]) -> Result<()> {
        let mut config = self.config.clone();
        config.apply_settings(settings)?;
        if config.header_table_size != self.config.header_table_size {
            self.set_header_table_size(config.header_table_size);
        }
        self.decoder.set_max_header_list_size(config.max_header_list_size);
        self.config = config;
        Ok(())
    }

    /// Start over as a fresh connection with the current configuration.
    pub fn reset(&mut self) {
        self.decoder = Self::decoder_for(&self.config);
        self.preface_matched = 0;
        self.header_len = 0;
        self.current = None;
        self.body = BytesMut::new();
        self.pending = None;
        self.failed = None;
    }

    /// Consume the next chunk of the connection byte stream.
    ///
    /// Events completed by this chunk are delivered to the listener before
    /// returning, so frames ahead of a bad one in the same chunk still reach
    /// it. After an error every later call returns that same error.
    pub fn feed(&mut self, data: &[u8]) -> Result<()> {
        if let Some(err) = &self.failed {
            return Err(err.clone());
        }
        self.advance(data).map_err(|err| {
            self.fail(&err);
            err
        })
    }

    fn fail(&mut self, err: &H2Error) {
        warn!(error = %err, code = err.error_code(), "HTTP/2 connection failed");
        self.pending = None;
        self.current = None;
        self.body = BytesMut::new();
        self.listener.on_connection_failure(err);
        self.failed = Some(err.clone());
    }

    fn advance(&mut self, data: &[u8]) -> Result<()> {
        let mut input = data;

        if self.config.expect_preface && self.preface_matched < CONNECTION_PREFACE.len() {
            let expected = &CONNECTION_PREFACE[self.preface_matched..];
            let n = expected.len().min(input.len());
            if input[..n] != expected[..n] {
                return Err(H2Error::protocol("invalid connection preface"));
            }
            self.preface_matched += n;
            input = &input[n..];
        }

        while !input.is_empty() {
            let Some(header) = self.current else {
                let n = (FRAME_HEADER_SIZE - self.header_len).min(input.len());
                self.header_buf[self.header_len..self.header_len + n].copy_from_slice(&input[..n]);
                self.header_len += n;
                input = &input[n..];
                if self.header_len < FRAME_HEADER_SIZE {
                    break;
                }
                self.header_len = 0;

                let header = FrameHeader::parse(&self.header_buf)
                    .ok_or_else(|| H2Error::frame_size("incomplete frame header"))?;
                self.check_frame_header(&header)?;
                if header.length == 0 {
                    self.on_frame(header, &[])?;
                } else {
                    self.current = Some(header);
                }
                continue;
            };

            let length = header.length as usize;
            if self.body.is_empty() && input.len() >= length {
                let (payload, rest) = input.split_at(length);
                input = rest;
                self.current = None;
                self.on_frame(header, payload)?;
                continue;
            }

            let n = (length - self.body.len()).min(input.len());
            self.body.extend_from_slice(&input[..n]);
            input = &input[n..];
            if self.body.len() == length {
                self.current = None;
                let body = std::mem::take(&mut self.body);
                let result = self.on_frame(header, &body);
                self.body = body;
                self.body.clear();
                result?;
            }
        }
        Ok(())
    }

    /// Checks that only need the 9-byte header.
    fn check_frame_header(&self, header: &FrameHeader) -> Result<()> {
        trace!(
            frame_type = frame_type::name(header.frame_type),
            flags = header.flags,
            stream_id = header.stream_id,
            length = header.length,
            "frame header"
        );

        if header.length > self.config.max_frame_size {
            return Err(H2Error::frame_size(format!(
                "{} frame of {} bytes exceeds max frame size {}",
                frame_type::name(header.frame_type),
                header.length,
                self.config.max_frame_size
            )));
        }
        if header.reserved && self.config.strict {
            return Err(H2Error::protocol(format!(
                "reserved bit set on stream id {}",
                header.stream_id
            )));
        }

        if let Some(pending) = &self.pending {
            if header.frame_type != frame_type::CONTINUATION || header.stream_id != pending.stream_id {
                return Err(H2Error::protocol(format!(
                    "expected CONTINUATION for stream {}, got {} on stream {}",
                    pending.stream_id,
                    frame_type::name(header.frame_type),
                    header.stream_id
                )));
            }
        } else if header.frame_type == frame_type::CONTINUATION {
            return Err(H2Error::protocol(format!(
                "unexpected CONTINUATION frame for stream {}",
                header.stream_id
            )));
        }

        match header.frame_type {
            frame_type::DATA
            | frame_type::HEADERS
            | frame_type::PRIORITY
            | frame_type::RST_STREAM
            | frame_type::PUSH_PROMISE
            | frame_type::CONTINUATION => {
                if header.stream_id == 0 {
                    return Err(H2Error::protocol(format!(
                        "{} frame on stream 0",
                        frame_type::name(header.frame_type)
                    )));
                }
            }
            frame_type::SETTINGS | frame_type::PING | frame_type::GOAWAY => {
                if header.stream_id != 0 {
                    return Err(H2Error::protocol(format!(
                        "{} frame on stream {}",
                        frame_type::name(header.frame_type),
                        header.stream_id
                    )));
                }
            }
            _ => {}
        }

        let length = header.length as usize;
        let bad_length = match header.frame_type {
            frame_type::PRIORITY => length != PriorityFrame::LENGTH,
            frame_type::RST_STREAM | frame_type::WINDOW_UPDATE => length != 4,
            frame_type::PING => length != 8,
            frame_type::GOAWAY => length < 8,
            frame_type::SETTINGS => {
                (header.has_flag(flags::ACK) && length != 0) || length % 6 != 0
            }
            _ => false,
        };
        if bad_length {
            return Err(H2Error::frame_size(format!(
                "{} frame with invalid length {}",
                frame_type::name(header.frame_type),
                length
            )));
        }
        Ok(())
    }

    fn on_frame(&mut self, header: FrameHeader, payload: &[u8]) -> Result<()> {
        let stream_id = header.stream_id;
        match header.frame_type {
            frame_type::DATA => {
                let data = strip_padding(&header, payload)?;
                self.listener.on_event(H2Event::Data {
                    stream_id,
                    data: Bytes::copy_from_slice(data),
                    end_stream: header.is_end_stream(),
                });
            }
            frame_type::HEADERS => {
                let mut fragment = strip_padding(&header, payload)?;
                let priority = if header.has_flag(flags::PRIORITY) {
                    let priority = PriorityFrame::parse_payload(stream_id, fragment)?;
                    fragment = &fragment[PriorityFrame::LENGTH..];
                    Some(priority)
                } else {
                    None
                };
                let kind = BlockKind::Headers {
                    priority,
                    end_stream: header.is_end_stream(),
                };
                self.start_block(&header, kind, fragment)?;
            }
            frame_type::PUSH_PROMISE => {
                let fragment = strip_padding(&header, payload)?;
                if fragment.len() < 4 {
                    return Err(H2Error::frame_size("PUSH_PROMISE frame without promised stream id"));
                }
                let promised_stream_id = read_u32(fragment) & MAX_STREAM_ID;
                if promised_stream_id == 0 {
                    return Err(H2Error::protocol("PUSH_PROMISE promising stream 0"));
                }
                let kind = BlockKind::PushPromise { promised_stream_id };
                self.start_block(&header, kind, &fragment[4..])?;
            }
            frame_type::CONTINUATION => {
                let max = self.config.max_header_block_size;
                let Some(pending) = self.pending.as_mut() else {
                    return Err(H2Error::protocol("CONTINUATION without an open header block"));
                };
                let size = pending.fragments.len() + payload.len();
                if size > max {
                    return Err(H2Error::protocol(format!(
                        "header block too large ({} bytes, max {})",
                        size, max
                    )));
                }
                pending.fragments.extend_from_slice(payload);
                if header.is_end_headers() {
                    if let Some(pending) = self.pending.take() {
                        self.deliver_block(pending.stream_id, pending.kind, &pending.fragments)?;
                    }
                }
            }
            frame_type::PRIORITY => {
                let priority = PriorityFrame::parse_payload(stream_id, payload)?;
                self.listener.on_event(H2Event::Priority(priority));
            }
            frame_type::RST_STREAM => {
                self.listener.on_event(H2Event::StreamReset {
                    stream_id,
                    error_code: read_u32(payload),
                });
            }
            frame_type::SETTINGS => {
                let settings = payload
                    .chunks_exact(6)
                    .map(|entry| (u16::from_be_bytes([entry[0], entry[1]]), read_u32(&entry[2..])))
                    .collect();
                self.listener.on_event(H2Event::Settings {
                    ack: header.has_flag(flags::ACK),
                    settings,
                });
            }
            frame_type::PING => {
                let mut data = [0u8; 8];
                data.copy_from_slice(payload);
                self.listener.on_event(H2Event::Ping {
                    ack: header.has_flag(flags::ACK),
                    data,
                });
            }
            frame_type::GOAWAY => {
                self.listener.on_event(H2Event::GoAway {
                    last_stream_id: read_u32(payload) & MAX_STREAM_ID,
                    error_code: read_u32(&payload[4..]),
                    debug_data: Bytes::copy_from_slice(&payload[8..]),
                });
            }
            frame_type::WINDOW_UPDATE => {
                self.listener.on_event(H2Event::WindowUpdate {
                    stream_id,
                    increment: read_u32(payload) & MAX_STREAM_ID,
                });
            }
            other => {
                trace!(frame_type = other, length = payload.len(), "skipping unknown frame");
            }
        }
        Ok(())
    }

    fn start_block(&mut self, header: &FrameHeader, kind: BlockKind, fragment: &[u8]) -> Result<()> {
        if fragment.len() > self.config.max_header_block_size {
            return Err(H2Error::protocol(format!(
                "header block too large ({} bytes, max {})",
                fragment.len(),
                self.config.max_header_block_size
            )));
        }
        if header.is_end_headers() {
            return self.deliver_block(header.stream_id, kind, fragment);
        }
        self.pending = Some(PendingBlock {
            stream_id: header.stream_id,
            kind,
            fragments: BytesMut::from(fragment),
        });
        Ok(())
    }

    fn deliver_block(&mut self, stream_id: u32, kind: BlockKind, block: &[u8]) -> Result<()> {
        let headers = self.decoder.decode(block)?;
        debug!(
            stream_id,
            fields = headers.len(),
            compressed = block.len(),
            table_size = self.decoder.table().size(),
            "decoded header block"
        );

        let event = match kind {
            BlockKind::Headers { priority, end_stream } => H2Event::Headers(HeadersFrame {
                stream_id,
                headers,
                priority,
                end_stream,
            }),
            BlockKind::PushPromise { promised_stream_id } => H2Event::PushPromise {
                stream_id,
                promised_stream_id,
                headers,
            },
        };
        self.listener.on_event(event);
        Ok(())
    }
}

impl Parser<Vec<H2Event>> {
    /// Feed `data` and take every event it completed.
    ///
    /// On error nothing is taken: events that completed before the failure
    /// stay in [`Parser::listener`].
    pub fn process(&mut self, data: &[u8]) -> Result<Vec<H2Event>> {
        self.feed(data)?;
        Ok(std::mem::take(&mut self.listener))
    }
}

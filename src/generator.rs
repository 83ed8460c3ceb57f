//! Frame generator.
//!
//! Serializes logical events into wire frames. Header blocks are compressed
//! once, up front, and then split into HEADERS (or PUSH_PROMISE) plus as many
//! CONTINUATION frames as the max frame size requires. Every call returns a
//! [`Lease`] over buffers drawn from the shared [`BufferPool`].
//!
//! The generator owns the connection's send-side [`HpackEncoder`]; callers
//! sharing one connection across streams must serialize their calls and
//! write the leases to the wire in the same order.

use bytes::{BufMut, BytesMut};
use tracing::{debug, trace};

use crate::config::GeneratorConfig;
use crate::error::{H2Error, Result};
use crate::frame::{
    flags, frame_type, FrameHeader, HeadersFrame, PriorityFrame, FRAME_HEADER_SIZE, MAX_FRAME_SIZE_LIMIT,
    MAX_STREAM_ID,
};
use crate::hpack::{H2Header, HpackEncoder};
use crate::pool::{BufferPool, Lease};

/// Smallest max frame size a header block may be split at.
pub const MIN_SPLIT_FRAME_SIZE: u32 = 16;

fn check_stream_id(stream_id: u32, what: &str) -> Result<()> {
    if stream_id == 0 || stream_id > MAX_STREAM_ID {
        return Err(H2Error::protocol(format!("{} on invalid stream id {}", what, stream_id)));
    }
    Ok(())
}

fn check_frame_size(max_frame_size: u32) -> Result<usize> {
    if !(MIN_SPLIT_FRAME_SIZE..=MAX_FRAME_SIZE_LIMIT).contains(&max_frame_size) {
        return Err(H2Error::frame_size(format!(
            "max frame size {} outside {}..={}",
            max_frame_size, MIN_SPLIT_FRAME_SIZE, MAX_FRAME_SIZE_LIMIT
        )));
    }
    Ok(max_frame_size as usize)
}

/// Overwrite the 9-byte placeholder at `at`.
fn patch_header(buf: &mut BytesMut, at: usize, header: FrameHeader) {
    buf[at..at + FRAME_HEADER_SIZE].copy_from_slice(&header.to_bytes());
    trace!(
        frame_type = frame_type::name(header.frame_type),
        flags = header.flags,
        stream_id = header.stream_id,
        length = header.length,
        "generated frame"
    );
}

fn append_frame(buf: &mut BytesMut, header: FrameHeader, payload: &[u8]) {
    header.write(buf);
    buf.put_slice(payload);
    trace!(
        frame_type = frame_type::name(header.frame_type),
        flags = header.flags,
        stream_id = header.stream_id,
        length = header.length,
        "generated frame"
    );
}

/// Send side of one connection: turns events into frames.
#[derive(Debug)]
pub struct Generator {
    pool: BufferPool,
    encoder: HpackEncoder,
    config: GeneratorConfig,
}

impl Generator {
    /// Generator with default settings drawing buffers from `pool`.
    pub fn new(pool: BufferPool) -> Self {
        Self::with_config(pool, GeneratorConfig::default())
    }

    /// Generator whose encoder starts at `config.header_table_size`.
    pub fn with_config(pool: BufferPool, config: GeneratorConfig) -> Self {
        let mut encoder = HpackEncoder::with_capacity(config.header_table_size);
        encoder.set_max_header_list_size(config.max_header_list_size);
        encoder.set_huffman(config.huffman);
        Self {
            pool,
            encoder,
            config,
        }
    }

    /// Current send-side settings.
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Send-side compression context.
    pub fn encoder(&self) -> &HpackEncoder {
        &self.encoder
    }

    /// Largest payload a single frame may carry.
    pub fn max_frame_size(&self) -> u32 {
        self.config.max_frame_size
    }

    /// Largest payload for later frames; usually the peer's SETTINGS value.
    pub fn set_max_frame_size(&mut self, max_frame_size: u32) {
        self.config.max_frame_size = max_frame_size;
    }

    /// Resize the compression table; the next header block announces it.
    pub fn set_header_table_size(&mut self, size: usize) {
        debug!(size, "generator header table size changed");
        self.config.header_table_size = size;
        self.encoder.set_capacity(size);
    }

    /// Apply the peer's SETTINGS.
    pub fn apply_settings(&mut self, settings: &[(u16, u32)]) -> Result<()> {
        let mut config = self.config.clone();
        config.apply_settings(settings)?;
        if config.header_table_size != self.config.header_table_size {
            self.set_header_table_size(config.header_table_size);
        }
        self.encoder.set_max_header_list_size(config.max_header_list_size);
        self.config = config;
        Ok(())
    }

    /// HEADERS using the configured max frame size.
    pub fn headers(&mut self, frame: &HeadersFrame) -> Result<Lease> {
        self.generate_headers(frame, self.config.max_frame_size)
    }

    /// Encode one logical HEADERS event, splitting it into CONTINUATION frames
    /// when the compressed block (plus any priority prefix) exceeds
    /// `max_frame_size`.
    pub fn generate_headers(&mut self, frame: &HeadersFrame, max_frame_size: u32) -> Result<Lease> {
        let max = check_frame_size(max_frame_size)?;
        check_stream_id(frame.stream_id, "HEADERS")?;

        let mut prefix = BytesMut::new();
        let mut first_flags = 0;
        if let Some(priority) = &frame.priority {
            let priority = PriorityFrame {
                stream_id: frame.stream_id,
                ..*priority
            };
            priority.validate()?;
            priority.write_payload(&mut prefix);
            first_flags |= flags::PRIORITY;
        }
        if frame.end_stream {
            first_flags |= flags::END_STREAM;
        }

        self.header_block(
            frame_type::HEADERS,
            first_flags,
            frame.stream_id,
            &prefix,
            &frame.headers,
            max,
        )
    }

    /// PUSH_PROMISE reserving `promised_stream_id`, with continuation like HEADERS.
    pub fn push_promise(
        &mut self,
        stream_id: u32,
        promised_stream_id: u32,
        headers: &[H2Header],
    ) -> Result<Lease> {
        let max = check_frame_size(self.config.max_frame_size)?;
        check_stream_id(stream_id, "PUSH_PROMISE")?;
        check_stream_id(promised_stream_id, "PUSH_PROMISE promised stream")?;

        let prefix = promised_stream_id.to_be_bytes();
        self.header_block(frame_type::PUSH_PROMISE, 0, stream_id, &prefix, headers, max)
    }

    fn header_block(
        &mut self,
        first_type: u8,
        first_flags: u8,
        stream_id: u32,
        prefix: &[u8],
        headers: &[H2Header],
        max: usize,
    ) -> Result<Lease> {
        // Take the buffer before the encoder touches its table.
        let mut lease = Lease::new(self.pool.clone());
        let estimate = FRAME_HEADER_SIZE + prefix.len() + headers.iter().map(H2Header::size).sum::<usize>();
        let buf = lease.acquire(estimate)?;

        buf.put_bytes(0, FRAME_HEADER_SIZE);
        buf.put_slice(prefix);
        self.encoder.encode_into(headers, buf)?;

        let payload_len = buf.len() - FRAME_HEADER_SIZE;
        debug!(
            stream_id,
            fields = headers.len(),
            compressed = payload_len - prefix.len(),
            table_size = self.encoder.table().size(),
            "encoded header block"
        );

        if payload_len <= max {
            let header = FrameHeader::new(
                payload_len as u32,
                first_type,
                first_flags | flags::END_HEADERS,
                stream_id,
            );
            patch_header(buf, 0, header);
            return Ok(lease);
        }

        let mut rest = buf.split_off(FRAME_HEADER_SIZE + max);
        patch_header(buf, 0, FrameHeader::new(max as u32, first_type, first_flags, stream_id));

        while !rest.is_empty() {
            let chunk = rest.split_to(max.min(rest.len()));
            let end = if rest.is_empty() { flags::END_HEADERS } else { 0 };
            let header = FrameHeader::new(chunk.len() as u32, frame_type::CONTINUATION, end, stream_id);
            append_frame(buf, header, &chunk);
        }
        Ok(lease)
    }

    /// DATA, split at the max frame size; END_STREAM goes on the last frame.
    pub fn data(&mut self, stream_id: u32, data: &[u8], end_stream: bool) -> Result<Lease> {
        let max = check_frame_size(self.config.max_frame_size)?;
        check_stream_id(stream_id, "DATA")?;

        let frames = data.len().div_ceil(max).max(1);
        let mut lease = Lease::new(self.pool.clone());
        let buf = lease.acquire(data.len() + frames * FRAME_HEADER_SIZE)?;

        let mut chunks = data.chunks(max).peekable();
        if chunks.peek().is_none() {
            let end = if end_stream { flags::END_STREAM } else { 0 };
            append_frame(buf, FrameHeader::new(0, frame_type::DATA, end, stream_id), &[]);
        }
        while let Some(chunk) = chunks.next() {
            let end = if end_stream && chunks.peek().is_none() {
                flags::END_STREAM
            } else {
                0
            };
            let header = FrameHeader::new(chunk.len() as u32, frame_type::DATA, end, stream_id);
            append_frame(buf, header, chunk);
        }
        Ok(lease)
    }

    /// Standalone PRIORITY frame.
    pub fn priority(&mut self, priority: &PriorityFrame) -> Result<Lease> {
        check_stream_id(priority.stream_id, "PRIORITY")?;
        priority.validate()?;
        let mut payload = BytesMut::with_capacity(PriorityFrame::LENGTH);
        priority.write_payload(&mut payload);
        self.single_frame(frame_type::PRIORITY, 0, priority.stream_id, &payload)
    }

    /// RST_STREAM carrying `error_code`.
    pub fn rst_stream(&mut self, stream_id: u32, error_code: u32) -> Result<Lease> {
        check_stream_id(stream_id, "RST_STREAM")?;
        self.single_frame(frame_type::RST_STREAM, 0, stream_id, &error_code.to_be_bytes())
    }

    /// SETTINGS with `(identifier, value)` pairs in order.
    pub fn settings(&mut self, settings: &[(u16, u32)]) -> Result<Lease> {
        let mut payload = BytesMut::with_capacity(settings.len() * 6);
        for &(id, value) in settings {
            payload.put_u16(id);
            payload.put_u32(value);
        }
        self.single_frame(frame_type::SETTINGS, 0, 0, &payload)
    }

    /// Empty SETTINGS with ACK.
    pub fn settings_ack(&mut self) -> Result<Lease> {
        self.single_frame(frame_type::SETTINGS, flags::ACK, 0, &[])
    }

    /// PING, or its ACK when `ack` is set.
    pub fn ping(&mut self, data: [u8; 8], ack: bool) -> Result<Lease> {
        let flags = if ack { flags::ACK } else { 0 };
        self.single_frame(frame_type::PING, flags, 0, &data)
    }

    /// GOAWAY naming the last stream processed, with optional debug data.
    pub fn goaway(&mut self, last_stream_id: u32, error_code: u32, debug_data: &[u8]) -> Result<Lease> {
        if last_stream_id > MAX_STREAM_ID {
            return Err(H2Error::protocol(format!(
                "GOAWAY last stream id {} exceeds 31 bits",
                last_stream_id
            )));
        }
        let mut payload = BytesMut::with_capacity(8 + debug_data.len());
        payload.put_u32(last_stream_id);
        payload.put_u32(error_code);
        payload.put_slice(debug_data);
        self.single_frame(frame_type::GOAWAY, 0, 0, &payload)
    }

    /// WINDOW_UPDATE; stream 0 updates the connection window.
    pub fn window_update(&mut self, stream_id: u32, increment: u32) -> Result<Lease> {
        if stream_id > MAX_STREAM_ID {
            return Err(H2Error::protocol(format!(
                "WINDOW_UPDATE on invalid stream id {}",
                stream_id
            )));
        }
        if increment == 0 || increment > MAX_STREAM_ID {
            return Err(H2Error::protocol(format!(
                "window increment {} outside 1..=2^31-1",
                increment
            )));
        }
        self.single_frame(frame_type::WINDOW_UPDATE, 0, stream_id, &increment.to_be_bytes())
    }

    fn single_frame(&mut self, frame_type: u8, flags: u8, stream_id: u32, payload: &[u8]) -> Result<Lease> {
        if payload.len() > self.config.max_frame_size as usize {
            return Err(H2Error::frame_size(format!(
                "{} payload of {} bytes exceeds max frame size {}",
                frame_type::name(frame_type),
                payload.len(),
                self.config.max_frame_size
            )));
        }
        let mut lease = Lease::new(self.pool.clone());
        let buf = lease.acquire(FRAME_HEADER_SIZE + payload.len())?;
        append_frame(buf, FrameHeader::new(payload.len() as u32, frame_type, flags, stream_id), payload);
        Ok(lease)
    }
}

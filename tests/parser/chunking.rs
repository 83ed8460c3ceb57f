//! Tests that delivered events do not depend on how input is chunked

use h2_framing::{
    error_code, settings_id, BufferPool, Generator, H2Event, H2Header, HeadersFrame, Parser, ParserState,
    PriorityFrame,
};

fn conversation() -> Vec<u8> {
    let mut generator = Generator::new(BufferPool::new());
    let mut wire = Vec::new();

    wire.extend(generator.settings(&[(settings_id::MAX_CONCURRENT_STREAMS, 100)]).unwrap().to_vec());
    wire.extend(generator.settings_ack().unwrap().to_vec());

    let request = HeadersFrame::new(
        1,
        vec![
            H2Header::new(":method", "POST"),
            H2Header::new(":scheme", "https"),
            H2Header::new(":authority", "example.com"),
            H2Header::new(":path", "/upload"),
            H2Header::new("content-type", "text/plain"),
        ],
    )
    .with_priority(PriorityFrame::new(1, 0, 32, false));
    wire.extend(generator.headers(&request).unwrap().to_vec());
    wire.extend(generator.data(1, b"hello world", true).unwrap().to_vec());

    // Forced into CONTINUATION frames, reusing the dynamic table entries above
    let big = HeadersFrame::new(
        3,
        vec![
            H2Header::new(":method", "GET"),
            H2Header::new(":scheme", "https"),
            H2Header::new(":authority", "example.com"),
            H2Header::new(":path", "/download"),
            H2Header::new("x-request-id", "0123456789abcdef0123456789abcdef"),
        ],
    )
    .with_end_stream(true);
    wire.extend(generator.generate_headers(&big, 16).unwrap().to_vec());

    wire.extend(generator.ping([1, 2, 3, 4, 5, 6, 7, 8], false).unwrap().to_vec());
    wire.extend(generator.window_update(0, 65_535).unwrap().to_vec());
    wire.extend(generator.rst_stream(3, error_code::CANCEL).unwrap().to_vec());
    wire.extend(generator.goaway(3, error_code::NO_ERROR, b"done").unwrap().to_vec());
    wire
}

fn parse_in_chunks(wire: &[u8], chunk_size: usize) -> Vec<H2Event> {
    let mut parser = Parser::new(Vec::<H2Event>::new());
    for chunk in wire.chunks(chunk_size) {
        parser.feed(chunk).unwrap();
    }
    assert_eq!(parser.state(), ParserState::AwaitingFrameHeader);
    parser.into_listener()
}

#[test]
fn test_whole_buffer_events() {
    let wire = conversation();
    let events = parse_in_chunks(&wire, wire.len());

    assert_eq!(events.len(), 9);
    match &events[4] {
        H2Event::Headers(headers) => {
            assert_eq!(headers.stream_id, 3);
            assert!(headers.end_stream);
            assert_eq!(headers.headers[4].value, "0123456789abcdef0123456789abcdef");
        }
        _ => panic!("Expected Headers event"),
    }
}

#[test]
fn test_one_byte_at_a_time_matches_whole_buffer() {
    let wire = conversation();
    assert_eq!(parse_in_chunks(&wire, 1), parse_in_chunks(&wire, wire.len()));
}

#[test]
fn test_arbitrary_chunk_sizes_match_whole_buffer() {
    let wire = conversation();
    let expected = parse_in_chunks(&wire, wire.len());
    for chunk_size in [2, 3, 5, 7, 9, 10, 13, 64, 100] {
        assert_eq!(parse_in_chunks(&wire, chunk_size), expected, "chunk size {}", chunk_size);
    }
}

#[test]
fn test_irregular_chunks_match_whole_buffer() {
    let wire = conversation();
    let expected = parse_in_chunks(&wire, wire.len());

    let mut parser = Parser::new(Vec::<H2Event>::new());
    let sizes = [1, 8, 2, 17, 3, 9, 30];
    let mut pos = 0;
    let mut i = 0;
    while pos < wire.len() {
        let end = (pos + sizes[i % sizes.len()]).min(wire.len());
        parser.feed(&wire[pos..end]).unwrap();
        pos = end;
        i += 1;
    }
    assert_eq!(parser.into_listener(), expected);
}

#[test]
fn test_empty_feed_is_a_no_op() {
    let wire = conversation();
    let mut parser = Parser::new(Vec::<H2Event>::new());
    parser.feed(&[]).unwrap();
    parser.feed(&wire[..4]).unwrap();
    parser.feed(&[]).unwrap();
    parser.feed(&wire[4..]).unwrap();
    assert_eq!(parser.into_listener(), parse_in_chunks(&wire, wire.len()));
}

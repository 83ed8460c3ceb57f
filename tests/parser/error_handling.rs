//! Tests for fatal error classification and the failed state

use h2_framing::{
    error_code, flags, frame_type, H2Error, H2Event, HpackError, Listener, Parser, ParserConfig, ParserState,
};

use super::{frame, init_tracing};

#[derive(Debug, Default)]
struct Recorder {
    events: Vec<H2Event>,
    failures: Vec<H2Error>,
}

impl Listener for Recorder {
    fn on_event(&mut self, event: H2Event) {
        self.events.push(event);
    }

    fn on_connection_failure(&mut self, error: &H2Error) {
        self.failures.push(error.clone());
    }
}

fn parse_error(bytes: &[u8]) -> H2Error {
    let mut parser = Parser::new(Vec::<H2Event>::new());
    parser.process(bytes).unwrap_err()
}

#[test]
fn test_fixed_length_violations_are_frame_size_errors() {
    let cases = [
        frame(frame_type::WINDOW_UPDATE, 0, 1, &[0, 0]),
        frame(frame_type::PING, 0, 0, &[1, 2, 3, 4]),
        frame(frame_type::GOAWAY, 0, 0, &[0, 0, 0, 5]),
        frame(frame_type::RST_STREAM, 0, 1, &[0, 0]),
        frame(frame_type::PRIORITY, 0, 1, &[0, 0, 0, 3]),
        frame(frame_type::SETTINGS, 0, 0, &[0, 1, 0, 0, 0]),
        frame(frame_type::SETTINGS, flags::ACK, 0, &[0, 1, 0, 0, 0x10, 0]),
    ];
    for bytes in &cases {
        let err = parse_error(bytes);
        assert!(matches!(err, H2Error::FrameSize(_)), "{:?} for type {}", err, bytes[3]);
        assert_eq!(err.error_code(), error_code::FRAME_SIZE_ERROR);
    }
}

#[test]
fn test_frame_larger_than_max_frame_size() {
    // Only the 9-byte header is needed to reject it
    let header = [0, 0x40, 0x01, frame_type::DATA, 0, 0, 0, 0, 1];
    let err = parse_error(&header);
    assert!(matches!(err, H2Error::FrameSize(_)));
}

#[test]
fn test_configured_max_frame_size_is_honored() {
    let config = ParserConfig::default().with_max_frame_size(32_768);
    let mut parser = Parser::with_config(config, Vec::<H2Event>::new());

    let payload = vec![0u8; 20_000];
    let events = parser.process(&frame(frame_type::DATA, 0, 1, &payload)).unwrap();
    assert_eq!(events.len(), 1);
}

#[test]
fn test_stream_id_rules() {
    let stream_zero = [
        frame(frame_type::DATA, 0, 0, b"x"),
        frame(frame_type::HEADERS, flags::END_HEADERS, 0, &[0x82]),
        frame(frame_type::PRIORITY, 0, 0, &[0, 0, 0, 1, 0]),
        frame(frame_type::RST_STREAM, 0, 0, &[0, 0, 0, 0]),
    ];
    for bytes in &stream_zero {
        assert!(matches!(parse_error(bytes), H2Error::Protocol(_)));
    }

    let non_zero = [
        frame(frame_type::SETTINGS, 0, 1, &[]),
        frame(frame_type::PING, 0, 1, &[0; 8]),
        frame(frame_type::GOAWAY, 0, 1, &[0; 8]),
    ];
    for bytes in &non_zero {
        assert!(matches!(parse_error(bytes), H2Error::Protocol(_)));
    }
}

#[test]
fn test_padded_data_frame_invalid_padding() {
    // Pad length 10 > payload (only 5 bytes after pad length)
    let payload = [10, b'h', b'e', b'l', b'l', b'o'];
    let err = parse_error(&frame(frame_type::DATA, flags::PADDED, 1, &payload));
    assert!(matches!(err, H2Error::Protocol(_)));
}

#[test]
fn test_padded_headers_without_pad_length() {
    let err = parse_error(&frame(frame_type::HEADERS, flags::PADDED | flags::END_HEADERS, 1, &[]));
    assert!(matches!(err, H2Error::Protocol(_)));
}

#[test]
fn test_self_dependent_priority_is_protocol_error() {
    let err = parse_error(&frame(frame_type::PRIORITY, 0, 7, &[0, 0, 0, 7, 16]));
    assert!(matches!(err, H2Error::Protocol(_)));

    let headers = frame(
        frame_type::HEADERS,
        flags::PRIORITY | flags::END_HEADERS,
        7,
        &[0, 0, 0, 7, 16, 0x82],
    );
    assert!(matches!(parse_error(&headers), H2Error::Protocol(_)));
}

#[test]
fn test_strict_mode_rejects_reserved_bit() {
    let mut bytes = frame(frame_type::DATA, 0, 1, b"x");
    bytes[5] |= 0x80;

    let config = ParserConfig::default().with_strict(true);
    let mut parser = Parser::with_config(config, Vec::<H2Event>::new());
    assert!(matches!(parser.process(&bytes), Err(H2Error::Protocol(_))));
}

#[test]
fn test_bad_index_is_compression_error() {
    // Index 62 with an empty dynamic table
    let err = parse_error(&frame(frame_type::HEADERS, flags::END_HEADERS, 1, &[0xbe]));
    assert_eq!(err, H2Error::Compression(HpackError::InvalidIndex(62)));
    assert_eq!(err.error_code(), error_code::COMPRESSION_ERROR);
    assert!(err.is_fatal());
}

#[test]
fn test_header_list_limit_is_compression_error() {
    let config = ParserConfig::default().with_max_header_list_size(40);
    let mut parser = Parser::with_config(config, Vec::<H2Event>::new());

    let err = parser
        .process(&frame(frame_type::HEADERS, flags::END_HEADERS, 1, &[0x82]))
        .unwrap_err();
    assert!(matches!(
        err,
        H2Error::Compression(HpackError::HeaderListTooLarge { size: 42, max: 40 })
    ));
}

#[test]
fn test_listener_notified_once_and_no_events_after_failure() {
    init_tracing();
    let mut parser = Parser::new(Recorder::default());

    let mut data = frame(frame_type::DATA, 0, 1, b"before");
    data.extend(frame(frame_type::HEADERS, flags::END_HEADERS, 1, &[0x80]));
    data.extend(frame(frame_type::DATA, 0, 1, b"after"));

    let err = parser.feed(&data).unwrap_err();
    assert_eq!(err, H2Error::Compression(HpackError::InvalidIndex(0)));

    // Events before the failure were delivered, nothing after it
    assert_eq!(parser.listener().events.len(), 1);
    assert_eq!(parser.listener().failures, vec![err.clone()]);

    assert_eq!(parser.feed(&frame(frame_type::DATA, 0, 1, b"more")), Err(err));
    assert_eq!(parser.listener().events.len(), 1);
    assert_eq!(parser.listener().failures.len(), 1);
    assert_eq!(parser.state(), ParserState::Failed);
}

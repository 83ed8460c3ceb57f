//! Tests for HPACK decoding

use h2_framing::{H2Header, HpackDecoder, HpackError};

#[test]
fn test_decode_indexed_header() {
    let mut decoder = HpackDecoder::new();

    // 0x82 = indexed header, index 2 = :method: GET
    let headers = decoder.decode(&[0x82]).unwrap();

    assert_eq!(headers.len(), 1);
    assert_eq!(headers[0].name, ":method");
    assert_eq!(headers[0].value, "GET");
}

#[test]
fn test_decode_multiple_indexed_headers() {
    let mut decoder = HpackDecoder::new();

    // 0x82 = :method: GET, 0x86 = :scheme: http, 0x84 = :path: /
    let headers = decoder.decode(&[0x82, 0x86, 0x84]).unwrap();

    assert_eq!(
        headers,
        vec![
            H2Header::new(":method", "GET"),
            H2Header::new(":scheme", "http"),
            H2Header::new(":path", "/"),
        ]
    );
}

#[test]
fn test_decode_literal_with_indexing() {
    let mut decoder = HpackDecoder::new();

    let data = [
        0x40, // Literal with indexing, new name
        0x06, // Name length: 6
        b'c', b'u', b's', b't', b'o', b'm', //
        0x05, // Value length: 5
        b'v', b'a', b'l', b'u', b'e',
    ];

    let headers = decoder.decode(&data).unwrap();
    assert_eq!(headers, vec![H2Header::new("custom", "value")]);

    // Now addressable as index 62
    assert_eq!(decoder.decode(&[0xbe]).unwrap(), headers);
}

#[test]
fn test_decode_literal_without_indexing() {
    let mut decoder = HpackDecoder::new();

    // 0x04 = without indexing, name index 4 (:path)
    let mut data = vec![0x04, 0x0c];
    data.extend_from_slice(b"/sample/path");

    let headers = decoder.decode(&data).unwrap();
    assert_eq!(headers, vec![H2Header::new(":path", "/sample/path")]);
    assert!(decoder.table().is_empty());
}

#[test]
fn test_decode_never_indexed() {
    let mut decoder = HpackDecoder::new();

    // RFC 7541 C.2.3
    let mut data = vec![0x10, 0x08];
    data.extend_from_slice(b"password");
    data.push(0x06);
    data.extend_from_slice(b"secret");

    let headers = decoder.decode(&data).unwrap();
    assert_eq!(headers, vec![H2Header::new("password", "secret")]);
    assert!(decoder.table().is_empty());
}

#[test]
fn test_decode_rfc7541_c6_responses_with_huffman() {
    // Table capped at 256 bytes forces evictions
    let mut decoder = HpackDecoder::with_capacity(256);

    let first = [
        0x48, 0x82, 0x64, 0x02, 0x58, 0x85, 0xae, 0xc3, 0x77, 0x1a, 0x4b, 0x61, 0x96, 0xd0, 0x7a, 0xbe, 0x94, 0x10,
        0x54, 0xd4, 0x44, 0xa8, 0x20, 0x05, 0x95, 0x04, 0x0b, 0x81, 0x66, 0xe0, 0x82, 0xa6, 0x2d, 0x1b, 0xff, 0x6e,
        0x91, 0x9d, 0x29, 0xad, 0x17, 0x18, 0x63, 0xc7, 0x8f, 0x0b, 0x97, 0xc8, 0xe9, 0xae, 0x82, 0xae, 0x43, 0xd3,
    ];
    let headers = decoder.decode(&first).unwrap();
    assert_eq!(
        headers,
        vec![
            H2Header::new(":status", "302"),
            H2Header::new("cache-control", "private"),
            H2Header::new("date", "Mon, 21 Oct 2013 20:13:21 GMT"),
            H2Header::new("location", "https://www.example.com"),
        ]
    );
    assert_eq!(decoder.table().size(), 222);

    let second = [0x48, 0x83, 0x64, 0x0e, 0xff, 0xc1, 0xc0, 0xbf];
    let headers = decoder.decode(&second).unwrap();
    assert_eq!(headers[0], H2Header::new(":status", "307"));
    assert_eq!(headers[3], H2Header::new("location", "https://www.example.com"));
    assert_eq!(decoder.table().size(), 222);
}

#[test]
fn test_decode_truncated_block() {
    let mut decoder = HpackDecoder::new();
    // Literal name claims 6 bytes, block ends after 3
    assert_eq!(decoder.decode(&[0x40, 0x06, b'c', b'u', b's']), Err(HpackError::Truncated));
    // Multi-byte integer cut short
    assert_eq!(decoder.decode(&[0xff]), Err(HpackError::Truncated));
}

#[test]
fn test_decode_invalid_huffman() {
    let mut decoder = HpackDecoder::new();
    // Huffman value of four 0xff bytes contains EOS
    let data = [0x04, 0x84, 0xff, 0xff, 0xff, 0xff];
    assert_eq!(decoder.decode(&data), Err(HpackError::InvalidHuffman));
}

#[test]
fn test_decode_size_update_rules() {
    let mut decoder = HpackDecoder::new();

    // Two updates at the start are allowed
    let headers = decoder.decode(&[0x20, 0x3f, 0xe1, 0x07, 0x82]).unwrap();
    assert_eq!(headers.len(), 1);
    assert_eq!(decoder.table().max_size(), 1024);

    assert_eq!(decoder.decode(&[0x82, 0x20]), Err(HpackError::SizeUpdateMidBlock));
}

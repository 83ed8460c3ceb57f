//! Tests for dynamic table synchronization between encoder and decoder

use h2_framing::{H2Header, HpackDecoder, HpackEncoder, HpackError};

fn assert_tables_match(encoder: &HpackEncoder, decoder: &HpackDecoder) {
    let enc: Vec<&H2Header> = encoder.table().iter().collect();
    let dec: Vec<&H2Header> = decoder.table().iter().collect();
    assert_eq!(enc, dec);
    assert_eq!(encoder.table().size(), decoder.table().size());
}

#[test]
fn test_tables_stay_identical_across_blocks() {
    let mut encoder = HpackEncoder::new();
    let mut decoder = HpackDecoder::new();

    for i in 0..200 {
        let headers = vec![
            H2Header::new(":method", "GET"),
            H2Header::new(":authority", format!("host-{}.example.com", i % 7)),
            H2Header::new("x-request-id", format!("req-{}", i)),
            H2Header::new("user-agent", "h2-framing-test"),
        ];
        let encoded = encoder.encode(&headers).unwrap();
        assert_eq!(decoder.decode(&encoded).unwrap(), headers);
        assert_tables_match(&encoder, &decoder);
        assert!(encoder.table().size() <= 4096);
    }
}

#[test]
fn test_repeated_block_shrinks_on_second_send() {
    let mut encoder = HpackEncoder::new();
    let headers = vec![
        H2Header::new("x-custom-header", "a fairly long custom value"),
        H2Header::new("accept", "text/html"),
    ];
    let first = encoder.encode(&headers).unwrap();
    let second = encoder.encode(&headers).unwrap();
    assert_eq!(second.len(), 2);
    assert!(second.len() < first.len());
}

#[test]
fn test_capacity_shrink_propagates_to_decoder() {
    let mut encoder = HpackEncoder::new();
    let mut decoder = HpackDecoder::new();

    let headers = vec![
        H2Header::new("x-a", "1111111111"),
        H2Header::new("x-b", "2222222222"),
        H2Header::new("x-c", "3333333333"),
    ];
    let encoded = encoder.encode(&headers).unwrap();
    decoder.decode(&encoded).unwrap();
    assert_eq!(decoder.table().len(), 3);

    encoder.set_capacity(100);
    assert_eq!(encoder.table().len(), 2);

    let encoded = encoder.encode(&[H2Header::new(":method", "GET")]).unwrap();
    decoder.decode(&encoded).unwrap();
    assert_eq!(decoder.table().max_size(), 100);
    assert_tables_match(&encoder, &decoder);
}

#[test]
fn test_zero_capacity_disables_indexing() {
    let mut encoder = HpackEncoder::with_capacity(0);
    let mut decoder = HpackDecoder::with_capacity(0);

    let headers = vec![H2Header::new("x-a", "b")];
    for _ in 0..3 {
        let encoded = encoder.encode(&headers).unwrap();
        assert_eq!(decoder.decode(&encoded).unwrap(), headers);
    }
    assert!(encoder.table().is_empty());
    assert!(decoder.table().is_empty());
}

#[test]
fn test_larger_encoder_table_than_decoder_allows_is_rejected() {
    let mut encoder = HpackEncoder::with_capacity(8192);
    let mut decoder = HpackDecoder::new();

    let encoded = encoder.encode(&[H2Header::new(":method", "GET")]).unwrap();
    assert_eq!(
        decoder.decode(&encoded),
        Err(HpackError::SizeUpdateTooLarge {
            requested: 8192,
            max: 4096
        })
    );
}

#[test]
fn test_decoder_capacity_raised_accepts_larger_table() {
    let mut encoder = HpackEncoder::with_capacity(8192);
    let mut decoder = HpackDecoder::new();
    decoder.set_capacity(8192);

    let headers = vec![H2Header::new("x-big", "v".repeat(5000))];
    let encoded = encoder.encode(&headers).unwrap();
    assert_eq!(decoder.decode(&encoded).unwrap(), headers);
    assert_tables_match(&encoder, &decoder);
    assert_eq!(decoder.table().len(), 1);
}

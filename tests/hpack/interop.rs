//! Cross-checks against an independent HPACK implementation (fluke-hpack)

use h2_framing::{H2Header, HpackDecoder, HpackEncoder};

fn sample_blocks() -> Vec<Vec<H2Header>> {
    vec![
        vec![
            H2Header::new(":method", "GET"),
            H2Header::new(":scheme", "https"),
            H2Header::new(":authority", "www.example.com"),
            H2Header::new(":path", "/"),
            H2Header::new("accept", "text/html"),
        ],
        vec![
            H2Header::new(":method", "POST"),
            H2Header::new(":scheme", "https"),
            H2Header::new(":authority", "www.example.com"),
            H2Header::new(":path", "/submit"),
            H2Header::new("content-type", "application/x-www-form-urlencoded"),
            H2Header::new("authorization", "Bearer abc.def.ghi"),
        ],
        vec![
            H2Header::new(":status", "200"),
            H2Header::new("set-cookie", "id=1; Path=/"),
            H2Header::new("set-cookie", "theme=dark"),
            H2Header::new("x-custom", "value"),
        ],
    ]
}

fn to_pairs(headers: &[H2Header]) -> Vec<(Vec<u8>, Vec<u8>)> {
    headers
        .iter()
        .map(|h| (h.name.as_bytes().to_vec(), h.value.as_bytes().to_vec()))
        .collect()
}

#[test]
fn test_our_encoder_decodes_with_fluke() {
    let mut encoder = HpackEncoder::new();
    let mut fluke = fluke_hpack::Decoder::new();

    for headers in sample_blocks() {
        let block = encoder.encode(&headers).unwrap();
        let decoded = fluke.decode(&block).unwrap();
        assert_eq!(decoded, to_pairs(&headers));
    }
}

#[test]
fn test_size_update_understood_by_fluke() {
    let mut encoder = HpackEncoder::new();
    let mut fluke = fluke_hpack::Decoder::new();

    let blocks = sample_blocks();
    fluke.decode(&encoder.encode(&blocks[0]).unwrap()).unwrap();

    encoder.set_capacity(64);
    let block = encoder.encode(&blocks[1]).unwrap();
    assert_eq!(fluke.decode(&block).unwrap(), to_pairs(&blocks[1]));
}

#[test]
fn test_fluke_encoder_decodes_with_ours() {
    let mut fluke = fluke_hpack::Encoder::new();
    let mut decoder = HpackDecoder::new();

    for headers in sample_blocks() {
        let pairs = to_pairs(&headers);
        let refs: Vec<(&[u8], &[u8])> = pairs.iter().map(|(k, v)| (k.as_slice(), v.as_slice())).collect();
        let block = fluke.encode(refs.into_iter());
        assert_eq!(decoder.decode(&block).unwrap(), headers);
    }
}

//! Golden store file vectors
//!
//! Each vector pairs a list of entries with the exact bytes of the store file
//! that holds them. Encoding must reproduce the bytes exactly and decoding
//! must reproduce the entries exactly.

use base64::{Engine, engine::general_purpose::STANDARD as BASE64_STANDARD};
use saltypass::ErrorKind;
use saltypass::binio::BinReader;
use saltypass::record::{self, Entry};
use serde::Deserialize;
use std::fs::File;
use tempfile::TempDir;

#[derive(Debug, Deserialize)]
struct VectorEntry {
    name: String,
    value: String,
}

#[derive(Debug, Deserialize)]
struct GoldenVector {
    entries: Vec<VectorEntry>,
    encoded: String,
    comment: String,
}

fn load_golden_vectors() -> Vec<GoldenVector> {
    let json_data = include_str!("../testdata/store-vectors.json");
    serde_json::from_str(json_data).expect("failed to parse golden vectors")
}

fn entries_of(vector: &GoldenVector) -> Vec<Entry> {
    vector
        .entries
        .iter()
        .map(|e| Entry::new(e.name.as_str(), e.value.as_str()))
        .collect()
}

#[test]
fn test_encode_matches_golden_bytes() {
    let vectors = load_golden_vectors();
    assert!(!vectors.is_empty(), "No golden vectors were loaded");

    for (i, vector) in vectors.iter().enumerate() {
        let expected = BASE64_STANDARD
            .decode(&vector.encoded)
            .expect("failed to decode vector bytes");
        let encoded = record::encode(&entries_of(vector)).unwrap();
        assert_eq!(
            encoded, expected,
            "vector {i} ({}): encoded bytes differ",
            vector.comment
        );
    }
}

#[test]
fn test_decode_matches_golden_entries() {
    for (i, vector) in load_golden_vectors().iter().enumerate() {
        let bytes = BASE64_STANDARD.decode(&vector.encoded).unwrap();
        let decoded = record::decode(&bytes).unwrap();
        assert_eq!(
            decoded,
            entries_of(vector),
            "vector {i} ({}): decoded entries differ",
            vector.comment
        );
    }
}

#[test]
fn test_every_truncation_is_rejected() {
    for vector in load_golden_vectors() {
        let bytes = BASE64_STANDARD.decode(&vector.encoded).unwrap();
        for cut in 0..bytes.len() {
            let err = record::decode(&bytes[..cut]).expect_err("truncated store must not decode");
            assert_eq!(
                err.kind,
                Some(ErrorKind::TruncatedInput),
                "{}: cut at {cut}",
                vector.comment
            );
        }
    }
}

#[test]
fn test_decode_from_file_medium() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("vectors.bin");

    // All vectors back to back; each decode must stop exactly at its end.
    let vectors = load_golden_vectors();
    let mut all = Vec::new();
    for vector in &vectors {
        all.extend(BASE64_STANDARD.decode(&vector.encoded).unwrap());
    }
    std::fs::write(&path, &all).unwrap();

    let mut reader = BinReader::new(File::open(&path).unwrap());
    for vector in &vectors {
        let decoded = record::read_entries(&mut reader).unwrap();
        assert_eq!(decoded, entries_of(vector), "{}", vector.comment);
    }
    assert_eq!(reader.tell().unwrap(), all.len() as u64);
}

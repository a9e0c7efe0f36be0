//! Failure-path tests for the volume decoder.
//!
//! Four categories:
//!
//! - **Metadata**: missing frame, unsupported type, missing dimension.
//!   The messages are part of the public surface and are pinned exactly.
//! - **Codec**: payloads rejected at the bound check versus payloads that
//!   fail during decompression.
//! - **Allocation**: the engine refusing the source or the destination
//!   buffer.
//! - **Buffer release**: after every failure the instrumented engine must
//!   report as many frees as successful allocations.

use zvol_decoder::{DecodeError, DecoderConfig, VolumeDecoder};
use zvol_engine::{EngineConfig, ZstdEngine};
use zvol_tests::{ContainerBuilder, CountingEngine, golden, metadata_frame};
use zvol_wire::MetadataError;

const HEADER: &str = r#"{"type":"uint8","xSize":2,"ySize":2,"zSize":3}"#;
const PAYLOAD: [u8; 12] = [0, 1, 10, 11, 100, 101, 110, 111, 200, 201, 210, 211];

fn counting() -> CountingEngine<ZstdEngine> {
    CountingEngine::new(ZstdEngine::new(EngineConfig::default()).unwrap())
}

fn decode_err(engine: &CountingEngine<ZstdEngine>, bytes: &[u8]) -> DecodeError {
    let err = VolumeDecoder::default()
        .decode(engine, bytes)
        .expect_err("decode should fail");
    assert!(
        engine.balanced(),
        "{} allocations, {} frees after `{err}`",
        engine.allocations(),
        engine.frees()
    );
    assert_eq!(engine.inner().live_allocations(), 0);
    err
}

// ── Metadata ──────────────────────────────────────────────────────────

#[test]
fn missing_metadata_frame() {
    let engine = counting();
    let err = decode_err(&engine, &golden("edge_cases/no_metadata.zvol"));

    assert_eq!(err.to_string(), "failed to parse metadata: no metadata frame");
    assert!(matches!(
        err,
        DecodeError::Metadata(MetadataError::NoMetadataFrame)
    ));
    assert_eq!(engine.malloc_calls(), 0);
}

#[test]
fn short_buffers_have_no_metadata_frame() {
    let engine = counting();
    let cases: [&[u8]; 3] = [&[], &[0x50], &[0x50, 0x2A, 0x4D]];
    for bytes in cases {
        let err = decode_err(&engine, bytes);
        assert!(matches!(
            err,
            DecodeError::Metadata(MetadataError::NoMetadataFrame)
        ));
    }
}

#[test]
fn unsupported_type() {
    let err = decode_err(&counting(), &golden("edge_cases/unsupported_type.zvol"));
    insta::assert_snapshot!(
        err.to_string(),
        @"failed to parse metadata: got `u8` data type, expected one of int8, int16, int32, int64, uint8, uint16, uint32, uint64, float32, float64"
    );
}

#[test]
fn missing_dimension() {
    let err = decode_err(&counting(), &golden("edge_cases/missing_zsize.zvol"));
    insta::assert_snapshot!(
        err.to_string(),
        @"failed to parse metadata: got `{xSize: 2, ySize: 2, zSize: undefined}` dimensions, expected numbers"
    );
}

#[test]
fn non_numeric_dimensions_are_echoed() {
    let bytes = ContainerBuilder::new(r#"{"type":"int8","xSize":"2","ySize":null,"zSize":-1}"#)
        .payload(PAYLOAD)
        .build()
        .unwrap();
    let err = decode_err(&counting(), &bytes);
    insta::assert_snapshot!(
        err.to_string(),
        @"failed to parse metadata: got `{xSize: 2, ySize: null, zSize: -1}` dimensions, expected numbers"
    );
}

#[test]
fn type_is_checked_before_dimensions() {
    let bytes = ContainerBuilder::new(r#"{"type":"float16"}"#)
        .payload(PAYLOAD)
        .build()
        .unwrap();
    let err = decode_err(&counting(), &bytes);
    assert!(matches!(
        err,
        DecodeError::Metadata(MetadataError::UnsupportedType { ref found }) if found == "float16"
    ));
}

#[test]
fn truncated_header() {
    let mut bytes = metadata_frame(0x184D_2A50, HEADER.as_bytes());
    bytes.truncate(20);
    let err = decode_err(&counting(), &bytes);
    assert!(matches!(
        err,
        DecodeError::Metadata(MetadataError::Truncated { available: 20, .. })
    ));
}

#[test]
fn oversized_header_is_rejected() {
    let bytes = ContainerBuilder::new(HEADER).payload(PAYLOAD).build().unwrap();
    let decoder = VolumeDecoder::new(DecoderConfig {
        max_header_length: 16,
        ..DecoderConfig::default()
    });

    let err = decoder.decode(&counting(), &bytes).unwrap_err();
    assert!(matches!(
        err,
        DecodeError::Metadata(MetadataError::HeaderTooLarge { limit: 16, .. })
    ));
}

#[test]
fn malformed_json() {
    let bytes = ContainerBuilder::new("{type: uint8").payload(PAYLOAD).build().unwrap();
    let err = decode_err(&counting(), &bytes);
    assert!(matches!(
        err,
        DecodeError::Metadata(MetadataError::MalformedJson(_))
    ));
}

// ── Codec ─────────────────────────────────────────────────────────────

#[test]
fn frame_without_payload_is_invalid_compressed_data() {
    let engine = counting();
    let err = decode_err(&engine, &golden("edge_cases/no_payload.zvol"));

    assert_eq!(err.to_string(), "invalid compressed data");
    // Rejected at the bound check: no destination buffer was allocated.
    assert_eq!(engine.allocations(), 1);
}

#[test]
fn empty_payload_is_invalid_compressed_data() {
    // A zstd frame of zero bytes reports a zero bound.
    let bytes = ContainerBuilder::new(r#"{"type":"uint8","xSize":0,"ySize":0,"zSize":0}"#)
        .build()
        .unwrap();
    let err = decode_err(&counting(), &bytes);
    assert!(matches!(err, DecodeError::InvalidCompressedData));
}

#[test]
fn garbage_after_frame_is_invalid_compressed_data() {
    let mut bytes = metadata_frame(0x184D_2A50, HEADER.as_bytes());
    bytes.extend_from_slice(b"this is not a zstd frame at all");

    let err = decode_err(&counting(), &bytes);
    assert!(matches!(err, DecodeError::InvalidCompressedData));
}

#[test]
fn corrupt_checksum_fails_decompression() {
    let engine = counting();
    let err = decode_err(&engine, &golden("edge_cases/corrupt_checksum.zvol"));

    assert_eq!(err.to_string(), "decompression failed");
    assert_eq!(engine.allocations(), 2);
}

#[test]
fn built_corrupt_checksum_fails_decompression() {
    let bytes = ContainerBuilder::new(HEADER)
        .payload(vec![9u8; 4096])
        .corrupt_checksum()
        .build()
        .unwrap();
    let err = decode_err(&counting(), &bytes);
    assert!(matches!(err, DecodeError::DecompressionFailed));
}

#[test]
fn partial_element() {
    let bytes = ContainerBuilder::new(r#"{"type":"float64","xSize":1,"ySize":1,"zSize":1}"#)
        .payload([0u8; 12])
        .build()
        .unwrap();
    let err = decode_err(&counting(), &bytes);
    insta::assert_snapshot!(
        err.to_string(),
        @"decompressed size 12 is not a multiple of the float64 element width (8 bytes)"
    );
}

// ── Allocation ────────────────────────────────────────────────────────

#[test]
fn source_allocation_refused() {
    let engine = counting().fail_allocation(1);
    let err = decode_err(&engine, &golden("uint8_2x2x3.zvol"));

    assert_eq!(err.to_string(), "failed to allocate memory for zstd buffer");
    assert_eq!(engine.malloc_calls(), 1);
    assert_eq!(engine.allocations(), 0);
}

#[test]
fn destination_allocation_refused() {
    let engine = counting().fail_allocation(2);
    let err = decode_err(&engine, &golden("uint8_2x2x3.zvol"));

    assert!(matches!(err, DecodeError::AllocationFailed { size: 12 }));
    assert_eq!(engine.malloc_calls(), 2);
    assert_eq!(engine.allocations(), 1);
    assert_eq!(engine.frees(), 1);
}

#[test]
fn memory_cap_refuses_destination() {
    let engine = CountingEngine::new(
        ZstdEngine::new(EngineConfig::default().with_max_memory(4096)).unwrap(),
    );
    let bytes = ContainerBuilder::new(r#"{"type":"uint8","xSize":65536,"ySize":1,"zSize":1}"#)
        .payload(vec![0u8; 65_536])
        .build()
        .unwrap();

    let err = decode_err(&engine, &bytes);
    assert!(matches!(err, DecodeError::AllocationFailed { size: 65_536 }));
}

#[test]
fn memory_cap_bounds_overstated_content_size() {
    // A stored frame whose header claims 1 GiB of content but carries 3 bytes.
    let mut bytes = metadata_frame(0x184D_2A50, HEADER.as_bytes());
    bytes.extend_from_slice(&0xFD2F_B528u32.to_le_bytes());
    bytes.push(0xA0);
    bytes.extend_from_slice(&(1u32 << 30).to_le_bytes());
    bytes.extend_from_slice(&[0x19, 0x00, 0x00, 1, 2, 3]);

    let engine = CountingEngine::new(
        ZstdEngine::new(EngineConfig::default().with_max_memory(1 << 20)).unwrap(),
    );
    let err = decode_err(&engine, &bytes);

    assert!(matches!(err, DecodeError::AllocationFailed { size } if size == 1 << 30));
    assert_eq!(engine.malloc_calls(), 2);
    assert_eq!(engine.inner().memory_size(), 8);
}

// ── Buffer release ────────────────────────────────────────────────────

#[test]
fn success_releases_both_buffers() {
    let engine = counting();
    VolumeDecoder::default()
        .decode(&engine, &golden("uint8_2x2x3.zvol"))
        .unwrap();

    assert_eq!(engine.allocations(), 2);
    assert_eq!(engine.frees(), 2);
    assert_eq!(engine.inner().live_allocations(), 0);
}

#[test]
fn engine_is_reusable_after_failures() {
    let engine = counting();
    let decoder = VolumeDecoder::default();

    for fixture in [
        "edge_cases/no_payload.zvol",
        "edge_cases/corrupt_checksum.zvol",
        "edge_cases/unsupported_type.zvol",
    ] {
        assert!(decoder.decode(&engine, &golden(fixture)).is_err());
    }

    let volume = decoder.decode(&engine, &golden("uint8_2x2x3.zvol")).unwrap();
    assert_eq!(volume.len(), 12);
    assert!(engine.balanced());
    assert_eq!(engine.inner().memory_size(), 8);
}

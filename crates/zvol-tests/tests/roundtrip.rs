//! Decode tests for well-formed containers.
//!
//! The golden fixtures hold raw (stored) zstd blocks written by hand, so
//! they exercise the decoder against a byte layout that does not come from
//! the same zstd build the tests link against. The builder-based tests
//! cover every element type with compressed payloads.

use zvol_decoder::{Volume, VolumeData, VolumeDecoder};
use zvol_engine::{EngineConfig, ZstdEngine};
use zvol_tests::{ContainerBuilder, golden, golden_fixtures};
use zvol_wire::{ElementType, Metadata};

fn decode(bytes: &[u8]) -> Volume {
    let engine = ZstdEngine::new(EngineConfig::default()).unwrap();
    let volume = VolumeDecoder::default()
        .decode(&engine, bytes)
        .expect("decode should succeed");
    assert_eq!(engine.live_allocations(), 0, "engine buffers leaked");
    volume
}

// ── Golden fixtures ───────────────────────────────────────────────────

#[test]
fn committed_fixtures_match_generator() {
    for (name, bytes) in golden_fixtures() {
        assert_eq!(golden(name), bytes, "{name} is out of date; run generate_golden");
    }
}

#[test]
fn uint8_volume_matches_flattening_order() {
    let volume = decode(&golden("uint8_2x2x3.zvol"));

    assert_eq!(
        volume.metadata(),
        Metadata {
            element_type: ElementType::Uint8,
            x_size: 2,
            y_size: 2,
            z_size: 3,
        }
    );

    let data = volume.as_slice::<u8>().unwrap();
    assert_eq!(data, &[0, 1, 10, 11, 100, 101, 110, 111, 200, 201, 210, 211]);

    let mut index = 0;
    for z in 0..3u8 {
        for y in 0..2u8 {
            for x in 0..2u8 {
                assert_eq!(data[index], z * 100 + y * 10 + x);
                index += 1;
            }
        }
    }
}

#[test]
fn int16_volume() {
    let volume = decode(&golden("int16_3x1x1.zvol"));
    assert_eq!(volume.data, VolumeData::Int16(vec![-1, 256, 32767]));
}

#[test]
fn float64_volume() {
    let volume = decode(&golden("float64_2x1x1.zvol"));
    assert_eq!(volume.as_slice::<f64>(), Some(&[0.25, -8.0][..]));
}

#[test]
fn magic_low_nibble_is_ignored() {
    let volume = decode(&golden("magic_variant.zvol"));
    assert_eq!(volume.as_slice::<u8>(), Some(&[42][..]));
}

// ── Every element type ────────────────────────────────────────────────

#[test]
fn every_element_type_decodes() {
    for &element_type in ElementType::ALL {
        let metadata = Metadata {
            element_type,
            x_size: 4,
            y_size: 3,
            z_size: 2,
        };
        let payload: Vec<u8> = (0..24 * element_type.width())
            .map(|i| u8::try_from(i % 251).unwrap())
            .collect();

        let bytes = ContainerBuilder::from_metadata(&metadata)
            .unwrap()
            .payload(payload.clone())
            .build()
            .unwrap();
        let volume = decode(&bytes);

        assert_eq!(volume.metadata(), metadata, "{element_type}");
        assert_eq!(volume.len(), 24, "{element_type}");
        assert_eq!(volume.data.element_type(), element_type);
        assert_eq!(volume.data.to_le_bytes(), payload, "{element_type}");
    }
}

#[test]
fn length_matches_declared_dimensions() {
    for (x, y, z) in [(1, 1, 1), (7, 5, 3), (64, 64, 4)] {
        let count = x * y * z;
        let header = format!(r#"{{"type":"int32","xSize":{x},"ySize":{y},"zSize":{z}}}"#);
        let payload: Vec<u8> = (0..count)
            .flat_map(|i| i32::try_from(i).unwrap().to_le_bytes())
            .collect();

        let volume = decode(&ContainerBuilder::new(header).payload(payload).build().unwrap());
        assert_eq!(volume.len(), count);
        assert_eq!(volume.as_slice::<i32>().unwrap()[count - 1], i32::try_from(count - 1).unwrap());
    }
}

#[test]
fn integral_float_dimensions_are_accepted() {
    let bytes = ContainerBuilder::new(r#"{"type":"uint8","xSize":2.0,"ySize":1,"zSize":1}"#)
        .payload([5u8, 6])
        .build()
        .unwrap();
    assert_eq!(decode(&bytes).x_size, 2);
}

#[test]
fn large_volume_roundtrip() {
    let payload: Vec<u8> = (0..(1u32 << 20)).flat_map(|i| (i as u16).to_le_bytes()).collect();
    let header = r#"{"type":"uint16","xSize":1024,"ySize":1024,"zSize":1}"#;

    let bytes = ContainerBuilder::new(header)
        .payload(payload.clone())
        .level(1)
        .build()
        .unwrap();
    assert!(bytes.len() < payload.len());

    let volume = decode(&bytes);
    assert_eq!(volume.len(), 1 << 20);
    assert_eq!(volume.data.to_le_bytes(), payload);
}

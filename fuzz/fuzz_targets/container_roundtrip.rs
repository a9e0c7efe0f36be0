#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use zvol_decoder::VolumeDecoder;
use zvol_engine::{EngineConfig, ZstdEngine};
use zvol_wire::ElementType;

#[derive(Debug, Arbitrary)]
struct Input {
    type_index: u8,
    variant: u8,
    x_size: u16,
    payload: Vec<u8>,
}

// Fuzz target: build a well-formed container from structured input and
// check the decode returns the payload unchanged.
fuzz_target!(|input: Input| {
    let element_type = ElementType::ALL[usize::from(input.type_index) % ElementType::ALL.len()];
    let width = element_type.width();
    let payload = &input.payload[..input.payload.len() / width * width];
    // An empty frame has a zero bound and is rejected as invalid data.
    if payload.is_empty() {
        return;
    }

    let header = format!(
        r#"{{"type":"{}","xSize":{},"ySize":1,"zSize":1}}"#,
        element_type.name(),
        input.x_size
    );
    let magic = 0x184D_2A50_u32 | u32::from(input.variant & 0x0F);

    let mut container = magic.to_le_bytes().to_vec();
    container.extend_from_slice(&(header.len() as u32).to_le_bytes());
    container.extend_from_slice(header.as_bytes());
    container.extend_from_slice(&zstd::bulk::compress(payload, 1).unwrap());

    let engine = ZstdEngine::new(EngineConfig::default()).unwrap();
    let volume = VolumeDecoder::default().decode(&engine, &container).unwrap();

    assert_eq!(volume.element_type, element_type);
    assert_eq!(volume.x_size, u64::from(input.x_size));
    assert_eq!(volume.data.to_le_bytes(), payload);
    assert_eq!(engine.live_allocations(), 0);
});

#![no_main]

use std::sync::OnceLock;

use libfuzzer_sys::fuzz_target;
use zvol_decoder::VolumeDecoder;
use zvol_engine::{EngineConfig, ZstdEngine};

static ENGINE: OnceLock<ZstdEngine> = OnceLock::new();

// Fuzz target: full decode of arbitrary bytes on one shared engine.
//
// The engine is reused across inputs, so a leaked buffer from any failure
// path shows up as a live allocation on the next run.
fuzz_target!(|data: &[u8]| {
    let engine = ENGINE.get_or_init(|| {
        ZstdEngine::new(EngineConfig::default().with_max_memory(64 << 20)).unwrap()
    });

    let _ = VolumeDecoder::default().decode(engine, data);
    assert_eq!(engine.live_allocations(), 0);
});

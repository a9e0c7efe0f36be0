#![no_main]

use libfuzzer_sys::fuzz_target;
use zvol_wire::frame::{MetadataFrame, DEFAULT_MAX_HEADER_LENGTH};

// Fuzz target: metadata frame location and header validation.
//
// Catches bugs in:
// - Magic masking and length-field bounds checks
// - UTF-8 and JSON handling of the header
// - Field rendering for diagnostics (absent, string, nested values)
fuzz_target!(|data: &[u8]| {
    if let Ok(frame) = MetadataFrame::read_from(data, DEFAULT_MAX_HEADER_LENGTH) {
        assert!(frame.frame_len() <= data.len());
        if let Ok(metadata) = frame.metadata() {
            let _ = metadata.voxel_count();
        }
    }
});

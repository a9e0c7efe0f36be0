/// Implementation of `zvol validate`.
///
/// Decodes the whole container and reports either a series of success
/// checkmarks (`✓`) or a diagnostic failure line (`✗`).
///
/// # Success output
///
/// ```text
/// ✓ Metadata: uint8, 2 x 2 x 3
/// ✓ Payload: 12 bytes decompressed
/// ✓ Elements: 12, matching the declared dimensions
/// ```
///
/// # Failure output
///
/// ```text
/// ✗ Error: failed to parse metadata: no metadata frame
/// ```
use std::fs;

use anyhow::{Context, Result, anyhow};
use zvol_decoder::{DecodeError, VolumeDecoder};
use zvol_engine::{EngineConfig, ZstdEngine};
use zvol_wire::MetadataError;

use crate::ValidateArgs;

/// Run the `zvol validate` command.
///
/// # Errors
///
/// Returns an error if the file cannot be read, the engine cannot be
/// created, the container fails to decode, or the element count differs
/// from the declared dimensions.
pub fn run(args: &ValidateArgs, config: EngineConfig) -> Result<()> {
    let bytes =
        fs::read(&args.file).with_context(|| format!("cannot read {}", args.file.display()))?;
    let engine = ZstdEngine::new(config)?;

    let volume = match VolumeDecoder::default().decode(&engine, &bytes) {
        Ok(volume) => volume,
        Err(e) => {
            println!("✗ Error: {}", diagnostic(&e));
            return Err(anyhow!("validation failed"));
        }
    };

    println!(
        "✓ Metadata: {}, {} x {} x {}",
        volume.element_type, volume.x_size, volume.y_size, volume.z_size
    );
    println!(
        "✓ Payload: {} bytes decompressed",
        volume.len() * volume.element_type.width()
    );

    let actual = volume.len() as u64;
    match volume.metadata().voxel_count() {
        Some(expected) if expected == actual => {
            println!("✓ Elements: {actual}, matching the declared dimensions");
            Ok(())
        }
        expected => {
            let expected = expected.map_or_else(|| "an overflowing".to_string(), |n| n.to_string());
            println!("✗ Elements: {actual}, header declares {expected}");
            Err(anyhow!("validation failed"))
        }
    }
}

/// Add a hint to the errors a user is most likely to hit.
fn diagnostic(e: &DecodeError) -> String {
    match e {
        DecodeError::Metadata(MetadataError::NoMetadataFrame) => {
            format!("{e} (is this a bare zstd file?)")
        }
        DecodeError::AllocationFailed { size } => {
            format!("{e} ({size} bytes; try a larger --max-memory)")
        }
        other => other.to_string(),
    }
}

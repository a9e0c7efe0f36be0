/// Implementation of `zvol inspect`.
///
/// Reads only the metadata frame; the payload is never decompressed.
///
/// # Output format
///
/// ```text
/// Frame:    skippable (variant 0x0), 46-byte header
/// Type:     uint8 (1 byte, unsigned)
/// Shape:    2 x 2 x 3 (12 elements, 12 bytes)
/// Payload:  29 compressed bytes
/// ```
use std::fs;

use anyhow::{Context, Result};
use zvol_wire::frame::DEFAULT_MAX_HEADER_LENGTH;
use zvol_wire::{ElementKind, MetadataFrame};

use crate::InspectArgs;

/// Run the `zvol inspect` command.
///
/// # Errors
///
/// Returns an error if the file cannot be read or has no valid metadata
/// frame.
pub fn run(args: &InspectArgs) -> Result<()> {
    let bytes =
        fs::read(&args.file).with_context(|| format!("cannot read {}", args.file.display()))?;

    let frame = MetadataFrame::read_from(&bytes, DEFAULT_MAX_HEADER_LENGTH)
        .with_context(|| format!("failed to parse metadata of {}", args.file.display()))?;
    let metadata = frame
        .metadata()
        .with_context(|| format!("failed to parse metadata of {}", args.file.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&metadata)?);
        return Ok(());
    }

    let element_type = metadata.element_type;
    let width = element_type.width();
    let kind = match element_type.kind() {
        ElementKind::Signed => "signed",
        ElementKind::Unsigned => "unsigned",
        ElementKind::Float => "float",
    };

    println!(
        "Frame:    skippable (variant 0x{:X}), {}-byte header",
        frame.variant,
        frame.header.len()
    );
    println!(
        "Type:     {element_type} ({width} byte{}, {kind})",
        if width == 1 { "" } else { "s" }
    );
    match metadata.voxel_count() {
        Some(count) => println!(
            "Shape:    {} x {} x {} ({count} elements, {} bytes)",
            metadata.x_size,
            metadata.y_size,
            metadata.z_size,
            count.saturating_mul(width as u64)
        ),
        None => println!(
            "Shape:    {} x {} x {} (element count overflows)",
            metadata.x_size, metadata.y_size, metadata.z_size
        ),
    }
    println!(
        "Payload:  {} compressed bytes",
        bytes.len().saturating_sub(frame.frame_len())
    );

    Ok(())
}

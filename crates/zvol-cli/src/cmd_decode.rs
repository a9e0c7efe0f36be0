/// Implementation of `zvol decode`.
///
/// Decodes the container through the async loader and writes the elements
/// as little-endian bytes. A one-line summary goes to stderr so stdout can
/// be piped.
use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use log::debug;
use zvol_decoder::{DecoderConfig, Volume, VolumeDecoder, VolumeLoader};
use zvol_engine::{EngineConfig, IsolatedEngine, SharedEngine, ZstdEngine, ZstdTemplate};

use crate::DecodeArgs;

/// Run the `zvol decode` command.
///
/// # Errors
///
/// Returns an error if the engine cannot be created, the file cannot be
/// read or decoded, or the output cannot be written.
pub async fn run(args: &DecodeArgs, config: EngineConfig) -> Result<()> {
    let decoder = VolumeDecoder::new(DecoderConfig {
        strict_dimensions: args.strict,
        ..DecoderConfig::default()
    });

    let volume = if args.isolated {
        let template = ZstdTemplate::new(config)?;
        let loader = VolumeLoader::new(IsolatedEngine::new(Arc::new(template)), decoder);
        load(&loader, args).await?
    } else {
        let engine = ZstdEngine::new(config)?;
        let loader = VolumeLoader::new(SharedEngine::new(Arc::new(engine)), decoder);
        load(&loader, args).await?
    };

    let bytes = volume.data.to_le_bytes();
    match &args.output {
        Some(path) => tokio::fs::write(path, &bytes)
            .await
            .with_context(|| format!("cannot write {}", path.display()))?,
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&bytes)?;
            stdout.flush()?;
        }
    }

    eprintln!(
        "decoded {} {} elements ({} x {} x {}, {} bytes)",
        volume.len(),
        volume.element_type,
        volume.x_size,
        volume.y_size,
        volume.z_size,
        bytes.len()
    );
    Ok(())
}

async fn load<S: zvol_engine::EngineSource>(
    loader: &VolumeLoader<S>,
    args: &DecodeArgs,
) -> Result<Volume> {
    let file = tokio::fs::File::open(&args.file)
        .await
        .with_context(|| format!("cannot read {}", args.file.display()))?;
    let total = file.metadata().await?.len();

    loader
        .load_reader(file, Some(total), |p| {
            debug!("read {} of {} bytes", p.loaded, total);
        })
        .await
        .with_context(|| format!("failed to decode {}", args.file.display()))
}

use std::path::Path;
use std::sync::Arc;

use log::debug;
use tokio::io::{AsyncRead, AsyncReadExt};
use zvol_engine::{
  EngineSource, IsolatedEngine, SharedEngine, ZstdEngine, ZstdTemplate, load_engine, load_template,
};

use crate::decoder::VolumeDecoder;
use crate::error::DecodeError;
use crate::volume::Volume;

/// Size of each read when buffering a container from a reader.
const READ_CHUNK: usize = 64 * 1024;

/// Bytes received so far while a container is being read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Progress {
  pub loaded: u64,

  /// Expected total, when the source knows it up front.
  pub total: Option<u64>,
}

/// Asynchronous front end over [`VolumeDecoder`].
///
/// The decode itself is CPU-bound, so it runs on the blocking pool and
/// the caller's task only awaits the result. Dropping the returned future
/// does not interrupt a decode that already started: the blocking task
/// runs to completion and releases its engine buffers.
///
/// ```rust,no_run
/// use zvol_decoder::VolumeLoader;
///
/// async fn open(path: &str) {
///     let loader = VolumeLoader::shared().await.unwrap();
///     let volume = loader.load_path(path).await.unwrap();
///     println!("{} elements", volume.len());
/// }
/// ```
pub struct VolumeLoader<S> {
  source: Arc<S>,
  decoder: VolumeDecoder,
}

impl<S> Clone for VolumeLoader<S> {
  fn clone(&self) -> Self {
    Self {
      source: Arc::clone(&self.source),
      decoder: self.decoder,
    }
  }
}

impl VolumeLoader<SharedEngine<ZstdEngine>> {
  /// A loader over the process-wide shared engine.
  ///
  /// # Errors
  ///
  /// [`DecodeError::Load`] if the engine failed to load.
  pub async fn shared() -> Result<Self, DecodeError> {
    let engine = load_engine().await?;
    Ok(Self::new(SharedEngine::new(engine), VolumeDecoder::default()))
  }
}

impl VolumeLoader<IsolatedEngine<ZstdTemplate>> {
  /// A loader that instantiates a fresh engine per decode from the
  /// process-wide template.
  ///
  /// # Errors
  ///
  /// [`DecodeError::Load`] if the template failed to load.
  pub async fn isolated() -> Result<Self, DecodeError> {
    let template = load_template().await?;
    Ok(Self::new(IsolatedEngine::new(template), VolumeDecoder::default()))
  }
}

impl<S: EngineSource> VolumeLoader<S> {
  pub fn new(source: S, decoder: VolumeDecoder) -> Self {
    Self {
      source: Arc::new(source),
      decoder,
    }
  }

  /// Replace the decoder (and so its configuration).
  #[must_use]
  pub fn with_decoder(mut self, decoder: VolumeDecoder) -> Self {
    self.decoder = decoder;
    self
  }

  pub fn source(&self) -> &S {
    &self.source
  }

  /// Decode an in-memory container.
  ///
  /// # Errors
  ///
  /// - Everything [`VolumeDecoder::decode_with`] returns.
  /// - [`DecodeError::Interrupted`] if the blocking task panicked or the
  ///   runtime shut down.
  pub async fn decode(&self, bytes: Vec<u8>) -> Result<Volume, DecodeError> {
    let source = Arc::clone(&self.source);
    let decoder = self.decoder;

    tokio::task::spawn_blocking(move || decoder.decode_with(&*source, &bytes))
      .await
      .map_err(|e| DecodeError::Interrupted(e.to_string()))?
  }

  /// Read a whole container from `reader`, reporting progress after
  /// every chunk, then decode it.
  ///
  /// `total` is passed through to the callback unchanged; it also sizes
  /// the read buffer up front when known.
  ///
  /// # Errors
  ///
  /// [`DecodeError::Io`] if reading fails, plus everything
  /// [`decode`](Self::decode) returns.
  pub async fn load_reader<R, F>(
    &self,
    mut reader: R,
    total: Option<u64>,
    mut on_progress: F,
  ) -> Result<Volume, DecodeError>
  where
    R: AsyncRead + Unpin,
    F: FnMut(Progress),
  {
    let capacity = total.and_then(|t| usize::try_from(t).ok()).unwrap_or(0);
    let mut bytes = Vec::with_capacity(capacity);
    let mut chunk = vec![0u8; READ_CHUNK];

    loop {
      let n = reader.read(&mut chunk).await?;
      if n == 0 {
        break;
      }
      bytes.extend_from_slice(&chunk[..n]);
      on_progress(Progress {
        loaded: bytes.len() as u64,
        total,
      });
    }

    debug!("read {} byte container", bytes.len());
    self.decode(bytes).await
  }

  /// Read and decode the container stored at `path`.
  ///
  /// # Errors
  ///
  /// [`DecodeError::Io`] if the file cannot be opened or read, plus
  /// everything [`decode`](Self::decode) returns.
  pub async fn load_path(&self, path: impl AsRef<Path>) -> Result<Volume, DecodeError> {
    let path = path.as_ref();
    let file = tokio::fs::File::open(path).await?;
    let total = file.metadata().await?.len();
    debug!("loading {}", path.display());
    self.load_reader(file, Some(total), |_| {}).await
  }
}

#[cfg(test)]
mod tests {
  use zvol_engine::EngineConfig;

  use super::*;
  use crate::DecoderConfig;

  fn container(header: &str, payload: &[u8]) -> Vec<u8> {
    let mut buf = 0x184D_2A50_u32.to_le_bytes().to_vec();
    buf.extend_from_slice(&u32::try_from(header.len()).unwrap().to_le_bytes());
    buf.extend_from_slice(header.as_bytes());
    buf.extend_from_slice(&zstd::bulk::compress(payload, 3).unwrap());
    buf
  }

  fn ramp(n: u32) -> (String, Vec<u8>) {
    let header = format!(r#"{{"type":"uint32","xSize":{n},"ySize":1,"zSize":1}}"#);
    let payload = (0..n).flat_map(u32::to_le_bytes).collect();
    (header, payload)
  }

  #[tokio::test]
  async fn concurrent_decodes_on_shared_engine() {
    let engine = Arc::new(ZstdEngine::new(EngineConfig::default()).unwrap());
    let loader = VolumeLoader::new(SharedEngine::new(Arc::clone(&engine)), VolumeDecoder::default());

    let mut handles = Vec::new();
    for n in 1..=16u32 {
      let loader = loader.clone();
      let (header, payload) = ramp(n * 1000);
      handles.push(tokio::spawn(async move {
        loader.decode(container(&header, &payload)).await
      }));
    }

    for (i, handle) in handles.into_iter().enumerate() {
      let volume = handle.await.unwrap().unwrap();
      let n = (i as u32 + 1) * 1000;
      let values = volume.as_slice::<u32>().unwrap();
      assert_eq!(values.len(), n as usize);
      assert!(values.iter().copied().eq(0..n));
    }
    assert_eq!(engine.live_allocations(), 0);
  }

  #[tokio::test]
  async fn isolated_loader_decodes() {
    let loader = VolumeLoader::isolated().await.unwrap();
    let (header, payload) = ramp(64);

    let volume = loader.decode(container(&header, &payload)).await.unwrap();
    assert_eq!(volume.x_size, 64);
    assert_eq!(volume.len(), 64);
  }

  #[tokio::test]
  async fn reader_reports_progress() {
    let loader = VolumeLoader::shared().await.unwrap();
    let (header, payload) = ramp(100_000);
    let bytes = container(&header, &payload);
    let total = bytes.len() as u64;

    let mut seen = Vec::new();
    let volume = loader
      .load_reader(&bytes[..], Some(total), |p| seen.push(p))
      .await
      .unwrap();

    assert_eq!(volume.len(), 100_000);
    assert!(!seen.is_empty());
    assert!(seen.windows(2).all(|w| w[0].loaded < w[1].loaded));
    assert_eq!(
      seen.last(),
      Some(&Progress {
        loaded: total,
        total: Some(total)
      })
    );
  }

  #[tokio::test]
  async fn errors_pass_through() {
    let loader = VolumeLoader::shared()
      .await
      .unwrap()
      .with_decoder(VolumeDecoder::new(DecoderConfig::default()));

    let err = loader.decode(b"no frame here".to_vec()).await.unwrap_err();
    assert_eq!(err.to_string(), "failed to parse metadata: no metadata frame");
  }

  #[tokio::test]
  async fn load_path_reads_file() {
    let (header, payload) = ramp(10);
    let path = std::env::temp_dir().join(format!("zvol-loader-{}.zst", std::process::id()));
    tokio::fs::write(&path, container(&header, &payload)).await.unwrap();

    let loader = VolumeLoader::shared().await.unwrap();
    let volume = loader.load_path(&path).await;
    tokio::fs::remove_file(&path).await.unwrap();

    assert_eq!(volume.unwrap().len(), 10);
  }

  #[tokio::test]
  async fn missing_file_is_io_error() {
    let loader = VolumeLoader::shared().await.unwrap();
    let err = loader
      .load_path("/nonexistent/zvol/volume.zst")
      .await
      .unwrap_err();
    assert!(matches!(err, DecodeError::Io(_)));
  }
}

use log::{debug, trace};
use zvol_engine::{DecoderEngine, EngineSource};
use zvol_wire::Metadata;
use zvol_wire::frame::read_metadata;

use crate::buffer::EngineBuffer;
use crate::config::DecoderConfig;
use crate::error::DecodeError;
use crate::volume::{Volume, VolumeData};

/// Synchronous volume decoder: one container in, one [`Volume`] out.
///
/// Decoding proceeds in six steps:
///
///   1. **Metadata**: locate the skippable frame at offset 0 and validate
///      its JSON header. Nothing touches the engine if this fails.
///   2. **Source buffer**: allocate engine memory for the whole container
///      and copy it in. The metadata frame stays in place; the codec
///      steps over skippable frames.
///   3. **Bound**: ask the engine for the decompressed size bound. A
///      bound ≤ 0 means the payload is not a compressed stream.
///   4. **Decompress**: allocate a destination of `bound` bytes and
///      decompress into it. A negative result means the stream is
///      corrupt.
///   5. **Materialize**: copy the `result` bytes (not `bound`) out of
///      engine memory as elements of the declared type.
///   6. **Release**: both engine buffers are freed on every exit path.
///
/// ```rust
/// use zvol_decoder::VolumeDecoder;
/// use zvol_engine::{EngineConfig, ZstdEngine};
///
/// let engine = ZstdEngine::new(EngineConfig::default()).unwrap();
/// let err = VolumeDecoder::default().decode(&engine, b"plain bytes").unwrap_err();
/// assert_eq!(err.to_string(), "failed to parse metadata: no metadata frame");
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct VolumeDecoder {
    config: DecoderConfig,
}

impl VolumeDecoder {
    #[must_use]
    pub fn new(config: DecoderConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> DecoderConfig {
        self.config
    }

    /// Read and validate the metadata header without decompressing.
    ///
    /// # Errors
    ///
    /// [`DecodeError::Metadata`] if the frame is missing or invalid.
    pub fn metadata(&self, bytes: &[u8]) -> Result<Metadata, DecodeError> {
        Ok(read_metadata(bytes, self.config.max_header_length)?)
    }

    /// Decode a container with `engine`.
    ///
    /// # Errors
    ///
    /// - [`DecodeError::Metadata`] if the metadata frame is missing or
    ///   invalid.
    /// - [`DecodeError::AllocationFailed`] if the engine cannot allocate
    ///   the source or destination buffer.
    /// - [`DecodeError::InvalidCompressedData`] if the decompression bound
    ///   is not positive.
    /// - [`DecodeError::DecompressionFailed`] if decompression reports an
    ///   error.
    /// - [`DecodeError::PartialElement`] if the decompressed size is not a
    ///   whole number of elements.
    /// - [`DecodeError::DimensionMismatch`] if strict dimensions are on and
    ///   the element count disagrees with the header.
    /// - [`DecodeError::Engine`] if engine memory access fails.
    pub fn decode<E: DecoderEngine + ?Sized>(
        &self,
        engine: &E,
        bytes: &[u8],
    ) -> Result<Volume, DecodeError> {
        let metadata = self.metadata(bytes)?;
        debug!(
            "decoding {} volume {}x{}x{} from {} bytes",
            metadata.element_type,
            metadata.x_size,
            metadata.y_size,
            metadata.z_size,
            bytes.len()
        );

        let src = EngineBuffer::from_bytes(engine, bytes)?;

        let bound = engine.decompress_bound(src.address(), src.len());
        trace!("decompress bound: {bound}");
        if bound <= 0 {
            return Err(DecodeError::InvalidCompressedData);
        }
        let capacity =
            usize::try_from(bound).map_err(|_| DecodeError::AllocationFailed { size: usize::MAX })?;

        let dst = EngineBuffer::allocate(engine, capacity)?;
        let result = engine.decompress(dst.address(), dst.len(), src.address(), src.len());
        trace!("decompress result: {result}");
        let Ok(written) = usize::try_from(result) else {
            return Err(DecodeError::DecompressionFailed);
        };

        let data = VolumeData::from_le_bytes(metadata.element_type, &dst.read(written)?)?;

        if self.config.strict_dimensions {
            let actual = u64::try_from(data.len()).unwrap_or(u64::MAX);
            match metadata.voxel_count() {
                Some(expected) if expected == actual => {}
                expected => {
                    return Err(DecodeError::DimensionMismatch {
                        expected: expected.unwrap_or(u64::MAX),
                        actual,
                    });
                }
            }
        }

        Ok(Volume::new(metadata, data))
    }

    /// Decode a container with an engine obtained from `source`.
    ///
    /// With an [`IsolatedEngine`](zvol_engine::IsolatedEngine) source the
    /// engine is instantiated for this call and dropped when it returns.
    ///
    /// # Errors
    ///
    /// [`DecodeError::Engine`] if the source cannot produce an engine,
    /// plus everything [`decode`](Self::decode) returns.
    pub fn decode_with<S: EngineSource + ?Sized>(
        &self,
        source: &S,
        bytes: &[u8],
    ) -> Result<Volume, DecodeError> {
        let engine = source.acquire()?;
        self.decode(&*engine, bytes)
    }
}

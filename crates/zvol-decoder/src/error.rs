use zvol_engine::{EngineError, LoadError};
use zvol_wire::{ElementType, MetadataError};

/// Errors that can occur while decoding a volume container.
///
/// ```text
///   DecodeError
///   ├── Metadata(MetadataError)  ← missing, malformed or invalid header
///   ├── AllocationFailed         ← engine malloc returned 0
///   ├── InvalidCompressedData    ← decompression bound ≤ 0
///   ├── DecompressionFailed      ← decompress returned < 0
///   ├── PartialElement           ← output not a multiple of element width
///   ├── DimensionMismatch        ← element count ≠ xSize*ySize*zSize (strict)
///   ├── Engine(EngineError)      ← engine memory access or instantiation
///   ├── Load(LoadError)          ← shared engine failed to load
///   ├── Interrupted              ← decode worker did not complete
///   └── Io(std::io::Error)       ← reading the container
/// ```
///
/// None of these are retried internally. Engine buffers acquired before
/// the failure are always released.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The metadata frame is absent or failed validation.
    ///
    /// Match on the inner [`MetadataError::NoMetadataFrame`] to tell an
    /// unframed input apart from a corrupt header.
    #[error("failed to parse metadata: {0}")]
    Metadata(#[from] MetadataError),

    /// The engine allocator returned address 0 for a `size`-byte request.
    #[error("failed to allocate memory for zstd buffer")]
    AllocationFailed { size: usize },

    /// The engine rejected the payload before decompression started.
    #[error("invalid compressed data")]
    InvalidCompressedData,

    /// The payload looked valid but failed to decompress.
    #[error("decompression failed")]
    DecompressionFailed,

    #[error(
        "decompressed size {size} is not a multiple of the {element_type} element width ({} bytes)",
        element_type.width()
    )]
    PartialElement {
        size: usize,
        element_type: ElementType,
    },

    #[error("volume declares {expected} elements but {actual} were decoded")]
    DimensionMismatch { expected: u64, actual: u64 },

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("decode task did not complete: {0}")]
    Interrupted(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

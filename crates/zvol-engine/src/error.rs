use std::sync::Arc;

/// Errors raised by a decompression engine outside its integer calling
/// convention.
///
/// Allocation failures, invalid input and decompression failures are
/// *not* represented here: the engine reports those through its return
/// values (0 address, non-positive bound, negative result size) and the
/// decoder turns them into typed errors. `EngineError` covers what the
/// calling convention cannot express.
///
/// ```text
///   EngineError
///   ├── OutOfBounds            ← memory access outside a live region
///   ├── UnsupportedLibrary     ← linked zstd is too old
///   └── Init                   ← engine construction failed
/// ```
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A read or write touched bytes outside engine memory.
    #[error("engine memory access out of bounds: {len} bytes at address {address:#010x}")]
    OutOfBounds { address: u32, len: usize },

    /// The linked zstd library predates `ZSTD_decompressBound`.
    #[error("zstd {found} is too old, {required} or newer is required")]
    UnsupportedLibrary { found: String, required: String },

    #[error("engine initialization failed: {0}")]
    Init(String),
}

/// Failure of a memoized engine load, shared by every caller that was
/// waiting on the same attempt.
///
/// The underlying [`EngineError`] is not `Clone`, so it travels behind an
/// `Arc`.
#[derive(Clone, Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to load decompression engine: {0}")]
    Failed(Arc<EngineError>),

    /// The initialization task panicked or was aborted before it finished.
    #[error("engine load was abandoned before completing")]
    Abandoned,
}

impl From<EngineError> for LoadError {
    fn from(err: EngineError) -> Self {
        Self::Failed(Arc::new(err))
    }
}

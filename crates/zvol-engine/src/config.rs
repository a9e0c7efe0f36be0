/// Configuration for [`ZstdEngine`](crate::ZstdEngine) instances.
///
/// ```text
/// ┌────────────┬──────────────────────────────────────────────────────┐
/// │ Field      │ Purpose                                              │
/// ├────────────┼──────────────────────────────────────────────────────┤
/// │ max_memory │ Cap on the engine's linear memory, in bytes. An      │
/// │            │ allocation that would grow memory past the cap       │
/// │            │ returns address 0.                                   │
/// └────────────┴──────────────────────────────────────────────────────┘
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    pub max_memory: usize,
}

/// Default memory cap: 2 GiB, the usual ceiling of a 32-bit linear
/// memory with signed offsets.
///
/// The destination buffer is sized from the content size the zstd frame
/// header declares, before any payload is decoded. A few bytes of input
/// can therefore claim up to this much memory, which is zero-filled and
/// then released when decompression fails. Callers decoding untrusted
/// input should lower the cap to the largest volume they expect.
pub const DEFAULT_MAX_MEMORY: usize = 2 * 1024 * 1024 * 1024;

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_memory: DEFAULT_MAX_MEMORY,
        }
    }
}

impl EngineConfig {
    /// Builder-style override of [`max_memory`](Self::max_memory).
    #[must_use]
    pub fn with_max_memory(mut self, max_memory: usize) -> Self {
        self.max_memory = max_memory;
        self
    }
}

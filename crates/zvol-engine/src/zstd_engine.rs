use std::sync::{Mutex, MutexGuard, PoisonError};

use log::{debug, warn};

use crate::config::EngineConfig;
use crate::engine::{Address, DecoderEngine, NULL_ADDRESS};
use crate::error::EngineError;
use crate::memory::LinearMemory;
use crate::strategy::EngineTemplate;

/// Oldest zstd release exposing `ZSTD_decompressBound`.
const MIN_ZSTD_VERSION: u32 = 10_400;

/// Return value of the codec entry points on failure.
const CODEC_ERROR: i64 = -1;

/// A zstd decompression engine with its own linear memory.
///
/// Memory and allocator sit behind one mutex. Every engine call takes the
/// lock for its whole duration, so concurrent decodes sharing one engine
/// interleave call by call but never touch memory at the same time. A
/// decode in progress on one thread therefore serializes with the others;
/// workloads that want parallel decompression instantiate one engine per
/// call through [`ZstdTemplate`] instead.
///
/// The codec itself is the `zstd` crate: `decompress_bound` wraps
/// `ZSTD_decompressBound` and `decompress` runs a bulk decompression.
/// Both step over skippable frames, so a container whose first frame is
/// the metadata frame can be passed in whole.
pub struct ZstdEngine {
    memory: Mutex<LinearMemory>,
}

impl ZstdEngine {
    /// Create an engine after checking the linked zstd library.
    ///
    /// # Errors
    ///
    /// [`EngineError::UnsupportedLibrary`] if the library is older than
    /// 1.4.0.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let version = zstd::zstd_safe::version_number();
        if version < MIN_ZSTD_VERSION {
            return Err(EngineError::UnsupportedLibrary {
                found: format_version(version),
                required: format_version(MIN_ZSTD_VERSION),
            });
        }

        debug!(
            "zstd engine ready (libzstd {}, memory cap {} bytes)",
            format_version(version),
            config.max_memory
        );

        Ok(Self {
            memory: Mutex::new(LinearMemory::new(config.max_memory)),
        })
    }

    /// Number of allocations currently live in engine memory.
    pub fn live_allocations(&self) -> usize {
        self.lock().live_allocations()
    }

    /// Current size of the linear memory in bytes.
    pub fn memory_size(&self) -> usize {
        self.lock().size()
    }

    fn lock(&self) -> MutexGuard<'_, LinearMemory> {
        // A panic while holding the lock cannot leave the allocator map
        // half-updated, so a poisoned memory is still usable.
        self.memory.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DecoderEngine for ZstdEngine {
    fn malloc(&self, size: usize) -> Address {
        match self.lock().allocate(size) {
            Some(address) => address,
            None => {
                debug!("allocation of {size} bytes refused");
                NULL_ADDRESS
            }
        }
    }

    fn free(&self, address: Address) {
        if address == NULL_ADDRESS {
            return;
        }
        if !self.lock().free(address) {
            warn!("free of unallocated address {address:#010x}");
        }
    }

    fn write(&self, address: Address, bytes: &[u8]) -> Result<(), EngineError> {
        self.lock()
            .slice_mut(address, bytes.len())?
            .copy_from_slice(bytes);
        Ok(())
    }

    fn read(&self, address: Address, out: &mut [u8]) -> Result<(), EngineError> {
        out.copy_from_slice(self.lock().slice(address, out.len())?);
        Ok(())
    }

    fn decompress_bound(&self, src: Address, src_size: usize) -> i64 {
        let memory = self.lock();
        let Ok(input) = memory.slice(src, src_size) else {
            warn!("decompress_bound: source {src:#010x}+{src_size} outside memory");
            return CODEC_ERROR;
        };

        match zstd::zstd_safe::decompress_bound(input) {
            // The content-size sentinels sit at the top of the u64 range
            // and fail the conversion.
            Ok(bound) => i64::try_from(bound).unwrap_or(CODEC_ERROR),
            Err(code) => {
                debug!(
                    "decompress_bound: {}",
                    zstd::zstd_safe::get_error_name(code)
                );
                CODEC_ERROR
            }
        }
    }

    fn decompress(&self, dst: Address, dst_capacity: usize, src: Address, src_size: usize) -> i64 {
        let mut memory = self.lock();
        let Some((input, output)) = memory.split((src, src_size), (dst, dst_capacity)) else {
            warn!("decompress: source and destination regions are invalid or overlap");
            return CODEC_ERROR;
        };

        match zstd::bulk::decompress_to_buffer(input, output) {
            Ok(written) => i64::try_from(written).unwrap_or(CODEC_ERROR),
            Err(err) => {
                debug!("decompress: {err}");
                CODEC_ERROR
            }
        }
    }
}

/// Engine template producing a fresh [`ZstdEngine`] per instantiation.
///
/// Each instance owns its own linear memory, so decodes running on
/// separate instances share nothing and proceed in parallel.
#[derive(Clone, Copy, Debug)]
pub struct ZstdTemplate {
    config: EngineConfig,
}

impl ZstdTemplate {
    /// Prepare a template, verifying the linked library once up front.
    ///
    /// # Errors
    ///
    /// Same as [`ZstdEngine::new`].
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        ZstdEngine::new(config)?;
        Ok(Self { config })
    }

    #[must_use]
    pub fn config(&self) -> EngineConfig {
        self.config
    }
}

impl EngineTemplate for ZstdTemplate {
    type Instance = ZstdEngine;

    fn instantiate(&self) -> Result<ZstdEngine, EngineError> {
        ZstdEngine::new(self.config)
    }
}

/// `10504` → `"1.5.4"`.
fn format_version(version: u32) -> String {
    format!(
        "{}.{}.{}",
        version / 10_000,
        version / 100 % 100,
        version % 100
    )
}

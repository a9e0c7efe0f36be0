use crate::error::EngineError;

/// An address inside an engine's linear memory.
pub type Address = u32;

/// The address an allocator returns when it cannot satisfy a request.
///
/// Freeing it is a no-op.
pub const NULL_ADDRESS: Address = 0;

/// Capability interface of a decompression engine.
///
/// The interface mirrors the calling convention of a codec compiled to a
/// sandboxed module: a single linear memory addressed by 32-bit offsets,
/// a `malloc`/`free` pair working on that memory, and two codec entry
/// points that report failure through their integer return values.
///
/// ```text
/// ┌────────────────────┬───────────────────────────────────────────────┐
/// │ Operation          │ Failure signal                                │
/// ├────────────────────┼───────────────────────────────────────────────┤
/// │ malloc             │ returns NULL_ADDRESS (0)                      │
/// │ free               │ none; freeing 0 is a no-op                    │
/// │ decompress_bound   │ returns ≤ 0 (input is not a compressed stream)│
/// │ decompress         │ returns < 0 (stream failed to decode)         │
/// │ read / write       │ Err(EngineError::OutOfBounds)                 │
/// └────────────────────┴───────────────────────────────────────────────┘
/// ```
///
/// Implementations must be usable from several threads at once. A shared
/// engine serves many concurrent decodes, each of which allocates, uses
/// and frees its own buffers; the implementation is responsible for
/// keeping those calls from corrupting each other.
pub trait DecoderEngine: Send + Sync {
    /// Allocate `size` bytes of engine memory.
    fn malloc(&self, size: usize) -> Address;

    /// Release an allocation made by [`malloc`](Self::malloc).
    fn free(&self, address: Address);

    /// Copy `bytes` into engine memory starting at `address`.
    ///
    /// # Errors
    ///
    /// [`EngineError::OutOfBounds`] if the range is not inside memory.
    fn write(&self, address: Address, bytes: &[u8]) -> Result<(), EngineError>;

    /// Copy `out.len()` bytes of engine memory starting at `address`.
    ///
    /// # Errors
    ///
    /// [`EngineError::OutOfBounds`] if the range is not inside memory.
    fn read(&self, address: Address, out: &mut [u8]) -> Result<(), EngineError>;

    /// Upper bound of the decompressed size of `src_size` bytes at `src`.
    fn decompress_bound(&self, src: Address, src_size: usize) -> i64;

    /// Decompress `src_size` bytes at `src` into `dst_capacity` bytes at
    /// `dst`, returning the number of bytes written.
    fn decompress(&self, dst: Address, dst_capacity: usize, src: Address, src_size: usize) -> i64;
}

impl<E: DecoderEngine + ?Sized> DecoderEngine for std::sync::Arc<E> {
    fn malloc(&self, size: usize) -> Address {
        (**self).malloc(size)
    }

    fn free(&self, address: Address) {
        (**self).free(address);
    }

    fn write(&self, address: Address, bytes: &[u8]) -> Result<(), EngineError> {
        (**self).write(address, bytes)
    }

    fn read(&self, address: Address, out: &mut [u8]) -> Result<(), EngineError> {
        (**self).read(address, out)
    }

    fn decompress_bound(&self, src: Address, src_size: usize) -> i64 {
        (**self).decompress_bound(src, src_size)
    }

    fn decompress(&self, dst: Address, dst_capacity: usize, src: Address, src_size: usize) -> i64 {
        (**self).decompress(dst, dst_capacity, src, src_size)
    }
}

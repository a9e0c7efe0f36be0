use zvol_engine::{Address, DecoderEngine, EngineError, NULL_ADDRESS};

use crate::error::DecodeError;

/// An allocation in engine memory, released when dropped.
///
/// Every exit from a decode, early return or panic included, runs the
/// guard's `Drop`, so each successful `malloc` is paired with exactly one
/// `free`.
pub(crate) struct EngineBuffer<'e, E: DecoderEngine + ?Sized> {
    engine: &'e E,
    address: Address,
    len: usize,
}

impl<'e, E: DecoderEngine + ?Sized> EngineBuffer<'e, E> {
    /// Allocate `len` bytes in `engine`.
    pub(crate) fn allocate(engine: &'e E, len: usize) -> Result<Self, DecodeError> {
        let address = engine.malloc(len);
        if address == NULL_ADDRESS {
            return Err(DecodeError::AllocationFailed { size: len });
        }
        Ok(Self {
            engine,
            address,
            len,
        })
    }

    /// Allocate a buffer sized to `bytes` and copy them in.
    pub(crate) fn from_bytes(engine: &'e E, bytes: &[u8]) -> Result<Self, DecodeError> {
        let buffer = Self::allocate(engine, bytes.len())?;
        engine.write(buffer.address, bytes)?;
        Ok(buffer)
    }

    pub(crate) fn address(&self) -> Address {
        self.address
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Copy the first `len` bytes out of engine memory.
    pub(crate) fn read(&self, len: usize) -> Result<Vec<u8>, EngineError> {
        let mut out = vec![0; len.min(self.len)];
        self.engine.read(self.address, &mut out)?;
        Ok(out)
    }
}

impl<E: DecoderEngine + ?Sized> Drop for EngineBuffer<'_, E> {
    fn drop(&mut self) {
        self.engine.free(self.address);
    }
}

use std::collections::BTreeMap;
use std::ops::Range;

use crate::engine::Address;
use crate::error::EngineError;

/// Allocation granularity. Every allocation starts on an 8-byte boundary
/// so typed views of any supported element width are aligned.
const ALIGN: usize = 8;

/// First usable address. The bytes below it are never handed out, which
/// keeps address 0 free to mean "allocation failed".
const HEAP_BASE: usize = ALIGN;

/// A growable linear memory with a first-fit allocator.
///
/// ```text
///  0       8                                                  len
///  ├───────┼──────────┬─────┬──────────────┬──────────────────┤
///  │ null  │ alloc A  │ gap │ alloc B      │ alloc C          │
///  └───────┴──────────┴─────┴──────────────┴──────────────────┘
/// ```
///
/// Allocations are tracked in an ordered map keyed by start address, so
/// finding a gap is a single walk over the live allocations. Memory grows
/// on demand up to `max_memory` and shrinks back when the highest
/// allocation is freed. Freed bytes are zeroed so a later allocation never
/// observes what a previous one held.
pub(crate) struct LinearMemory {
    bytes: Vec<u8>,
    /// Live allocations: start address → requested length.
    live: BTreeMap<Address, usize>,
    max_memory: usize,
}

impl LinearMemory {
    pub(crate) fn new(max_memory: usize) -> Self {
        let addressable = usize::try_from(Address::MAX).unwrap_or(usize::MAX);
        Self {
            bytes: vec![0; HEAP_BASE],
            live: BTreeMap::new(),
            max_memory: max_memory.min(addressable),
        }
    }

    /// Reserve `size` bytes and return their address, or `None` when the
    /// request cannot fit under the memory cap.
    ///
    /// Zero-sized requests still receive a distinct address.
    pub(crate) fn allocate(&mut self, size: usize) -> Option<Address> {
        let size = size.max(1);
        let rounded = size.checked_next_multiple_of(ALIGN)?;

        let mut cursor = HEAP_BASE;
        for (&start, &len) in &self.live {
            let start = start as usize;
            if start - cursor >= rounded {
                break;
            }
            cursor = align_up(start + len);
        }

        let end = cursor.checked_add(rounded)?;
        if end > self.max_memory {
            return None;
        }
        if end > self.bytes.len() {
            self.bytes.resize(end, 0);
        }

        let address = Address::try_from(cursor).ok()?;
        self.live.insert(address, size);
        Some(address)
    }

    /// Release the allocation starting at `address`.
    ///
    /// Returns `false` if no allocation starts there.
    pub(crate) fn free(&mut self, address: Address) -> bool {
        let Some(len) = self.live.remove(&address) else {
            return false;
        };

        let start = address as usize;
        self.bytes[start..start + len].fill(0);

        let high_water = self
            .live
            .last_key_value()
            .map_or(HEAP_BASE, |(&s, &l)| align_up(s as usize + l));
        if high_water < self.bytes.len() {
            self.bytes.truncate(high_water);
            if self.live.is_empty() {
                self.bytes.shrink_to_fit();
            }
        }
        true
    }

    pub(crate) fn slice(&self, address: Address, len: usize) -> Result<&[u8], EngineError> {
        let range = self.range(address, len)?;
        Ok(&self.bytes[range])
    }

    pub(crate) fn slice_mut(
        &mut self,
        address: Address,
        len: usize,
    ) -> Result<&mut [u8], EngineError> {
        let range = self.range(address, len)?;
        Ok(&mut self.bytes[range])
    }

    /// Borrow a source region immutably and a destination region mutably
    /// at the same time. Returns `None` if the regions overlap or either
    /// lies outside memory.
    pub(crate) fn split(
        &mut self,
        src: (Address, usize),
        dst: (Address, usize),
    ) -> Option<(&[u8], &mut [u8])> {
        let src = self.range(src.0, src.1).ok()?;
        let dst = self.range(dst.0, dst.1).ok()?;

        if src.start < dst.end && dst.start < src.end {
            return None;
        }

        if src.end <= dst.start {
            let (low, high) = self.bytes.split_at_mut(dst.start);
            Some((&low[src], &mut high[..dst.len()]))
        } else {
            let (low, high) = self.bytes.split_at_mut(src.start);
            Some((&high[..src.len()], &mut low[dst]))
        }
    }

    pub(crate) fn live_allocations(&self) -> usize {
        self.live.len()
    }

    pub(crate) fn size(&self) -> usize {
        self.bytes.len()
    }

    fn range(&self, address: Address, len: usize) -> Result<Range<usize>, EngineError> {
        let start = address as usize;
        match start.checked_add(len) {
            Some(end) if end <= self.bytes.len() => Ok(start..end),
            _ => Err(EngineError::OutOfBounds { address, len }),
        }
    }
}

fn align_up(n: usize) -> usize {
    n.next_multiple_of(ALIGN)
}

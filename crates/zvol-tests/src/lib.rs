//! Shared fixtures for the zvol integration tests and benches.
//!
//! - [`ContainerBuilder`] writes containers: a metadata frame followed by
//!   a zstd-compressed payload, with switches for the malformed variants
//!   the edge-case tests need.
//! - [`CountingEngine`] wraps any engine, counts allocations and frees,
//!   and can be told to refuse a specific allocation.
//! - [`golden`] reads a committed fixture from `tests/golden/`;
//!   [`golden_fixtures`] holds the bytes those files were written from.

use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use zvol_engine::{Address, DecoderEngine, EngineError, NULL_ADDRESS};
use zvol_wire::Metadata;
use zvol_wire::frame::SKIPPABLE_MAGIC;

/// Read a golden fixture relative to `tests/golden/`.
///
/// # Panics
///
/// If the fixture does not exist.
#[must_use]
pub fn golden(subpath: &str) -> Vec<u8> {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    let fixture_path = manifest_dir.join("tests/golden").join(subpath);
    std::fs::read(&fixture_path)
        .unwrap_or_else(|e| panic!("failed to read golden fixture {}: {e}", fixture_path.display()))
}

/// A metadata frame: magic, header length, header bytes.
#[must_use]
pub fn metadata_frame(magic: u32, header: &[u8]) -> Vec<u8> {
    let length = u32::try_from(header.len()).unwrap_or(u32::MAX);
    let mut frame = Vec::with_capacity(8 + header.len());
    frame.extend_from_slice(&magic.to_le_bytes());
    frame.extend_from_slice(&length.to_le_bytes());
    frame.extend_from_slice(header);
    frame
}

/// `0, 1, 2, …` as little-endian `u32` elements, with a matching header.
#[must_use]
pub fn ramp_u32(n: u32) -> (String, Vec<u8>) {
    let header = format!(r#"{{"type":"uint32","xSize":{n},"ySize":1,"zSize":1}}"#);
    let payload = (0..n).flat_map(u32::to_le_bytes).collect();
    (header, payload)
}

// ── Golden fixtures ───────────────────────────────────────────────────

/// A single-segment zstd frame holding `payload` in one raw block.
///
/// ```text
///   28 B5 2F FD │ FHD │ FCS (1 or 2 bytes) │ block header │ payload │ checksum?
/// ```
///
/// The output depends on no zstd build, which keeps the committed
/// fixtures reproducible. `checksum` is written verbatim, so a wrong value
/// yields a frame that only fails at decompression.
///
/// # Panics
///
/// If `payload` is larger than 65 791 bytes (the 2-byte FCS limit).
#[must_use]
pub fn stored_frame(payload: &[u8], checksum: Option<u32>) -> Vec<u8> {
    const MAGIC: u32 = 0xFD2F_B528;
    const SINGLE_SEGMENT: u8 = 0x20;
    const CHECKSUM_FLAG: u8 = 0x04;

    let mut frame = MAGIC.to_le_bytes().to_vec();
    let flags = if checksum.is_some() { SINGLE_SEGMENT | CHECKSUM_FLAG } else { SINGLE_SEGMENT };

    match u8::try_from(payload.len()) {
        Ok(size) => frame.extend_from_slice(&[flags, size]),
        Err(_) => {
            let size = u16::try_from(payload.len() - 256)
                .unwrap_or_else(|_| panic!("{} bytes do not fit a stored frame", payload.len()));
            frame.push(flags | 0x40);
            frame.extend_from_slice(&size.to_le_bytes());
        }
    }

    // Last block, type raw.
    let block_header = (u32::try_from(payload.len()).unwrap_or(u32::MAX) << 3) | 1;
    frame.extend_from_slice(&block_header.to_le_bytes()[..3]);
    frame.extend_from_slice(payload);
    if let Some(checksum) = checksum {
        frame.extend_from_slice(&checksum.to_be_bytes());
    }
    frame
}

const UINT8_HEADER: &str = r#"{"type":"uint8","xSize":2,"ySize":2,"zSize":3}"#;
const UINT8_PAYLOAD: [u8; 12] = [0, 1, 10, 11, 100, 101, 110, 111, 200, 201, 210, 211];

/// Every committed fixture under `tests/golden/`, path and bytes.
///
/// | Fixture                          | Contents                                |
/// |----------------------------------|-----------------------------------------|
/// | uint8_2x2x3.zvol                 | 12 uint8 voxels, value = z*100+y*10+x   |
/// | int16_3x1x1.zvol                 | -1, 256, 32767                          |
/// | float64_2x1x1.zvol               | 0.25, -8.0                              |
/// | magic_variant.zvol               | Frame magic 0x184D2A5A, one uint8 (42)  |
/// | edge_cases/no_metadata.zvol      | Bare zstd frame                         |
/// | edge_cases/unsupported_type.zvol | `type: "u8"`                            |
/// | edge_cases/missing_zsize.zvol    | Header without zSize                    |
/// | edge_cases/no_payload.zvol       | Metadata frame only                     |
/// | edge_cases/corrupt_checksum.zvol | Valid frame, checksum `DEADBEEF`        |
#[must_use]
pub fn golden_fixtures() -> Vec<(&'static str, Vec<u8>)> {
    let container = |magic: u32, header: &str, payload: &[u8], checksum: Option<u32>| {
        let mut bytes = metadata_frame(magic, header.as_bytes());
        bytes.extend_from_slice(&stored_frame(payload, checksum));
        bytes
    };

    let int16: Vec<u8> = [-1i16, 256, 32767].iter().flat_map(|v| v.to_le_bytes()).collect();
    let float64: Vec<u8> = [0.25f64, -8.0].iter().flat_map(|v| v.to_le_bytes()).collect();

    vec![
        ("uint8_2x2x3.zvol", container(SKIPPABLE_MAGIC, UINT8_HEADER, &UINT8_PAYLOAD, None)),
        (
            "int16_3x1x1.zvol",
            container(SKIPPABLE_MAGIC, r#"{"type":"int16","xSize":3,"ySize":1,"zSize":1}"#, &int16, None),
        ),
        (
            "float64_2x1x1.zvol",
            container(
                SKIPPABLE_MAGIC,
                r#"{"type":"float64","xSize":2,"ySize":1,"zSize":1}"#,
                &float64,
                None,
            ),
        ),
        (
            "magic_variant.zvol",
            container(0x184D_2A5A, r#"{"type":"uint8","xSize":1,"ySize":1,"zSize":1}"#, &[42], None),
        ),
        ("edge_cases/no_metadata.zvol", stored_frame(&[1, 2, 3], None)),
        (
            "edge_cases/unsupported_type.zvol",
            container(SKIPPABLE_MAGIC, r#"{"type":"u8","xSize":2,"ySize":2,"zSize":3}"#, &[0; 12], None),
        ),
        (
            "edge_cases/missing_zsize.zvol",
            container(SKIPPABLE_MAGIC, r#"{"type":"uint8","xSize":2,"ySize":2}"#, &[0; 12], None),
        ),
        ("edge_cases/no_payload.zvol", metadata_frame(SKIPPABLE_MAGIC, UINT8_HEADER.as_bytes())),
        (
            "edge_cases/corrupt_checksum.zvol",
            container(SKIPPABLE_MAGIC, UINT8_HEADER, &UINT8_PAYLOAD, Some(0xDEAD_BEEF)),
        ),
    ]
}

// ── Container builder ─────────────────────────────────────────────────

/// Builder for test containers.
///
/// ```text
///   metadata_frame(magic, header) ++ zstd(payload)
/// ```
///
/// `without_payload` drops the zstd frame; `corrupt_checksum` enables the
/// frame checksum and flips its last byte, which leaves the frame
/// structurally valid (the bound is still known) but fails decompression.
#[derive(Clone, Debug)]
pub struct ContainerBuilder {
    magic: u32,
    header: String,
    payload: Vec<u8>,
    level: i32,
    with_payload: bool,
    corrupt_checksum: bool,
}

impl ContainerBuilder {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            magic: SKIPPABLE_MAGIC,
            header: header.into(),
            payload: Vec::new(),
            level: 3,
            with_payload: true,
            corrupt_checksum: false,
        }
    }

    /// Start from a validated header record.
    ///
    /// # Errors
    ///
    /// If the record cannot be serialized.
    pub fn from_metadata(metadata: &Metadata) -> serde_json::Result<Self> {
        Ok(Self::new(serde_json::to_string(metadata)?))
    }

    #[must_use]
    pub fn magic(mut self, magic: u32) -> Self {
        self.magic = magic;
        self
    }

    #[must_use]
    pub fn payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.payload = payload.into();
        self
    }

    #[must_use]
    pub fn level(mut self, level: i32) -> Self {
        self.level = level;
        self
    }

    #[must_use]
    pub fn without_payload(mut self) -> Self {
        self.with_payload = false;
        self
    }

    #[must_use]
    pub fn corrupt_checksum(mut self) -> Self {
        self.corrupt_checksum = true;
        self
    }

    /// Write the container.
    ///
    /// # Errors
    ///
    /// If zstd fails to compress the payload.
    pub fn build(&self) -> io::Result<Vec<u8>> {
        let mut container = metadata_frame(self.magic, self.header.as_bytes());
        if !self.with_payload {
            return Ok(container);
        }

        let mut compressor = zstd::bulk::Compressor::new(self.level)?;
        compressor.include_checksum(self.corrupt_checksum)?;
        let mut compressed = compressor.compress(&self.payload)?;
        if self.corrupt_checksum {
            if let Some(last) = compressed.last_mut() {
                *last ^= 0xFF;
            }
        }

        container.extend_from_slice(&compressed);
        Ok(container)
    }
}

// ── Instrumented engine ───────────────────────────────────────────────

/// An engine wrapper that counts allocations and frees.
///
/// `fail_allocation(n)` makes the `n`-th `malloc` (1-based) return
/// [`NULL_ADDRESS`] without reaching the inner engine. Refused calls are
/// counted in `malloc_calls` but not in `allocations`.
pub struct CountingEngine<E> {
    inner: E,
    malloc_calls: AtomicUsize,
    allocations: AtomicUsize,
    frees: AtomicUsize,
    fail_at: Option<usize>,
}

impl<E: DecoderEngine> CountingEngine<E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            malloc_calls: AtomicUsize::new(0),
            allocations: AtomicUsize::new(0),
            frees: AtomicUsize::new(0),
            fail_at: None,
        }
    }

    #[must_use]
    pub fn fail_allocation(mut self, n: usize) -> Self {
        self.fail_at = Some(n);
        self
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }

    pub fn malloc_calls(&self) -> usize {
        self.malloc_calls.load(Ordering::SeqCst)
    }

    /// Successful allocations.
    pub fn allocations(&self) -> usize {
        self.allocations.load(Ordering::SeqCst)
    }

    /// Frees of non-null addresses.
    pub fn frees(&self) -> usize {
        self.frees.load(Ordering::SeqCst)
    }

    /// Whether every successful allocation has been freed.
    pub fn balanced(&self) -> bool {
        self.allocations() == self.frees()
    }
}

impl<E: DecoderEngine> DecoderEngine for CountingEngine<E> {
    fn malloc(&self, size: usize) -> Address {
        let call = self.malloc_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_at == Some(call) {
            return NULL_ADDRESS;
        }

        let address = self.inner.malloc(size);
        if address != NULL_ADDRESS {
            self.allocations.fetch_add(1, Ordering::SeqCst);
        }
        address
    }

    fn free(&self, address: Address) {
        if address != NULL_ADDRESS {
            self.frees.fetch_add(1, Ordering::SeqCst);
        }
        self.inner.free(address);
    }

    fn write(&self, address: Address, bytes: &[u8]) -> Result<(), EngineError> {
        self.inner.write(address, bytes)
    }

    fn read(&self, address: Address, out: &mut [u8]) -> Result<(), EngineError> {
        self.inner.read(address, out)
    }

    fn decompress_bound(&self, src: Address, src_size: usize) -> i64 {
        self.inner.decompress_bound(src, src_size)
    }

    fn decompress(&self, dst: Address, dst_capacity: usize, src: Address, src_size: usize) -> i64 {
        self.inner.decompress(dst, dst_capacity, src, src_size)
    }
}

use crate::error::MetadataError;
use crate::metadata::Metadata;

// The metadata travels inside a zstd *skippable frame*. Decompressors
// step over these frames without looking at their contents, which is
// why the whole container (metadata frame included) can be handed to
// the decompression engine unchanged.
//
// The skippable-frame magic is a family of sixteen values: the low
// nibble is a user-chosen frame id, so the check masks it away.

/// Magic number of the skippable-frame family, low nibble cleared.
pub const SKIPPABLE_MAGIC: u32 = 0x184D_2A50;

/// Mask applied to the magic before comparing with [`SKIPPABLE_MAGIC`].
pub const SKIPPABLE_MAGIC_MASK: u32 = 0xFFFF_FFF0;

/// Size of the fixed part of the frame: magic (4) + header length (4).
pub const FRAME_PREFIX_SIZE: usize = 8;

/// Default upper bound for the JSON header length.
pub const DEFAULT_MAX_HEADER_LENGTH: usize = 64 * 1024;

/// Whether `magic` belongs to the skippable-frame family.
#[must_use]
pub fn is_skippable_magic(magic: u32) -> bool {
    magic & SKIPPABLE_MAGIC_MASK == SKIPPABLE_MAGIC
}

/// A metadata frame located at the start of a container.
///
/// ```text
/// ┌──────────┬──────────────┬─────────────────────────────────────┐
/// │ Offset   │ Size         │ Description                         │
/// ├──────────┼──────────────┼─────────────────────────────────────┤
/// │ 0x00     │ 4 bytes (LE) │ Magic: 0x184D2A5? (any low nibble)  │
/// │ 0x04     │ 4 bytes (LE) │ Header length N                     │
/// │ 0x08     │ N bytes      │ UTF-8 JSON header                   │
/// └──────────┴──────────────┴─────────────────────────────────────┘
/// ```
///
/// The frame borrows its header bytes from the container; nothing is
/// copied until [`metadata`](Self::metadata) parses the JSON.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MetadataFrame<'a> {
    /// Low nibble of the magic number (the skippable-frame id).
    pub variant: u8,

    /// Raw JSON header bytes.
    pub header: &'a [u8],
}

impl<'a> MetadataFrame<'a> {
    /// Locate the metadata frame at offset 0 of `buf`.
    ///
    /// # Errors
    ///
    /// - [`MetadataError::NoMetadataFrame`] if the buffer is shorter than
    ///   a magic number or the magic is not a skippable-frame magic.
    /// - [`MetadataError::Truncated`] if the length field or the header
    ///   it announces runs past the end of `buf`.
    /// - [`MetadataError::HeaderTooLarge`] if the announced header length
    ///   exceeds `max_header_length`.
    pub fn read_from(buf: &'a [u8], max_header_length: usize) -> Result<Self, MetadataError> {
        let Some(magic) = read_u32_le(buf, 0) else {
            return Err(MetadataError::NoMetadataFrame);
        };
        if !is_skippable_magic(magic) {
            return Err(MetadataError::NoMetadataFrame);
        }

        let length = read_u32_le(buf, 4).ok_or(MetadataError::Truncated {
            needed: FRAME_PREFIX_SIZE,
            available: buf.len(),
        })?;
        let length = usize::try_from(length).unwrap_or(usize::MAX);

        if length > max_header_length {
            return Err(MetadataError::HeaderTooLarge {
                length,
                limit: max_header_length,
            });
        }

        let end = FRAME_PREFIX_SIZE.saturating_add(length);
        let header = buf.get(FRAME_PREFIX_SIZE..end).ok_or(MetadataError::Truncated {
            needed: end,
            available: buf.len(),
        })?;

        #[allow(clippy::cast_possible_truncation)]
        let variant = (magic & !SKIPPABLE_MAGIC_MASK) as u8;

        Ok(Self { variant, header })
    }

    /// Total size of the frame in bytes, prefix included.
    #[must_use]
    pub fn frame_len(&self) -> usize {
        FRAME_PREFIX_SIZE + self.header.len()
    }

    /// Parse and validate the JSON header.
    ///
    /// # Errors
    ///
    /// See [`Metadata::from_json`].
    pub fn metadata(&self) -> Result<Metadata, MetadataError> {
        Metadata::from_json(self.header)
    }
}

/// Locate the metadata frame in `buf` and return its validated record.
///
/// # Errors
///
/// Any error from [`MetadataFrame::read_from`] or [`Metadata::from_json`].
pub fn read_metadata(buf: &[u8], max_header_length: usize) -> Result<Metadata, MetadataError> {
    MetadataFrame::read_from(buf, max_header_length)?.metadata()
}

fn read_u32_le(buf: &[u8], offset: usize) -> Option<u32> {
    let bytes = buf.get(offset..offset + 4)?;
    Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

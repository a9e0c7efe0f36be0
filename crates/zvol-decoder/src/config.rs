use zvol_wire::frame::DEFAULT_MAX_HEADER_LENGTH;

/// Configuration for [`VolumeDecoder`](crate::VolumeDecoder).
///
/// ```text
/// ┌───────────────────┬─────────────────────────────────────────────────┐
/// │ Field             │ Purpose                                         │
/// ├───────────────────┼─────────────────────────────────────────────────┤
/// │ max_header_length │ Largest JSON header accepted, in bytes          │
/// │ strict_dimensions │ Reject volumes whose element count differs from │
/// │                   │ xSize * ySize * zSize                           │
/// └───────────────────┴─────────────────────────────────────────────────┘
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecoderConfig {
    pub max_header_length: usize,

    /// Off by default: the decoded length follows the decompressed size,
    /// and reconciling it with the declared dimensions is left to the
    /// caller.
    pub strict_dimensions: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_header_length: DEFAULT_MAX_HEADER_LENGTH,
            strict_dimensions: false,
        }
    }
}

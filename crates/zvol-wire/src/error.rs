use crate::element::ElementType;

/// Errors produced while locating and validating the metadata frame.
///
/// `NoMetadataFrame` is deliberately kept apart from the rest: a buffer
/// that does not start with a skippable frame is a legitimate state a
/// caller may want to detect (for example to treat the input as raw,
/// uncompressed data). Every other variant means a frame *was* found but
/// its contents cannot be trusted.
///
/// ```text
///   MetadataError
///   ├── NoMetadataFrame     ← magic & 0xFFFFFFF0 != 0x184D2A50
///   ├── Truncated           ← frame runs past the end of the buffer
///   ├── HeaderTooLarge      ← declared header length above the limit
///   ├── InvalidUtf8         ← header bytes are not UTF-8
///   ├── MalformedJson       ← header text is not JSON
///   ├── UnsupportedType     ← `type` outside the ten element types
///   └── InvalidDimensions   ← xSize / ySize / zSize missing or non-numeric
/// ```
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    /// The buffer does not begin with a skippable-frame magic number.
    #[error("no metadata frame")]
    NoMetadataFrame,

    /// The frame claims more bytes than the buffer holds.
    #[error("metadata frame truncated: need {needed} bytes, {available} available")]
    Truncated { needed: usize, available: usize },

    /// The declared JSON header length exceeds the configured limit.
    #[error("metadata header is {length} bytes, limit is {limit}")]
    HeaderTooLarge { length: usize, limit: usize },

    #[error("metadata header is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    #[error("metadata header is not valid JSON: {0}")]
    MalformedJson(#[from] serde_json::Error),

    /// The `type` field is absent or not one of the supported names.
    ///
    /// `found` is the observed value as it was written, or `undefined`
    /// when the field is missing.
    #[error("got `{found}` data type, expected one of {}", ElementType::name_list())]
    UnsupportedType { found: String },

    /// At least one of the three dimension fields is absent or not a
    /// non-negative integer. All three observed values are echoed back.
    #[error("got `{{xSize: {x_size}, ySize: {y_size}, zSize: {z_size}}}` dimensions, expected numbers")]
    InvalidDimensions {
        x_size: String,
        y_size: String,
        z_size: String,
    },
}

use serde::Serialize;
use serde_json::Value;

use crate::element::ElementType;
use crate::error::MetadataError;

/// Validated contents of a metadata header.
///
/// The JSON form is
/// `{"type": "uint8", "xSize": 2, "ySize": 2, "zSize": 3}`; extra fields
/// are ignored. Serializing a `Metadata` writes the same field names back.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Metadata {
    #[serde(rename = "type")]
    pub element_type: ElementType,

    #[serde(rename = "xSize")]
    pub x_size: u64,

    #[serde(rename = "ySize")]
    pub y_size: u64,

    #[serde(rename = "zSize")]
    pub z_size: u64,
}

impl Metadata {
    /// Parse and validate a JSON header.
    ///
    /// Validation runs in a fixed order: the element type first, then the
    /// three dimensions. A header with both a bad type and bad dimensions
    /// reports the type.
    ///
    /// # Errors
    ///
    /// - [`MetadataError::InvalidUtf8`] / [`MetadataError::MalformedJson`]
    ///   if the bytes are not a JSON document.
    /// - [`MetadataError::UnsupportedType`] if `type` is missing or not
    ///   one of [`ElementType::ALL`].
    /// - [`MetadataError::InvalidDimensions`] if any of `xSize`, `ySize`,
    ///   `zSize` is missing or not a non-negative integer.
    pub fn from_json(bytes: &[u8]) -> Result<Self, MetadataError> {
        let text = std::str::from_utf8(bytes)?;
        let header: Value = serde_json::from_str(text)?;

        // `Value::get` yields None for non-objects, so a header that is a
        // bare number or array simply has no fields.
        let type_field = header.get("type");
        let element_type = type_field
            .and_then(Value::as_str)
            .and_then(ElementType::from_name)
            .ok_or_else(|| MetadataError::UnsupportedType {
                found: render_field(type_field),
            })?;

        let x = header.get("xSize");
        let y = header.get("ySize");
        let z = header.get("zSize");

        match (dimension(x), dimension(y), dimension(z)) {
            (Some(x_size), Some(y_size), Some(z_size)) => Ok(Self {
                element_type,
                x_size,
                y_size,
                z_size,
            }),
            _ => Err(MetadataError::InvalidDimensions {
                x_size: render_field(x),
                y_size: render_field(y),
                z_size: render_field(z),
            }),
        }
    }

    /// Number of elements the dimensions describe, or `None` on overflow.
    #[must_use]
    pub fn voxel_count(&self) -> Option<u64> {
        self.x_size
            .checked_mul(self.y_size)?
            .checked_mul(self.z_size)
    }
}

/// Accept non-negative integers, including integral floats like `4.0`.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::float_cmp
)]
fn dimension(value: Option<&Value>) -> Option<u64> {
    let value = value?;
    if let Some(n) = value.as_u64() {
        return Some(n);
    }
    let f = value.as_f64()?;
    if f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 {
        Some(f as u64)
    } else {
        None
    }
}

/// Render an observed header field for diagnostics.
///
/// Strings are shown without quotes, absent fields as `undefined`, and
/// everything else as its JSON text.
fn render_field(value: Option<&Value>) -> String {
    match value {
        None => "undefined".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

use std::fmt;
use std::str::FromStr;

use crate::error::MetadataError;

// ── Element type table ────────────────────────────────────────────────
//
// Each element type is a name (as written in the JSON header, matching
// `str(numpy.dtype)`), a byte width and a numeric kind. The macro keeps
// the three columns next to each other so the table reads top to bottom
// in declaration order, which is also the order used in diagnostics.

macro_rules! element_types {
  (
    $( $(#[$vmeta:meta])* $variant:ident => ($name:literal, $width:literal, $kind:ident) ),+ $(,)?
  ) => {
    /// Numeric element types a volume can carry.
    ///
    /// ```text
    /// ┌─────────┬───────┬──────────┐
    /// │ Name    │ Width │ Kind     │
    /// ├─────────┼───────┼──────────┤
    /// │ int8    │ 1     │ Signed   │
    /// │ int16   │ 2     │ Signed   │
    /// │ int32   │ 4     │ Signed   │
    /// │ int64   │ 8     │ Signed   │
    /// │ uint8   │ 1     │ Unsigned │
    /// │ uint16  │ 2     │ Unsigned │
    /// │ uint32  │ 4     │ Unsigned │
    /// │ uint64  │ 8     │ Unsigned │
    /// │ float32 │ 4     │ Float    │
    /// │ float64 │ 8     │ Float    │
    /// └─────────┴───────┴──────────┘
    /// ```
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum ElementType {
      $( $(#[$vmeta])* $variant ),+
    }

    impl ElementType {
      /// Every element type, in declaration order.
      pub const ALL: &'static [Self] = &[ $( Self::$variant ),+ ];

      /// The name used in the JSON header.
      #[must_use]
      pub fn name(self) -> &'static str {
        match self {
          $( Self::$variant => $name ),+
        }
      }

      /// Size of one element in bytes.
      #[must_use]
      pub fn width(self) -> usize {
        match self {
          $( Self::$variant => $width ),+
        }
      }

      #[must_use]
      pub fn kind(self) -> ElementKind {
        match self {
          $( Self::$variant => ElementKind::$kind ),+
        }
      }

      /// Look up an element type by its header name.
      ///
      /// Names are case-sensitive: `uint8` is accepted, `UINT8` and `u8`
      /// are not.
      #[must_use]
      pub fn from_name(name: &str) -> Option<Self> {
        match name {
          $( $name => Some(Self::$variant), )+
          _ => None,
        }
      }
    }
  };
}

element_types! {
  Int8 => ("int8", 1, Signed),
  Int16 => ("int16", 2, Signed),
  Int32 => ("int32", 4, Signed),
  Int64 => ("int64", 8, Signed),
  Uint8 => ("uint8", 1, Unsigned),
  Uint16 => ("uint16", 2, Unsigned),
  Uint32 => ("uint32", 4, Unsigned),
  Uint64 => ("uint64", 8, Unsigned),
  Float32 => ("float32", 4, Float),
  Float64 => ("float64", 8, Float),
}

/// Numeric family of an element type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElementKind {
  Signed,
  Unsigned,
  Float,
}

impl ElementType {
  /// All names joined with `", "`, in declaration order.
  #[must_use]
  pub fn name_list() -> String {
    Self::ALL
      .iter()
      .map(|t| t.name())
      .collect::<Vec<_>>()
      .join(", ")
  }
}

impl fmt::Display for ElementType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

impl FromStr for ElementType {
  type Err = MetadataError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::from_name(s).ok_or_else(|| MetadataError::UnsupportedType {
      found: s.to_string(),
    })
  }
}

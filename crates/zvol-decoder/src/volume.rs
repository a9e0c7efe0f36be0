use zvol_wire::{ElementType, Metadata};

use crate::error::DecodeError;

/// A decoded volume: the declared shape plus a flat typed sequence.
///
/// The sequence is not reshaped. Callers that need 3-D indexing apply
/// their own flattening order (the usual one is `z * ySize * xSize +
/// y * xSize + x`).
#[derive(Clone, Debug, PartialEq)]
pub struct Volume {
    pub x_size: u64,
    pub y_size: u64,
    pub z_size: u64,
    pub element_type: ElementType,
    pub data: VolumeData,
}

impl Volume {
    pub(crate) fn new(metadata: Metadata, data: VolumeData) -> Self {
        Self {
            x_size: metadata.x_size,
            y_size: metadata.y_size,
            z_size: metadata.z_size,
            element_type: metadata.element_type,
            data,
        }
    }

    /// The header this volume was decoded from.
    #[must_use]
    pub fn metadata(&self) -> Metadata {
        Metadata {
            element_type: self.element_type,
            x_size: self.x_size,
            y_size: self.y_size,
            z_size: self.z_size,
        }
    }

    /// Number of decoded elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The elements as a slice of `T`, or `None` if `T` is not the
    /// volume's element type.
    ///
    /// ```rust
    /// # use zvol_decoder::{Volume, VolumeData};
    /// # use zvol_wire::ElementType;
    /// let volume = Volume {
    ///     x_size: 2,
    ///     y_size: 1,
    ///     z_size: 1,
    ///     element_type: ElementType::Uint16,
    ///     data: VolumeData::Uint16(vec![7, 9]),
    /// };
    /// assert_eq!(volume.as_slice::<u16>(), Some(&[7, 9][..]));
    /// assert_eq!(volume.as_slice::<i16>(), None);
    /// ```
    #[must_use]
    pub fn as_slice<T: Element>(&self) -> Option<&[T]> {
        T::slice(&self.data)
    }
}

/// A primitive that can be the element type of a [`Volume`].
pub trait Element: Copy + sealed::Sealed {
    /// The matching [`ElementType`].
    const TYPE: ElementType;

    /// Borrow `data` as `[Self]` if it holds this element type.
    fn slice(data: &VolumeData) -> Option<&[Self]>;
}

mod sealed {
    pub trait Sealed {}
}

// ── Typed storage ─────────────────────────────────────────────────────

macro_rules! volume_data {
    ($( $variant:ident => $ty:ty ),+ $(,)?) => {
        /// Decoded elements, one variant per [`ElementType`].
        ///
        /// The elements are copied out of engine memory, so a `VolumeData`
        /// never aliases buffers the engine may reuse.
        #[derive(Clone, Debug, PartialEq)]
        pub enum VolumeData {
            $( $variant(Vec<$ty>), )+
        }

        impl VolumeData {
            /// Reinterpret little-endian `bytes` as elements of
            /// `element_type`.
            ///
            /// # Errors
            ///
            /// [`DecodeError::PartialElement`] if `bytes.len()` is not a
            /// multiple of the element width.
            pub fn from_le_bytes(
                element_type: ElementType,
                bytes: &[u8],
            ) -> Result<Self, DecodeError> {
                if bytes.len() % element_type.width() != 0 {
                    return Err(DecodeError::PartialElement {
                        size: bytes.len(),
                        element_type,
                    });
                }

                Ok(match element_type {
                    $(
                        ElementType::$variant => Self::$variant(
                            bytes
                                .chunks_exact(size_of::<$ty>())
                                .map(|chunk| {
                                    let mut raw = [0u8; size_of::<$ty>()];
                                    raw.copy_from_slice(chunk);
                                    <$ty>::from_le_bytes(raw)
                                })
                                .collect(),
                        ),
                    )+
                })
            }

            #[must_use]
            pub fn element_type(&self) -> ElementType {
                match self {
                    $( Self::$variant(_) => ElementType::$variant, )+
                }
            }

            #[must_use]
            pub fn len(&self) -> usize {
                match self {
                    $( Self::$variant(values) => values.len(), )+
                }
            }

            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.len() == 0
            }

            /// Serialize the elements back to little-endian bytes.
            #[must_use]
            pub fn to_le_bytes(&self) -> Vec<u8> {
                match self {
                    $(
                        Self::$variant(values) => values
                            .iter()
                            .flat_map(|value| value.to_le_bytes())
                            .collect(),
                    )+
                }
            }
        }

        $(
            impl sealed::Sealed for $ty {}

            impl Element for $ty {
                const TYPE: ElementType = ElementType::$variant;

                fn slice(data: &VolumeData) -> Option<&[Self]> {
                    match data {
                        VolumeData::$variant(values) => Some(values),
                        _ => None,
                    }
                }
            }
        )+
    };
}

volume_data! {
    Int8 => i8,
    Int16 => i16,
    Int32 => i32,
    Int64 => i64,
    Uint8 => u8,
    Uint16 => u16,
    Uint32 => u32,
    Uint64 => u64,
    Float32 => f32,
    Float64 => f64,
}

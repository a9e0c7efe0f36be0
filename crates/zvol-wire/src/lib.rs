#![warn(clippy::pedantic)]

pub mod element;
pub mod error;
pub mod frame;
pub mod metadata;

pub use element::{ElementKind, ElementType};
pub use error::MetadataError;
pub use frame::MetadataFrame;
pub use metadata::Metadata;

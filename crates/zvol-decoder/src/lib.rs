#![warn(clippy::pedantic)]

pub mod config;
pub mod decoder;
pub mod error;
pub mod loader;
pub mod volume;

mod buffer;

pub use config::DecoderConfig;
pub use decoder::VolumeDecoder;
pub use error::DecodeError;
pub use loader::{Progress, VolumeLoader};
pub use volume::{Element, Volume, VolumeData};

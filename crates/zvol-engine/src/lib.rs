#![warn(clippy::pedantic)]

pub mod config;
pub mod engine;
pub mod error;
pub mod loader;
pub mod strategy;
pub mod zstd_engine;

mod memory;

pub use config::EngineConfig;
pub use engine::{Address, DecoderEngine, NULL_ADDRESS};
pub use error::{EngineError, LoadError};
pub use loader::{EngineLoader, load_engine, load_template};
pub use strategy::{EngineSource, EngineTemplate, IsolatedEngine, SharedEngine};
pub use zstd_engine::{ZstdEngine, ZstdTemplate};

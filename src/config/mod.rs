//! Configuration management for fieldlog.
//!
//! This module handles loading and saving configuration from `~/.fieldlog/`.

mod paths;
mod settings;

pub use paths::Paths;
pub use settings::{CacheConfig, Config, GeneralConfig, QueueConfig};

//! Local read cache.
//!
//! Keeps the last-known-good result of each read so it can be shown while
//! the device is offline.

mod layer;
mod manager;

pub use layer::{CacheLayer, CacheSource, CachedRead};
pub use manager::{CacheEntry, CacheManager};

//! Feature implementations for fieldlog.
//!
//! - Offline operation queue and its drain
//! - Read cache with offline fallback

pub mod cache;
pub mod sync;

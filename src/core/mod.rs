//! Core abstractions for fieldlog.
//!
//! Shared types used by both the operation queue and the read cache.

mod connectivity;

pub use connectivity::Connectivity;

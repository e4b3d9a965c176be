//! Command implementations for fieldlog.
//!
//! Each command returns the text to print, already formatted for the
//! requested output format.

mod cache;
mod config;
mod queue;

pub use cache::cache;
pub use config::config;
pub use queue::queue;

//! fieldlog - offline operation queue and read cache
//!
//! Keeps a field service log usable without connectivity: writes are queued
//! in a durable local store and replayed against the remote document store
//! later, and reads are cached so the last-known-good data can be shown
//! while offline.

#![deny(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod features;
pub mod output;
pub mod storage;

pub use cli::args::{Cli, Commands, OutputFormat};
pub use crate::core::Connectivity;
pub use error::FieldlogError;
pub use features::cache::{CacheLayer, CacheManager};
pub use features::sync::{Drainer, OperationQueue, QueuedOperation, RemoteStore};
